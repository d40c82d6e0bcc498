//! Ancillary-register access and the odds and ends: RDasr/WRasr, PAUSE.

use dbt_ir::{CleanCall, CleanHelper, Expr, JumpKind, Op, Stmt, Ty, binop, mk_u1, mk_u64};

use crate::decode::{DecodedInsn, Operands};
use crate::lift::{HwCaps, INSN_LENGTH, LiftResult, Lifter, Unsupported};
use crate::regs::{self, Asr};
use crate::state::offsets;

impl Lifter<'_> {
    /// RDasr. CCR and GSR are synthesized; %tick/%stick go through a clean
    /// helper (their values only exist on live hardware); %cfr reports the
    /// feature word derived from the capability bits.
    pub(crate) fn lift_rdasr(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::Asr { asr, rd, .. } = insn.operands else {
            unreachable!()
        };
        let Some(asr) = Asr::from_num(asr) else {
            return Err(Unsupported("RDasr source register"));
        };

        match asr {
            Asr::Y | Asr::Ccr | Asr::Asi | Asr::Pc | Asr::Fprs | Asr::Gsr => {
                let val = self.get_asr(asr);
                self.put_ireg(rd, val);
            }
            Asr::Cfr => {
                let hw = self.arch.hwcaps;
                let mut cfr: u64 = 0;
                if hw.contains(HwCaps::SPARC6) {
                    cfr |= 0x3F_8000;
                } else if hw.contains(HwCaps::SPARC5) {
                    cfr |= 0x7000;
                } else if hw.contains(HwCaps::SPARC4) {
                    // Everything except Kasumi.
                    cfr |= 0xFFB;
                }
                self.put_ireg(rd, mk_u64(cfr));
            }
            Asr::Tick | Asr::Stick => {
                let call = Expr::Call(CleanCall {
                    helper: CleanHelper::ReadAsr,
                    args: vec![mk_u64(asr as u64)],
                    ret_ty: Ty::I64,
                    // The register number is a constant, not data.
                    mcx_mask: 1,
                });
                self.put_ireg(rd, call);
            }
            _ => return Err(Unsupported("RDasr source register")),
        }

        Ok(())
    }

    /// WRasr writes `rs1 ^ rs2_or_imm` (an architectural quirk of the
    /// encoding). Writing PAUSE yields to the scheduler rather than
    /// modelling the wait.
    pub(crate) fn lift_wrasr(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::Asr {
            asr, rs1, rs2_imm, ..
        } = insn.operands
        else {
            unreachable!()
        };
        let Some(asr) = Asr::from_num(asr) else {
            return Err(Unsupported("WRasr destination register"));
        };

        let rhs = self.rs2_imm_expr(rs2_imm);
        let value = binop(Op::Xor64, self.get_ireg(rs1), rhs);

        match asr {
            Asr::Y | Asr::Ccr | Asr::Asi | Asr::Gsr => self.put_asr(asr, value),
            Asr::Fprs => {
                // Keep the enable bit on whatever the guest writes, so FP
                // support never needs re-checking.
                self.put_asr(
                    asr,
                    binop(Op::Or64, value, mk_u64(regs::FPRS_FEF)),
                );
            }
            Asr::Pause => {
                // Continue after conditionally yielding to the scheduler.
                self.stmt(Stmt::Exit {
                    guard: mk_u1(true),
                    kind: JumpKind::Yield,
                    dst: self.pc + INSN_LENGTH,
                    ip_offset: offsets::PC,
                });
            }
            _ => return Err(Unsupported("WRasr destination register")),
        }

        Ok(())
    }
}
