//! Integer arithmetic: add/sub (with and without carry), multiply, divide,
//! and the Y-register plumbing of the 32-bit forms.
//!
//! Family parameters per mnemonic: (IR op, CC tag, which carry bit is
//! consumed, whether operands narrow to 32 bits). The `cc` forms write the
//! thunk with the untruncated 64-bit sources; the evaluator handles both
//! widths from those.
//!
//!   Y_OUT (umul/smul): the high 32 bits of the product land in %y.
//!   Y_IN  (udiv/sdiv): the dividend is the 64-bit concatenation %y:rs1.

use dbt_ir::{Expr, Op, Stmt, Ty, binop, mk_u8, mk_u64, unop};

use crate::ccr::CcOp;
use crate::decode::{DecodedInsn, Mnemonic, Operands, RegOrImm};
use crate::lift::{LiftResult, Lifter};
use crate::regs::Asr;
use crate::state::offsets;

/// Which CCR carry bit feeds the operation.
#[derive(Clone, Copy, PartialEq)]
enum TakesCarry {
    No,
    Icc,
    Xcc,
}

impl Lifter<'_> {
    pub(crate) fn lift_arith(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::IntRR { rs1, rs2_imm, rd } = insn.operands else {
            unreachable!()
        };

        // (ir op, cc tag, carry in, 32-bit operands, writes cc)
        let (ir_op, cc_op, carry_in, is_32bit, outputs_cc) = match insn.mnemonic {
            M::Add => (Op::Add64, CcOp::Add, TakesCarry::No, false, false),
            M::AddCc => (Op::Add64, CcOp::Add, TakesCarry::No, false, true),
            M::AddC => (Op::Add64, CcOp::AddC, TakesCarry::Icc, false, false),
            M::AddCCc => (Op::Add64, CcOp::AddC, TakesCarry::Icc, false, true),
            M::AddXC => (Op::Add64, CcOp::AddC, TakesCarry::Xcc, false, false),
            M::AddXCcc => (Op::Add64, CcOp::AddC, TakesCarry::Xcc, false, true),
            M::BMask => (Op::Add64, CcOp::Add, TakesCarry::No, false, false),
            M::Mulx => (Op::Mul64, CcOp::Copy, TakesCarry::No, false, false),
            M::Sdivx => (Op::DivS64, CcOp::Copy, TakesCarry::No, false, false),
            M::Udivx => (Op::DivU64, CcOp::Copy, TakesCarry::No, false, false),
            M::Sdiv => (Op::DivS64To32, CcOp::Copy, TakesCarry::No, true, false),
            M::SdivCc => (Op::DivS64To32, CcOp::SDiv, TakesCarry::No, true, true),
            M::Smul => (Op::MullS32, CcOp::Copy, TakesCarry::No, true, false),
            M::SmulCc => (Op::MullS32, CcOp::SMul, TakesCarry::No, true, true),
            M::Sub => (Op::Sub64, CcOp::Sub, TakesCarry::No, false, false),
            M::SubCc => (Op::Sub64, CcOp::Sub, TakesCarry::No, false, true),
            M::SubC => (Op::Sub64, CcOp::SubC, TakesCarry::Icc, false, false),
            M::SubCCc => (Op::Sub64, CcOp::SubC, TakesCarry::Icc, false, true),
            M::Udiv => (Op::DivU64To32, CcOp::Copy, TakesCarry::No, true, false),
            M::UdivCc => (Op::DivU64To32, CcOp::UDiv, TakesCarry::No, true, true),
            M::Umul => (Op::MullU32, CcOp::Copy, TakesCarry::No, true, false),
            M::UmulCc => (Op::MullU32, CcOp::UMul, TakesCarry::No, true, true),
            M::UmulXhi => (Op::MulHiU64, CcOp::Copy, TakesCarry::No, false, false),
            _ => unreachable!(),
        };

        let y_in = matches!(insn.mnemonic, M::Sdiv | M::SdivCc | M::Udiv | M::UdivCc);
        let y_out = matches!(insn.mnemonic, M::Smul | M::SmulCc | M::Umul | M::UmulCc);

        // src* are always 64-bit wide (thunk operands); arg* feed the IR op
        // and may be narrowed.
        let mut src_l = self.get_ireg(rs1);
        let mut arg_l = src_l.clone();
        if is_32bit {
            arg_l = unop(Op::Trunc64To32, src_l.clone());
            if y_in {
                // Dividend is %y:rs1(low 32).
                let y = self.get_asr(Asr::Y);
                arg_l = binop(
                    Op::Or64,
                    unop(Op::Uext32, arg_l),
                    binop(Op::Shl64, y, mk_u8(32)),
                );
                src_l = arg_l.clone();
            }
        }

        let src_r = self.rs2_imm_expr(rs2_imm);
        let arg_r = match (is_32bit, rs2_imm) {
            (false, _) => src_r.clone(),
            (true, RegOrImm::Reg(_)) => unop(Op::Trunc64To32, src_r.clone()),
            (true, RegOrImm::Imm(imm)) => dbt_ir::mk_u32(imm as u32),
        };

        // Fetch the carry before the thunk is overwritten.
        let carry = self.temp(Ty::I64);
        match carry_in {
            TakesCarry::No => {}
            TakesCarry::Icc => {
                let ccr = self.calc_ccr();
                self.assign(carry, binop(Op::And64, ccr, mk_u64(1)));
            }
            TakesCarry::Xcc => {
                let ccr = self.calc_ccr();
                self.assign(
                    carry,
                    binop(
                        Op::Shr64,
                        binop(Op::And64, ccr, mk_u64(0x10)),
                        mk_u8(4),
                    ),
                );
            }
        }

        if outputs_cc {
            let dep1 = self.temp(Ty::I64);
            let dep2 = self.temp(Ty::I64);
            self.assign(dep1, src_l);
            self.assign(dep2, src_r);
            if carry_in == TakesCarry::No {
                self.set_flags_dep1_dep2(cc_op, dep1, dep2);
            } else {
                self.set_flags_dep1_dep2_ndep(cc_op, dep1, dep2, carry);
            }
        }

        let result = self.temp(Ty::I64);
        if carry_in == TakesCarry::No {
            self.assign(result, binop(ir_op, arg_l, arg_r));
        } else {
            self.assign(
                result,
                binop(ir_op, binop(ir_op, arg_l, arg_r), Expr::Tmp(carry)),
            );
        }
        self.put_ireg(rd, Expr::Tmp(result));

        if y_out {
            let hi = binop(Op::Shr64, Expr::Tmp(result), mk_u8(32));
            self.put_asr(Asr::Y, hi);
        } else if insn.mnemonic == M::BMask {
            let mask = unop(Op::Trunc64To32, Expr::Tmp(result));
            self.stmt(Stmt::Put {
                offset: offsets::GSR_MASK,
                data: mask,
            });
        }

        Ok(())
    }

    pub(crate) fn lift_sethi(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::Sethi { imm, rd } = insn.operands else {
            unreachable!()
        };
        self.put_ireg(rd, mk_u64(imm));
        Ok(())
    }
}
