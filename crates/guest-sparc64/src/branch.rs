//! Control transfer: conditional branches with delay-slot and annul
//! handling, compare-and-branch, calls, register jumps and trap-always.
//!
//! Delay-slot patterns (see the module docs of `lift`):
//! - annul clear, conditional: stash the taken-exit for the next call so it
//!   lands after the delay instruction's statements.
//! - annul set, conditional: emit an in-place exit on the *negated*
//!   condition to the fall-through (skipping the delay slot), then stash
//!   the target so the delay instruction runs and the block stops there.
//! - annul set, unconditional: the delay slot never runs; stop immediately.
//! - branch-never, annul clear: an instruction-prefetch hint; nothing to do.

use dbt_ir::{DisResult, Expr, JumpKind, Op, Stmt, Ty, WhatNext, binop, mk_u64};

use crate::ccr::{CcOp, ICond};
use crate::decode::{DecodedInsn, Mnemonic, Operands, RCond};
use crate::fsr::FCond;
use crate::lift::{INSN_LENGTH, LiftResult, Lifter, Unsupported};
use crate::state::offsets;

/// Register-against-zero condition as a one-bit expression.
fn rcond_expr(rcond: RCond, reg: Expr, negate: bool) -> Expr {
    let cond = match rcond {
        RCond::Z => binop(Op::CmpEq64, reg, mk_u64(0)),
        RCond::LeZ => binop(Op::CmpLe64S, reg, mk_u64(0)),
        RCond::LZ => binop(Op::CmpLt64S, reg, mk_u64(0)),
        RCond::NZ => binop(Op::CmpNe64, reg, mk_u64(0)),
        RCond::GZ => binop(Op::CmpLt64S, mk_u64(0), reg),
        RCond::GeZ => binop(Op::CmpLe64S, mk_u64(0), reg),
    };
    if negate {
        dbt_ir::unop(Op::Not1, cond)
    } else {
        cond
    }
}

impl Lifter<'_> {
    fn exit_to(&self, guard: Expr, dst: u64) -> Stmt {
        Stmt::Exit {
            guard,
            kind: JumpKind::Boring,
            dst,
            ip_offset: offsets::PC,
        }
    }

    /// Bicc / BPcc. The prediction bit has no IR counterpart and is
    /// dropped.
    pub(crate) fn lift_bicc_bpcc(
        &mut self,
        insn: &DecodedInsn,
        dres: &mut DisResult,
    ) -> LiftResult {
        let Operands::Br {
            annul,
            cond4,
            xcc,
            disp,
        } = insn.operands
        else {
            unreachable!()
        };
        let pc = self.pc;
        let jmp_addr = pc.wrapping_add(disp as u64);

        let icc_cond = ICond::from_cond4(cond4);
        let cond = if xcc { icc_cond.xcc() } else { icc_cond };

        if annul {
            if icc_cond == ICond::AIcc || icc_cond == ICond::NIcc {
                // Unconditional with annul: the delay slot is dead. Stop.
                dres.what_next = WhatNext::StopHere;
                dres.stop_kind = Some(JumpKind::Boring);
                if icc_cond == ICond::AIcc {
                    self.put_npc(mk_u64(jmp_addr + INSN_LENGTH));
                    self.put_pc(mk_u64(jmp_addr));
                } else {
                    self.put_npc(mk_u64(pc + 3 * INSN_LENGTH));
                    self.put_pc(mk_u64(pc + 2 * INSN_LENGTH));
                }
            } else {
                // Not-taken skips the delay slot: exit in place on the
                // negated condition, then continue lifting at the target.
                let neg = self.icond_from_ccr(cond, true);
                let skip = self.exit_to(neg, pc + 2 * INSN_LENGTH);
                self.stmt(skip);
                self.pending_next = Some((mk_u64(jmp_addr), JumpKind::Boring));
            }
        } else {
            if icc_cond == ICond::NIcc {
                // Branch-never without annul is a prefetch hint.
                return Ok(());
            }
            let cond_expr = self.icond_from_ccr(cond, false);
            let t = self.temp(Ty::I1);
            self.assign(t, cond_expr);
            self.pending_exit = Some(self.exit_to(Expr::Tmp(t), jmp_addr));
        }

        Ok(())
    }

    /// FBPfcc, same annul scheme against an fcc field.
    pub(crate) fn lift_fbpfcc(&mut self, insn: &DecodedInsn, dres: &mut DisResult) -> LiftResult {
        let Operands::BrFp {
            annul,
            cond4,
            fcc,
            disp,
        } = insn.operands
        else {
            unreachable!()
        };
        let pc = self.pc;
        let jmp_addr = pc.wrapping_add(disp as u64);
        let cond = FCond::from_cond4(cond4);

        if annul {
            if cond == FCond::A || cond == FCond::N {
                dres.what_next = WhatNext::StopHere;
                dres.stop_kind = Some(JumpKind::Boring);
                if cond == FCond::A {
                    self.put_npc(mk_u64(jmp_addr + INSN_LENGTH));
                    self.put_pc(mk_u64(jmp_addr));
                } else {
                    self.put_npc(mk_u64(pc + 3 * INSN_LENGTH));
                    self.put_pc(mk_u64(pc + 2 * INSN_LENGTH));
                }
            } else {
                let neg = self.fcond_from_fsr(cond, fcc, true);
                let skip = self.exit_to(neg, pc + 2 * INSN_LENGTH);
                self.stmt(skip);
                self.pending_next = Some((mk_u64(jmp_addr), JumpKind::Boring));
            }
        } else {
            if cond == FCond::N {
                return Ok(());
            }
            let cond_expr = self.fcond_from_fsr(cond, fcc, false);
            let t = self.temp(Ty::I1);
            self.assign(t, cond_expr);
            self.pending_exit = Some(self.exit_to(Expr::Tmp(t), jmp_addr));
        }

        Ok(())
    }

    /// BPr: branch on register contents, annul scheme as above.
    pub(crate) fn lift_bpr(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::BrReg {
            annul,
            rcond,
            rs1,
            disp,
        } = insn.operands
        else {
            unreachable!()
        };
        let pc = self.pc;
        let jmp_addr = pc.wrapping_add(disp as u64);
        let reg = self.get_ireg(rs1);

        if annul {
            let skip = self.exit_to(rcond_expr(rcond, reg, true), pc + 2 * INSN_LENGTH);
            self.stmt(skip);
            self.pending_next = Some((mk_u64(jmp_addr), JumpKind::Boring));
        } else {
            let t = self.temp(Ty::I1);
            self.assign(t, rcond_expr(rcond, reg, false));
            self.pending_exit = Some(self.exit_to(Expr::Tmp(t), jmp_addr));
        }

        Ok(())
    }

    /// Compare-and-branch: no delay slot; the comparison thunks straight
    /// into an in-line conditional exit.
    pub(crate) fn lift_cbcond(&mut self, insn: &DecodedInsn, dres: &mut DisResult) -> LiftResult {
        let Operands::CmpBr {
            cond4,
            xcc,
            rs1,
            rs2_imm,
            disp,
        } = insn.operands
        else {
            unreachable!()
        };
        let pc = self.pc;
        let jmp_addr = pc.wrapping_add(disp as u64);

        let icc_cond = ICond::from_cond4(cond4);
        let cond = if xcc { icc_cond.xcc() } else { icc_cond };

        // A subtract thunk over the operands, evaluated immediately.
        let dep1 = self.temp(Ty::I64);
        let dep2 = self.temp(Ty::I64);
        let l = self.get_ireg(rs1);
        self.assign(dep1, l);
        let r = self.rs2_imm_expr(rs2_imm);
        self.assign(dep2, r);

        dres.what_next = WhatNext::StopHere;
        dres.stop_kind = Some(JumpKind::Boring);

        let guard = self.icond_expr(
            cond,
            mk_u64(CcOp::Sub as u64),
            Expr::Tmp(dep1),
            Expr::Tmp(dep2),
            mk_u64(0),
            false,
        );
        let exit = self.exit_to(guard, jmp_addr);
        self.stmt(exit);
        self.put_npc(mk_u64(pc + 2 * INSN_LENGTH));
        self.put_pc(mk_u64(pc + INSN_LENGTH));

        Ok(())
    }

    /// CALL: link into %o7, then an unconditional non-annulling transfer.
    pub(crate) fn lift_call(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::Call { disp } = insn.operands else {
            unreachable!()
        };
        let pc = self.pc;
        self.stmt(Stmt::Put {
            offset: offsets::O7,
            data: mk_u64(pc),
        });
        self.pending_next = Some((mk_u64(pc.wrapping_add(disp as u64)), JumpKind::Call));
        Ok(())
    }

    /// JMPL: link PC into rd, jump to rs1 + rs2/imm.
    pub(crate) fn lift_jmpl(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::IntRR { rs1, rs2_imm, rd } = insn.operands else {
            unreachable!()
        };
        let tgt = self.temp(Ty::I64);
        let ea = self.ea_expr(rs1, rs2_imm);
        self.assign(tgt, ea);
        self.put_ireg(rd, mk_u64(self.pc));
        self.pending_next = Some((Expr::Tmp(tgt), JumpKind::Ret));
        Ok(())
    }

    /// RETURN: a register jump fused with a window restore.
    pub(crate) fn lift_return(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::IntRR { rs1, rs2_imm, .. } = insn.operands else {
            unreachable!()
        };
        let tgt = self.temp(Ty::I64);
        let ea = self.ea_expr(rs1, rs2_imm);
        self.assign(tgt, ea);
        self.pending_next = Some((Expr::Tmp(tgt), JumpKind::Ret));

        self.restore_window();
        Ok(())
    }

    /// Trap-always, immediate form only; the trap number picks the host-OS
    /// syscall convention. Conditional traps are not lifted.
    pub(crate) fn lift_trap(&mut self, insn: &DecodedInsn, dres: &mut DisResult) -> LiftResult {
        use crate::lift::GuestOs;

        debug_assert_eq!(insn.mnemonic, Mnemonic::Tcc);
        let Operands::Trap { cond4, rs1, imm8 } = insn.operands else {
            unreachable!()
        };

        if cond4 != 0x8 {
            return Err(Unsupported("conditional trap"));
        }
        let Some(trap_imm) = imm8 else {
            return Err(Unsupported("trap number in rs2"));
        };
        if rs1 != 0 {
            return Err(Unsupported("trap with rs1 != %g0"));
        }

        let kind = match self.abi.os {
            GuestOs::Linux => match trap_imm {
                0x6d => JumpKind::Syscall,
                0x6e => JumpKind::SysGetContext,
                0x6f => JumpKind::SysSetContext,
                _ => return Err(Unsupported("trap number")),
            },
            GuestOs::Solaris => {
                if trap_imm == 0x40 {
                    JumpKind::Syscall
                } else {
                    // The fast-trap number travels in %o0, which the trap
                    // clobbers anyway.
                    self.stmt(Stmt::Put {
                        offset: crate::regs::offset_ireg(crate::regs::REG_O0),
                        data: mk_u64(u64::from(trap_imm)),
                    });
                    JumpKind::FastTrap
                }
            }
        };

        dres.what_next = WhatNext::StopHere;
        dres.stop_kind = Some(kind);
        let pc = self.pc;
        self.put_npc(mk_u64(pc + 2 * INSN_LENGTH));
        self.put_pc(mk_u64(pc + INSN_LENGTH));
        Ok(())
    }

    /// FLUSH: records the cache-maintenance window and hands control back
    /// so stale translations get dropped.
    pub(crate) fn lift_flush(&mut self, insn: &DecodedInsn, dres: &mut DisResult) -> LiftResult {
        let Operands::IntRR { rs1, rs2_imm, .. } = insn.operands else {
            unreachable!()
        };
        let tgt = self.ea_expr(rs1, rs2_imm);
        self.stmt(Stmt::Put {
            offset: offsets::CMSTART,
            data: tgt,
        });
        self.stmt(Stmt::Put {
            offset: offsets::CMLEN,
            data: mk_u64(8),
        });
        let pc = self.pc;
        self.put_npc(mk_u64(pc + 2 * INSN_LENGTH));
        self.put_pc(mk_u64(pc + INSN_LENGTH));

        dres.what_next = WhatNext::StopHere;
        dres.stop_kind = Some(JumpKind::InvalICache);
        Ok(())
    }

    /// MOVcc's register-conditional cousin lives in `misc`; this is the
    /// shared register-condition builder for BPr and MOVr.
    pub(crate) fn rcond(&mut self, rcond: RCond, rs1: u8, negate: bool) -> Expr {
        let reg = self.get_ireg(rs1);
        rcond_expr(rcond, reg, negate)
    }
}
