//! Shared IR-building helpers used by every instruction family.
//!
//! These are the only places that know how guest registers, thunks and
//! memory accesses are spelled in IR; the family modules compose them.

use dbt_ir::{
    CleanCall, CleanHelper, Expr, Op, Stmt, Temp, Ty, binop, mk_u8, mk_u64, unop,
};

use crate::ccr::{self, CcOp, ICond};
use crate::decode::{Asi, RegOrImm};
use crate::fsr::{self, CexcOp, FCond};
use crate::lift::Lifter;
use crate::regs::{self, Asr};
use crate::state::offsets;

/// IR type for an FP operand size in bytes.
#[must_use]
pub fn fp_ty(size: usize) -> Ty {
    match size {
        4 => Ty::F32,
        8 => Ty::F64,
        16 => Ty::F128,
        _ => panic!("bad FP operand size {size}"),
    }
}

impl Lifter<'_> {
    pub(crate) fn stmt(&mut self, st: Stmt) {
        self.block.stmt(st);
    }

    pub(crate) fn temp(&mut self, ty: Ty) -> Temp {
        self.block.new_temp(ty)
    }

    pub(crate) fn assign(&mut self, tmp: Temp, data: Expr) {
        self.stmt(Stmt::WrTmp { tmp, data });
    }

    /// Allocates a temp, assigns `data` to it and returns the read.
    pub(crate) fn bind(&mut self, ty: Ty, data: Expr) -> Expr {
        let t = self.temp(ty);
        self.assign(t, data);
        Expr::Tmp(t)
    }

    // ---- integer registers ----

    /// Reads an integer register; %g0 reads as constant zero.
    pub(crate) fn get_ireg(&self, reg: u8) -> Expr {
        assert!(reg < 32);
        if reg == 0 {
            mk_u64(0)
        } else {
            Expr::Get {
                offset: regs::offset_ireg(reg),
                ty: Ty::I64,
            }
        }
    }

    /// Writes an integer register; writes to %g0 are discarded.
    pub(crate) fn put_ireg(&mut self, reg: u8, data: Expr) {
        assert!(reg < 32);
        if reg == 0 {
            return;
        }
        self.stmt(Stmt::Put {
            offset: regs::offset_ireg(reg),
            data,
        });
    }

    // ---- FP registers ----

    pub(crate) fn get_freg(&self, reg: u8, size: usize) -> Expr {
        Expr::Get {
            offset: regs::offset_freg(reg, size),
            ty: fp_ty(size),
        }
    }

    pub(crate) fn put_freg(&mut self, reg: u8, size: usize, data: Expr) {
        self.stmt(Stmt::Put {
            offset: regs::offset_freg(reg, size),
            data,
        });
    }

    /// Reads an FP register's bits as an integer of the same width,
    /// avoiding a reinterpret operation.
    pub(crate) fn get_freg_as_int(&self, reg: u8, size: usize) -> Expr {
        let ty = match size {
            4 => Ty::I32,
            8 => Ty::I64,
            _ => panic!("bad integer view size {size}"),
        };
        Expr::Get {
            offset: regs::offset_freg(reg, size),
            ty,
        }
    }

    // ---- program counters ----

    pub(crate) fn put_pc(&mut self, data: Expr) {
        self.stmt(Stmt::Put {
            offset: offsets::PC,
            data,
        });
    }

    pub(crate) fn put_npc(&mut self, data: Expr) {
        self.stmt(Stmt::Put {
            offset: offsets::NPC,
            data,
        });
    }

    // ---- ancillary registers ----

    pub(crate) fn get_asr(&mut self, asr: Asr) -> Expr {
        match asr {
            Asr::Ccr => self.calc_ccr(),
            Asr::Gsr => {
                let hi = binop(
                    Op::Shl64,
                    unop(
                        Op::Uext32,
                        Expr::Get {
                            offset: offsets::GSR_MASK,
                            ty: Ty::I32,
                        },
                    ),
                    mk_u8(fsr::GSR_SHIFT_MASK as u8),
                );
                let lo = unop(
                    Op::Uext32,
                    Expr::Get {
                        offset: offsets::GSR_ALIGN,
                        ty: Ty::I32,
                    },
                );
                binop(Op::Or64, hi, lo)
            }
            _ => Expr::Get {
                offset: regs::offset_asr(asr),
                ty: Ty::I64,
            },
        }
    }

    pub(crate) fn put_asr(&mut self, asr: Asr, data: Expr) {
        match asr {
            Asr::Y => {
                // High 32 bits of Y always read zero.
                self.stmt(Stmt::Put {
                    offset: offsets::Y,
                    data: binop(Op::And64, data, mk_u64(0xffff_ffff)),
                });
            }
            Asr::Ccr => self.set_flags_dep1(CcOp::Copy, data),
            Asr::Asi => {
                self.stmt(Stmt::Put {
                    offset: offsets::ASI,
                    data: binop(Op::And64, data, mk_u64(0xff)),
                });
            }
            Asr::Gsr => {
                let align = unop(
                    Op::Trunc64To32,
                    binop(Op::And64, data.clone(), mk_u64(fsr::GSR_MASK_ALIGN)),
                );
                self.stmt(Stmt::Put {
                    offset: offsets::GSR_ALIGN,
                    data: align,
                });
                let mask = unop(
                    Op::Trunc64To32,
                    binop(Op::Shr64, data, mk_u8(fsr::GSR_SHIFT_MASK as u8)),
                );
                self.stmt(Stmt::Put {
                    offset: offsets::GSR_MASK,
                    data: mask,
                });
            }
            _ => {
                let offset = regs::offset_asr(asr);
                self.stmt(Stmt::Put { offset, data });
            }
        }
    }

    /// Marks both FP banks dirty, keeping the enable bit on so FP support
    /// never needs re-checking.
    pub(crate) fn set_fprs_dirty(&mut self) {
        self.put_asr(Asr::Fprs, mk_u64(regs::FPRS_DUDL | regs::FPRS_FEF));
    }

    // ---- condition-code thunk ----

    /// Lazy CCR evaluation: a clean-helper call over the stored thunk.
    pub(crate) fn calc_ccr(&mut self) -> Expr {
        let args = vec![
            self.get_thunk(offsets::CC_OP),
            self.get_thunk(offsets::CC_DEP1),
            self.get_thunk(offsets::CC_DEP2),
            self.get_thunk(offsets::CC_NDEP),
        ];
        // OP and NDEP are always-defined; exclude them from checking.
        Expr::Call(CleanCall {
            helper: CleanHelper::CalcCcr,
            args,
            ret_ty: Ty::I64,
            mcx_mask: (1 << 0) | (1 << 3),
        })
    }

    fn get_thunk(&self, offset: usize) -> Expr {
        Expr::Get {
            offset,
            ty: Ty::I64,
        }
    }

    /// One-bit integer condition from explicit thunk components. Constant
    /// patterns are specialized at lift time; everything else becomes a
    /// clean-helper call.
    pub(crate) fn icond_expr(
        &mut self,
        cond: ICond,
        cc_op: Expr,
        cc_dep1: Expr,
        cc_dep2: Expr,
        cc_ndep: Expr,
        negate: bool,
    ) -> Expr {
        let args = vec![mk_u64(cond as u64), cc_op, cc_dep1, cc_dep2, cc_ndep];
        let call = ccr::specialize_icond(&args).unwrap_or_else(|| {
            // Exclude COND, OP and NDEP from definedness checking.
            Expr::Call(CleanCall {
                helper: CleanHelper::CalcICond,
                args,
                ret_ty: Ty::I64,
                mcx_mask: (1 << 0) | (1 << 1) | (1 << 4),
            })
        });
        if negate {
            unop(Op::Trunc64To1, unop(Op::Not64, call))
        } else {
            unop(Op::Trunc64To1, call)
        }
    }

    /// One-bit integer condition from the stored thunk.
    pub(crate) fn icond_from_ccr(&mut self, cond: ICond, negate: bool) -> Expr {
        let op = self.get_thunk(offsets::CC_OP);
        let dep1 = self.get_thunk(offsets::CC_DEP1);
        let dep2 = self.get_thunk(offsets::CC_DEP2);
        let ndep = self.get_thunk(offsets::CC_NDEP);
        self.icond_expr(cond, op, dep1, dep2, ndep, negate)
    }

    /// One-bit FP condition from the stored fcc fields.
    pub(crate) fn fcond_from_fsr(&mut self, cond: FCond, fccn: u8, negate: bool) -> Expr {
        let args = vec![
            mk_u64(cond as u64),
            mk_u64(u64::from(fccn)),
            self.get_thunk(offsets::FSR_FCC),
        ];
        let call = fsr::specialize_fcond(&args).unwrap_or(Expr::Call(CleanCall {
            helper: CleanHelper::CalcFCond,
            args,
            ret_ty: Ty::I64,
            mcx_mask: (1 << 0) | (1 << 1),
        }));
        if negate {
            unop(Op::Trunc64To1, unop(Op::Not64, call))
        } else {
            unop(Op::Trunc64To1, call)
        }
    }

    /// Thunk write: tag plus DEP1; DEP2 zeroed, NDEP untouched.
    pub(crate) fn set_flags_dep1(&mut self, cc_op: CcOp, dep1: Expr) {
        self.stmt(Stmt::Put {
            offset: offsets::CC_OP,
            data: mk_u64(cc_op as u64),
        });
        self.stmt(Stmt::Put {
            offset: offsets::CC_DEP1,
            data: dep1,
        });
        self.stmt(Stmt::Put {
            offset: offsets::CC_DEP2,
            data: mk_u64(0),
        });
    }

    /// Thunk write: tag plus both operands.
    pub(crate) fn set_flags_dep1_dep2(&mut self, cc_op: CcOp, dep1: Temp, dep2: Temp) {
        self.stmt(Stmt::Put {
            offset: offsets::CC_OP,
            data: mk_u64(cc_op as u64),
        });
        self.stmt(Stmt::Put {
            offset: offsets::CC_DEP1,
            data: Expr::Tmp(dep1),
        });
        self.stmt(Stmt::Put {
            offset: offsets::CC_DEP2,
            data: Expr::Tmp(dep2),
        });
    }

    /// Thunk write for the carry-consuming tags: DEP2 is stored XOR carry
    /// so the checker sees real data flow, NDEP carries the raw carry.
    pub(crate) fn set_flags_dep1_dep2_ndep(
        &mut self,
        cc_op: CcOp,
        dep1: Temp,
        dep2: Temp,
        carry: Temp,
    ) {
        self.stmt(Stmt::Put {
            offset: offsets::CC_OP,
            data: mk_u64(cc_op as u64),
        });
        self.stmt(Stmt::Put {
            offset: offsets::CC_DEP1,
            data: Expr::Tmp(dep1),
        });
        self.stmt(Stmt::Put {
            offset: offsets::CC_DEP2,
            data: binop(Op::Xor64, Expr::Tmp(dep2), Expr::Tmp(carry)),
        });
        self.stmt(Stmt::Put {
            offset: offsets::CC_NDEP,
            data: Expr::Tmp(carry),
        });
    }

    // ---- FP current-exceptions thunk ----

    fn put_cexc_dep(&mut self, hi_offset: usize, lo_offset: usize, dep: Expr, ty: Ty) {
        match ty {
            Ty::F32 | Ty::F64 | Ty::I64 => {
                self.stmt(Stmt::Put {
                    offset: hi_offset,
                    data: mk_u64(0),
                });
                self.stmt(Stmt::Put {
                    offset: lo_offset,
                    data: dep,
                });
            }
            // An F128 put covers both halves.
            Ty::F128 => self.stmt(Stmt::Put {
                offset: hi_offset,
                data: dep,
            }),
            _ => panic!("bad cexc dependency type {ty:?}"),
        }
    }

    fn put_cexc_op(&mut self, op: CexcOp) {
        self.stmt(Stmt::Put {
            offset: offsets::FSR_CEXC_OP,
            data: mk_u64(op as u64),
        });
    }

    fn put_cexc_ndep_rd(&mut self) {
        let rd = self.get_thunk(offsets::FSR_RD);
        self.stmt(Stmt::Put {
            offset: offsets::FSR_CEXC_NDEP,
            data: rd,
        });
    }

    /// cexc thunk write: tag plus DEP1; DEP2 zeroed in both halves.
    pub(crate) fn set_cexc_dep1(&mut self, op: CexcOp, dep1: Expr, ty: Ty) {
        self.put_cexc_op(op);
        self.put_cexc_dep(offsets::FSR_CEXC_DEP1_HI, offsets::FSR_CEXC_DEP1_LO, dep1, ty);
        self.stmt(Stmt::Put {
            offset: offsets::FSR_CEXC_DEP2_HI,
            data: mk_u64(0),
        });
        self.stmt(Stmt::Put {
            offset: offsets::FSR_CEXC_DEP2_LO,
            data: mk_u64(0),
        });
    }

    /// As [`Lifter::set_cexc_dep1`], also recording the live rounding mode.
    pub(crate) fn set_cexc_dep1_rd(&mut self, op: CexcOp, dep1: Expr, ty: Ty) {
        self.set_cexc_dep1(op, dep1, ty);
        self.put_cexc_ndep_rd();
    }

    /// cexc thunk write: tag plus both operands.
    pub(crate) fn set_cexc_dep1_dep2(&mut self, op: CexcOp, dep1: Expr, dep2: Expr, ty: Ty) {
        self.put_cexc_op(op);
        self.put_cexc_dep(offsets::FSR_CEXC_DEP1_HI, offsets::FSR_CEXC_DEP1_LO, dep1, ty);
        self.put_cexc_dep(offsets::FSR_CEXC_DEP2_HI, offsets::FSR_CEXC_DEP2_LO, dep2, ty);
    }

    /// As [`Lifter::set_cexc_dep1_dep2`], also recording the rounding mode.
    pub(crate) fn set_cexc_dep1_dep2_rd(&mut self, op: CexcOp, dep1: Expr, dep2: Expr, ty: Ty) {
        self.set_cexc_dep1_dep2(op, dep1, dep2, ty);
        self.put_cexc_ndep_rd();
    }

    /// cexc thunk write for four-operand fused multiply-add: the three
    /// sources pack into DEP1_HI, DEP1_LO and DEP2_HI.
    pub(crate) fn set_cexc_fmaf(&mut self, op: CexcOp, arg1: Expr, arg2: Expr, arg3: Expr) {
        self.put_cexc_op(op);
        self.stmt(Stmt::Put {
            offset: offsets::FSR_CEXC_DEP1_HI,
            data: arg1,
        });
        self.stmt(Stmt::Put {
            offset: offsets::FSR_CEXC_DEP1_LO,
            data: arg2,
        });
        self.stmt(Stmt::Put {
            offset: offsets::FSR_CEXC_DEP2_HI,
            data: arg3,
        });
        self.stmt(Stmt::Put {
            offset: offsets::FSR_CEXC_DEP2_LO,
            data: mk_u64(0),
        });
        self.put_cexc_ndep_rd();
    }

    /// Clears the cexc thunk: operations that cannot raise FP exceptions.
    pub(crate) fn clear_cexc(&mut self) {
        self.set_cexc_dep1_dep2(CexcOp::Copy, mk_u64(0), mk_u64(0), Ty::I64);
    }

    /// The live rounding mode as the I32 the FP operators take.
    pub(crate) fn ir_round_mode(&self) -> Expr {
        unop(
            Op::Trunc64To32,
            Expr::Get {
                offset: offsets::FSR_RD,
                ty: Ty::I64,
            },
        )
    }

    // ---- memory ----

    /// Right operand of a format-3 instruction.
    pub(crate) fn rs2_imm_expr(&self, rs2_imm: RegOrImm) -> Expr {
        match rs2_imm {
            RegOrImm::Reg(r) => self.get_ireg(r),
            RegOrImm::Imm(imm) => mk_u64(imm as u64),
        }
    }

    /// Effective address `rs1 + rs2_or_imm`.
    pub(crate) fn ea_expr(&self, rs1: u8, rs2_imm: RegOrImm) -> Expr {
        binop(Op::Add64, self.get_ireg(rs1), self.rs2_imm_expr(rs2_imm))
    }

    /// ASI qualifier: an immediate, or the dynamic %asi register.
    pub(crate) fn asi_expr(&mut self, asi: Asi) -> Expr {
        match asi {
            Asi::Imm(v) => mk_u8(v),
            Asi::Implicit => unop(Op::Trunc64To8, self.get_asr(Asr::Asi)),
        }
    }

    /// Sized load widened to 64 bits, optionally ASI-qualified.
    pub(crate) fn narrow_load(
        &mut self,
        size: usize,
        sext: bool,
        addr: Expr,
        asi: Option<Expr>,
    ) -> Expr {
        let (ty, widen) = match (size, sext) {
            (8, _) => (Ty::I64, None),
            (4, true) => (Ty::I32, Some(Op::Sext32)),
            (4, false) => (Ty::I32, Some(Op::Uext32)),
            (2, true) => (Ty::I16, Some(Op::Sext16)),
            (2, false) => (Ty::I16, Some(Op::Uext16)),
            (1, true) => (Ty::I8, Some(Op::Sext8)),
            (1, false) => (Ty::I8, Some(Op::Uext8)),
            _ => panic!("bad load size {size}"),
        };
        let load = match asi {
            Some(asi) => Expr::LoadA {
                ty,
                addr: Box::new(addr),
                asi: Box::new(asi),
            },
            None => Expr::Load {
                ty,
                addr: Box::new(addr),
            },
        };
        match widen {
            Some(op) => unop(op, load),
            None => load,
        }
    }

    /// Sized store of the low bytes of a 64-bit value, optionally
    /// ASI-qualified.
    pub(crate) fn narrow_store(&mut self, size: usize, addr: Expr, data: Expr, asi: Option<Expr>) {
        let data = match size {
            8 => data,
            4 => unop(Op::Trunc64To32, data),
            2 => unop(Op::Trunc64To16, data),
            1 => unop(Op::Trunc64To8, data),
            _ => panic!("bad store size {size}"),
        };
        match asi {
            Some(asi) => self.stmt(Stmt::StoreA { addr, data, asi }),
            None => self.stmt(Stmt::Store { addr, data }),
        }
    }

    // ---- register-window save area ----

    /// Stores one windowed register to the save area at `base + off`
    /// (stack-biased).
    pub(crate) fn savearea_store(&mut self, state_off: usize, base: Temp, off: u64) {
        let addr = binop(
            Op::Add64,
            Expr::Tmp(base),
            mk_u64(off + regs::STACK_BIAS),
        );
        self.stmt(Stmt::Store {
            addr,
            data: Expr::Get {
                offset: state_off,
                ty: Ty::I64,
            },
        });
    }

    /// Reloads one windowed register from the save area at `base + off`
    /// (stack-biased).
    pub(crate) fn savearea_restore(&mut self, state_off: usize, base: Temp, off: u64) {
        let addr = binop(
            Op::Add64,
            Expr::Tmp(base),
            mk_u64(off + regs::STACK_BIAS),
        );
        self.stmt(Stmt::Put {
            offset: state_off,
            data: Expr::Load {
                ty: Ty::I64,
                addr: Box::new(addr),
            },
        });
    }

    /// Copies one 64-bit guest-state slot to another (window shifting).
    pub(crate) fn copy_reg_slot(&mut self, dst_off: usize, src_off: usize) {
        self.stmt(Stmt::Put {
            offset: dst_off,
            data: Expr::Get {
                offset: src_off,
                ty: Ty::I64,
            },
        });
    }
}
