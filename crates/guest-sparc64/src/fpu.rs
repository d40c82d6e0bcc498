//! Floating-point arithmetic, compares, conversions and moves.
//!
//! Every exception-raising operation publishes its operands (and the live
//! rounding mode where consumed) into the cexc thunk before computing the
//! result, so the current-exceptions field can be reproduced exactly later.
//! Sign operations and moves clear the thunk instead; they never raise.

use dbt_ir::{Expr, Op, Temp, Ty, binop, mk_u8, mk_u32, mk_u64, qop, triop, unop};

use crate::ccr::ICond;
use crate::decode::{CcSel, DecodedInsn, Mnemonic, Operands};
use crate::fsr::{self, CexcOp, FCond};
use crate::lift::{LiftResult, Lifter};
use crate::recipe::fp_ty;
use crate::state::offsets;

impl Lifter<'_> {
    /// Binds an FP register read to a temp, returning the temp.
    fn bind_freg(&mut self, reg: u8, size: usize) -> Temp {
        let t = self.temp(fp_ty(size));
        let val = self.get_freg(reg, size);
        self.assign(t, val);
        t
    }

    pub(crate) fn lift_farith(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpBinary { rs1, rs2, rd } = insn.operands else {
            unreachable!()
        };

        // (ir op, cexc tag, src size, dst size, consumes rounding mode)
        let (ir_op, cexc, ssz, dsz, rounds) = match insn.mnemonic {
            M::FAddS => (Op::AddF32, CexcOp::FAdd32, 4, 4, true),
            M::FAddD => (Op::AddF64, CexcOp::FAdd64, 8, 8, true),
            M::FAddQ => (Op::AddF128, CexcOp::FAdd128, 16, 16, true),
            M::FSubS => (Op::SubF32, CexcOp::FSub32, 4, 4, true),
            M::FSubD => (Op::SubF64, CexcOp::FSub64, 8, 8, true),
            M::FSubQ => (Op::SubF128, CexcOp::FSub128, 16, 16, true),
            M::FMulS => (Op::MulF32, CexcOp::FMul32, 4, 4, true),
            M::FMulD => (Op::MulF64, CexcOp::FMul64, 8, 8, true),
            M::FMulQ => (Op::MulF128, CexcOp::FMul128, 16, 16, true),
            M::FDivS => (Op::DivF32, CexcOp::FDiv32, 4, 4, true),
            M::FDivD => (Op::DivF64, CexcOp::FDiv64, 8, 8, true),
            M::FDivQ => (Op::DivF128, CexcOp::FDiv128, 16, 16, true),
            // The widening products are exact; no rounding mode involved.
            M::FsMulD => (Op::MullF32, CexcOp::F32Mul64, 4, 8, false),
            M::FdMulQ => (Op::MullF64, CexcOp::F64Mul128, 8, 16, false),
            _ => unreachable!(),
        };

        let src_l = self.bind_freg(rs1, ssz);
        let src_r = self.bind_freg(rs2, ssz);

        if rounds {
            self.set_cexc_dep1_dep2_rd(cexc, Expr::Tmp(src_l), Expr::Tmp(src_r), fp_ty(ssz));
            let rm = self.ir_round_mode();
            self.put_freg(rd, dsz, triop(ir_op, rm, Expr::Tmp(src_l), Expr::Tmp(src_r)));
        } else {
            self.set_cexc_dep1_dep2(cexc, Expr::Tmp(src_l), Expr::Tmp(src_r), fp_ty(ssz));
            self.put_freg(rd, dsz, binop(ir_op, Expr::Tmp(src_l), Expr::Tmp(src_r)));
        }

        self.set_fprs_dirty();
        Ok(())
    }

    pub(crate) fn lift_fsqrt(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpUnary { rs2, rd } = insn.operands else {
            unreachable!()
        };
        let (ir_op, cexc, sz) = match insn.mnemonic {
            M::FSqrtS => (Op::SqrtF32, CexcOp::FSqrt32, 4),
            M::FSqrtD => (Op::SqrtF64, CexcOp::FSqrt64, 8),
            M::FSqrtQ => (Op::SqrtF128, CexcOp::FSqrt128, 16),
            _ => unreachable!(),
        };

        let src = self.bind_freg(rs2, sz);
        self.set_cexc_dep1_rd(cexc, Expr::Tmp(src), fp_ty(sz));
        let rm = self.ir_round_mode();
        self.put_freg(rd, sz, binop(ir_op, rm, Expr::Tmp(src)));

        self.set_fprs_dirty();
        Ok(())
    }

    /// Reformats the I32 an FP compare produces into the native 2-bit fcc
    /// encoding {EQ=00, LT=01, GT=10, UN=11}, branch-free.
    ///
    /// ```text
    /// outcome | cmp  | ix | fcc
    /// EQ      | 0x40 | 10 | 00
    /// LT      | 0x01 | 01 | 01
    /// GT      | 0x00 | 00 | 10
    /// UN      | 0x45 | 11 | 11
    /// ```
    ///
    /// `ix` packs bits 6 and 0 of the compare result side by side. Then
    /// `2 >> ix` produces the right fcc for everything but UN (00 instead
    /// of 11), and the carry term `((ix + 1) & 4) >> 2` is 1 exactly for
    /// ix = 11; ORing it into both bits applies the correction.
    fn fcmp_result_to_fcc(&mut self, cmp_res: Temp) -> Expr {
        let wide = self.temp(Ty::I64);
        self.assign(wide, unop(Op::Uext32, Expr::Tmp(cmp_res)));

        let ix = self.temp(Ty::I64);
        self.assign(
            ix,
            binop(
                Op::Or64,
                binop(
                    Op::And64,
                    binop(Op::Shr64, Expr::Tmp(wide), mk_u8(5)),
                    mk_u64(3),
                ),
                binop(Op::And64, Expr::Tmp(wide), mk_u64(1)),
            ),
        );

        let fcc = self.temp(Ty::I64);
        self.assign(
            fcc,
            binop(Op::Shr64, mk_u64(2), unop(Op::Trunc64To8, Expr::Tmp(ix))),
        );

        let carry = self.temp(Ty::I64);
        self.assign(
            carry,
            binop(
                Op::Shr64,
                binop(
                    Op::And64,
                    binop(Op::Add64, Expr::Tmp(ix), mk_u64(1)),
                    mk_u64(4),
                ),
                mk_u8(2),
            ),
        );

        binop(
            Op::Or64,
            binop(
                Op::Or64,
                binop(Op::Shl64, Expr::Tmp(carry), mk_u8(1)),
                Expr::Tmp(carry),
            ),
            Expr::Tmp(fcc),
        )
    }

    pub(crate) fn lift_fcmp(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FCmp { fcc, rs1, rs2 } = insn.operands else {
            unreachable!()
        };
        let (ir_op, sz) = match insn.mnemonic {
            M::FCmpS | M::FCmpES => (Op::CmpF32, 4),
            M::FCmpD | M::FCmpED => (Op::CmpF64, 8),
            M::FCmpQ | M::FCmpEQ => (Op::CmpF128, 16),
            _ => unreachable!(),
        };
        let cexc = fsr::cexc_op_for_cmp(insn.mnemonic);

        let src_l = self.bind_freg(rs1, sz);
        let src_r = self.bind_freg(rs2, sz);

        let cmp_res = self.temp(Ty::I32);
        self.assign(cmp_res, binop(ir_op, Expr::Tmp(src_l), Expr::Tmp(src_r)));

        // Splice the reformatted result into the requested fcc field.
        let fcc_bits = self.fcmp_result_to_fcc(cmp_res);
        let fccn = fcc as usize;
        let old = self.temp(Ty::I64);
        self.assign(
            old,
            binop(
                Op::And64,
                Expr::Get {
                    offset: offsets::FSR_FCC,
                    ty: Ty::I64,
                },
                mk_u64(!fsr::FCC_MASKS[fccn]),
            ),
        );
        let merged = self.temp(Ty::I64);
        self.assign(
            merged,
            binop(
                Op::Or64,
                Expr::Tmp(old),
                binop(Op::Shl64, fcc_bits, mk_u8(fsr::FCC_SHIFTS[fccn] as u8)),
            ),
        );
        self.stmt(dbt_ir::Stmt::Put {
            offset: offsets::FSR_FCC,
            data: Expr::Tmp(merged),
        });

        self.set_cexc_dep1_dep2(cexc, Expr::Tmp(src_l), Expr::Tmp(src_r), fp_ty(sz));
        Ok(())
    }

    /// Precision conversions among F32/F64/F128. Narrowing ones round.
    pub(crate) fn lift_fpconvert(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpUnary { rs2, rd } = insn.operands else {
            unreachable!()
        };
        let (ir_op, cexc, ssz, dsz, rounds) = match insn.mnemonic {
            M::FsToD => (Op::F32ToF64, CexcOp::F32ToF64, 4, 8, false),
            M::FsToQ => (Op::F32ToF128, CexcOp::F32ToF128, 4, 16, false),
            M::FdToS => (Op::F64ToF32, CexcOp::F64ToF32, 8, 4, true),
            M::FdToQ => (Op::F64ToF128, CexcOp::F64ToF128, 8, 16, false),
            M::FqToS => (Op::F128ToF32, CexcOp::F128ToF32, 16, 4, true),
            M::FqToD => (Op::F128ToF64, CexcOp::F128ToF64, 16, 8, true),
            _ => unreachable!(),
        };

        let src = self.bind_freg(rs2, ssz);
        if rounds {
            self.set_cexc_dep1_rd(cexc, Expr::Tmp(src), fp_ty(ssz));
            let rm = self.ir_round_mode();
            self.put_freg(rd, dsz, binop(ir_op, rm, Expr::Tmp(src)));
        } else {
            self.set_cexc_dep1(cexc, Expr::Tmp(src), fp_ty(ssz));
            self.put_freg(rd, dsz, unop(ir_op, Expr::Tmp(src)));
        }

        self.set_fprs_dirty();
        Ok(())
    }

    /// FP to integer conversions always round toward zero, whatever
    /// FSR.rd says.
    pub(crate) fn lift_f_to_int(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpUnary { rs2, rd } = insn.operands else {
            unreachable!()
        };
        let (ir_op, cexc, ssz, dsz) = match insn.mnemonic {
            M::FsToX => (Op::F32ToI64S, CexcOp::F32ToI64, 4, 8),
            M::FdToX => (Op::F64ToI64S, CexcOp::F64ToI64, 8, 8),
            M::FqToX => (Op::F128ToI64S, CexcOp::F128ToI64, 16, 8),
            M::FsToI => (Op::F32ToI32S, CexcOp::F32ToI32, 4, 4),
            M::FdToI => (Op::F64ToI32S, CexcOp::F64ToI32, 8, 4),
            M::FqToI => (Op::F128ToI32S, CexcOp::F128ToI32, 16, 4),
            _ => unreachable!(),
        };

        let src = self.bind_freg(rs2, ssz);
        self.set_cexc_dep1(cexc, Expr::Tmp(src), fp_ty(ssz));
        let res = binop(
            ir_op,
            mk_u32(dbt_ir::RoundMode::Zero as u32),
            Expr::Tmp(src),
        );
        // The integer result lands in an FP register of the same width.
        let reinterp = if dsz == 8 {
            Op::ReinterpI64AsF64
        } else {
            Op::ReinterpI32AsF32
        };
        self.put_freg(rd, dsz, unop(reinterp, res));

        self.set_fprs_dirty();
        Ok(())
    }

    /// 64-bit integer (held in a double register) to FP.
    pub(crate) fn lift_x_to_f(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpUnary { rs2, rd } = insn.operands else {
            unreachable!()
        };
        let (ir_op, cexc, dsz, rounds) = match insn.mnemonic {
            M::FxToS => (Op::I64SToF32, CexcOp::I64ToF32, 4, true),
            M::FxToD => (Op::I64SToF64, CexcOp::I64ToF64, 8, true),
            M::FxToQ => (Op::I64SToF128, CexcOp::I64ToF128, 16, false),
            _ => unreachable!(),
        };

        let src = self.bind_freg(rs2, 8);
        let as_int = unop(Op::ReinterpF64AsI64, Expr::Tmp(src));
        if rounds {
            self.set_cexc_dep1_rd(cexc, Expr::Tmp(src), Ty::F64);
            let rm = self.ir_round_mode();
            self.put_freg(rd, dsz, binop(ir_op, rm, as_int));
        } else {
            self.set_cexc_dep1(cexc, Expr::Tmp(src), Ty::F64);
            self.put_freg(rd, dsz, unop(ir_op, as_int));
        }

        self.set_fprs_dirty();
        Ok(())
    }

    /// 32-bit integer (held in a single register) to FP.
    pub(crate) fn lift_i_to_f(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpUnary { rs2, rd } = insn.operands else {
            unreachable!()
        };
        let (ir_op, cexc, dsz, rounds) = match insn.mnemonic {
            M::FiToS => (Op::I32SToF32, CexcOp::I32ToF32, 4, true),
            M::FiToD => (Op::I32SToF64, CexcOp::I32ToF64, 8, false),
            M::FiToQ => (Op::I32SToF128, CexcOp::I32ToF128, 16, false),
            _ => unreachable!(),
        };

        let src = self.bind_freg(rs2, 4);
        let as_int = unop(Op::ReinterpF32AsI32, Expr::Tmp(src));
        if rounds {
            self.set_cexc_dep1_rd(cexc, Expr::Tmp(src), Ty::F32);
            let rm = self.ir_round_mode();
            self.put_freg(rd, dsz, binop(ir_op, rm, as_int));
        } else {
            self.set_cexc_dep1(cexc, Expr::Tmp(src), Ty::F32);
            self.put_freg(rd, dsz, unop(ir_op, as_int));
        }

        self.set_fprs_dirty();
        Ok(())
    }

    /// Fused multiply-add/subtract. The three sources pack into the
    /// 4-operand thunk layout.
    pub(crate) fn lift_fmaf(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpTernary { rs1, rs2, rs3, rd } = insn.operands else {
            unreachable!()
        };
        let (ir_op, cexc, sz) = match insn.mnemonic {
            M::FMAddS => (Op::MAddF32, CexcOp::FMAdd32, 4),
            M::FMAddD => (Op::MAddF64, CexcOp::FMAdd64, 8),
            M::FMSubS => (Op::MSubF32, CexcOp::FMSub32, 4),
            M::FMSubD => (Op::MSubF64, CexcOp::FMSub64, 8),
            _ => unreachable!(),
        };

        let arg1 = self.bind_freg(rs1, sz);
        let arg2 = self.bind_freg(rs2, sz);
        let arg3 = self.bind_freg(rs3, sz);

        self.set_cexc_fmaf(cexc, Expr::Tmp(arg1), Expr::Tmp(arg2), Expr::Tmp(arg3));
        let rm = self.ir_round_mode();
        self.put_freg(
            rd,
            sz,
            qop(ir_op, rm, Expr::Tmp(arg1), Expr::Tmp(arg2), Expr::Tmp(arg3)),
        );

        self.set_fprs_dirty();
        Ok(())
    }

    pub(crate) fn lift_fmov(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::FpUnary { rs2, rd } = insn.operands else {
            unreachable!()
        };
        let sz = match insn.mnemonic {
            Mnemonic::FMovS => 4,
            Mnemonic::FMovD => 8,
            Mnemonic::FMovQ => 16,
            _ => unreachable!(),
        };
        let src = self.get_freg(rs2, sz);
        self.put_freg(rd, sz, src);
        self.clear_cexc();
        self.set_fprs_dirty();
        Ok(())
    }

    /// FABS / FNEG: pure sign manipulation, exception-free.
    pub(crate) fn lift_fabs_fneg(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpUnary { rs2, rd } = insn.operands else {
            unreachable!()
        };
        let (ir_op, sz) = match insn.mnemonic {
            M::FAbsS => (Op::AbsF32, 4),
            M::FAbsD => (Op::AbsF64, 8),
            M::FAbsQ => (Op::AbsF128, 16),
            M::FNegS => (Op::NegF32, 4),
            M::FNegD => (Op::NegF64, 8),
            M::FNegQ => (Op::NegF128, 16),
            _ => unreachable!(),
        };
        let src = self.get_freg(rs2, sz);
        self.put_freg(rd, sz, unop(ir_op, src));
        self.clear_cexc();
        self.set_fprs_dirty();
        Ok(())
    }

    /// FMOVcc over either the integer condition codes or an fcc field: a
    /// conditional select against the current destination value.
    pub(crate) fn lift_fmovcc(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::FMovCc {
            sel,
            cond4,
            rs2,
            rd,
        } = insn.operands
        else {
            unreachable!()
        };
        let sz = match insn.mnemonic {
            Mnemonic::FMovCcS => 4,
            Mnemonic::FMovCcD => 8,
            Mnemonic::FMovCcQ => 16,
            _ => unreachable!(),
        };

        let guard = match sel {
            CcSel::Icc => {
                let cond = ICond::from_cond4(cond4);
                self.icond_from_ccr(cond, false)
            }
            CcSel::Xcc => {
                let cond = ICond::from_cond4(cond4).xcc();
                self.icond_from_ccr(cond, false)
            }
            CcSel::Fcc(n) => {
                let cond = FCond::from_cond4(cond4);
                self.fcond_from_fsr(cond, n, false)
            }
        };

        let src = self.get_freg(rs2, sz);
        let cur = self.get_freg(rd, sz);
        self.put_freg(rd, sz, dbt_ir::ite(guard, src, cur));
        self.clear_cexc();
        self.set_fprs_dirty();
        Ok(())
    }

    /// FP-to-integer register file moves: a typed guest-state read avoids
    /// any reinterpret in the IR.
    pub(crate) fn lift_mov_f_to_i(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpUnary { rs2, rd } = insn.operands else {
            unreachable!()
        };
        let res = match insn.mnemonic {
            M::MovSToSw => unop(Op::Sext32, self.get_freg_as_int(rs2, 4)),
            M::MovSToUw => unop(Op::Uext32, self.get_freg_as_int(rs2, 4)),
            M::MovDToX => self.get_freg_as_int(rs2, 8),
            _ => unreachable!(),
        };
        self.put_ireg(rd, res);
        Ok(())
    }

    /// Integer-to-FP register file moves.
    pub(crate) fn lift_mov_i_to_f(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::FpUnary { rs2, rd } = insn.operands else {
            unreachable!()
        };
        let src = self.get_ireg(rs2);
        match insn.mnemonic {
            Mnemonic::MovWToS => {
                let narrowed = unop(Op::Trunc64To32, src);
                self.put_freg(rd, 4, unop(Op::ReinterpI32AsF32, narrowed));
            }
            Mnemonic::MovXToD => {
                self.put_freg(rd, 8, unop(Op::ReinterpI64AsF64, src));
            }
            _ => unreachable!(),
        }
        self.set_fprs_dirty();
        Ok(())
    }

    /// MOVcc: integer-destination conditional move.
    pub(crate) fn lift_movcc(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::MovCc {
            sel,
            cond4,
            rs2_imm,
            rd,
        } = insn.operands
        else {
            unreachable!()
        };

        let guard = match sel {
            CcSel::Icc => {
                let cond = ICond::from_cond4(cond4);
                self.icond_from_ccr(cond, false)
            }
            CcSel::Xcc => {
                let cond = ICond::from_cond4(cond4).xcc();
                self.icond_from_ccr(cond, false)
            }
            CcSel::Fcc(n) => {
                let cond = FCond::from_cond4(cond4);
                self.fcond_from_fsr(cond, n, false)
            }
        };

        let src = self.rs2_imm_expr(rs2_imm);
        let cur = self.get_ireg(rd);
        self.put_ireg(rd, dbt_ir::ite(guard, src, cur));
        Ok(())
    }

    /// MOVr: conditional move keyed on a register-against-zero compare.
    pub(crate) fn lift_movr(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::MovR {
            rcond,
            rs1,
            rs2_imm,
            rd,
        } = insn.operands
        else {
            unreachable!()
        };

        let guard = self.rcond(rcond, rs1, false);
        let src = self.rs2_imm_expr(rs2_imm);
        let cur = self.get_ireg(rd);
        self.put_ireg(rd, dbt_ir::ite(guard, src, cur));
        Ok(())
    }
}
