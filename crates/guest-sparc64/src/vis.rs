//! VIS data-steering and bitwise operations on the FP register file.
//!
//! These treat FP registers as raw bit vectors: logic, partitioned shifts,
//! byte alignment and shuffling. None of them touch the cexc thunk (they
//! cannot raise FP exceptions), but all of them dirty FPRS.

use dbt_ir::{Expr, Op, Stmt, Ty, binop, ite, mk_u64, triop, unop};

use crate::decode::{DecodedInsn, Mnemonic, Operands};
use crate::lift::{LiftResult, Lifter};
use crate::state::offsets;

impl Lifter<'_> {
    /// LZCNT: count leading zeroes, with the zero-input case (which the
    /// underlying IR op leaves undefined) pinned to 64.
    pub(crate) fn lift_lzcnt(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::IntRR { rs1, rd, .. } = insn.operands else {
            unreachable!()
        };
        let src = self.get_ireg(rs1);
        let arg = self.bind(Ty::I64, src);
        let guarded = ite(
            binop(Op::CmpNe64, arg.clone(), mk_u64(0)),
            unop(Op::Clz64, arg),
            mk_u64(64),
        );
        self.put_ireg(rd, guarded);
        Ok(())
    }

    /// ALIGNADDRESS: aligns rs1 + rs2 down to 8 bytes into rd and parks
    /// the dropped offset in GSR.align for a later FALIGNDATA.
    pub(crate) fn lift_alignaddress(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::IntRR { rs1, rs2_imm, rd } = insn.operands else {
            unreachable!()
        };
        let res = self.temp(Ty::I64);
        let sum = self.ea_expr(rs1, rs2_imm);
        self.assign(res, sum);

        self.put_ireg(
            rd,
            binop(Op::And64, Expr::Tmp(res), mk_u64(0xffff_ffff_ffff_fff8)),
        );
        self.stmt(Stmt::Put {
            offset: offsets::GSR_ALIGN,
            data: unop(
                Op::Trunc64To32,
                binop(Op::And64, Expr::Tmp(res), mk_u64(0x7)),
            ),
        });
        Ok(())
    }

    /// FALIGNDATA: 8 contiguous bytes out of rs1:rs2 at the GSR.align
    /// offset.
    pub(crate) fn lift_faligndata(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::FpBinary { rs1, rs2, rd } = insn.operands else {
            unreachable!()
        };
        let align = unop(
            Op::Uext32,
            Expr::Get {
                offset: offsets::GSR_ALIGN,
                ty: Ty::I32,
            },
        );
        let a = self.get_freg(rs1, 8);
        let b = self.get_freg(rs2, 8);
        self.put_freg(rd, 8, triop(Op::AlignF64, align, a, b));
        self.set_fprs_dirty();
        Ok(())
    }

    /// BSHUFFLE: byte shuffle of rs1:rs2 under the GSR.mask nibble map.
    pub(crate) fn lift_bshuffle(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::FpBinary { rs1, rs2, rd } = insn.operands else {
            unreachable!()
        };
        let mask = Expr::Get {
            offset: offsets::GSR_MASK,
            ty: Ty::I32,
        };
        let a = self.get_freg(rs1, 8);
        let b = self.get_freg(rs2, 8);
        self.put_freg(rd, 8, triop(Op::ShuffleF64, mask, a, b));
        self.set_fprs_dirty();
        Ok(())
    }

    /// FZERO / FONE: constant fills.
    pub(crate) fn lift_fzero_fone(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpUnary { rd, .. } = insn.operands else {
            unreachable!()
        };
        let (data, sz): (Expr, usize) = match insn.mnemonic {
            M::FZeroS => (dbt_ir::mk_u32(0), 4),
            M::FZeroD => (mk_u64(0), 8),
            M::FOneS => (dbt_ir::mk_u32(0xffff_ffff), 4),
            M::FOneD => (mk_u64(0xffff_ffff_ffff_ffff), 8),
            _ => unreachable!(),
        };
        self.stmt(Stmt::Put {
            offset: crate::regs::offset_freg(rd, sz),
            data,
        });
        self.set_fprs_dirty();
        Ok(())
    }

    /// FSRC1/FSRC2 copy one source through; FNOT1/FNOT2 invert it.
    pub(crate) fn lift_fsrc(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpUnary { rs2, rd } = insn.operands else {
            unreachable!()
        };
        let (invert, sz) = match insn.mnemonic {
            M::FSrc1S | M::FSrc2S => (None, 4),
            M::FSrc1D | M::FSrc2D => (None, 8),
            M::FNot1S | M::FNot2S => (Some(Op::NotF32), 4),
            M::FNot1D | M::FNot2D => (Some(Op::NotF64), 8),
            _ => unreachable!(),
        };
        let mut src = self.get_freg(rs2, sz);
        if let Some(op) = invert {
            src = unop(op, src);
        }
        self.put_freg(rd, sz, src);
        self.set_fprs_dirty();
        Ok(())
    }

    /// FP logic family: and/or/xor over register bits, with optional
    /// negation of either source or of the result.
    pub(crate) fn lift_flogic(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpBinary { rs1, rs2, rd } = insn.operands else {
            unreachable!()
        };

        // (ir op, negate rs1, negate rs2, negate result, size)
        let (ir_op, neg_rs1, neg_rs2, neg_rd, sz) = match insn.mnemonic {
            M::FOrD => (Op::OrF64, false, false, false, 8),
            M::FOrS => (Op::OrF32, false, false, false, 4),
            M::FNorD => (Op::OrF64, false, false, true, 8),
            M::FNorS => (Op::OrF32, false, false, true, 4),
            M::FAndD => (Op::AndF64, false, false, false, 8),
            M::FAndS => (Op::AndF32, false, false, false, 4),
            M::FNandD => (Op::AndF64, false, false, true, 8),
            M::FNandS => (Op::AndF32, false, false, true, 4),
            M::FXorD => (Op::XorF64, false, false, false, 8),
            M::FXorS => (Op::XorF32, false, false, false, 4),
            M::FXnorD => (Op::XorF64, false, false, true, 8),
            M::FXnorS => (Op::XorF32, false, false, true, 4),
            M::FOrNot1D => (Op::OrF64, true, false, false, 8),
            M::FOrNot1S => (Op::OrF32, true, false, false, 4),
            M::FOrNot2D => (Op::OrF64, false, true, false, 8),
            M::FOrNot2S => (Op::OrF32, false, true, false, 4),
            M::FAndNot1D => (Op::AndF64, true, false, false, 8),
            M::FAndNot1S => (Op::AndF32, true, false, false, 4),
            M::FAndNot2D => (Op::AndF64, false, true, false, 8),
            M::FAndNot2S => (Op::AndF32, false, true, false, 4),
            _ => unreachable!(),
        };
        let not_op = if sz == 8 { Op::NotF64 } else { Op::NotF32 };

        let mut src_l = self.get_freg(rs1, sz);
        if neg_rs1 {
            src_l = unop(not_op, src_l);
        }
        let mut src_r = self.get_freg(rs2, sz);
        if neg_rs2 {
            src_r = unop(not_op, src_r);
        }
        let mut res = binop(ir_op, src_l, src_r);
        if neg_rd {
            res = unop(not_op, res);
        }
        self.put_freg(rd, sz, res);
        self.set_fprs_dirty();
        Ok(())
    }

    /// Partitioned shifts over 16- or 32-bit lanes of a double register.
    pub(crate) fn lift_fshift(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpBinary { rs1, rs2, rd } = insn.operands else {
            unreachable!()
        };
        let ir_op = match insn.mnemonic {
            M::FSll16 => Op::FShl16x4,
            M::FSrl16 => Op::FShr16x4,
            M::FSll32 => Op::FShl32x2,
            M::FSrl32 => Op::FShr32x2,
            M::FSlas16 => Op::FSalSat16x4,
            M::FSra16 => Op::FSar16x4,
            M::FSlas32 => Op::FSalSat32x2,
            M::FSra32 => Op::FSar32x2,
            _ => unreachable!(),
        };
        let a = self.get_freg(rs1, 8);
        let b = self.get_freg(rs2, 8);
        self.put_freg(rd, 8, binop(ir_op, a, b));
        self.set_fprs_dirty();
        Ok(())
    }
}
