//! Hardware crypto and hashing instructions.
//!
//! The AES primitives and carry-less multiplies lift to clean-helper calls;
//! the helpers re-execute the hardware instruction, so these lifts are
//! gated on the matching capability bit and fail (to the native escape)
//! without it. The hash instructions are dirty helpers over declared FP
//! register ranges, keeping the data flow visible to the optimizer.

use dbt_ir::{
    CleanCall, CleanHelper, DirtyCall, DirtyHelper, Effect, Expr, Fx, Op, Stmt, Ty, unop,
};

use crate::decode::{DecodedInsn, Mnemonic, Operands, RegOrImm};
use crate::helpers;
use crate::lift::{HwCaps, LiftResult, Lifter, Unsupported};

impl Lifter<'_> {
    fn freg_bits(&mut self, reg: u8) -> Expr {
        let val = self.get_freg(reg, 8);
        unop(Op::ReinterpF64AsI64, val)
    }

    fn put_freg_bits(&mut self, reg: u8, bits: Expr) {
        self.put_freg(reg, 8, unop(Op::ReinterpI64AsF64, bits));
    }

    /// One AES round, three double-register inputs.
    pub(crate) fn lift_aes_round(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::FpTernary { rs1, rs2, rs3, rd } = insn.operands else {
            unreachable!()
        };
        let helper = match insn.mnemonic {
            M::AesERound01 => CleanHelper::AesEround01,
            M::AesERound23 => CleanHelper::AesEround23,
            M::AesDRound01 => CleanHelper::AesDround01,
            M::AesDRound23 => CleanHelper::AesDround23,
            M::AesERound01L => CleanHelper::AesEround01Last,
            M::AesERound23L => CleanHelper::AesEround23Last,
            M::AesDRound01L => CleanHelper::AesDround01Last,
            M::AesDRound23L => CleanHelper::AesDround23Last,
            _ => unreachable!(),
        };

        if !self.arch.hwcaps.contains(HwCaps::SPARC4) {
            // The helpers lean on the hardware instruction directly.
            return Err(Unsupported("AES round without the SPARC4 feature"));
        }

        let args = vec![
            self.freg_bits(rs1),
            self.freg_bits(rs2),
            self.freg_bits(rs3),
        ];
        let call = Expr::Call(CleanCall {
            helper,
            args,
            ret_ty: Ty::I64,
            mcx_mask: 0,
        });
        self.put_freg_bits(rd, call);

        self.set_fprs_dirty();
        Ok(())
    }

    /// AES key expansion without a round constant.
    pub(crate) fn lift_aes_kexpand(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::FpBinary { rs1, rs2, rd } = insn.operands else {
            unreachable!()
        };
        let helper = match insn.mnemonic {
            Mnemonic::AesKexpand0 => CleanHelper::AesKexpand0,
            Mnemonic::AesKexpand2 => CleanHelper::AesKexpand2,
            _ => unreachable!(),
        };

        if !self.arch.hwcaps.contains(HwCaps::SPARC4) {
            return Err(Unsupported("AES key expansion without the SPARC4 feature"));
        }

        let args = vec![self.freg_bits(rs1), self.freg_bits(rs2)];
        let call = Expr::Call(CleanCall {
            helper,
            args,
            ret_ty: Ty::I64,
            mcx_mask: 0,
        });
        self.put_freg_bits(rd, call);

        self.set_fprs_dirty();
        Ok(())
    }

    /// AES key expansion with a round constant chosen by imm5; only the
    /// ten architectural round constants exist.
    pub(crate) fn lift_aes_kexpand_rcon(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::AesKexpand1 { rs1, rs2, imm5, rd } = insn.operands else {
            unreachable!()
        };
        if imm5 > 9 {
            return Err(Unsupported("AES kexpand1 round-constant index"));
        }
        if !self.arch.hwcaps.contains(HwCaps::SPARC4) {
            return Err(Unsupported("AES key expansion without the SPARC4 feature"));
        }

        let args = vec![self.freg_bits(rs1), self.freg_bits(rs2)];
        let call = Expr::Call(CleanCall {
            helper: CleanHelper::AesKexpand1(imm5),
            args,
            ret_ty: Ty::I64,
            mcx_mask: 0,
        });
        self.put_freg_bits(rd, call);

        self.set_fprs_dirty();
        Ok(())
    }

    /// MD5/SHA block steps: dirty helpers reading the data registers and
    /// modifying the chaining value in place.
    pub(crate) fn lift_hash(&mut self, insn: &DecodedInsn) -> LiftResult {
        let helper = match insn.mnemonic {
            Mnemonic::Md5 => DirtyHelper::Md5,
            Mnemonic::Sha1 => DirtyHelper::Sha1,
            Mnemonic::Sha256 => DirtyHelper::Sha256,
            Mnemonic::Sha512 => DirtyHelper::Sha512,
            _ => unreachable!(),
        };

        if !self.arch.hwcaps.contains(HwCaps::VIS3) {
            return Err(Unsupported("hash instruction without the VIS3 feature"));
        }

        let (iv_off, iv_size, data_off, data_size) = helpers::hash_effects(helper);
        self.stmt(Stmt::Dirty(DirtyCall {
            helper,
            effects: vec![
                Effect {
                    fx: Fx::Modify,
                    offset: iv_off,
                    size: iv_size,
                },
                Effect {
                    fx: Fx::Read,
                    offset: data_off,
                    size: data_size,
                },
            ],
        }));

        Ok(())
    }

    /// Carry-less multiply, low or high half.
    pub(crate) fn lift_xmulx(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::IntRR { rs1, rs2_imm, rd } = insn.operands else {
            unreachable!()
        };
        let RegOrImm::Reg(rs2) = rs2_imm else {
            return Err(Unsupported("xmulx with an immediate"));
        };
        let helper = match insn.mnemonic {
            Mnemonic::XmulX => CleanHelper::XmulX,
            Mnemonic::XmulXHi => CleanHelper::XmulXHi,
            _ => unreachable!(),
        };

        if !self.arch.hwcaps.contains(HwCaps::VIS3) {
            return Err(Unsupported("xmulx without the VIS3 feature"));
        }

        let args = vec![self.get_ireg(rs1), self.get_ireg(rs2)];
        let call = Expr::Call(CleanCall {
            helper,
            args,
            ret_ty: Ty::I64,
            mcx_mask: 0,
        });
        self.put_ireg(rd, call);

        Ok(())
    }
}
