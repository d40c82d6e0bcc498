//! Shifts. The 32-bit right shifts narrow the source, shift, then widen the
//! result back to 64 bits with the sign- or zero-extension the opcode
//! implies. A 32-bit left shift needs no narrowing at all: the low 32 bits
//! come out the same and the destination takes the full 64-bit value.
//!
//! Register shift counts use only the low 5 (32-bit) or 6 (64-bit) bits.

use dbt_ir::{Op, binop, mk_u8, mk_u64, unop};

use crate::decode::{DecodedInsn, Mnemonic, Operands, RegOrImm};
use crate::lift::{LiftResult, Lifter};

impl Lifter<'_> {
    pub(crate) fn lift_shift(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::IntRR { rs1, rs2_imm, rd } = insn.operands else {
            unreachable!()
        };

        // (ir op, 64-bit count, narrowing, widening back)
        let (ir_op, wide, widen) = match insn.mnemonic {
            M::Sll => (Op::Shl64, false, None),
            M::Srl => (Op::Shr32, false, Some(Op::Uext32)),
            M::Sra => (Op::Sar32, false, Some(Op::Sext32)),
            M::Sllx => (Op::Shl64, true, None),
            M::Srlx => (Op::Shr64, true, None),
            M::Srax => (Op::Sar64, true, None),
            _ => unreachable!(),
        };

        let count = match rs2_imm {
            RegOrImm::Reg(r) => {
                let mask = if wide { 0x3f } else { 0x1f };
                unop(
                    Op::Trunc64To8,
                    binop(Op::And64, self.get_ireg(r), mk_u64(mask)),
                )
            }
            RegOrImm::Imm(imm) => mk_u8(imm as u8),
        };

        let mut src = self.get_ireg(rs1);
        if widen.is_some() {
            src = unop(Op::Trunc64To32, src);
        }
        let mut shifted = binop(ir_op, src, count);
        if let Some(w) = widen {
            shifted = unop(w, shifted);
        }
        self.put_ireg(rd, shifted);

        Ok(())
    }
}
