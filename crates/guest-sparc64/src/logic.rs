//! Bitwise logic: and/or/xor with optional second-operand negation and
//! optional condition-code update.

use dbt_ir::{Expr, Op, Ty, binop, unop};

use crate::ccr::CcOp;
use crate::decode::{DecodedInsn, Mnemonic, Operands};
use crate::lift::{LiftResult, Lifter};

impl Lifter<'_> {
    pub(crate) fn lift_logic(&mut self, insn: &DecodedInsn) -> LiftResult {
        use Mnemonic as M;

        let Operands::IntRR { rs1, rs2_imm, rd } = insn.operands else {
            unreachable!()
        };

        let (ir_op, negate, sets_cc) = match insn.mnemonic {
            M::And => (Op::And64, false, false),
            M::AndN => (Op::And64, true, false),
            M::AndCc => (Op::And64, false, true),
            M::AndNCc => (Op::And64, true, true),
            M::Or => (Op::Or64, false, false),
            M::OrN => (Op::Or64, true, false),
            M::OrCc => (Op::Or64, false, true),
            M::OrNCc => (Op::Or64, true, true),
            M::Xor => (Op::Xor64, false, false),
            M::Xnor => (Op::Xor64, true, false),
            M::XorCc => (Op::Xor64, false, true),
            M::XnorCc => (Op::Xor64, true, true),
            _ => unreachable!(),
        };

        let mut arg_r = self.rs2_imm_expr(rs2_imm);
        if negate {
            arg_r = unop(Op::Not64, arg_r);
        }

        let res = self.temp(Ty::I64);
        let arg_l = self.get_ireg(rs1);
        self.assign(res, binop(ir_op, arg_l, arg_r));
        if sets_cc {
            self.set_flags_dep1(CcOp::Logic, Expr::Tmp(res));
        }
        self.put_ireg(rd, Expr::Tmp(res));

        Ok(())
    }
}
