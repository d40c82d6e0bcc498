//! Lazy integer condition codes.
//!
//! CC-producing instructions never materialize %icc/%xcc. They record a
//! 4-word thunk instead: an operation tag, two dependent operands and one
//! non-dependent operand. The evaluator recomputes the 8-bit CCR from the
//! thunk only when a consumer actually needs it.
//!
//! The 4-word shape (rather than 3) exists for the memory checker: the tag
//! and NDEP are declared always-defined, so the checker sees the flags as
//! data-dependent on DEP1/DEP2 only. Consequently every thunk write must
//! store all DEP slots (zeroed when unused), while NDEP is written only for
//! tags that consult it.
//!
//! For the add/sub-with-carry tags, DEP2 holds the right operand XOR-ed with
//! the carry and NDEP holds the raw carry: the checker sees correct data
//! flow through DEP2 and the evaluator recovers the operand by XOR-ing back.

use dbt_ir::{Expr, Op, binop, mk_u64, unop};

// CCR bit positions: icc in bits 0..3, xcc in bits 4..7.
pub const CCR_SHIFT_I_C: u64 = 0;
pub const CCR_SHIFT_I_V: u64 = 1;
pub const CCR_SHIFT_I_Z: u64 = 2;
pub const CCR_SHIFT_I_N: u64 = 3;
pub const CCR_SHIFT_X_C: u64 = 4;
pub const CCR_SHIFT_X_V: u64 = 5;
pub const CCR_SHIFT_X_Z: u64 = 6;
pub const CCR_SHIFT_X_N: u64 = 7;

pub const CCR_MASK_I_C: u64 = 1 << CCR_SHIFT_I_C;
pub const CCR_MASK_X_C: u64 = 1 << CCR_SHIFT_X_C;

/// Condition-code thunk operation tags.
///
/// | tag   | DEP1      | DEP2         | NDEP  |
/// |-------|-----------|--------------|-------|
/// | Copy  | old CCR   | 0            | —     |
/// | Logic | result    | 0            | —     |
/// | Add   | argL      | argR         | —     |
/// | AddC  | argL      | argR ^ carry | carry |
/// | SDiv  | argL      | argR         | —     |
/// | SMul  | argL      | argR         | —     |
/// | Sub   | argL      | argR         | —     |
/// | SubC  | argL      | argR ^ carry | carry |
/// | UDiv  | argL      | argR         | —     |
/// | UMul  | argL      | argR         | —     |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum CcOp {
    Copy = 0,
    Logic,
    Add,
    AddC,
    SDiv,
    SMul,
    Sub,
    SubC,
    UDiv,
    UMul,
}

/// Integer condition codes. xcc variants are odd and directly follow their
/// icc variant; the evaluator and the specializer rely on this layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum ICond {
    AIcc = 0,
    AXcc,
    NIcc,
    NXcc,
    NeIcc,
    NeXcc,
    EIcc,
    EXcc,
    GIcc,
    GXcc,
    LeIcc,
    LeXcc,
    GeIcc,
    GeXcc,
    LIcc,
    LXcc,
    GuIcc,
    GuXcc,
    LeuIcc,
    LeuXcc,
    CcIcc,
    CcXcc,
    CsIcc,
    CsXcc,
    PosIcc,
    PosXcc,
    NegIcc,
    NegXcc,
    VcIcc,
    VcXcc,
    VsIcc,
    VsXcc,
}

impl ICond {
    /// The icc-variant condition for a 4-bit cond field from a Bicc/MOVcc/
    /// Tcc-style encoding. Callers select the xcc variant with [`ICond::xcc`].
    #[must_use]
    pub fn from_cond4(cond4: u8) -> ICond {
        match cond4 & 0xf {
            0x8 => ICond::AIcc,
            0x0 => ICond::NIcc,
            0x9 => ICond::NeIcc,
            0x1 => ICond::EIcc,
            0xA => ICond::GIcc,
            0x2 => ICond::LeIcc,
            0xB => ICond::GeIcc,
            0x3 => ICond::LIcc,
            0xC => ICond::GuIcc,
            0x4 => ICond::LeuIcc,
            0xD => ICond::CcIcc,
            0x5 => ICond::CsIcc,
            0xE => ICond::PosIcc,
            0x6 => ICond::NegIcc,
            0xF => ICond::VcIcc,
            0x7 => ICond::VsIcc,
            _ => unreachable!(),
        }
    }

    /// The %xcc twin of an icc condition.
    #[must_use]
    pub fn xcc(self) -> ICond {
        debug_assert!(self as u64 % 2 == 0, "already an xcc condition");
        // Safe by construction: xcc variants directly follow icc ones.
        match self {
            ICond::AIcc => ICond::AXcc,
            ICond::NIcc => ICond::NXcc,
            ICond::NeIcc => ICond::NeXcc,
            ICond::EIcc => ICond::EXcc,
            ICond::GIcc => ICond::GXcc,
            ICond::LeIcc => ICond::LeXcc,
            ICond::GeIcc => ICond::GeXcc,
            ICond::LIcc => ICond::LXcc,
            ICond::GuIcc => ICond::GuXcc,
            ICond::LeuIcc => ICond::LeuXcc,
            ICond::CcIcc => ICond::CcXcc,
            ICond::CsIcc => ICond::CsXcc,
            ICond::PosIcc => ICond::PosXcc,
            ICond::NegIcc => ICond::NegXcc,
            ICond::VcIcc => ICond::VcXcc,
            ICond::VsIcc => ICond::VsXcc,
            _ => unreachable!(),
        }
    }
}

/// Evaluates the thunk into the 8-bit CCR. Pure; called lazily from
/// generated code and from the client API.
#[must_use]
pub fn calculate_ccr(cc_op: u64, cc_dep1: u64, cc_dep2: u64, cc_ndep: u64) -> u64 {
    let mut i_n = 0u64;
    let mut i_z = 0u64;
    let mut i_v = 0u64;
    let mut i_c = 0u64;
    let mut x_n = 0u64;
    let mut x_z = 0u64;
    let mut x_v = 0u64;
    let mut x_c = 0u64;

    match cc_op {
        x if x == CcOp::Copy as u64 => return cc_dep1 & 0xff,

        x if x == CcOp::Logic as u64 => {
            i_n = u64::from(cc_dep1 & 0x8000_0000 != 0);
            x_n = u64::from(cc_dep1 & 0x8000_0000_0000_0000 != 0);
            i_z = u64::from(cc_dep1 as u32 == 0);
            x_z = u64::from(cc_dep1 == 0);
        }

        x if x == CcOp::Add as u64 => {
            let res = cc_dep1.wrapping_add(cc_dep2);
            let tmp = !(cc_dep1 ^ cc_dep2) & (cc_dep1 ^ res);

            i_c = u64::from(cc_dep1 as u32 > u32::MAX - cc_dep2 as u32);
            x_c = u64::from(cc_dep1 > u64::MAX - cc_dep2);
            i_v = u64::from(tmp & 0x8000_0000 != 0);
            x_v = u64::from(tmp & 0x8000_0000_0000_0000 != 0);
            i_n = u64::from((res as i32) < 0);
            x_n = u64::from((res as i64) < 0);
            i_z = u64::from(res as u32 == 0);
            x_z = u64::from(res == 0);
        }

        x if x == CcOp::AddC as u64 => {
            // Recover argR from DEP2 and the recorded carry.
            let arg_r = cc_dep2 ^ cc_ndep;
            let res = cc_dep1.wrapping_add(arg_r).wrapping_add(cc_ndep);
            let tmp = !(cc_dep1 ^ cc_dep2) & (cc_dep1 ^ res);

            if cc_ndep != 0 {
                i_c = u64::from(cc_dep1 as u32 >= u32::MAX - cc_dep2 as u32);
                x_c = u64::from(cc_dep1 >= u64::MAX - cc_dep2);
            } else {
                i_c = u64::from(cc_dep1 as u32 > u32::MAX - cc_dep2 as u32);
                x_c = u64::from(cc_dep1 > u64::MAX - cc_dep2);
            }
            i_v = u64::from(tmp & 0x8000_0000 != 0);
            x_v = u64::from(tmp & 0x8000_0000_0000_0000 != 0);
            i_n = u64::from((res as i32) < 0);
            x_n = u64::from((res as i64) < 0);
            i_z = u64::from(res as u32 == 0);
            x_z = u64::from(res == 0);
        }

        x if x == CcOp::SDiv as u64 => {
            // 64-bit Y:rs1 dividend over a 32-bit divisor, clamped to the
            // 32-bit signed range with V flagging the clamp.
            let dividend = cc_dep1 as i64;
            let divisor = i64::from(cc_dep2 as i32);
            let mut q = dividend / divisor;

            if q >= 0x8000_0000 {
                q = 0x7fff_ffff;
                i_v = 1;
            } else if q <= -0x7fff_ffff {
                q = -0x8000_0000;
                i_v = 1;
            }

            i_n = u64::from(q as u64 & 0x8000_0000 != 0);
            x_n = u64::from(q < 0);
            i_z = u64::from(q as u32 == 0);
            x_z = u64::from(q == 0);
        }

        x if x == CcOp::SMul as u64 => {
            let res = i64::from(cc_dep1 as i32).wrapping_mul(i64::from(cc_dep2 as i32)) as u64;
            i_n = u64::from(res & 0x8000_0000 != 0);
            x_n = u64::from(res & 0x8000_0000_0000_0000 != 0);
            i_z = u64::from(res as u32 == 0);
            x_z = u64::from(res == 0);
        }

        x if x == CcOp::Sub as u64 => {
            let res = cc_dep1.wrapping_sub(cc_dep2);
            let tmp = (cc_dep1 ^ cc_dep2) & (cc_dep1 ^ res);

            i_c = u64::from((cc_dep1 as u32) < cc_dep2 as u32);
            x_c = u64::from(cc_dep1 < cc_dep2);
            i_v = u64::from(tmp & 0x8000_0000 != 0);
            x_v = u64::from(tmp & 0x8000_0000_0000_0000 != 0);
            i_n = u64::from((res as i32) < 0);
            x_n = u64::from((res as i64) < 0);
            i_z = u64::from(res as u32 == 0);
            x_z = u64::from(res == 0);
        }

        x if x == CcOp::SubC as u64 => {
            let arg_r = cc_dep2 ^ cc_ndep;
            let res = cc_dep1.wrapping_sub(arg_r).wrapping_sub(cc_ndep);
            let tmp = (cc_dep1 ^ cc_dep2) & (cc_dep1 ^ res);

            if cc_ndep != 0 {
                i_c = u64::from(cc_dep1 as u32 <= arg_r as u32);
                x_c = u64::from(cc_dep1 <= arg_r);
            } else {
                i_c = u64::from((cc_dep1 as u32) < arg_r as u32);
                x_c = u64::from(cc_dep1 < arg_r);
            }
            i_v = u64::from(tmp & 0x8000_0000 != 0);
            x_v = u64::from(tmp & 0x8000_0000_0000_0000 != 0);
            i_n = u64::from((res as i32) < 0);
            x_n = u64::from((res as i64) < 0);
            i_z = u64::from(res as u32 == 0);
            x_z = u64::from(res == 0);
        }

        x if x == CcOp::UDiv as u64 => {
            let divisor = u64::from(cc_dep2 as u32);
            let mut res = cc_dep1 / divisor;

            if res > 0xffff_ffff {
                res = 0xffff_ffff;
                i_v = 1;
            }

            i_n = u64::from(res & 0x8000_0000 != 0);
            x_n = u64::from(res & 0x8000_0000_0000_0000 != 0);
            i_z = u64::from(res as u32 == 0);
            x_z = u64::from(res == 0);
        }

        x if x == CcOp::UMul as u64 => {
            let res = u64::from(cc_dep1 as u32).wrapping_mul(u64::from(cc_dep2 as u32));
            i_n = u64::from(res & 0x8000_0000 != 0);
            x_n = u64::from(res & 0x8000_0000_0000_0000 != 0);
            i_z = u64::from(res as u32 == 0);
            x_z = u64::from(res == 0);
        }

        _ => panic!("calculate_ccr: bad CC_OP {cc_op}"),
    }

    (x_n << CCR_SHIFT_X_N)
        | (x_z << CCR_SHIFT_X_Z)
        | (x_v << CCR_SHIFT_X_V)
        | (x_c << CCR_SHIFT_X_C)
        | (i_n << CCR_SHIFT_I_N)
        | (i_z << CCR_SHIFT_I_Z)
        | (i_v << CCR_SHIFT_I_V)
        | (i_c << CCR_SHIFT_I_C)
}

/// Evaluates an integer condition against the thunk. Returns 0 or 1.
#[must_use]
pub fn calculate_icond(cond: u64, cc_op: u64, cc_dep1: u64, cc_dep2: u64, cc_ndep: u64) -> u64 {
    let ccr = calculate_ccr(cc_op, cc_dep1, cc_dep2, cc_ndep);

    // xcc conditions are the odd tags.
    let (n, z, v, c) = if cond & 1 != 0 {
        (
            ccr >> CCR_SHIFT_X_N & 1,
            ccr >> CCR_SHIFT_X_Z & 1,
            ccr >> CCR_SHIFT_X_V & 1,
            ccr >> CCR_SHIFT_X_C & 1,
        )
    } else {
        (
            ccr >> CCR_SHIFT_I_N & 1,
            ccr >> CCR_SHIFT_I_Z & 1,
            ccr >> CCR_SHIFT_I_V & 1,
            ccr >> CCR_SHIFT_I_C & 1,
        )
    };

    let pair = |icc: ICond| cond == icc as u64 || cond == icc as u64 + 1;

    if pair(ICond::AIcc) {
        1
    } else if pair(ICond::NIcc) {
        0
    } else if pair(ICond::NeIcc) {
        1 ^ z
    } else if pair(ICond::EIcc) {
        z
    } else if pair(ICond::GIcc) {
        1 ^ (z | (n ^ v))
    } else if pair(ICond::LeIcc) {
        z | (n ^ v)
    } else if pair(ICond::GeIcc) {
        1 ^ (n ^ v)
    } else if pair(ICond::LIcc) {
        n ^ v
    } else if pair(ICond::GuIcc) {
        1 ^ (c | z)
    } else if pair(ICond::LeuIcc) {
        c | z
    } else if pair(ICond::CcIcc) {
        1 ^ c
    } else if pair(ICond::CsIcc) {
        c
    } else if pair(ICond::PosIcc) {
        1 ^ n
    } else if pair(ICond::NegIcc) {
        n
    } else if pair(ICond::VcIcc) {
        1 ^ v
    } else if pair(ICond::VsIcc) {
        v
    } else {
        panic!("calculate_icond: bad condition {cond}")
    }
}

fn bit_test(cc_dep1: &Expr, shift: u64, expected: u64) -> Expr {
    let masked = binop(
        Op::And64,
        binop(Op::Shr64, cc_dep1.clone(), dbt_ir::mk_u8(shift as u8)),
        mk_u64(1),
    );
    unop(
        Op::Bool1To64,
        binop(Op::CmpEq64, masked, mk_u64(expected)),
    )
}

/// Lift-time specializer for the integer-condition helper call.
///
/// `args` are the helper arguments `(cond, cc_op, cc_dep1, cc_dep2,
/// cc_ndep)`. When the condition and tag are constants matching a common
/// pattern, returns a direct expression and the helper call is never built.
#[must_use]
pub fn specialize_icond(args: &[Expr]) -> Option<Expr> {
    assert!(args.len() == 5, "icond specializer wants 5 args");
    let cond = &args[0];
    let cc_op = &args[1];
    let cc_dep1 = &args[2];
    let cc_dep2 = &args[3];

    // Always/never need no thunk at all.
    if cond.is_u64(ICond::AIcc as u64) || cond.is_u64(ICond::AXcc as u64) {
        return Some(mk_u64(1));
    }
    if cond.is_u64(ICond::NIcc as u64) || cond.is_u64(ICond::NXcc as u64) {
        return Some(mk_u64(0));
    }

    if cc_op.is_u64(CcOp::Copy as u64) {
        // COPY, then E/NE: a single bit extract of Z from DEP1.
        if cond.is_u64(ICond::EIcc as u64) {
            return Some(bit_test(cc_dep1, CCR_SHIFT_I_Z, 1));
        }
        if cond.is_u64(ICond::EXcc as u64) {
            return Some(bit_test(cc_dep1, CCR_SHIFT_X_Z, 1));
        }
        if cond.is_u64(ICond::NeIcc as u64) {
            return Some(bit_test(cc_dep1, CCR_SHIFT_I_Z, 0));
        }
        if cond.is_u64(ICond::NeXcc as u64) {
            return Some(bit_test(cc_dep1, CCR_SHIFT_X_Z, 0));
        }
    } else if cc_op.is_u64(CcOp::Logic as u64) {
        if cond.is_u64(ICond::EXcc as u64) {
            return Some(unop(
                Op::Bool1To64,
                binop(Op::CmpEq64, cc_dep1.clone(), mk_u64(0)),
            ));
        }
        if cond.is_u64(ICond::NeXcc as u64) {
            return Some(unop(
                Op::Bool1To64,
                binop(Op::CmpNe64, cc_dep1.clone(), mk_u64(0)),
            ));
        }
    } else if cc_op.is_u64(CcOp::Add as u64) {
        if cond.is_u64(ICond::EXcc as u64) {
            return Some(unop(
                Op::Bool1To64,
                binop(
                    Op::CmpEq64,
                    binop(Op::Add64, cc_dep1.clone(), cc_dep2.clone()),
                    mk_u64(0),
                ),
            ));
        }
    } else if cc_op.is_u64(CcOp::Sub as u64) {
        // sub/cmp, then E/NE: a direct operand comparison.
        if cond.is_u64(ICond::EXcc as u64) {
            return Some(unop(
                Op::Bool1To64,
                binop(Op::CmpEq64, cc_dep1.clone(), cc_dep2.clone()),
            ));
        }
        if cond.is_u64(ICond::NeXcc as u64) {
            return Some(unop(
                Op::Bool1To64,
                binop(Op::CmpNe64, cc_dep1.clone(), cc_dep2.clone()),
            ));
        }
    }

    None
}
