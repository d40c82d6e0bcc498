//! IR expressions.

use crate::block::Temp;
use crate::op::Op;
use crate::ty::Ty;

/// An IR constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Const {
    U1(bool),
    U8(u8),
    U32(u32),
    U64(u64),
}

/// Clean helpers callable from generated code.
///
/// Clean helpers are pure: the call may be duplicated, hoisted or dropped by
/// the optimizer. Each variant maps to one function in the front-end's helper
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanHelper {
    /// (cc_op, dep1, dep2, ndep) -> 8-bit CCR.
    CalcCcr,
    /// (cond, cc_op, dep1, dep2, ndep) -> 0 or 1.
    CalcICond,
    /// (cond, fccn, fsr_fcc) -> 0 or 1.
    CalcFCond,
    /// (cexc_op, dep1_hi, dep1_lo, dep2_hi, dep2_lo, ndep) -> FSR.ver|cexc.
    CalcFsrVerCexc,
    /// (fsr) -> emulation-note number, 0 when the value is acceptable.
    CheckFsr,
    /// (asr_reg) -> live ancillary register value (%tick, %stick).
    ReadAsr,
    // AES primitives; three 64-bit inputs, one 64-bit output.
    AesEround01,
    AesEround23,
    AesDround01,
    AesDround23,
    AesEround01Last,
    AesEround23Last,
    AesDround01Last,
    AesDround23Last,
    // AES key expansion; two 64-bit inputs, one 64-bit output.
    AesKexpand0,
    /// Key expansion with the round constant selected by the immediate.
    AesKexpand1(u8),
    AesKexpand2,
    // Carry-less multiply.
    XmulX,
    XmulXHi,
}

/// A call to a clean helper.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanCall {
    pub helper: CleanHelper,
    pub args: Vec<Expr>,
    pub ret_ty: Ty,
    /// Bitmask of argument indices the memory checker must treat as
    /// always-defined (excluded from definedness tracking). Bit i set means
    /// argument i is exempt.
    pub mcx_mask: u32,
}

/// An IR expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(Const),
    Tmp(Temp),
    /// Read of the guest state at a byte offset.
    Get { offset: usize, ty: Ty },
    /// Big-endian memory load.
    Load { ty: Ty, addr: Box<Expr> },
    /// Big-endian memory load qualified by an 8-bit address-space identifier.
    LoadA {
        ty: Ty,
        addr: Box<Expr>,
        asi: Box<Expr>,
    },
    Unop(Op, Box<Expr>),
    Binop(Op, Box<Expr>, Box<Expr>),
    Triop(Op, Box<Expr>, Box<Expr>, Box<Expr>),
    Qop(Op, Box<Expr>, Box<Expr>, Box<Expr>, Box<Expr>),
    /// if-then-else; `cond` is I1, both arms have the same type.
    Ite {
        cond: Box<Expr>,
        iftrue: Box<Expr>,
        iffalse: Box<Expr>,
    },
    Call(CleanCall),
}

#[must_use]
pub fn mk_u1(b: bool) -> Expr {
    Expr::Const(Const::U1(b))
}

#[must_use]
pub fn mk_u8(n: u8) -> Expr {
    Expr::Const(Const::U8(n))
}

#[must_use]
pub fn mk_u32(n: u32) -> Expr {
    Expr::Const(Const::U32(n))
}

#[must_use]
pub fn mk_u64(n: u64) -> Expr {
    Expr::Const(Const::U64(n))
}

#[must_use]
pub fn unop(op: Op, e: Expr) -> Expr {
    Expr::Unop(op, Box::new(e))
}

#[must_use]
pub fn binop(op: Op, l: Expr, r: Expr) -> Expr {
    Expr::Binop(op, Box::new(l), Box::new(r))
}

#[must_use]
pub fn triop(op: Op, a: Expr, b: Expr, c: Expr) -> Expr {
    Expr::Triop(op, Box::new(a), Box::new(b), Box::new(c))
}

#[must_use]
pub fn qop(op: Op, a: Expr, b: Expr, c: Expr, d: Expr) -> Expr {
    Expr::Qop(op, Box::new(a), Box::new(b), Box::new(c), Box::new(d))
}

#[must_use]
pub fn ite(cond: Expr, iftrue: Expr, iffalse: Expr) -> Expr {
    Expr::Ite {
        cond: Box::new(cond),
        iftrue: Box::new(iftrue),
        iffalse: Box::new(iffalse),
    }
}

impl Expr {
    /// True if this expression is the given 64-bit constant.
    #[must_use]
    pub fn is_u64(&self, n: u64) -> bool {
        matches!(self, Expr::Const(Const::U64(v)) if *v == n)
    }
}
