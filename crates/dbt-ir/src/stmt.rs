//! IR statements.

use crate::block::Temp;
use crate::expr::Expr;
use crate::result::JumpKind;
use crate::ty::Ty;

/// Atomic compare-and-swap. Reads `addr`, stores the old value into `old`,
/// and writes `new` back iff the old value equals `expected`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cas {
    pub old: Temp,
    pub ty: Ty,
    pub addr: Expr,
    pub expected: Expr,
    pub new: Expr,
}

/// Guest-state access direction of one dirty-helper effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fx {
    Read,
    Modify,
}

/// A declared guest-state byte range a dirty helper touches. The optimizer
/// must preserve data flow into `Read` ranges and out of `Modify` ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    pub fx: Fx,
    pub offset: usize,
    pub size: usize,
}

/// Dirty helpers callable from generated code. Each one takes the
/// guest-state pointer and mutates the ranges it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyHelper {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

/// A call to a dirty helper.
#[derive(Debug, Clone, PartialEq)]
pub struct DirtyCall {
    pub helper: DirtyHelper,
    pub effects: Vec<Effect>,
}

/// An IR statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Write to the guest state at a byte offset.
    Put { offset: usize, data: Expr },
    /// Write to a temporary; single assignment per temp.
    WrTmp { tmp: Temp, data: Expr },
    /// Big-endian memory store.
    Store { addr: Expr, data: Expr },
    /// Big-endian memory store qualified by an address-space identifier.
    StoreA { addr: Expr, data: Expr, asi: Expr },
    Cas(Cas),
    /// Conditional side exit. When `guard` is true, the guest IP slot at
    /// `ip_offset` is set to `dst` and the block exits with `kind`.
    Exit {
        guard: Expr,
        kind: JumpKind,
        dst: u64,
        ip_offset: usize,
    },
    /// Full memory fence; also an optimizer barrier for guest-state motion.
    Fence,
    Dirty(DirtyCall),
    /// Marker for an instruction the front-end recognized but did not lift.
    /// The runtime executes the raw word natively via the escape stub.
    Unrecognized(u32),
}
