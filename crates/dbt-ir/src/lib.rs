//! Target-independent IR emitted by the guest front-ends.
//!
//! A front-end lifts one guest instruction at a time into a flat list of
//! statements appended to the current [`IrBlock`]. The downstream optimizer
//! and code generator consume the block; this crate is only the shared
//! vocabulary between the two sides.
//!
//! Guest state is addressed by byte offset into an architecture-specific
//! state record. Memory accesses are big-endian: the only guest this
//! framework currently fronts is big-endian and the lifter refuses
//! little-endian hosts outright.

mod block;
mod expr;
mod layout;
mod op;
mod result;
mod round;
mod stmt;
mod ty;

pub use block::{IrBlock, Temp};
pub use expr::{
    CleanCall, CleanHelper, Const, Expr, binop, ite, mk_u1, mk_u8, mk_u32, mk_u64, qop, triop,
    unop,
};
pub use layout::{EmNote, GuestLayout, RegisterUpdates};
pub use op::{Op, fcmp};
pub use result::{DisResult, JumpKind, WhatNext};
pub use round::RoundMode;
pub use stmt::{Cas, DirtyCall, DirtyHelper, Effect, Fx, Stmt};
pub use ty::Ty;
