//! IR block under construction.

use crate::stmt::Stmt;
use crate::ty::Ty;

/// Index of an IR temporary within its block's type environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Temp(pub u32);

/// A basic block of IR statements plus the type environment for its
/// temporaries. The front-end appends statements in guest program order;
/// a single control transfer (or fall-through recorded in the guest-state
/// program counters) terminates it.
#[derive(Debug, Default)]
pub struct IrBlock {
    tyenv: Vec<Ty>,
    pub stmts: Vec<Stmt>,
    /// Set when the block carries an [`Stmt::Unrecognized`] marker; such a
    /// block must hold that single guest instruction only.
    pub has_unrecognized: bool,
}

impl IrBlock {
    #[must_use]
    pub fn new() -> IrBlock {
        IrBlock::default()
    }

    /// Allocates a fresh temporary of the given type.
    pub fn new_temp(&mut self, ty: Ty) -> Temp {
        self.tyenv.push(ty);
        Temp((self.tyenv.len() - 1) as u32)
    }

    /// Type of an existing temporary.
    #[must_use]
    pub fn ty_of(&self, tmp: Temp) -> Ty {
        self.tyenv[tmp.0 as usize]
    }

    /// Number of temporaries allocated so far.
    #[must_use]
    pub fn temp_count(&self) -> usize {
        self.tyenv.len()
    }

    pub fn stmt(&mut self, st: Stmt) {
        self.stmts.push(st);
    }
}
