//! SAVE / RESTORE: explicit spill and fill of the single emulated register
//! window.
//!
//! Only one window lives in the guest state, so SAVE stores %l0-%l7/%i0-%i7
//! to the stack frame (at %sp + stack bias), shifts %o into %i, and
//! computes `rs1 + rs2_or_imm` with old-window sources into the new-window
//! rd. RESTORE mirrors it, reloading through %fp. A fence follows every
//! window flip so the optimizer cannot move loads across it; unwinding and
//! core dumps depend on the flip being visible at once.

use dbt_ir::{Expr, Stmt, Ty};

use crate::decode::{DecodedInsn, Mnemonic, Operands};
use crate::lift::{LiftResult, Lifter};
use crate::state::offsets;

impl Lifter<'_> {
    pub(crate) fn lift_save_restore(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::IntRR { rs1, rs2_imm, rd } = insn.operands else {
            unreachable!()
        };

        // "ADD rs1, rs2, rd" with both sources read from the old window;
        // rd lands in the new one after the flip.
        let res = self.temp(Ty::I64);
        let sum = self.ea_expr(rs1, rs2_imm);
        self.assign(res, sum);

        if insn.mnemonic == Mnemonic::Save {
            // Spill the current window to the save area under %sp.
            let sa_base = self.temp(Ty::I64);
            self.assign(
                sa_base,
                Expr::Get {
                    offset: offsets::O6,
                    ty: Ty::I64,
                },
            );
            for (i, off) in (16..=31).zip((0..).step_by(8)) {
                self.savearea_store(offsets::r(i), sa_base, off);
            }

            // %o -> %i
            for i in 0..8 {
                self.copy_reg_slot(offsets::r(24 + i), offsets::r(8 + i));
            }
        } else {
            debug_assert_eq!(insn.mnemonic, Mnemonic::Restore);
            self.restore_window();
        }

        // rd is in the now-active window.
        self.put_ireg(rd, Expr::Tmp(res));

        // The optimizer must not reorder around the flip: stack unwinding
        // and core dumps read the window mid-block.
        self.stmt(Stmt::Fence);

        Ok(())
    }

    /// The RESTORE half of the window flip, shared with RETURN: %i -> %o,
    /// then refill %l0-%l7/%i0-%i7 from the save area under %fp.
    pub(crate) fn restore_window(&mut self) {
        // %i -> %o
        for i in 0..8 {
            self.copy_reg_slot(offsets::r(8 + i), offsets::r(24 + i));
        }

        let sa_base = self.temp(Ty::I64);
        self.assign(
            sa_base,
            Expr::Get {
                offset: offsets::I6,
                ty: Ty::I64,
            },
        );
        for (i, off) in (16..=29).zip((0..).step_by(8)) {
            self.savearea_restore(offsets::r(i), sa_base, off);
        }
        self.savearea_restore(offsets::r(31), sa_base, 120);
        // %fp locates the save area for the loads above, so it is the last
        // register reloaded.
        self.savearea_restore(offsets::r(30), sa_base, 112);
    }
}
