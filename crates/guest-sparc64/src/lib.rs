//! SPARC64 guest front-end.
//!
//! Lifts one SPARC64 instruction at a time into the target-independent IR of
//! [`dbt_ir`]. The front-end models the architectural state user code can
//! observe: the current register window (previous windows are always
//! spilled), the FP register file with its single/double/quad aliasing, lazy
//! integer condition codes, lazy FP current-exceptions, and the delay-slot
//! control-flow discipline.
//!
//! Not modelled: kernel mode, traps other than trap-always, register-window
//! spill/fill traps, FSR.aexc, and FP exception trapping (FSR.tem/ns are
//! rejected with an emulation note).

pub mod arith;
pub mod branch;
pub mod ccr;
pub mod crypto;
pub mod decode;
pub mod fsr;
pub mod helpers;
pub mod lift;
pub mod logic;
pub mod mem;
pub mod misc;
pub mod recipe;
pub mod regs;
pub mod shift;
pub mod state;
pub mod vis;
pub mod window;

pub mod fpu;

pub use ccr::{CcOp, ICond};
pub use decode::{DecodeError, DecodedInsn, Mnemonic};
pub use fsr::{CexcOp, FCond};
pub use lift::{AbiFlags, AbiInfo, ArchInfo, Endness, GuestOs, HwCaps, Lifter, set_ir_injection};
pub use state::{GuestState, LAYOUT};
