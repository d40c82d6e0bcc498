//! Guest-state layout description consumed by the optimizer and the optional
//! memory checker.

/// Emulation notes a front-end can record in its guest state. The dispatcher
/// reads the slot when a block exits with an emulation-warning kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum EmNote {
    None = 0,
    /// The guest tried to enable FP exception trapping (FSR.tem); the
    /// front-end does not emulate the deferred-trap machinery.
    FpExns = 1,
    /// The guest tried to enable non-standard FP mode (FSR.ns).
    FpNs = 2,
    /// An unrecognized instruction is being run through the native escape.
    HandlingUnrecognized = 3,
}

/// Register-update precision requested by the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterUpdates {
    SpAtMemAccess,
    UnwindRegsAtMemAccess,
    AllRegsAtMemAccess,
    AllRegsAtEachInsn,
}

/// Static description of one guest-state record layout.
///
/// `always_defined` lists `(offset, size)` ranges the memory checker treats
/// as never carrying uninitialized-memory taint: thunk operation tags, their
/// non-dependent operands, and the program counter.
#[derive(Debug, Clone, Copy)]
pub struct GuestLayout {
    pub total_size: usize,
    pub offset_sp: usize,
    pub sizeof_sp: usize,
    pub offset_fp: usize,
    pub sizeof_fp: usize,
    pub offset_ip: usize,
    pub sizeof_ip: usize,
    pub always_defined: &'static [(usize, usize)],
}
