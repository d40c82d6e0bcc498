//! Per-instruction translation result, the contract between a front-end and
//! the block-building driver.

/// Why a block stops, as seen by the dispatcher that runs translated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    /// Ordinary control transfer.
    Boring,
    Call,
    Ret,
    /// The in-guest escape sequence requested a client service.
    ClientReq,
    /// Jump that must bypass function redirection.
    NoRedir,
    /// Voluntary yield to the scheduler.
    Yield,
    /// An emulation warning was recorded; the dispatcher must surface it
    /// before running the next block.
    EmWarn,
    /// The bytes at the guest IP could not be decoded.
    NoDecode,
    /// Translations overlapping the cache-maintenance window must be
    /// discarded before execution continues.
    InvalICache,
    /// Host-OS syscall conventions for the trap-always instruction.
    Syscall,
    SysGetContext,
    SysSetContext,
    /// Syscall convention where the trap number travels in a guest register.
    FastTrap,
}

/// What the block-building driver should do after this instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhatNext {
    /// Keep lifting at the next instruction.
    Continue,
    /// The block ends here.
    StopHere,
    /// Discard this instruction's statements and re-start a fresh block at
    /// this instruction boundary (used to isolate native-escape markers).
    BackUp,
}

/// Result of lifting one guest instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisResult {
    /// Bytes consumed: 4, or 8 for the two-instruction escape sequences.
    /// 0 on decode failure.
    pub len: u32,
    pub what_next: WhatNext,
    /// Stop kind; meaningful only when `what_next` is not `Continue`.
    pub stop_kind: Option<JumpKind>,
    /// When continuing, a statically-known next address if the front-end
    /// redirected the flow (otherwise lifting continues sequentially).
    pub continue_at: Option<u64>,
}

impl DisResult {
    /// The default result: four bytes consumed, keep going.
    #[must_use]
    pub fn next_insn() -> DisResult {
        DisResult {
            len: 4,
            what_next: WhatNext::Continue,
            stop_kind: None,
            continue_at: None,
        }
    }
}
