//! SPARC64 guest state: layout, lifecycle and the client-visible register
//! accessors.
//!
//! The state holds only the current register window; previous windows are
//! always spilled to the guest stack. FPRS.fu/du are not tracked separately
//! (both read as set), FSR.aexc is not represented at all, and FSR.tem/ns
//! are rejected at load-FSR time with an emulation note.
//!
//! The byte layout is stable: external callers (generated code, the native
//! escape stub, the dispatcher) index into the record through the constants
//! in [`offsets`].

use dbt_ir::{EmNote, GuestLayout, RegisterUpdates, RoundMode};

use crate::ccr::{self, CcOp};
use crate::fsr::{self, CexcOp};
use crate::regs;

/// The SPARC64 guest state record.
///
/// Offsets (in bytes):
///
/// ```text
///    0 host_evc_failaddr      event-check fail address (dispatcher)
///    8 host_evc_counter       event-check down counter (dispatcher)
///   16 r[0..32]               %g0-%g7 %o0-%o7 %l0-%l7 %i0-%i7
///  272 f[0..32]               %f0-%f31 (32-bit slots)
///  400 d[0..16]               %d32,%d34,..,%d62 (64-bit-only slots)
///  528 pc / 536 npc           program counters (delay-slot pair)
///  544 y / 552 asi / 560 fprs ancillary state
///  568 gsr_align / 572 gsr_mask
///  576 cmstart / 584 cmlen    cache-maintenance window
///  592 cc_op dep1 dep2 ndep   condition-code thunk
///  624 fsr_rd / 632 fsr_fcc
///  640 fsr_cexc_*             FP current-exceptions thunk
///  688 nraddr                 non-redirected return address
///  696 emnote / 704 scratchpad
///  712 host_fp/sp/o7          host registers across the native escape
/// ```
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct GuestState {
    pub host_evc_failaddr: u64,
    pub host_evc_counter: u32,
    pad0: u32,
    /// One window's view of the integer file. `r[0]` is architecturally
    /// zero; the lifter never emits a write to it.
    pub r: [u64; 32],
    /// Single-precision slots `%f0..%f31`. Doubles `%d0..%d30` and quads
    /// `%q0..%q28` alias pairs/quadruples of these bytes.
    pub f: [u32; 32],
    /// Double-only slots `%d32, %d34, .., %d62` (alias quads `%q32..%q60`).
    pub d: [u64; 16],
    pub pc: u64,
    /// Next program counter; SPARC has an architectural delay slot.
    pub npc: u64,
    /// Only the low 32 bits are meaningful; the high half always reads 0.
    pub y: u64,
    /// Only the low 8 bits are meaningful.
    pub asi: u64,
    /// The enable bit is forced on; the dirty bits track FP writes.
    pub fprs: u64,
    pub gsr_align: u32,
    pub gsr_mask: u32,
    pub cmstart: u64,
    pub cmlen: u64,
    pub cc_op: u64,
    pub cc_dep1: u64,
    pub cc_dep2: u64,
    pub cc_ndep: u64,
    /// FSR.rd in the normalized IR encoding, not the native one.
    pub fsr_rd: u64,
    /// All four fcc fields, in their native FSR bit positions.
    pub fsr_fcc: u64,
    pub fsr_cexc_op: u64,
    pub fsr_cexc_dep1_hi: u64,
    pub fsr_cexc_dep1_lo: u64,
    pub fsr_cexc_dep2_hi: u64,
    pub fsr_cexc_dep2_lo: u64,
    /// Rounding mode valid at the time of the recorded FP operation.
    pub fsr_cexc_ndep: u64,
    pub nraddr: u64,
    pub emnote: u32,
    pad1: u32,
    /// Scratch slot the native escape stub uses to move %fsr through memory.
    pub scratchpad: u64,
    pub host_fp: u64,
    pub host_sp: u64,
    pub host_o7: u64,
}

/// Byte offsets of the guest-state fields. Generated code and the native
/// escape stub address the record exclusively through these.
pub mod offsets {
    use core::mem::offset_of;

    use super::GuestState;

    pub const R_BASE: usize = offset_of!(GuestState, r);
    pub const F_BASE: usize = offset_of!(GuestState, f);
    pub const D_BASE: usize = offset_of!(GuestState, d);

    /// Integer register `%r<i>`.
    #[must_use]
    pub const fn r(i: usize) -> usize {
        assert!(i < 32);
        R_BASE + 8 * i
    }

    pub const PC: usize = offset_of!(GuestState, pc);
    pub const NPC: usize = offset_of!(GuestState, npc);
    pub const Y: usize = offset_of!(GuestState, y);
    pub const ASI: usize = offset_of!(GuestState, asi);
    pub const FPRS: usize = offset_of!(GuestState, fprs);
    pub const GSR_ALIGN: usize = offset_of!(GuestState, gsr_align);
    pub const GSR_MASK: usize = offset_of!(GuestState, gsr_mask);
    pub const CMSTART: usize = offset_of!(GuestState, cmstart);
    pub const CMLEN: usize = offset_of!(GuestState, cmlen);
    pub const CC_OP: usize = offset_of!(GuestState, cc_op);
    pub const CC_DEP1: usize = offset_of!(GuestState, cc_dep1);
    pub const CC_DEP2: usize = offset_of!(GuestState, cc_dep2);
    pub const CC_NDEP: usize = offset_of!(GuestState, cc_ndep);
    pub const FSR_RD: usize = offset_of!(GuestState, fsr_rd);
    pub const FSR_FCC: usize = offset_of!(GuestState, fsr_fcc);
    pub const FSR_CEXC_OP: usize = offset_of!(GuestState, fsr_cexc_op);
    pub const FSR_CEXC_DEP1_HI: usize = offset_of!(GuestState, fsr_cexc_dep1_hi);
    pub const FSR_CEXC_DEP1_LO: usize = offset_of!(GuestState, fsr_cexc_dep1_lo);
    pub const FSR_CEXC_DEP2_HI: usize = offset_of!(GuestState, fsr_cexc_dep2_hi);
    pub const FSR_CEXC_DEP2_LO: usize = offset_of!(GuestState, fsr_cexc_dep2_lo);
    pub const FSR_CEXC_NDEP: usize = offset_of!(GuestState, fsr_cexc_ndep);
    pub const NRADDR: usize = offset_of!(GuestState, nraddr);
    pub const EMNOTE: usize = offset_of!(GuestState, emnote);
    pub const SCRATCHPAD: usize = offset_of!(GuestState, scratchpad);
    pub const HOST_FP: usize = offset_of!(GuestState, host_fp);
    pub const HOST_SP: usize = offset_of!(GuestState, host_sp);
    pub const HOST_O7: usize = offset_of!(GuestState, host_o7);

    /// `%o6` / `%sp`.
    pub const O6: usize = r(14);
    /// `%o7`, the call return-address register.
    pub const O7: usize = r(15);
    /// `%i6` / `%fp`.
    pub const I6: usize = r(30);
}

/// Layout description handed to the optimizer and the memory checker.
///
/// Precise memory exceptions are kept for %sp, %fp and %pc only, the minimum
/// for correct stack unwinding. The always-defined set is the thunk
/// definedness contract: operation tags and NDEP slots never carry taint, so
/// the checker sees condition codes as data-dependent on DEP1/DEP2 alone.
pub const LAYOUT: GuestLayout = GuestLayout {
    total_size: size_of::<GuestState>(),
    offset_sp: offsets::O6,
    sizeof_sp: 8,
    offset_fp: offsets::I6,
    sizeof_fp: 8,
    offset_ip: offsets::PC,
    sizeof_ip: 8,
    always_defined: &[
        (offsets::CC_OP, 8),
        (offsets::CC_NDEP, 8),
        (offsets::FSR_CEXC_OP, 8),
        (offsets::FSR_CEXC_NDEP, 8),
        (offsets::PC, 8),
    ],
};

/// Does any part of `minoff..=maxoff` require precise memory exceptions?
#[must_use]
pub fn requires_precise_mem_exns(
    minoff: usize,
    maxoff: usize,
    px_control: RegisterUpdates,
) -> bool {
    let overlaps = |base: usize| maxoff >= base && minoff <= base + 7;

    if overlaps(offsets::O6) {
        return true;
    }
    if px_control == RegisterUpdates::SpAtMemAccess {
        // Only the stack pointer matters in this mode.
        return false;
    }
    overlaps(offsets::I6) || overlaps(offsets::PC)
}

impl GuestState {
    /// A freshly initialised guest state, ready for thread start.
    #[must_use]
    pub fn new() -> GuestState {
        let mut st: GuestState = bytemuck::Zeroable::zeroed();
        st.asi = u64::from(regs::ASI_PRIMARY_NO_FAULT);
        // FPU support is always on.
        st.fprs = regs::FPRS_FEF;
        st.fsr_rd = RoundMode::Nearest as u64;
        st.fsr_cexc_op = CexcOp::Copy as u64;
        st
    }

    /// Evaluates the condition-code thunk into the 8-bit CCR value.
    #[must_use]
    pub fn get_ccr(&self) -> u64 {
        ccr::calculate_ccr(self.cc_op, self.cc_dep1, self.cc_dep2, self.cc_ndep)
    }

    /// Replaces the condition-code thunk with a literal CCR value.
    pub fn put_ccr(&mut self, ccr_val: u64) {
        self.cc_op = CcOp::Copy as u64;
        self.cc_dep1 = ccr_val & 0xff;
        self.cc_dep2 = 0;
        self.cc_ndep = 0;
    }

    fn manipulate_carry(&mut self, set: bool, mask: u64) {
        let mut ccr_val = self.get_ccr();
        if set {
            ccr_val |= mask;
        } else {
            ccr_val &= !mask;
        }
        self.put_ccr(ccr_val);
    }

    /// Sets or clears the icc carry bit, leaving the other flags intact.
    pub fn put_icc_c(&mut self, carry: bool) {
        self.manipulate_carry(carry, ccr::CCR_MASK_I_C);
    }

    /// Sets or clears the xcc carry bit, leaving the other flags intact.
    pub fn put_xcc_c(&mut self, carry: bool) {
        self.manipulate_carry(carry, ccr::CCR_MASK_X_C);
    }

    /// Assembles the user-visible FSR value: rd (converted back to the
    /// native encoding), the fcc fields, and the evaluated cexc thunk.
    /// FSR.aexc always reads as zero.
    #[must_use]
    pub fn get_fsr(&self) -> u64 {
        let rd = fsr::round_ir_to_native(RoundMode::from_bits(self.fsr_rd));
        let cexc = helpers_cexc(self);
        cexc | self.fsr_fcc | (rd << fsr::FSR_SHIFT_RD)
    }

    /// Stores a raw FSR value: rd is normalized, fcc kept, cexc recorded as
    /// a copy thunk. tem/ns/aexc are dropped here; the lifter rejects them
    /// at the load-FSR boundary where the warning can be surfaced.
    pub fn put_fsr(&mut self, fsr_val: u64) {
        let native_rd = (fsr_val & fsr::FSR_MASK_RD) >> fsr::FSR_SHIFT_RD;
        self.fsr_rd = fsr::round_native_to_ir(native_rd) as u64;
        self.fsr_fcc = fsr_val & fsr::FSR_MASK_FCC;
        self.fsr_cexc_op = CexcOp::Copy as u64;
        self.fsr_cexc_dep1_hi = 0;
        self.fsr_cexc_dep1_lo = fsr_val & fsr::FSR_MASK_CEXC;
        self.fsr_cexc_dep2_hi = 0;
        self.fsr_cexc_dep2_lo = 0;
        self.fsr_cexc_ndep = 0;
    }

    /// Assembles GSR from its two guest-state halves.
    #[must_use]
    pub fn get_gsr(&self) -> u64 {
        (u64::from(self.gsr_mask) << fsr::GSR_SHIFT_MASK) | u64::from(self.gsr_align)
    }

    /// Splits a GSR value into the two guest-state halves.
    pub fn put_gsr(&mut self, gsr: u64) {
        self.gsr_align = (gsr & fsr::GSR_MASK_ALIGN) as u32;
        self.gsr_mask = (gsr >> fsr::GSR_SHIFT_MASK) as u32;
    }

    /// Records an emulation note.
    pub fn set_emnote(&mut self, note: EmNote) {
        self.emnote = note as u32;
    }
}

impl Default for GuestState {
    fn default() -> GuestState {
        GuestState::new()
    }
}

fn helpers_cexc(st: &GuestState) -> u64 {
    crate::helpers::calculate_fsr_ver_cexc(
        st.fsr_cexc_op,
        st.fsr_cexc_dep1_hi,
        st.fsr_cexc_dep1_lo,
        st.fsr_cexc_dep2_hi,
        st.fsr_cexc_dep2_lo,
        st.fsr_cexc_ndep,
    )
}
