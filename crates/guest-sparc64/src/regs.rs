//! Register numbering and guest-state addressing.
//!
//! Integer registers are the flat 32-register window view. FP registers are
//! addressed by architectural number and operand size; doubles and quads
//! alias the single-precision slots bit-exactly, so the returned offsets for
//! `%d0`/`%q0` are simply the offset of `%f0`.

use crate::state::offsets;

/// Architectural stack bias: every save-area address adds this to %sp/%fp.
pub const STACK_BIAS: u64 = 2047;

pub const REG_G1: u8 = 1;
pub const REG_O0: u8 = 8;
pub const REG_O7: u8 = 15;

/// FPRS.fef: FPU enable. Forced on for the whole guest lifetime.
pub const FPRS_FEF: u64 = 1 << 2;
/// FPRS.dl | FPRS.du: dirty-lower/dirty-upper.
pub const FPRS_DUDL: u64 = 3;

// Address-space identifiers the front-end accepts.
pub const ASI_PRIMARY: u8 = 0x80;
pub const ASI_PRIMARY_NO_FAULT: u8 = 0x82;
pub const ASI_BLOCK_PRIMARY: u8 = 0xF0;
pub const ASI_FL8_PRIMARY: u8 = 0xD0;
pub const ASI_FL16_PRIMARY: u8 = 0xD2;

/// Ancillary state registers, by architectural number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Asr {
    Y = 0,
    Ccr = 2,
    Asi = 3,
    Tick = 4,
    Pc = 5,
    Fprs = 6,
    Gsr = 19,
    Stick = 24,
    /// Compatibility feature register (read-only feature word).
    Cfr = 26,
    Pause = 27,
    Mwait = 28,
}

impl Asr {
    /// Maps an ASR number from an instruction to the known set.
    #[must_use]
    pub fn from_num(num: u8) -> Option<Asr> {
        Some(match num {
            0 => Asr::Y,
            2 => Asr::Ccr,
            3 => Asr::Asi,
            4 => Asr::Tick,
            5 => Asr::Pc,
            6 => Asr::Fprs,
            19 => Asr::Gsr,
            24 => Asr::Stick,
            26 => Asr::Cfr,
            27 => Asr::Pause,
            28 => Asr::Mwait,
            _ => return None,
        })
    }
}

/// Guest-state offset of an integer register.
#[must_use]
pub fn offset_ireg(reg: u8) -> usize {
    assert!(reg < 32, "bad integer register number {reg}");
    offsets::r(reg as usize)
}

/// Guest-state offset of an FP register of the given operand size (4, 8 or
/// 16 bytes). The register number is the full architectural number (0..=63
/// for doubles/quads, already un-aliased by the decoder).
#[must_use]
pub fn offset_freg(reg: u8, size: usize) -> usize {
    let reg = reg as usize;
    match size {
        4 => {
            assert!(reg < 32, "bad single-precision register %f{reg}");
            offsets::F_BASE + 4 * reg
        }
        8 => {
            assert!(reg < 64 && reg % 2 == 0, "bad double register %d{reg}");
            if reg < 32 {
                offsets::F_BASE + 4 * reg
            } else {
                offsets::D_BASE + 8 * ((reg - 32) / 2)
            }
        }
        16 => {
            assert!(reg < 64 && reg % 4 == 0, "bad quad register %q{reg}");
            if reg < 32 {
                offsets::F_BASE + 4 * reg
            } else {
                offsets::D_BASE + 8 * ((reg - 32) / 2)
            }
        }
        _ => panic!("bad FP operand size {size}"),
    }
}

/// Guest-state offset of a directly-stored ASR. CCR and GSR are synthesized
/// from thunks/halves and have no single slot.
#[must_use]
pub fn offset_asr(asr: Asr) -> usize {
    match asr {
        Asr::Y => offsets::Y,
        Asr::Asi => offsets::ASI,
        Asr::Pc => offsets::PC,
        Asr::Fprs => offsets::FPRS,
        _ => panic!("ASR {asr:?} is not a plain guest-state slot"),
    }
}
