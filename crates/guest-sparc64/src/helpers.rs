//! Helper runtime referenced by generated code.
//!
//! Clean helpers are pure functions; dirty helpers take the guest-state
//! pointer and mutate the register ranges they declare. The integer-side
//! helpers are computed in Rust. The FP current-exceptions evaluator and the
//! hardware crypto primitives re-execute the operation on a SPARC64 host to
//! capture its exact behaviour; off such a host they are unreachable by
//! construction (the lifter refuses the opcodes that would need them) and
//! panic if called anyway.

use crate::ccr;
use crate::fsr::{self, CexcOp};
use crate::regs::Asr;
use crate::state::{GuestState, offsets};

/// Clean: evaluates the condition-code thunk into the 8-bit CCR.
#[must_use]
pub fn calculate_ccr(cc_op: u64, cc_dep1: u64, cc_dep2: u64, cc_ndep: u64) -> u64 {
    ccr::calculate_ccr(cc_op, cc_dep1, cc_dep2, cc_ndep)
}

/// Clean: evaluates one integer condition against the thunk.
#[must_use]
pub fn calculate_icond(cond: u64, cc_op: u64, cc_dep1: u64, cc_dep2: u64, cc_ndep: u64) -> u64 {
    ccr::calculate_icond(cond, cc_op, cc_dep1, cc_dep2, cc_ndep)
}

/// Clean: evaluates one FP condition against the stored fcc fields.
#[must_use]
pub fn calculate_fcond_from_fsr(cond: u64, fccn: u64, fsr_fcc: u64) -> u64 {
    fsr::calculate_fcond_from_fsr(cond, fccn, fsr_fcc)
}

/// Clean: checks a to-be-loaded FSR value for unsupported bits.
#[must_use]
pub fn check_fsr(fsr_val: u64) -> u64 {
    u64::from(fsr::check_fsr(fsr_val) as u32)
}

/// Clean: reads a live ancillary register (%tick, %stick).
///
/// Reading the cycle counters requires re-executing the read on SPARC64
/// hardware; there is no portable source for these values.
#[must_use]
pub fn read_asr(asr_reg: u64) -> u64 {
    match asr_reg {
        x if x == Asr::Tick as u64 || x == Asr::Stick as u64 => {
            panic!("reading %tick/%stick requires a SPARC64 host")
        }
        _ => panic!("read_asr: unsupported ASR register {asr_reg}"),
    }
}

/// Clean: evaluates the FP current-exceptions thunk, ORing in FSR.ver.
///
/// Only the copy tag is computable portably. Every other tag re-executes
/// the recorded FP operation natively to capture %fsr.cexc bit-exactly; the
/// lifter guarantees those tags cannot reach a non-SPARC64 host.
#[must_use]
pub fn calculate_fsr_ver_cexc(
    cexc_op: u64,
    dep1_hi: u64,
    dep1_lo: u64,
    dep2_hi: u64,
    dep2_lo: u64,
    ndep: u64,
) -> u64 {
    let _ = (dep1_hi, dep2_hi, dep2_lo, ndep);
    // FSR.ver reads as zero off-host; the implementation version of the
    // emulated FPU is not architecturally meaningful to user code.
    match cexc_op {
        x if x == CexcOp::Copy as u64 => dep1_lo & fsr::FSR_MASK_CEXC,
        _ => panic!("cexc tag {cexc_op} requires re-execution on a SPARC64 host"),
    }
}

/// Clean: carry-less (XOR) 64x64 multiply, low 64 bits of the product.
#[must_use]
pub fn xmulx(arg_l: u64, arg_r: u64) -> u64 {
    clmul128(arg_l, arg_r) as u64
}

/// Clean: carry-less (XOR) 64x64 multiply, high 64 bits of the product.
#[must_use]
pub fn xmulxhi(arg_l: u64, arg_r: u64) -> u64 {
    (clmul128(arg_l, arg_r) >> 64) as u64
}

fn clmul128(a: u64, b: u64) -> u128 {
    let mut acc: u128 = 0;
    let a = u128::from(a);
    for bit in 0..64 {
        if b & (1 << bit) != 0 {
            acc ^= a << bit;
        }
    }
    acc
}

macro_rules! native_only {
    ($($(#[$doc:meta])* $name:ident($($arg:ident),+);)+) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $name($($arg: u64),+) -> u64 {
                let _ = ($($arg),+);
                panic!(concat!(
                    stringify!($name),
                    " requires the SPARC64 hardware instruction"
                ));
            }
        )+
    };
}

native_only! {
    /// Clean: AES encrypt round, columns 0/1.
    aes_eround01(arg1, arg2, arg3);
    /// Clean: AES encrypt round, columns 2/3.
    aes_eround23(arg1, arg2, arg3);
    /// Clean: AES decrypt round, columns 0/1.
    aes_dround01(arg1, arg2, arg3);
    /// Clean: AES decrypt round, columns 2/3.
    aes_dround23(arg1, arg2, arg3);
    /// Clean: last AES encrypt round, columns 0/1.
    aes_eround01_l(arg1, arg2, arg3);
    /// Clean: last AES encrypt round, columns 2/3.
    aes_eround23_l(arg1, arg2, arg3);
    /// Clean: last AES decrypt round, columns 0/1.
    aes_dround01_l(arg1, arg2, arg3);
    /// Clean: last AES decrypt round, columns 2/3.
    aes_dround23_l(arg1, arg2, arg3);
    /// Clean: AES key expansion without round constant.
    aes_kexpand0(arg_l, arg_r);
    /// Clean: AES key expansion without SBOX.
    aes_kexpand2(arg_l, arg_r);
}

/// Clean: AES key expansion with the round constant selected by `rcon`.
#[must_use]
pub fn aes_kexpand1(arg_l: u64, arg_r: u64, rcon: u8) -> u64 {
    let _ = (arg_l, arg_r, rcon);
    panic!("aes_kexpand1 requires the SPARC64 hardware instruction");
}

/// Dirty: MD5 block step. IV in %q0, data in %q8..%q20, result in %q0.
pub fn md5(guest_state: &mut GuestState) {
    let _ = guest_state;
    panic!("md5 requires the SPARC64 hardware instruction");
}

/// Dirty: SHA-1 block step. IV in %f0-%f4, data in %q8..%q20.
pub fn sha1(guest_state: &mut GuestState) {
    let _ = guest_state;
    panic!("sha1 requires the SPARC64 hardware instruction");
}

/// Dirty: SHA-256 block step. IV in %q0-%q4, data in %q8..%q20.
pub fn sha256(guest_state: &mut GuestState) {
    let _ = guest_state;
    panic!("sha256 requires the SPARC64 hardware instruction");
}

/// Dirty: SHA-512 block step. IV in %q0-%q12, data in %q16..%q44.
pub fn sha512(guest_state: &mut GuestState) {
    let _ = guest_state;
    panic!("sha512 requires the SPARC64 hardware instruction");
}

/// Byte ranges the hash helpers declare to the optimizer, as
/// (iv offset, iv size, data offset, data size).
#[must_use]
pub fn hash_effects(helper: dbt_ir::DirtyHelper) -> (usize, usize, usize, usize) {
    use dbt_ir::DirtyHelper;
    let f = |i: usize| offsets::F_BASE + 4 * i;
    match helper {
        DirtyHelper::Md5 => (f(0), 16, f(8), 64),
        DirtyHelper::Sha1 => (f(0), 20, f(8), 64),
        DirtyHelper::Sha256 => (f(0), 32, f(8), 64),
        DirtyHelper::Sha512 => (f(0), 64, f(16), 128),
    }
}
