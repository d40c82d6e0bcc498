//! FP lifting: compares into fcc fields, arithmetic with the cexc thunk,
//! conversions and conditional moves.

mod common;

use common::{Machine, lift_words};
use guest_sparc64::{CexcOp, fsr};

fn set_d(m: &mut Machine, reg: usize, v: f64) {
    let bits = v.to_bits();
    m.state.f[reg] = (bits >> 32) as u32;
    m.state.f[reg + 1] = bits as u32;
}

fn get_d(m: &Machine, reg: usize) -> f64 {
    f64::from_bits(u64::from(m.state.f[reg]) << 32 | u64::from(m.state.f[reg + 1]))
}

/// fcmpd %fcc0, %d0, %d2
const FCMPD_FCC0: u32 = 0x81a8_0a42;

fn fcc0(m: &Machine) -> u64 {
    (m.state.fsr_fcc >> fsr::FSR_SHIFT_FCC0) & 3
}

#[test]
fn fcmpd_equal_writes_fcc_00() {
    // %d0 = %d2 = 1.0 compares equal into fcc0.
    let mut m = Machine::new(0x1_0000, 64);
    set_d(&mut m, 0, 1.0);
    set_d(&mut m, 2, 1.0);

    let (block, _) = lift_words(&[FCMPD_FCC0], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(fcc0(&m), 0b00);
}

#[test]
fn fcmpd_orders_and_unordered_match_hardware_encoding() {
    for (a, b, want) in [
        (1.0, 2.0, 0b01),            // LT
        (2.0, 1.0, 0b10),            // GT
        (f64::NAN, 1.0, 0b11),       // UN
        (f64::NAN, f64::NAN, 0b11),  // UN
        (-0.0, 0.0, 0b00),           // EQ
    ] {
        let mut m = Machine::new(0x1_0000, 64);
        set_d(&mut m, 0, a);
        set_d(&mut m, 2, b);
        let (block, _) = lift_words(&[FCMPD_FCC0], 0x1000);
        assert!(m.exec(&block).is_none());
        assert_eq!(fcc0(&m), want, "fcmpd({a}, {b})");
    }
}

#[test]
fn fcmpd_touches_only_the_selected_fcc_field() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.fsr_fcc = 0b01 << fsr::FSR_SHIFT_FCC0 | 0b10 << fsr::FSR_SHIFT_FCC2;
    set_d(&mut m, 0, 2.0);
    set_d(&mut m, 2, 1.0);

    // fcmpd %fcc1, %d0, %d2 -> GT
    let (block, _) = lift_words(&[0x83a8_0a42], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!((m.state.fsr_fcc >> fsr::FSR_SHIFT_FCC1) & 3, 0b10);
    assert_eq!((m.state.fsr_fcc >> fsr::FSR_SHIFT_FCC0) & 3, 0b01);
    assert_eq!((m.state.fsr_fcc >> fsr::FSR_SHIFT_FCC2) & 3, 0b10);
}

#[test]
fn faddd_computes_and_publishes_the_thunk() {
    let mut m = Machine::new(0x1_0000, 64);
    set_d(&mut m, 0, 1.5);
    set_d(&mut m, 2, 2.25);

    // faddd %d0, %d2, %d4
    let (block, _) = lift_words(&[0x89a0_0842], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(get_d(&m, 4), 3.75);

    assert_eq!(m.state.fsr_cexc_op, CexcOp::FAdd64 as u64);
    assert_eq!(m.state.fsr_cexc_dep1_lo, 1.5f64.to_bits());
    assert_eq!(m.state.fsr_cexc_dep2_lo, 2.25f64.to_bits());
    // The recorded rounding mode is the live one.
    assert_eq!(m.state.fsr_cexc_ndep, m.state.fsr_rd);
}

#[test]
fn fsubd_and_double_register_aliasing() {
    let mut m = Machine::new(0x1_0000, 64);
    set_d(&mut m, 0, 5.0);
    set_d(&mut m, 2, 3.0);

    // fsubd %d0, %d2, %d4
    let (block, _) = lift_words(&[0x89a0_08c2], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(get_d(&m, 4), 2.0);
    // The singles underneath %d4 hold its halves bit-exactly.
    assert_eq!(m.state.f[4], (2.0f64.to_bits() >> 32) as u32);
    assert_eq!(m.state.f[5], 2.0f64.to_bits() as u32);
}

#[test]
fn fstoi_truncates_toward_zero() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.f[1] = (-7.9f32).to_bits();

    // fstoi %f1, %f2
    let (block, _) = lift_words(&[0x85a0_1a21], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.f[2] as i32, -7);
    assert_eq!(m.state.fsr_cexc_op, CexcOp::F32ToI32 as u64);
}

#[test]
fn fxtod_converts_a_64bit_integer() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.f[0] = 0;
    m.state.f[1] = 42;

    // fxtod %d0, %d2
    let (block, _) = lift_words(&[0x85a0_1100], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(get_d(&m, 2), 42.0);
}

#[test]
fn fabsd_clears_the_cexc_thunk() {
    let mut m = Machine::new(0x1_0000, 64);
    set_d(&mut m, 0, -3.5);
    m.state.fsr_cexc_op = CexcOp::FAdd64 as u64;
    m.state.fsr_cexc_dep1_lo = 0x1234;

    // fabsd %d0, %d2
    let (block, _) = lift_words(&[0x85a0_0140], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(get_d(&m, 2), 3.5);
    assert_eq!(m.state.fsr_cexc_op, CexcOp::Copy as u64);
    assert_eq!(m.state.fsr_cexc_dep1_lo, 0);
}

#[test]
fn fmaddd_packs_three_sources_into_the_thunk() {
    let mut m = Machine::new(0x1_0000, 64);
    set_d(&mut m, 0, 2.0);
    set_d(&mut m, 2, 3.0);
    set_d(&mut m, 4, 1.0);

    // fmaddd %d0, %d2, %d4, %d6
    let (block, _) = lift_words(&[0x8db8_0842], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(get_d(&m, 6), 7.0);

    assert_eq!(m.state.fsr_cexc_op, CexcOp::FMAdd64 as u64);
    assert_eq!(m.state.fsr_cexc_dep1_hi, 2.0f64.to_bits());
    assert_eq!(m.state.fsr_cexc_dep1_lo, 3.0f64.to_bits());
    assert_eq!(m.state.fsr_cexc_dep2_hi, 1.0f64.to_bits());
    assert_eq!(m.state.fsr_cexc_dep2_lo, 0);
}

#[test]
fn fnmaddd_refuses_to_lift() {
    // fnmaddd: op5 = 0xE. Falls back to the native escape.
    let word = 2 << 30 | 6 << 25 | 0x37 << 19 | 4 << 9 | 0xE << 5 | 2;
    let (block, res) = lift_words(&[word], 0x1000);
    assert_eq!(res.stop_kind, Some(dbt_ir::JumpKind::EmWarn));
    assert!(block.has_unrecognized);
}

#[test]
fn movcc_on_equal_picks_the_immediate() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 7;
    m.state.r[9] = 7;

    // cmp %o0, %o1 ; move %icc, 5, %o2
    let (block, _) = lift_words(&[0x80a2_0009, 0x9564_6005], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.r[10], 5);

    // And with inequality the destination is untouched.
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 7;
    m.state.r[9] = 8;
    m.state.r[10] = 99;
    let (block, _) = lift_words(&[0x80a2_0009, 0x9564_6005], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.r[10], 99);
}

#[test]
fn movr_tests_the_register_not_the_ccr() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 0;
    m.state.r[10] = 1;

    // movrz %o0, 7, %o2
    let (block, _) = lift_words(&[0x957a_2407], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.r[10], 7);
}

#[test]
fn fmovd_cc_selects_on_the_fcc_field() {
    let mut m = Machine::new(0x1_0000, 64);
    set_d(&mut m, 0, 1.0);
    set_d(&mut m, 2, 9.0);
    m.state.fsr_fcc = 0; // fcc0 = E

    // fmovde %fcc0, %d0, %d2
    let word = 2 << 30 | 2 << 25 | 0x35 << 19 | 9 << 14 | 0 << 11 | 2 << 5 | 0;
    let (block, _) = lift_words(&[word], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(get_d(&m, 2), 1.0);
}

#[test]
fn mov_between_register_files_is_bit_exact() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.f[1] = 0x8000_0001;

    // movstosw %f1, %o0 (sign-extends) / movstouw %f1, %o1
    let sw = 2 << 30 | 8 << 25 | 0x36 << 19 | 0x113 << 5 | 1;
    let uw = 2 << 30 | 9 << 25 | 0x36 << 19 | 0x111 << 5 | 1;
    let (block, _) = lift_words(&[sw, uw], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.r[8], 0xffff_ffff_8000_0001);
    assert_eq!(m.state.r[9], 0x8000_0001);

    // movxtod %o0, %d0
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 0xdead_beef_0bad_f00d;
    let (block, _) = lift_words(&[0x81b0_2308], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.f[0], 0xdead_beef);
    assert_eq!(m.state.f[1], 0x0bad_f00d);
}

#[test]
fn vis_logic_operates_on_register_bits() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.f[1] = 0xff00_ff00;
    m.state.f[2] = 0x0ff0_0ff0;

    // fands %f1, %f2, %f3
    let (block, _) = lift_words(&[0x87b0_4da2], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.f[3], 0x0f00_0f00);
}

#[test]
fn fzeros_writes_a_zero_single() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.f[3] = 0xffff_ffff;

    let (block, _) = lift_words(&[0x87b0_0c20], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.f[3], 0);
}

#[test]
fn aes_lifts_only_with_the_feature_bit() {
    // aes_eround01 %d0, %d2, %d4, %d6
    let word = 0x8cc8_0802;
    let code = common::words_to_bytes(&[word]);

    // Without the SPARC4 capability the lift fails into the native escape.
    let (block, res) =
        common::lift_block(&code, 0x1000, common::arch_base(), common::abi_linux(), 100);
    assert_eq!(res.stop_kind, Some(dbt_ir::JumpKind::EmWarn));
    assert!(block.has_unrecognized);

    // With it, the round becomes an ordinary clean-helper lift.
    let (block, res) = common::lift_block(&code, 0x1000, common::arch(), common::abi_linux(), 100);
    assert_eq!(res.what_next, dbt_ir::WhatNext::Continue);
    assert!(!block.has_unrecognized);
}

#[test]
fn faligndata_concatenates_at_the_gsr_offset() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.gsr_align = 3;
    m.state.f[0] = 0x0011_2233;
    m.state.f[1] = 0x4455_6677;
    m.state.f[2] = 0x8899_aabb;
    m.state.f[3] = 0xccdd_eeff;

    // faligndata %d0, %d2, %d4
    let word = 2 << 30 | 4 << 25 | 0x36 << 19 | 0 << 14 | 0x48 << 5 | 2;
    let (block, _) = lift_words(&[word], 0x1000);
    assert!(m.exec(&block).is_none());
    let d4 = u64::from(m.state.f[4]) << 32 | u64::from(m.state.f[5]);
    assert_eq!(d4, 0x3344_5566_7788_99aa);
}
