//! SAVE/RESTORE window emulation: explicit spill and fill round trips.

mod common;

use common::{Machine, lift_words};
use guest_sparc64::regs::STACK_BIAS;

/// save %sp, -176, %sp
const SAVE: u32 = 0x9de3_bf50;
/// restore %g0, %g0, %g0
const RESTORE: u32 = 0x81e8_0000;

fn sentinel(i: usize) -> u64 {
    0x1111_0000_0000_0000 + (i as u64) * 0x101
}

#[test]
fn save_then_restore_round_trips_the_window() {
    let mut m = Machine::new(0x1_0000, 8192);
    let sp = 0x1_0000 + 1024;
    m.state.r[14] = sp;
    for i in 16..32 {
        m.state.r[i] = sentinel(i);
    }
    let outs: Vec<u64> = (8..16).map(|i| 0x2222_0000 + i as u64).collect();
    for (k, v) in outs.iter().enumerate() {
        m.state.r[8 + k] = *v;
    }

    let (block, _) = lift_words(&[SAVE, RESTORE], 0x1000);
    assert!(m.exec(&block).is_none());

    // All sixteen windowed slots are back, and so is %sp.
    for i in 16..32 {
        assert_eq!(m.state.r[i], sentinel(i), "slot r{i}");
    }
    assert_eq!(m.state.r[14], sp);

    // The save area under the old %sp (stack-biased) holds the spills.
    for k in 0..16 {
        let addr = sp + STACK_BIAS + 8 * k as u64;
        assert_eq!(m.mem.read(addr, 8), sentinel(16 + k), "save slot {k}");
    }
}

#[test]
fn save_shifts_out_registers_into_the_new_window() {
    let mut m = Machine::new(0x1_0000, 8192);
    let sp = 0x1_0000 + 1024;
    m.state.r[14] = sp;
    m.state.r[8] = 0xaaaa; // %o0
    m.state.r[15] = 0xbbbb; // %o7

    let (block, _) = lift_words(&[SAVE], 0x1000);
    assert!(m.exec(&block).is_none());

    // %o0 -> %i0, %o7 -> %i7, and the new %sp reflects the frame.
    assert_eq!(m.state.r[24], 0xaaaa);
    assert_eq!(m.state.r[31], 0xbbbb);
    assert_eq!(m.state.r[14], sp - 176);
    // %i6 (the new frame pointer) is the caller's %sp.
    assert_eq!(m.state.r[30], sp);
}

#[test]
fn restore_shifts_in_registers_back_out() {
    let mut m = Machine::new(0x1_0000, 8192);
    let sp = 0x1_0000 + 1024;
    m.state.r[14] = sp;
    for i in 16..32 {
        m.state.r[i] = sentinel(i);
    }
    m.state.r[8] = 0x1234; // %o0, will travel o -> i -> o

    let (block, _) = lift_words(&[SAVE, RESTORE], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.r[8], 0x1234);
}

#[test]
fn save_computes_rd_with_old_window_sources() {
    let mut m = Machine::new(0x1_0000, 8192);
    let sp = 0x1_0000 + 2048;
    m.state.r[14] = sp;
    m.state.r[9] = 0x40; // %o1 in the old window

    // save %o1, 0x10, %l0: rs1 read before the flip, rd written after.
    let word = 2 << 30 | 16 << 25 | 0x3C << 19 | 9 << 14 | 1 << 13 | 0x10;
    let (block, _) = lift_words(&[word], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.r[16], 0x50);
}

#[test]
fn window_flip_emits_an_optimizer_fence() {
    let (block, _) = lift_words(&[SAVE], 0x1000);
    assert!(
        block.stmts.iter().any(|s| matches!(s, dbt_ir::Stmt::Fence)),
        "save must fence the window flip"
    );
}
