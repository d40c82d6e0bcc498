//! Delay-slot and annul behaviour, executed through the interpreter.

mod common;

use common::{Machine, lift_words};
use dbt_ir::JumpKind;

/// cmp %o0, %o1
const CMP_O0_O1: u32 = 0x80a2_0009;
/// mov 5, %o2 (or %g0, 5, %o2)
const MOV_5_O2: u32 = 0x9410_2005;
/// bne +16
const BNE_16: u32 = 0x1280_0004;
/// bne,a +16
const BNE_A_16: u32 = 0x3280_0004;
const NOP: u32 = 0x0100_0000;

#[test]
fn annulled_unconditional_branch_skips_the_delay_slot() {
    // At 0x1000, `ba,a 0x100c` followed by a nop that must never run.
    let mut m = Machine::new(0x1_0000, 64);
    let (block, res) = lift_words(&[0x3080_0003, NOP], 0x1000);

    assert_eq!(res.what_next, dbt_ir::WhatNext::StopHere);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.pc, 0x100c);
    assert_eq!(m.state.npc, 0x1010);
}

#[test]
fn taken_branch_runs_the_delay_slot_first() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 1;
    m.state.r[9] = 2; // NE holds

    // 0x1000 cmp; 0x1004 bne +16; 0x1008 mov 5, %o2 (delay)
    let (block, _) = lift_words(&[CMP_O0_O1, BNE_16, MOV_5_O2], 0x1000);
    let exit = m.exec(&block);

    // The delay-slot move committed before the transfer.
    assert_eq!(m.state.r[10], 5);
    assert_eq!(exit, Some(JumpKind::Boring));
    assert_eq!(m.state.pc, 0x1004 + 16);
}

#[test]
fn untaken_branch_still_runs_the_delay_slot() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 2;
    m.state.r[9] = 2; // NE fails

    let (block, _) = lift_words(&[CMP_O0_O1, BNE_16, MOV_5_O2], 0x1000);
    let exit = m.exec(&block);

    assert_eq!(exit, None);
    assert_eq!(m.state.r[10], 5);
    // Fall through past the delay slot.
    assert_eq!(m.state.pc, 0x100c);
    assert_eq!(m.state.npc, 0x1010);
}

#[test]
fn annulled_branch_not_taken_kills_the_delay_slot() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 2;
    m.state.r[9] = 2; // NE fails -> annulled

    let (block, _) = lift_words(&[CMP_O0_O1, BNE_A_16, MOV_5_O2], 0x1000);
    let exit = m.exec(&block);

    // The in-place exit on the negated condition skipped the move.
    assert_eq!(exit, Some(JumpKind::Boring));
    assert_eq!(m.state.r[10], 0);
    assert_eq!(m.state.pc, 0x1004 + 8);
}

#[test]
fn annulled_branch_taken_runs_the_delay_slot() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 1;
    m.state.r[9] = 2; // NE holds -> taken

    let (block, res) = lift_words(&[CMP_O0_O1, BNE_A_16, MOV_5_O2], 0x1000);
    let exit = m.exec(&block);

    assert_eq!(exit, None);
    assert_eq!(res.stop_kind, Some(JumpKind::Boring));
    assert_eq!(m.state.r[10], 5);
    assert_eq!(m.state.pc, 0x1004 + 16);
    assert_eq!(m.state.npc, 0x1004 + 20);
}

#[test]
fn branch_never_without_annul_is_a_prefetch_hint() {
    let mut m = Machine::new(0x1_0000, 64);
    // bn +16 (cond 0, annul 0); the delay slot runs as a normal insn.
    let bn = 0x0080_0004;
    let (block, _) = lift_words(&[bn, MOV_5_O2], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.r[10], 5);
    assert_eq!(m.state.pc, 0x1008);
}

#[test]
fn branch_on_register_contents() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 0;

    // brz %o0, +16; delay mov
    let (block, _) = lift_words(&[0x02ca_0004, MOV_5_O2], 0x1000);
    let exit = m.exec(&block);
    assert_eq!(exit, Some(JumpKind::Boring));
    assert_eq!(m.state.r[10], 5);
    assert_eq!(m.state.pc, 0x1010);
}

#[test]
fn call_links_and_stops_after_the_delay_slot() {
    let mut m = Machine::new(0x1_0000, 64);

    // 0x1000 call +0x40; 0x1004 mov 5, %o2 (delay)
    let (block, res) = lift_words(&[0x4000_0010, MOV_5_O2], 0x1000);
    assert!(m.exec(&block).is_none());

    assert_eq!(res.stop_kind, Some(JumpKind::Call));
    assert_eq!(m.state.r[15], 0x1000); // %o7 = call PC
    assert_eq!(m.state.r[10], 5);
    assert_eq!(m.state.pc, 0x1040);
    assert_eq!(m.state.npc, 0x1044);
}

#[test]
fn jmpl_is_a_register_jump_with_link() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[15] = 0x4000; // %o7

    // 0x2000 ret (jmpl %o7+8, %g0); 0x2004 nop (delay)
    let (block, res) = lift_words(&[0x81c3_e008, NOP], 0x2000);
    assert!(m.exec(&block).is_none());

    assert_eq!(res.stop_kind, Some(JumpKind::Ret));
    assert_eq!(m.state.pc, 0x4008);
    assert_eq!(m.state.npc, 0x400c);
}

#[test]
fn compare_and_branch_has_no_delay_slot() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 9;
    m.state.r[9] = 9;

    // cwbe %o0, %o1, +12; the next word must not execute.
    let (block, res) = lift_words(&[0x12c2_0069, MOV_5_O2], 0x1000);
    let exit = m.exec(&block);

    assert_eq!(res.len, 4);
    assert_eq!(exit, Some(JumpKind::Boring));
    assert_eq!(m.state.r[10], 0);
    assert_eq!(m.state.pc, 0x100c);
}

#[test]
fn compare_and_branch_falls_through_when_false() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[8] = 1;
    m.state.r[9] = 9;

    let (block, _) = lift_words(&[0x12c2_0069], 0x1000);
    assert!(m.exec(&block).is_none());
    assert_eq!(m.state.pc, 0x1004);
    assert_eq!(m.state.npc, 0x1008);
}

#[test]
fn fp_branch_tests_the_selected_fcc_field() {
    let mut m = Machine::new(0x1_0000, 64);
    // fcc0 = L (01): fbe must fall through, then the delay slot runs.
    m.state.fsr_fcc = 0b01 << 10;

    let (block, _) = lift_words(&[0x1348_0004, MOV_5_O2], 0x1000);
    let exit = m.exec(&block);
    assert_eq!(exit, None);
    assert_eq!(m.state.r[10], 5);

    // fcc0 = E (00): now it branches.
    let mut m = Machine::new(0x1_0000, 64);
    m.state.fsr_fcc = 0;
    let (block, _) = lift_words(&[0x1348_0004, MOV_5_O2], 0x1000);
    let exit = m.exec(&block);
    assert_eq!(exit, Some(JumpKind::Boring));
    assert_eq!(m.state.pc, 0x1010);
}

#[test]
fn trap_always_maps_to_the_syscall_stop() {
    let mut m = Machine::new(0x1_0000, 64);
    let (block, res) = lift_words(&[0x91d0_206d], 0x1000);
    assert!(m.exec(&block).is_none());

    assert_eq!(res.stop_kind, Some(JumpKind::Syscall));
    assert_eq!(m.state.pc, 0x1004);
    assert_eq!(m.state.npc, 0x1008);
}

#[test]
fn solaris_fast_trap_spills_the_number_into_o0() {
    let mut m = Machine::new(0x1_0000, 64);
    let code = common::words_to_bytes(&[0x91d0_2042]); // ta 0x42
    let (block, res) = {
        let mut block = dbt_ir::IrBlock::new();
        let res = {
            let mut lifter = guest_sparc64::Lifter::new(
                &mut block,
                common::arch(),
                common::abi_solaris(),
                100,
            );
            lifter.lift_instr(&code, 0, 0x1000)
        };
        (block, res)
    };
    assert!(m.exec(&block).is_none());
    assert_eq!(res.stop_kind, Some(JumpKind::FastTrap));
    assert_eq!(m.state.r[8], 0x42);
}

#[test]
fn conditional_trap_is_rejected() {
    let mut m = Machine::new(0x1_0000, 64);
    // te 0x6d (cond 1) at delta 0: becomes a native-escape block.
    let te = 0x83d0_206d;
    let (block, res) = lift_words(&[te], 0x1000);
    assert_eq!(res.stop_kind, Some(JumpKind::EmWarn));
    assert!(block.has_unrecognized);
    let _ = m;
}

#[test]
fn trailing_dcti_stops_the_block_one_early() {
    // With max_insns = 3, a branch at the would-be last slot must not
    // start: the block stops after the second instruction.
    let code = common::words_to_bytes(&[NOP, NOP, BNE_16, NOP]);
    let (_, res) = common::lift_block(&code, 0x1000, common::arch(), common::abi_linux(), 3);
    assert_eq!(res.what_next, dbt_ir::WhatNext::StopHere);
    assert_eq!(res.stop_kind, Some(JumpKind::Boring));
}
