//! The in-guest escape sequence: preamble recognition and the four
//! follower behaviours.

mod common;

use common::{Machine, lift_words};
use dbt_ir::{JumpKind, Stmt, WhatNext, mk_u64};
use guest_sparc64::state::offsets;

/// srax %g6, %g7, %g0
const PREAMBLE: u32 = 0x8139_9007;
/// or %o0, %o1, %g0
const CLIENT_REQUEST: u32 = 0x8012_0009;
/// or %o1, %o2, %g0
const NRADDR: u32 = 0x8012_400a;
/// or %o2, %o3, %g0
const NOREDIR_JMPL: u32 = 0x8012_800b;
/// or %o3, %o4, %g0
const IR_INJECTION: u32 = 0x8012_c00c;

#[test]
fn client_request_stops_with_pc_past_the_pair() {
    let mut m = Machine::new(0x1_0000, 64);
    let (block, res) = lift_words(&[PREAMBLE, CLIENT_REQUEST], 0x1000);
    assert!(m.exec(&block).is_none());

    assert_eq!(res.len, 8);
    assert_eq!(res.what_next, WhatNext::StopHere);
    assert_eq!(res.stop_kind, Some(JumpKind::ClientReq));
    assert_eq!(m.state.pc, 0x1008);
    assert_eq!(m.state.npc, 0x100c);
}

#[test]
fn nraddr_reads_into_o0_and_continues() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.nraddr = 0xcafe_f00d;

    let (block, res) = lift_words(&[PREAMBLE, NRADDR], 0x1000);
    assert!(m.exec(&block).is_none());

    assert_eq!(res.len, 8);
    assert_eq!(res.what_next, WhatNext::Continue);
    assert_eq!(m.state.r[8], 0xcafe_f00d);
    assert_eq!(m.state.pc, 0x1008);
    assert_eq!(m.state.npc, 0x100c);
}

#[test]
fn noredir_jmpl_links_the_preamble_address() {
    let mut m = Machine::new(0x1_0000, 64);
    m.state.r[1] = 0x4000; // %g1 holds the target

    let (block, res) = lift_words(&[PREAMBLE, NOREDIR_JMPL], 0x1000);
    assert!(m.exec(&block).is_none());

    assert_eq!(res.stop_kind, Some(JumpKind::NoRedir));
    // The wrapped callee returns with %i7 + 8, so %o7 must be the
    // preamble address itself.
    assert_eq!(m.state.r[15], 0x1000);
    assert_eq!(m.state.pc, 0x4000);
    assert_eq!(m.state.npc, 0x4004);
}

#[test]
fn ir_injection_splices_installed_statements() {
    let mut m = Machine::new(0x1_0000, 64);
    guest_sparc64::set_ir_injection(vec![Stmt::Put {
        offset: offsets::r(5),
        data: mk_u64(77),
    }]);

    let (block, res) = lift_words(&[PREAMBLE, IR_INJECTION], 0x1000);
    assert!(m.exec(&block).is_none());

    assert_eq!(res.stop_kind, Some(JumpKind::InvalICache));
    assert_eq!(m.state.r[5], 77);
    // The injected range is flagged for translation invalidation.
    assert_eq!(m.state.cmstart, 0x1000);
    assert_eq!(m.state.cmlen, 8);
    assert_eq!(m.state.pc, 0x1008);
}

#[test]
fn unknown_follower_is_a_decode_failure() {
    let mut m = Machine::new(0x1_0000, 64);
    let (block, res) = lift_words(&[PREAMBLE, 0xdead_beef], 0x1000);
    m.exec(&block);

    assert_eq!(res.len, 0);
    assert_eq!(res.stop_kind, Some(JumpKind::NoDecode));
    // The bytes read as not-yet-executed.
    assert_eq!(m.state.pc, 0x1000);
    assert_eq!(m.state.npc, 0x1004);
}

#[test]
fn preamble_bytes_match_the_documented_sequence() {
    assert_eq!(PREAMBLE.to_be_bytes(), [0x81, 0x39, 0x90, 0x07]);
}
