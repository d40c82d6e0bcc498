//! The lowering dispatcher: one decoded instruction in, IR out.
//!
//! Lifting is driven per basic block: the block driver calls
//! [`Lifter::lift_instr`] once per instruction until the result says stop.
//! Two cross-instruction slots implement the delay-slot patterns:
//!
//! - `pending_exit`: a conditional exit stashed by a non-annulling
//!   conditional branch. The next call lifts the delay instruction, then
//!   appends the exit, so the delay slot's effects precede the transfer.
//! - `pending_next`: the branch target (and stop kind) stashed by an
//!   annulling conditional branch, a call, or a register jump. The next
//!   call lifts the delay instruction, then stops at the target.
//!
//! Both slots must be empty when a new block starts; leftovers from a prior
//! block are a caller bug and panic.

use std::cell::RefCell;

use bitflags::bitflags;
use dbt_ir::{
    DisResult, EmNote, Expr, IrBlock, JumpKind, Op, Stmt, WhatNext, binop, mk_u64,
};
use log::{trace, warn};
use thiserror::Error;

use crate::decode::{self, DecodeError, DecodedInsn, Mnemonic};
use crate::regs::{REG_G1, REG_O0, REG_O7};
use crate::state::offsets;

/// Instruction length; every SPARC64 instruction is four bytes.
pub(crate) const INSN_LENGTH: u64 = 4;

/// Escape-sequence preamble: `srax %g6, %g7, %g0`, an architectural no-op.
const MAGIC_PREAMBLE: u32 = 0x8139_9007;
/// `or %o0, %o1, %g0`: client request.
const MAGIC_CLIENT_REQUEST: u32 = 0x8012_0009;
/// `or %o1, %o2, %g0`: %o0 = NRADDR.
const MAGIC_NRADDR: u32 = 0x8012_400a;
/// `or %o2, %o3, %g0`: jump-and-link-to-noredir %g1.
const MAGIC_NOREDIR_JMPL: u32 = 0x8012_800b;
/// `or %o3, %o4, %g0`: IR injection.
const MAGIC_IR_INJECTION: u32 = 0x8012_c00c;

bitflags! {
    /// Hardware capabilities of the translated-for CPU generation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HwCaps: u32 {
        const VIS1 = 1 << 0;
        const VIS2 = 1 << 1;
        const VIS3 = 1 << 2;
        const SPARC4 = 1 << 3;
        const SPARC5 = 1 << 4;
        const SPARC6 = 1 << 5;
    }
}

bitflags! {
    /// ABI-level flags for the lifter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AbiFlags: u32 {
        /// Never route unrecognized instructions to the native escape.
        const NO_UNRECOGNIZED_FALLBACK = 1 << 0;
    }
}

/// Guest operating system; selects the trap-always syscall convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestOs {
    Linux,
    Solaris,
}

/// Host endianness as seen by the lifter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endness {
    Big,
    Little,
}

/// Architecture info for the translation target.
#[derive(Debug, Clone, Copy)]
pub struct ArchInfo {
    pub hwcaps: HwCaps,
    pub endness: Endness,
}

/// ABI info for the guest process.
#[derive(Debug, Clone, Copy)]
pub struct AbiInfo {
    pub os: GuestOs,
    pub flags: AbiFlags,
}

/// Family-level lift failure: a recognized opcode in a variant this
/// front-end does not support.
#[derive(Debug, Clone, Copy, Error)]
#[error("unsupported {0}")]
pub(crate) struct Unsupported(pub &'static str);

pub(crate) type LiftResult = Result<(), Unsupported>;

thread_local! {
    static IR_INJECTION: RefCell<Option<Vec<Stmt>>> = const { RefCell::new(None) };
}

/// Installs the statements the next IR-injection escape will splice into
/// its block. Thread-local, consumed per block.
pub fn set_ir_injection(stmts: Vec<Stmt>) {
    IR_INJECTION.with(|slot| *slot.borrow_mut() = Some(stmts));
}

/// The translation cursor for one block-lifting session.
pub struct Lifter<'a> {
    pub(crate) block: &'a mut IrBlock,
    pub(crate) arch: ArchInfo,
    pub(crate) abi: AbiInfo,
    /// Maximum instructions per block; used for the trailing-dCTI check.
    max_insns: u32,
    /// PC of the instruction currently being lifted.
    pub(crate) pc: u64,
    pub(crate) pending_exit: Option<Stmt>,
    pub(crate) pending_next: Option<(Expr, JumpKind)>,
}

impl<'a> Lifter<'a> {
    /// Starts a lifting session for one block.
    ///
    /// Fails hard on a little-endian host: the generated loads/stores are
    /// all big-endian and nothing else in the pipeline byte-swaps.
    #[must_use]
    pub fn new(block: &'a mut IrBlock, arch: ArchInfo, abi: AbiInfo, max_insns: u32) -> Lifter<'a> {
        assert!(
            arch.endness == Endness::Big,
            "SPARC64 front-end requires a big-endian host"
        );
        assert!(max_insns >= 2, "a block must fit a dCTI and its delay slot");
        Lifter {
            block,
            arch,
            abi,
            max_insns,
            pc: 0,
            pending_exit: None,
            pending_next: None,
        }
    }

    /// Lifts the instruction at byte offset `delta` of `code`, whose guest
    /// address is `pc`. Returns what the block driver should do next.
    pub fn lift_instr(&mut self, code: &[u8], delta: usize, pc: u64) -> DisResult {
        assert!(delta % 4 == 0, "misaligned instruction delta {delta}");
        assert!(pc % 4 == 0, "misaligned guest PC {pc:#x}");
        self.pc = pc;

        // Capture the slots the previous instruction left for us. At most
        // one may be set; both set means the session state is corrupt.
        let prev_exit = self.pending_exit.take();
        let prev_next = self.pending_next.take();
        assert!(
            !(prev_exit.is_some() && prev_next.is_some()),
            "both cross-instruction slots set"
        );
        let in_delay_slot = prev_exit.is_some() || prev_next.is_some();

        let word = read_word(code, delta);
        trace!("[{pc:#x}] {word:#010x}");

        let mut dres = DisResult::next_insn();

        let outcome = if word == MAGIC_PREAMBLE {
            self.lift_magic(code, delta, &mut dres)
        } else {
            match decode::decode(word) {
                Ok(insn) => self.dispatch(&insn, &mut dres).map_err(|u| {
                    trace!("[{pc:#x}] lift failed: {u}");
                    Fail::Escape
                }),
                Err(DecodeError::Unimplemented { .. }) => Err(Fail::Escape),
                Err(DecodeError::Unknown { .. }) => Err(Fail::Unknown),
            }
        };

        // Non-annulled delay slot: the branch's exit goes after the delay
        // instruction's statements, then the block stops at the fall-through.
        if let Some(exit) = prev_exit {
            dres.what_next = WhatNext::StopHere;
            dres.stop_kind = Some(JumpKind::Boring);
            self.stmt(exit);
            self.put_npc(mk_u64(pc + 2 * INSN_LENGTH));
            self.put_pc(mk_u64(pc + INSN_LENGTH));
        }

        // Annulled branch / call / jump: the exit is already in the block,
        // the delay instruction has run; stop at the recorded target.
        if let Some((tgt, kind)) = prev_next {
            dres.what_next = WhatNext::StopHere;
            dres.stop_kind = Some(kind);
            self.put_npc(binop(Op::Add64, tgt.clone(), mk_u64(INSN_LENGTH)));
            self.put_pc(tgt);
        }

        match outcome {
            Ok(()) => {
                if dres.what_next == WhatNext::Continue {
                    // A dCTI lifted just now redirects the fall-through NPC
                    // to its target; the delay instruction comes next.
                    if let Some((tgt, _)) = &self.pending_next {
                        let tgt = tgt.clone();
                        self.put_npc(tgt);
                        self.put_pc(mk_u64(pc + INSN_LENGTH));
                    } else {
                        let next = pc + u64::from(dres.len);
                        self.put_npc(mk_u64(next + INSN_LENGTH));
                        self.put_pc(mk_u64(next));
                    }

                    // If the next instruction would be the last one of this
                    // block and is a delayed CTI, stop now: a branch and its
                    // delay slot must never split across blocks.
                    let insns_done = (delta as u64 + INSN_LENGTH) / INSN_LENGTH;
                    if u64::from(self.max_insns - 1) == insns_done
                        && dres.len == 4
                        && self.pending_exit.is_none()
                        && self.pending_next.is_none()
                        && delta + 8 <= code.len()
                    {
                        let next_word = read_word(code, delta + 4);
                        if let Ok(next) = decode::decode(next_word) {
                            if next.mnemonic.is_dcti() {
                                dres.what_next = WhatNext::StopHere;
                                dres.stop_kind = Some(JumpKind::Boring);
                            }
                        }
                    }
                }
                dres
            }
            Err(fail) => self.lift_failure(word, delta, fail, in_delay_slot),
        }
    }

    fn dispatch(&mut self, insn: &DecodedInsn, dres: &mut DisResult) -> LiftResult {
        use Mnemonic as M;

        match insn.mnemonic {
            M::Add
            | M::AddCc
            | M::AddC
            | M::AddCCc
            | M::AddXC
            | M::AddXCcc
            | M::BMask
            | M::Mulx
            | M::Sdivx
            | M::Udivx
            | M::Sdiv
            | M::SdivCc
            | M::Smul
            | M::SmulCc
            | M::Sub
            | M::SubCc
            | M::SubC
            | M::SubCCc
            | M::Udiv
            | M::UdivCc
            | M::Umul
            | M::UmulCc
            | M::UmulXhi => self.lift_arith(insn),
            M::And
            | M::AndCc
            | M::AndN
            | M::AndNCc
            | M::Or
            | M::OrCc
            | M::OrN
            | M::OrNCc
            | M::Xor
            | M::XorCc
            | M::Xnor
            | M::XnorCc => self.lift_logic(insn),
            M::Sll | M::Srl | M::Sra | M::Sllx | M::Srlx | M::Srax => self.lift_shift(insn),
            M::Sethi => self.lift_sethi(insn),
            M::Nop | M::FlushW | M::Prefetch | M::PrefetchA => Ok(()),
            M::Bicc | M::BPcc => self.lift_bicc_bpcc(insn, dres),
            M::BPr => self.lift_bpr(insn),
            M::FBPfcc => self.lift_fbpfcc(insn, dres),
            M::CwBCond | M::CxBCond => self.lift_cbcond(insn, dres),
            M::Call => self.lift_call(insn),
            M::Jmpl => self.lift_jmpl(insn),
            M::Return => self.lift_return(insn),
            M::Tcc => self.lift_trap(insn, dres),
            M::Save | M::Restore => self.lift_save_restore(insn),
            M::Membar => {
                self.stmt(Stmt::Fence);
                Ok(())
            }
            M::Flush => self.lift_flush(insn, dres),
            M::Ldsb | M::Ldsh | M::Ldsw | M::Ldub | M::Lduh | M::Lduw | M::Ldx => {
                self.lift_load(insn, false, false)
            }
            M::LdsbA | M::LdshA | M::LdswA | M::LdubA | M::LduhA | M::LduwA | M::LdxA => {
                self.lift_load(insn, true, false)
            }
            M::Ldf | M::Lddf | M::Ldqf => self.lift_load(insn, false, true),
            M::LdBlockF => self.lift_load_block(insn),
            M::LdShortF => self.lift_load_short_float(insn),
            M::LdFsr | M::LdxFsr => self.lift_ldfsr(insn),
            M::Stb | M::Sth | M::Stw | M::Stx => self.lift_store(insn, false, false),
            M::StbA | M::SthA | M::StwA | M::StxA => self.lift_store(insn, true, false),
            M::Stf | M::Stdf | M::Stqf => self.lift_store(insn, false, true),
            M::StFsr | M::StxFsr => self.lift_stfsr(insn),
            M::Ldstub => self.lift_ldstub(insn),
            M::Swap => self.lift_swap(insn),
            M::Casa | M::Casxa => self.lift_cas(insn),
            M::RdAsr => self.lift_rdasr(insn),
            M::WrAsr => self.lift_wrasr(insn),
            M::MovCc => self.lift_movcc(insn),
            M::MovR => self.lift_movr(insn),
            M::MovSToSw | M::MovSToUw | M::MovDToX => self.lift_mov_f_to_i(insn),
            M::MovWToS | M::MovXToD => self.lift_mov_i_to_f(insn),
            M::FMovS | M::FMovD | M::FMovQ => self.lift_fmov(insn),
            M::FNegS | M::FNegD | M::FNegQ | M::FAbsS | M::FAbsD | M::FAbsQ => {
                self.lift_fabs_fneg(insn)
            }
            M::FSqrtS | M::FSqrtD | M::FSqrtQ => self.lift_fsqrt(insn),
            M::FAddS
            | M::FAddD
            | M::FAddQ
            | M::FSubS
            | M::FSubD
            | M::FSubQ
            | M::FMulS
            | M::FMulD
            | M::FMulQ
            | M::FsMulD
            | M::FdMulQ
            | M::FDivS
            | M::FDivD
            | M::FDivQ => self.lift_farith(insn),
            M::FCmpS | M::FCmpD | M::FCmpQ | M::FCmpES | M::FCmpED | M::FCmpEQ => {
                self.lift_fcmp(insn)
            }
            M::FsToD | M::FsToQ | M::FdToS | M::FdToQ | M::FqToS | M::FqToD => {
                self.lift_fpconvert(insn)
            }
            M::FsToX | M::FdToX | M::FqToX | M::FsToI | M::FdToI | M::FqToI => {
                self.lift_f_to_int(insn)
            }
            M::FxToS | M::FxToD | M::FxToQ => self.lift_x_to_f(insn),
            M::FiToS | M::FiToD | M::FiToQ => self.lift_i_to_f(insn),
            M::FMAddS | M::FMAddD | M::FMSubS | M::FMSubD => self.lift_fmaf(insn),
            // Negated-FMA would need sign games that skew cexc; refuse.
            M::FNMAddS | M::FNMAddD | M::FNMSubS | M::FNMSubD => {
                Err(Unsupported("negated fused multiply-add"))
            }
            M::FMovCcS | M::FMovCcD | M::FMovCcQ => self.lift_fmovcc(insn),
            M::AlignAddress => self.lift_alignaddress(insn),
            M::FAlignData => self.lift_faligndata(insn),
            M::BShuffle => self.lift_bshuffle(insn),
            M::FZeroS | M::FZeroD | M::FOneS | M::FOneD => self.lift_fzero_fone(insn),
            M::FSrc1S | M::FSrc1D | M::FSrc2S | M::FSrc2D | M::FNot1S | M::FNot1D | M::FNot2S
            | M::FNot2D => self.lift_fsrc(insn),
            M::FOrS | M::FOrD | M::FNorS | M::FNorD | M::FAndS | M::FAndD | M::FNandS
            | M::FNandD | M::FXorS | M::FXorD | M::FXnorS | M::FXnorD | M::FOrNot1S
            | M::FOrNot1D | M::FOrNot2S | M::FOrNot2D | M::FAndNot1S | M::FAndNot1D
            | M::FAndNot2S | M::FAndNot2D => self.lift_flogic(insn),
            M::FSll16 | M::FSrl16 | M::FSll32 | M::FSrl32 | M::FSlas16 | M::FSra16 | M::FSlas32
            | M::FSra32 => self.lift_fshift(insn),
            M::Lzcnt => self.lift_lzcnt(insn),
            M::AesERound01
            | M::AesERound23
            | M::AesDRound01
            | M::AesDRound23
            | M::AesERound01L
            | M::AesERound23L
            | M::AesDRound01L
            | M::AesDRound23L => self.lift_aes_round(insn),
            M::AesKexpand0 | M::AesKexpand2 => self.lift_aes_kexpand(insn),
            M::AesKexpand1 => self.lift_aes_kexpand_rcon(insn),
            M::Md5 | M::Sha1 | M::Sha256 | M::Sha512 => self.lift_hash(insn),
            M::XmulX | M::XmulXHi => self.lift_xmulx(insn),
        }
    }

    /// Handles the four recognized escape sequences after the preamble.
    fn lift_magic(&mut self, code: &[u8], delta: usize, dres: &mut DisResult) -> Result<(), Fail> {
        let pc = self.pc;
        if delta + 8 > code.len() {
            return Err(Fail::Unknown);
        }
        let follower = read_word(code, delta + 4);
        match follower {
            MAGIC_CLIENT_REQUEST => {
                trace!("%o0 = client_request ( %o1 )");
                self.put_npc(mk_u64(pc + 3 * INSN_LENGTH));
                self.put_pc(mk_u64(pc + 2 * INSN_LENGTH));
                dres.len = 8;
                dres.what_next = WhatNext::StopHere;
                dres.stop_kind = Some(JumpKind::ClientReq);
            }
            MAGIC_NRADDR => {
                trace!("%o0 = guest_NRADDR");
                let nraddr = Expr::Get {
                    offset: offsets::NRADDR,
                    ty: dbt_ir::Ty::I64,
                };
                self.put_ireg(REG_O0, nraddr);
                dres.len = 8;
            }
            MAGIC_NOREDIR_JMPL => {
                trace!("jump-and-link-to-noredir %g1");
                // The wrapped function returns with `%i7 + 8`, so the
                // return address must be the preamble itself.
                self.put_ireg(REG_O7, mk_u64(pc));
                let g1 = self.get_ireg(REG_G1);
                let target = self.bind(dbt_ir::Ty::I64, g1);
                self.put_npc(binop(Op::Add64, target.clone(), mk_u64(INSN_LENGTH)));
                self.put_pc(target);
                dres.len = 8;
                dres.what_next = WhatNext::StopHere;
                dres.stop_kind = Some(JumpKind::NoRedir);
            }
            MAGIC_IR_INJECTION => {
                trace!("IR injection");
                let injected = IR_INJECTION.with(|slot| slot.borrow_mut().take());
                let Some(stmts) = injected else {
                    panic!("IR-injection escape hit with no injected IR installed");
                };
                for st in stmts {
                    self.stmt(st);
                }
                self.stmt(Stmt::Put {
                    offset: offsets::CMSTART,
                    data: mk_u64(pc),
                });
                self.stmt(Stmt::Put {
                    offset: offsets::CMLEN,
                    data: mk_u64(2 * INSN_LENGTH),
                });
                self.put_npc(mk_u64(pc + 3 * INSN_LENGTH));
                self.put_pc(mk_u64(pc + 2 * INSN_LENGTH));
                dres.len = 8;
                dres.what_next = WhatNext::StopHere;
                dres.stop_kind = Some(JumpKind::InvalICache);
            }
            _ => {
                // Nothing else may follow the preamble.
                return Err(Fail::Unknown);
            }
        }
        Ok(())
    }

    /// Decode/lift failure handling: route eligible instructions to the
    /// native escape, everything else to a no-decode stop.
    fn lift_failure(&mut self, word: u32, delta: usize, fail: Fail, in_delay_slot: bool) -> DisResult {
        let pc = self.pc;
        let escape_ok = fail == Fail::Escape
            && !in_delay_slot
            && !self.abi.flags.contains(AbiFlags::NO_UNRECOGNIZED_FALLBACK);

        if escape_ok {
            if delta == 0 {
                // The marker must sit in a block of its own; report an
                // emulation warning alongside it.
                warn!("unrecognized SPARC64 instruction {word:#010x}, running natively");
                self.stmt(Stmt::Put {
                    offset: offsets::EMNOTE,
                    data: dbt_ir::mk_u32(EmNote::HandlingUnrecognized as u32),
                });
                self.stmt(Stmt::Unrecognized(word));
                self.block.has_unrecognized = true;
                self.put_npc(mk_u64(pc + 2 * INSN_LENGTH));
                self.put_pc(mk_u64(pc + INSN_LENGTH));
                return DisResult {
                    len: INSN_LENGTH as u32,
                    what_next: WhatNext::StopHere,
                    stop_kind: Some(JumpKind::EmWarn),
                    continue_at: None,
                };
            }
            // Not at a block boundary: back up so the next block starts
            // exactly at this instruction.
            return DisResult {
                len: INSN_LENGTH as u32,
                what_next: WhatNext::BackUp,
                stop_kind: Some(JumpKind::Boring),
                continue_at: None,
            };
        }

        warn!("cannot decode SPARC64 instruction {word:#010x} at {pc:#x}");

        // Tell the dispatcher these bytes have not been executed and are
        // the next to execute.
        self.put_npc(mk_u64(pc + INSN_LENGTH));
        self.put_pc(mk_u64(pc));
        DisResult {
            len: 0,
            what_next: WhatNext::StopHere,
            stop_kind: Some(JumpKind::NoDecode),
            continue_at: None,
        }
    }

}

/// Why a lift failed, and whether the native escape may pick it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fail {
    Unknown,
    Escape,
}

fn read_word(code: &[u8], delta: usize) -> u32 {
    let bytes: [u8; 4] = code[delta..delta + 4]
        .try_into()
        .expect("instruction buffer too short");
    u32::from_be_bytes(bytes)
}
