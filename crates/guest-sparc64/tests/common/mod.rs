//! Test support: a block-lifting driver and a small interpreter for the IR
//! subset the front-end emits.
//!
//! The interpreter executes lifted blocks directly against a `GuestState`
//! and a flat big-endian test memory, with clean-helper calls routed to the
//! crate's helper runtime. It understands the integer, memory, window,
//! compare-and-swap and F32/F64 subsets; everything a test would need a
//! SPARC64 host for (F128 arithmetic, hardware crypto) panics.

#![allow(dead_code)] // each integration test uses a different slice of this

use dbt_ir::{
    CleanHelper, Const, DisResult, Expr, IrBlock, JumpKind, Op, RoundMode, Stmt, Ty, WhatNext,
    fcmp,
};
use guest_sparc64::state::offsets;
use guest_sparc64::{
    AbiFlags, AbiInfo, ArchInfo, Endness, GuestState, GuestOs, HwCaps, Lifter, helpers,
};

/// Default architecture for tests: big-endian with the full feature set.
pub fn arch() -> ArchInfo {
    ArchInfo {
        hwcaps: HwCaps::VIS1 | HwCaps::VIS2 | HwCaps::VIS3 | HwCaps::SPARC4,
        endness: Endness::Big,
    }
}

/// Architecture with no optional features.
pub fn arch_base() -> ArchInfo {
    ArchInfo {
        hwcaps: HwCaps::empty(),
        endness: Endness::Big,
    }
}

pub fn abi_linux() -> AbiInfo {
    AbiInfo {
        os: GuestOs::Linux,
        flags: AbiFlags::empty(),
    }
}

pub fn abi_solaris() -> AbiInfo {
    AbiInfo {
        os: GuestOs::Solaris,
        flags: AbiFlags::empty(),
    }
}

/// Encodes instruction words as the big-endian byte buffer the lifter eats.
pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Drives the lifter over a code buffer until the block ends, mirroring the
/// block-building driver. Returns the finished block and the last result.
pub fn lift_block(
    code: &[u8],
    pc: u64,
    arch: ArchInfo,
    abi: AbiInfo,
    max_insns: u32,
) -> (IrBlock, DisResult) {
    let mut block = IrBlock::new();
    let last = {
        let mut lifter = Lifter::new(&mut block, arch, abi, max_insns);
        let mut delta = 0usize;
        loop {
            let res = lifter.lift_instr(code, delta, pc + delta as u64);
            match res.what_next {
                WhatNext::Continue => {
                    delta += res.len as usize;
                    if delta >= code.len() {
                        break res;
                    }
                }
                _ => break res,
            }
        }
    };
    (block, last)
}

/// Convenience wrapper over [`lift_block`] for word slices.
pub fn lift_words(words: &[u32], pc: u64) -> (IrBlock, DisResult) {
    lift_block(&words_to_bytes(words), pc, arch(), abi_linux(), 100)
}

/// Flat big-endian test memory.
pub struct TestMem {
    pub base: u64,
    pub data: Vec<u8>,
}

impl TestMem {
    pub fn new(base: u64, size: usize) -> TestMem {
        TestMem {
            base,
            data: vec![0; size],
        }
    }

    fn index(&self, addr: u64, size: usize) -> usize {
        let off = addr.checked_sub(self.base).expect("address below memory base") as usize;
        assert!(off + size <= self.data.len(), "address {addr:#x} out of range");
        off
    }

    pub fn read(&self, addr: u64, size: usize) -> u64 {
        let off = self.index(addr, size);
        let mut v = 0u64;
        for b in &self.data[off..off + size] {
            v = v << 8 | u64::from(*b);
        }
        v
    }

    pub fn write(&mut self, addr: u64, size: usize, value: u64) {
        let off = self.index(addr, size);
        for i in 0..size {
            self.data[off + i] = (value >> (8 * (size - 1 - i))) as u8;
        }
    }
}

/// A runtime value; integers of all widths travel masked in `I`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I(u64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn as_u64(self) -> u64 {
        match self {
            Value::I(v) => v,
            Value::F32(f) => u64::from(f.to_bits()),
            Value::F64(f) => f.to_bits(),
        }
    }

    fn as_f32(self) -> f32 {
        match self {
            Value::F32(f) => f,
            Value::I(v) => f32::from_bits(v as u32),
            Value::F64(_) => panic!("F64 where F32 expected"),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Value::F64(f) => f,
            Value::I(v) => f64::from_bits(v),
            Value::F32(_) => panic!("F32 where F64 expected"),
        }
    }
}

/// Guest state plus memory: enough machine to run lifted blocks.
pub struct Machine {
    pub state: GuestState,
    pub mem: TestMem,
}

impl Machine {
    pub fn new(mem_base: u64, mem_size: usize) -> Machine {
        Machine {
            state: GuestState::new(),
            mem: TestMem::new(mem_base, mem_size),
        }
    }

    /// Reads a guest-state byte range, honouring the FP aliasing rules
    /// (a double register is the big-endian concatenation of its singles).
    pub fn read_state(&self, off: usize, size: usize) -> u64 {
        let f_base = offsets::F_BASE;
        let d_base = offsets::D_BASE;
        if off >= f_base && off < d_base {
            let k = (off - f_base) / 4;
            match size {
                4 => u64::from(self.state.f[k]),
                8 => u64::from(self.state.f[k]) << 32 | u64::from(self.state.f[k + 1]),
                _ => panic!("bad FP-bank read size {size}"),
            }
        } else if off >= d_base && off < d_base + 16 * 8 {
            assert_eq!(size, 8);
            self.state.d[(off - d_base) / 8]
        } else {
            let bytes = bytemuck::bytes_of(&self.state);
            match size {
                4 => u64::from(u32::from_ne_bytes(
                    bytes[off..off + 4].try_into().expect("aligned"),
                )),
                8 => u64::from_ne_bytes(bytes[off..off + 8].try_into().expect("aligned")),
                _ => panic!("bad state read size {size}"),
            }
        }
    }

    pub fn write_state(&mut self, off: usize, size: usize, value: u64) {
        let f_base = offsets::F_BASE;
        let d_base = offsets::D_BASE;
        if off >= f_base && off < d_base {
            let k = (off - f_base) / 4;
            match size {
                4 => self.state.f[k] = value as u32,
                8 => {
                    self.state.f[k] = (value >> 32) as u32;
                    self.state.f[k + 1] = value as u32;
                }
                _ => panic!("bad FP-bank write size {size}"),
            }
        } else if off >= d_base && off < d_base + 16 * 8 {
            assert_eq!(size, 8);
            self.state.d[(off - d_base) / 8] = value;
        } else {
            let bytes = bytemuck::bytes_of_mut(&mut self.state);
            match size {
                4 => bytes[off..off + 4].copy_from_slice(&(value as u32).to_ne_bytes()),
                8 => bytes[off..off + 8].copy_from_slice(&value.to_ne_bytes()),
                _ => panic!("bad state write size {size}"),
            }
        }
    }

    /// Executes one lifted block. Returns the stop kind of a taken side
    /// exit, or `None` when the block runs to its end.
    pub fn exec(&mut self, block: &IrBlock) -> Option<JumpKind> {
        let mut temps: Vec<Option<Value>> = vec![None; block.temp_count()];

        for st in &block.stmts {
            match st {
                Stmt::WrTmp { tmp, data } => {
                    let v = self.eval(data, &temps);
                    temps[tmp.0 as usize] = Some(v);
                }
                Stmt::Put { offset, data } => {
                    let v = self.eval(data, &temps);
                    let size = match data_ty(data, block, &temps) {
                        Ty::I32 | Ty::F32 => 4,
                        _ => 8,
                    };
                    self.write_state(*offset, size, v.as_u64());
                }
                Stmt::Store { addr, data } | Stmt::StoreA { addr, data, .. } => {
                    let a = self.eval(addr, &temps).as_u64();
                    let v = self.eval(data, &temps);
                    let size = match data_ty(data, block, &temps) {
                        Ty::I8 => 1,
                        Ty::I16 => 2,
                        Ty::I32 | Ty::F32 => 4,
                        _ => 8,
                    };
                    self.mem.write(a, size, v.as_u64());
                }
                Stmt::Cas(cas) => {
                    let size = match cas.ty {
                        Ty::I8 => 1,
                        Ty::I16 => 2,
                        Ty::I32 => 4,
                        Ty::I64 => 8,
                        _ => panic!("bad CAS type"),
                    };
                    let a = self.eval(&cas.addr, &temps).as_u64();
                    let expected = self.eval(&cas.expected, &temps).as_u64();
                    let new = self.eval(&cas.new, &temps).as_u64();
                    let cur = self.mem.read(a, size);
                    temps[cas.old.0 as usize] = Some(Value::I(cur));
                    if cur == expected {
                        self.mem.write(a, size, new);
                    }
                }
                Stmt::Exit {
                    guard,
                    kind,
                    dst,
                    ip_offset,
                } => {
                    if self.eval(guard, &temps).as_u64() & 1 != 0 {
                        self.write_state(*ip_offset, 8, *dst);
                        return Some(*kind);
                    }
                }
                Stmt::Fence => {}
                Stmt::Dirty(call) => panic!("dirty helper {:?} in interpreted block", call.helper),
                Stmt::Unrecognized(word) => {
                    panic!("native-escape marker {word:#010x} in interpreted block")
                }
            }
        }
        None
    }

    fn eval(&self, e: &Expr, temps: &[Option<Value>]) -> Value {
        match e {
            Expr::Const(c) => Value::I(match c {
                Const::U1(b) => u64::from(*b),
                Const::U8(v) => u64::from(*v),
                Const::U32(v) => u64::from(*v),
                Const::U64(v) => *v,
            }),
            Expr::Tmp(t) => temps[t.0 as usize].expect("read of unset temp"),
            Expr::Get { offset, ty } => {
                let size = match ty {
                    Ty::I32 | Ty::F32 => 4,
                    Ty::I64 | Ty::F64 => 8,
                    _ => panic!("bad Get type {ty:?}"),
                };
                let raw = self.read_state(*offset, size);
                match ty {
                    Ty::F32 => Value::F32(f32::from_bits(raw as u32)),
                    Ty::F64 => Value::F64(f64::from_bits(raw)),
                    _ => Value::I(raw),
                }
            }
            Expr::Load { ty, addr } | Expr::LoadA { ty, addr, .. } => {
                let a = self.eval(addr, temps).as_u64();
                let (size, fp) = match ty {
                    Ty::I8 => (1, false),
                    Ty::I16 => (2, false),
                    Ty::I32 => (4, false),
                    Ty::I64 => (8, false),
                    Ty::F32 => (4, true),
                    Ty::F64 => (8, true),
                    _ => panic!("bad load type {ty:?}"),
                };
                let raw = self.mem.read(a, size);
                if fp {
                    if size == 4 {
                        Value::F32(f32::from_bits(raw as u32))
                    } else {
                        Value::F64(f64::from_bits(raw))
                    }
                } else {
                    Value::I(raw)
                }
            }
            Expr::Unop(op, a) => {
                let a = self.eval(a, temps);
                eval_unop(*op, a)
            }
            Expr::Binop(op, a, b) => {
                let a = self.eval(a, temps);
                let b = self.eval(b, temps);
                eval_binop(*op, a, b)
            }
            Expr::Triop(op, a, b, c) => {
                let a = self.eval(a, temps);
                let b = self.eval(b, temps);
                let c = self.eval(c, temps);
                eval_triop(*op, a, b, c)
            }
            Expr::Qop(op, a, b, c, d) => {
                let a = self.eval(a, temps);
                let b = self.eval(b, temps);
                let c = self.eval(c, temps);
                let d = self.eval(d, temps);
                eval_qop(*op, a, b, c, d)
            }
            Expr::Ite {
                cond,
                iftrue,
                iffalse,
            } => {
                if self.eval(cond, temps).as_u64() & 1 != 0 {
                    self.eval(iftrue, temps)
                } else {
                    self.eval(iffalse, temps)
                }
            }
            Expr::Call(call) => {
                let args: Vec<u64> = call
                    .args
                    .iter()
                    .map(|a| self.eval(a, temps).as_u64())
                    .collect();
                Value::I(eval_helper(call.helper, &args))
            }
        }
    }
}

/// Best-effort type of a statement operand, for sizing puts/stores. Only
/// the cases the lifter produces need answers.
fn data_ty(e: &Expr, block: &IrBlock, _temps: &[Option<Value>]) -> Ty {
    match e {
        Expr::Const(Const::U32(_)) => Ty::I32,
        Expr::Const(_) => Ty::I64,
        Expr::Tmp(t) => block.ty_of(*t),
        Expr::Get { ty, .. } | Expr::Load { ty, .. } | Expr::LoadA { ty, .. } => *ty,
        Expr::Unop(op, _) => unop_ty(*op),
        Expr::Binop(op, ..) | Expr::Triop(op, ..) | Expr::Qop(op, ..) => binop_ty(*op),
        Expr::Ite { iftrue, .. } => data_ty(iftrue, block, _temps),
        Expr::Call(call) => call.ret_ty,
    }
}

fn unop_ty(op: Op) -> Ty {
    use Op::*;
    match op {
        Trunc64To8 => Ty::I8,
        Trunc64To16 => Ty::I16,
        Trunc64To32 => Ty::I32,
        Trunc64To1 => Ty::I1,
        ReinterpI32AsF32 => Ty::F32,
        ReinterpI64AsF64 => Ty::F64,
        ReinterpF32AsI32 => Ty::I32,
        ReinterpF64AsI64 => Ty::I64,
        AbsF32 | NegF32 | NotF32 => Ty::F32,
        AbsF64 | NegF64 | NotF64 | F32ToF64 | I32SToF64 => Ty::F64,
        Not1 => Ty::I1,
        _ => Ty::I64,
    }
}

fn binop_ty(op: Op) -> Ty {
    use Op::*;
    match op {
        Shr32 | Sar32 | CmpF32 | CmpF64 | F32ToI32S | F64ToI32S => Ty::I32,
        AddF32 | SubF32 | MulF32 | DivF32 | SqrtF32 | MAddF32 | MSubF32 | F64ToF32 | I32SToF32
        | I64SToF32 => Ty::F32,
        AddF64 | SubF64 | MulF64 | DivF64 | SqrtF64 | MAddF64 | MSubF64 | MullF32 | I64SToF64
        | AlignF64 | ShuffleF64 => Ty::F64,
        CmpEq64 | CmpNe64 | CmpLt64S | CmpLe64S | CmpNe32 => Ty::I1,
        _ => Ty::I64,
    }
}

fn eval_unop(op: Op, a: Value) -> Value {
    use Op::*;
    let v = a.as_u64();
    match op {
        Not64 => Value::I(!v),
        Not1 => Value::I(v ^ 1),
        Clz64 => Value::I(u64::from(v.leading_zeros())),
        Uext8 => Value::I(v & 0xff),
        Sext8 => Value::I(v as u8 as i8 as i64 as u64),
        Uext16 => Value::I(v & 0xffff),
        Sext16 => Value::I(v as u16 as i16 as i64 as u64),
        Uext32 => Value::I(v & 0xffff_ffff),
        Sext32 => Value::I(v as u32 as i32 as i64 as u64),
        Bool1To64 => Value::I(v & 1),
        Trunc64To32 => Value::I(v & 0xffff_ffff),
        Trunc64To16 => Value::I(v & 0xffff),
        Trunc64To8 => Value::I(v & 0xff),
        Trunc64To1 => Value::I(v & 1),
        ReinterpF32AsI32 => Value::I(u64::from((a.as_f32()).to_bits())),
        ReinterpI32AsF32 => Value::F32(f32::from_bits(v as u32)),
        ReinterpF64AsI64 => Value::I(a.as_f64().to_bits()),
        ReinterpI64AsF64 => Value::F64(f64::from_bits(v)),
        AbsF32 => Value::F32(f32::from_bits(a.as_f32().to_bits() & 0x7fff_ffff)),
        AbsF64 => Value::F64(f64::from_bits(a.as_f64().to_bits() & !(1u64 << 63))),
        NegF32 => Value::F32(f32::from_bits(a.as_f32().to_bits() ^ 0x8000_0000)),
        NegF64 => Value::F64(f64::from_bits(a.as_f64().to_bits() ^ 1 << 63)),
        NotF32 => Value::F32(f32::from_bits(!a.as_f32().to_bits())),
        NotF64 => Value::F64(f64::from_bits(!a.as_f64().to_bits())),
        F32ToF64 => Value::F64(f64::from(a.as_f32())),
        I32SToF64 => Value::F64(f64::from(v as u32 as i32)),
        _ => panic!("interpreter: unhandled unop {op:?}"),
    }
}

fn fcmp_bits(ord: Option<std::cmp::Ordering>) -> u64 {
    use std::cmp::Ordering::*;
    u64::from(match ord {
        Some(Equal) => fcmp::EQ,
        Some(Less) => fcmp::LT,
        Some(Greater) => fcmp::GT,
        None => fcmp::UN,
    })
}

fn eval_binop(op: Op, a: Value, b: Value) -> Value {
    use Op::*;
    let (x, y) = (a.as_u64(), b.as_u64());
    match op {
        Add64 => Value::I(x.wrapping_add(y)),
        Sub64 => Value::I(x.wrapping_sub(y)),
        Mul64 => Value::I(x.wrapping_mul(y)),
        MulHiU64 => Value::I(((u128::from(x) * u128::from(y)) >> 64) as u64),
        DivS64 => Value::I(((x as i64).wrapping_div(y as i64)) as u64),
        DivU64 => Value::I(x / y),
        DivS64To32 => {
            let q = (x as i64) / i64::from(y as u32 as i32);
            let clamped = q.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
            Value::I(clamped as u64)
        }
        DivU64To32 => {
            let q = x / u64::from(y as u32);
            Value::I(q.min(u64::from(u32::MAX)))
        }
        MullS32 => Value::I((i64::from(x as u32 as i32).wrapping_mul(i64::from(y as u32 as i32))) as u64),
        MullU32 => Value::I(u64::from(x as u32).wrapping_mul(u64::from(y as u32))),
        And64 => Value::I(x & y),
        Or64 => Value::I(x | y),
        Xor64 => Value::I(x ^ y),
        Shl64 => Value::I(x << (y & 0x3f)),
        Shr64 => Value::I(x >> (y & 0x3f)),
        Sar64 => Value::I(((x as i64) >> (y & 0x3f)) as u64),
        Shr32 => Value::I(u64::from((x as u32) >> (y & 0x1f))),
        Sar32 => Value::I(((x as u32 as i32) >> (y & 0x1f)) as u32 as u64),
        CmpEq64 => Value::I(u64::from(x == y)),
        CmpNe64 => Value::I(u64::from(x != y)),
        CmpLt64S => Value::I(u64::from((x as i64) < (y as i64))),
        CmpLe64S => Value::I(u64::from((x as i64) <= (y as i64))),
        CmpNe32 => Value::I(u64::from(x as u32 != y as u32)),
        CmpF32 => Value::I(fcmp_bits(a.as_f32().partial_cmp(&b.as_f32()))),
        CmpF64 => Value::I(fcmp_bits(a.as_f64().partial_cmp(&b.as_f64()))),
        MullF32 => Value::F64(f64::from(a.as_f32()) * f64::from(b.as_f32())),
        SqrtF32 => {
            assert_round_nearest(x);
            Value::F32(b.as_f32().sqrt())
        }
        SqrtF64 => {
            assert_round_nearest(x);
            Value::F64(b.as_f64().sqrt())
        }
        F64ToF32 => {
            assert_round_nearest(x);
            Value::F32(b.as_f64() as f32)
        }
        // FP-to-int IR conversions truncate (the lifter pins rm to zero).
        F32ToI32S => Value::I(b.as_f32() as i32 as u32 as u64),
        F32ToI64S => Value::I(b.as_f32() as i64 as u64),
        F64ToI32S => Value::I(b.as_f64() as i32 as u32 as u64),
        F64ToI64S => Value::I(b.as_f64() as i64 as u64),
        I32SToF32 => {
            assert_round_nearest(x);
            Value::F32(y as u32 as i32 as f32)
        }
        I64SToF32 => {
            assert_round_nearest(x);
            Value::F32(y as i64 as f32)
        }
        I64SToF64 => {
            assert_round_nearest(x);
            Value::F64(y as i64 as f64)
        }
        AndF32 => Value::F32(f32::from_bits(a.as_f32().to_bits() & b.as_f32().to_bits())),
        OrF32 => Value::F32(f32::from_bits(a.as_f32().to_bits() | b.as_f32().to_bits())),
        XorF32 => Value::F32(f32::from_bits(a.as_f32().to_bits() ^ b.as_f32().to_bits())),
        AndF64 => Value::F64(f64::from_bits(a.as_f64().to_bits() & b.as_f64().to_bits())),
        OrF64 => Value::F64(f64::from_bits(a.as_f64().to_bits() | b.as_f64().to_bits())),
        XorF64 => Value::F64(f64::from_bits(a.as_f64().to_bits() ^ b.as_f64().to_bits())),
        _ => panic!("interpreter: unhandled binop {op:?}"),
    }
}

fn eval_triop(op: Op, a: Value, b: Value, c: Value) -> Value {
    use Op::*;
    match op {
        AddF32 => {
            assert_round_nearest(a.as_u64());
            Value::F32(b.as_f32() + c.as_f32())
        }
        SubF32 => {
            assert_round_nearest(a.as_u64());
            Value::F32(b.as_f32() - c.as_f32())
        }
        MulF32 => {
            assert_round_nearest(a.as_u64());
            Value::F32(b.as_f32() * c.as_f32())
        }
        DivF32 => {
            assert_round_nearest(a.as_u64());
            Value::F32(b.as_f32() / c.as_f32())
        }
        AddF64 => {
            assert_round_nearest(a.as_u64());
            Value::F64(b.as_f64() + c.as_f64())
        }
        SubF64 => {
            assert_round_nearest(a.as_u64());
            Value::F64(b.as_f64() - c.as_f64())
        }
        MulF64 => {
            assert_round_nearest(a.as_u64());
            Value::F64(b.as_f64() * c.as_f64())
        }
        DivF64 => {
            assert_round_nearest(a.as_u64());
            Value::F64(b.as_f64() / c.as_f64())
        }
        AlignF64 => {
            // 8 contiguous bytes of b:c at byte offset a.
            let shift = (a.as_u64() & 7) * 8;
            let hi = b.as_f64().to_bits();
            let lo = c.as_f64().to_bits();
            let v = if shift == 0 {
                hi
            } else {
                hi << shift | lo >> (64 - shift)
            };
            Value::F64(f64::from_bits(v))
        }
        _ => panic!("interpreter: unhandled triop {op:?}"),
    }
}

fn eval_qop(op: Op, a: Value, b: Value, c: Value, d: Value) -> Value {
    use Op::*;
    match op {
        MAddF32 => {
            assert_round_nearest(a.as_u64());
            Value::F32(b.as_f32().mul_add(c.as_f32(), d.as_f32()))
        }
        MAddF64 => {
            assert_round_nearest(a.as_u64());
            Value::F64(b.as_f64().mul_add(c.as_f64(), d.as_f64()))
        }
        MSubF32 => {
            assert_round_nearest(a.as_u64());
            Value::F32(b.as_f32().mul_add(c.as_f32(), -d.as_f32()))
        }
        MSubF64 => {
            assert_round_nearest(a.as_u64());
            Value::F64(b.as_f64().mul_add(c.as_f64(), -d.as_f64()))
        }
        _ => panic!("interpreter: unhandled qop {op:?}"),
    }
}

/// The interpreter only models round-to-nearest; tests must not switch
/// modes before exercising rounding-sensitive operations.
fn assert_round_nearest(rm: u64) {
    assert_eq!(
        rm,
        RoundMode::Nearest as u64,
        "interpreter only supports round-to-nearest"
    );
}

fn eval_helper(helper: CleanHelper, args: &[u64]) -> u64 {
    match helper {
        CleanHelper::CalcCcr => helpers::calculate_ccr(args[0], args[1], args[2], args[3]),
        CleanHelper::CalcICond => {
            helpers::calculate_icond(args[0], args[1], args[2], args[3], args[4])
        }
        CleanHelper::CalcFCond => helpers::calculate_fcond_from_fsr(args[0], args[1], args[2]),
        CleanHelper::CalcFsrVerCexc => helpers::calculate_fsr_ver_cexc(
            args[0], args[1], args[2], args[3], args[4], args[5],
        ),
        CleanHelper::CheckFsr => helpers::check_fsr(args[0]),
        CleanHelper::XmulX => helpers::xmulx(args[0], args[1]),
        CleanHelper::XmulXHi => helpers::xmulxhi(args[0], args[1]),
        other => panic!("interpreter: helper {other:?} needs a SPARC64 host"),
    }
}
