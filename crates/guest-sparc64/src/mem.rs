//! Loads, stores and atomics.
//!
//! Plain accesses use the implicit primary address space; the `A` variants
//! carry an ASI, either an immediate from the instruction or the dynamic
//! %asi register. FP loads flip the FPRS dirty bits. The atomics lower to
//! compare-and-swap IR, with the unconditional forms (ldstub, swap)
//! expressed as a CAS whose expected value is a plain load of the location.

use dbt_ir::{Cas, CleanCall, CleanHelper, Expr, JumpKind, Op, Stmt, Ty, binop, mk_u8, mk_u64, unop};

use crate::decode::{Asi, DecodedInsn, Mnemonic, Operands};
use crate::fsr::{self, CexcOp};
use crate::lift::{INSN_LENGTH, LiftResult, Lifter, Unsupported};
use crate::regs;
use crate::state::offsets;

impl Lifter<'_> {
    fn mem_operands(&self, insn: &DecodedInsn) -> (u8, crate::decode::RegOrImm, Option<Asi>, u8) {
        match insn.operands {
            Operands::Mem { rs1, rs2_imm, rd } => (rs1, rs2_imm, None, rd),
            Operands::MemAsi {
                rs1,
                rs2_imm,
                asi,
                rd,
            } => (rs1, rs2_imm, Some(asi), rd),
            _ => unreachable!(),
        }
    }

    pub(crate) fn lift_load(&mut self, insn: &DecodedInsn, is_asi: bool, is_fp: bool) -> LiftResult {
        use Mnemonic as M;

        let (size, sext) = match insn.mnemonic {
            M::Ldsb | M::LdsbA => (1, true),
            M::Ldsh | M::LdshA => (2, true),
            M::Ldsw | M::LdswA => (4, true),
            M::Ldub | M::LdubA => (1, false),
            M::Lduh | M::LduhA => (2, false),
            M::Lduw | M::LduwA => (4, false),
            M::Ldx | M::LdxA => (8, false),
            M::Ldf => (4, false),
            M::Lddf => (8, false),
            M::Ldqf => (16, false),
            _ => unreachable!(),
        };

        let (rs1, rs2_imm, asi, rd) = self.mem_operands(insn);
        let ea = self.ea_expr(rs1, rs2_imm);
        let asi_expr = asi.filter(|_| is_asi).map(|a| self.asi_expr(a));

        if is_fp {
            let ty = crate::recipe::fp_ty(size);
            let load = match asi_expr {
                Some(asi) => Expr::LoadA {
                    ty,
                    addr: Box::new(ea),
                    asi: Box::new(asi),
                },
                None => Expr::Load {
                    ty,
                    addr: Box::new(ea),
                },
            };
            self.put_freg(rd, size, load);
            self.set_fprs_dirty();
        } else {
            let load = self.narrow_load(size, sext, ea, asi_expr);
            self.put_ireg(rd, load);
        }

        Ok(())
    }

    pub(crate) fn lift_store(&mut self, insn: &DecodedInsn, is_asi: bool, is_fp: bool) -> LiftResult {
        use Mnemonic as M;

        let size = match insn.mnemonic {
            M::Stb | M::StbA => 1,
            M::Sth | M::SthA => 2,
            M::Stw | M::StwA => 4,
            M::Stx | M::StxA => 8,
            M::Stf => 4,
            M::Stdf => 8,
            M::Stqf => 16,
            _ => unreachable!(),
        };

        let (rs1, rs2_imm, asi, rd) = self.mem_operands(insn);
        let ea = self.ea_expr(rs1, rs2_imm);
        let asi_expr = asi.filter(|_| is_asi).map(|a| self.asi_expr(a));

        if is_fp {
            let data = self.get_freg(rd, size);
            match asi_expr {
                Some(asi) => self.stmt(Stmt::StoreA {
                    addr: ea,
                    data,
                    asi,
                }),
                None => self.stmt(Stmt::Store { addr: ea, data }),
            }
        } else {
            let data = self.get_ireg(rd);
            self.narrow_store(size, ea, data, asi_expr);
        }

        Ok(())
    }

    /// Block load: eight consecutive doubles into rd, rd+2, .., rd+14.
    /// Accepted only with the block-primary ASI.
    pub(crate) fn lift_load_block(&mut self, insn: &DecodedInsn) -> LiftResult {
        let (rs1, rs2_imm, asi, rd) = self.mem_operands(insn);
        match asi {
            Some(Asi::Imm(regs::ASI_BLOCK_PRIMARY)) => {}
            Some(Asi::Imm(_)) => return Err(Unsupported("block load with a non-block ASI")),
            Some(Asi::Implicit) | None => {
                return Err(Unsupported("block load with the implicit ASI register"));
            }
        }

        let ea = self.ea_expr(rs1, rs2_imm);
        let base = self.bind(Ty::I64, ea);
        for i in 0..8u64 {
            let addr = binop(Op::Add64, base.clone(), mk_u64(i * 8));
            self.put_freg(
                rd + (i as u8) * 2,
                8,
                Expr::Load {
                    ty: Ty::F64,
                    addr: Box::new(addr),
                },
            );
        }
        self.set_fprs_dirty();
        Ok(())
    }

    /// Short-float load: an 8- or 16-bit value zero-extended to 64 bits and
    /// bit-cast into a double.
    pub(crate) fn lift_load_short_float(&mut self, insn: &DecodedInsn) -> LiftResult {
        let (rs1, rs2_imm, asi, rd) = self.mem_operands(insn);
        let ty = match asi {
            Some(Asi::Imm(regs::ASI_FL8_PRIMARY)) => Ty::I8,
            Some(Asi::Imm(regs::ASI_FL16_PRIMARY)) => Ty::I16,
            Some(Asi::Imm(_)) => return Err(Unsupported("short-float load ASI")),
            Some(Asi::Implicit) | None => {
                return Err(Unsupported("short-float load with the implicit ASI register"));
            }
        };
        let widen = if ty == Ty::I8 { Op::Uext8 } else { Op::Uext16 };

        let ea = self.ea_expr(rs1, rs2_imm);
        let loaded = Expr::Load {
            ty,
            addr: Box::new(ea),
        };
        self.put_freg(rd, 8, unop(Op::ReinterpI64AsF64, unop(widen, loaded)));
        self.set_fprs_dirty();
        Ok(())
    }

    /// LDFSR / LDXFSR: loads a raw FSR, refuses tem/ns with an emulation
    /// note and a side exit, and unpacks rd/fcc/cexc into the guest state.
    pub(crate) fn lift_ldfsr(&mut self, insn: &DecodedInsn) -> LiftResult {
        let (rs1, rs2_imm, _, _) = self.mem_operands(insn);
        let ea = self.ea_expr(rs1, rs2_imm);

        let fsr_val = self.temp(Ty::I64);
        let loaded = match insn.mnemonic {
            Mnemonic::LdFsr => unop(
                Op::Uext32,
                Expr::Load {
                    ty: Ty::I32,
                    addr: Box::new(ea),
                },
            ),
            Mnemonic::LdxFsr => Expr::Load {
                ty: Ty::I64,
                addr: Box::new(ea),
            },
            _ => unreachable!(),
        };
        self.assign(fsr_val, loaded);

        // Unsupported bits yield an emulation warning, visible to the
        // dispatcher through the note slot and the side exit below.
        let check = Expr::Call(CleanCall {
            helper: CleanHelper::CheckFsr,
            args: vec![Expr::Tmp(fsr_val)],
            ret_ty: Ty::I64,
            mcx_mask: 0,
        });
        let note = self.temp(Ty::I32);
        self.assign(note, unop(Op::Trunc64To32, check));
        self.stmt(Stmt::Put {
            offset: offsets::EMNOTE,
            data: Expr::Tmp(note),
        });

        // Only rd, fcc and cexc are observed; aexc is silently dropped.
        let rd_ir = fsr::convert_fsr_rd_to_ir(Expr::Tmp(fsr_val));
        self.stmt(Stmt::Put {
            offset: offsets::FSR_RD,
            data: rd_ir,
        });

        let fcc_mask = match insn.mnemonic {
            Mnemonic::LdFsr => fsr::FSR_MASK_FCC0,
            _ => fsr::FSR_MASK_FCC,
        };
        let fcc = self.temp(Ty::I64);
        self.assign(fcc, binop(Op::And64, Expr::Tmp(fsr_val), mk_u64(fcc_mask)));
        self.stmt(Stmt::Put {
            offset: offsets::FSR_FCC,
            data: Expr::Tmp(fcc),
        });

        let cexc = self.temp(Ty::I64);
        self.assign(
            cexc,
            binop(Op::And64, Expr::Tmp(fsr_val), mk_u64(fsr::FSR_MASK_CEXC)),
        );
        self.set_cexc_dep1(CexcOp::Copy, Expr::Tmp(cexc), Ty::I64);

        // Side-exit to the next instruction when a warning was recorded so
        // the dispatcher surfaces it before anything else runs.
        let warned = binop(Op::CmpNe32, Expr::Tmp(note), dbt_ir::mk_u32(0));
        self.stmt(Stmt::Exit {
            guard: warned,
            kind: JumpKind::EmWarn,
            dst: self.pc + INSN_LENGTH,
            ip_offset: offsets::PC,
        });

        Ok(())
    }

    /// STFSR / STXFSR: evaluates the cexc thunk and reassembles the
    /// user-visible FSR.
    pub(crate) fn lift_stfsr(&mut self, insn: &DecodedInsn) -> LiftResult {
        let (rs1, rs2_imm, _, _) = self.mem_operands(insn);

        let get = |offset| Expr::Get {
            offset,
            ty: Ty::I64,
        };
        let call = Expr::Call(CleanCall {
            helper: CleanHelper::CalcFsrVerCexc,
            args: vec![
                get(offsets::FSR_CEXC_OP),
                get(offsets::FSR_CEXC_DEP1_HI),
                get(offsets::FSR_CEXC_DEP1_LO),
                get(offsets::FSR_CEXC_DEP2_HI),
                get(offsets::FSR_CEXC_DEP2_LO),
                get(offsets::FSR_CEXC_NDEP),
            ],
            ret_ty: Ty::I64,
            // OP and NDEP are always-defined.
            mcx_mask: (1 << 0) | (1 << 5),
        });

        let fsr_val = self.temp(Ty::I64);
        let rd_native = fsr::convert_ir_rd_to_fsr(get(offsets::FSR_RD));
        self.assign(
            fsr_val,
            binop(
                Op::Or64,
                binop(Op::Or64, get(offsets::FSR_FCC), call),
                rd_native,
            ),
        );

        let ea = self.ea_expr(rs1, rs2_imm);
        match insn.mnemonic {
            Mnemonic::StFsr => self.stmt(Stmt::Store {
                addr: ea,
                data: unop(Op::Trunc64To32, Expr::Tmp(fsr_val)),
            }),
            Mnemonic::StxFsr => self.stmt(Stmt::Store {
                addr: ea,
                data: Expr::Tmp(fsr_val),
            }),
            _ => unreachable!(),
        }

        Ok(())
    }

    /// LDSTUB: atomic read of a byte while setting it to all-ones,
    /// materialised as a CAS whose expected value is a plain load.
    pub(crate) fn lift_ldstub(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::Mem { rs1, rs2_imm, rd } = insn.operands else {
            unreachable!()
        };
        let ea = self.ea_expr(rs1, rs2_imm);
        let addr = self.bind(Ty::I64, ea);

        let old = self.temp(Ty::I8);
        self.stmt(Stmt::Cas(Cas {
            old,
            ty: Ty::I8,
            addr: addr.clone(),
            expected: Expr::Load {
                ty: Ty::I8,
                addr: Box::new(addr),
            },
            new: mk_u8(0xff),
        }));
        self.put_ireg(rd, unop(Op::Uext8, Expr::Tmp(old)));
        Ok(())
    }

    /// SWAP: atomic 32-bit exchange, same CAS materialisation.
    pub(crate) fn lift_swap(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::Mem { rs1, rs2_imm, rd } = insn.operands else {
            unreachable!()
        };
        let ea = self.ea_expr(rs1, rs2_imm);
        let addr = self.bind(Ty::I64, ea);

        let new = self.temp(Ty::I32);
        let rd_val = self.get_ireg(rd);
        self.assign(new, unop(Op::Trunc64To32, rd_val));

        let old = self.temp(Ty::I32);
        self.stmt(Stmt::Cas(Cas {
            old,
            ty: Ty::I32,
            addr: addr.clone(),
            expected: Expr::Load {
                ty: Ty::I32,
                addr: Box::new(addr),
            },
            new: Expr::Tmp(new),
        }));
        self.put_ireg(rd, unop(Op::Uext32, Expr::Tmp(old)));
        Ok(())
    }

    /// CASA / CASXA. Only the primary address space is accepted.
    pub(crate) fn lift_cas(&mut self, insn: &DecodedInsn) -> LiftResult {
        let Operands::Cas { rs1, asi, rs2, rd } = insn.operands else {
            unreachable!()
        };
        match asi {
            Asi::Imm(regs::ASI_PRIMARY) => {}
            Asi::Imm(_) => return Err(Unsupported("compare-and-swap with a non-primary ASI")),
            Asi::Implicit => {
                return Err(Unsupported("compare-and-swap with the implicit ASI register"));
            }
        }

        let ty = if insn.mnemonic == Mnemonic::Casa {
            Ty::I32
        } else {
            Ty::I64
        };
        let addr = self.get_ireg(rs1);

        let expected = self.temp(ty);
        let new = self.temp(ty);
        let rs2_val = self.get_ireg(rs2);
        let rd_val = self.get_ireg(rd);
        if ty == Ty::I32 {
            self.assign(expected, unop(Op::Trunc64To32, rs2_val));
            self.assign(new, unop(Op::Trunc64To32, rd_val));
        } else {
            self.assign(expected, rs2_val);
            self.assign(new, rd_val);
        }

        let old = self.temp(ty);
        self.stmt(Stmt::Cas(Cas {
            old,
            ty,
            addr,
            expected: Expr::Tmp(expected),
            new: Expr::Tmp(new),
        }));

        if ty == Ty::I32 {
            self.put_ireg(rd, unop(Op::Uext32, Expr::Tmp(old)));
        } else {
            self.put_ireg(rd, Expr::Tmp(old));
        }
        Ok(())
    }
}
