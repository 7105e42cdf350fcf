//! A trivial in-order interpreter of the same ISA the engine implements,
//! used by the invariant tests to check the engine's out-of-order result
//! against sequential semantics (§8, "Equivalence to sequential semantics").

use apex_core::common::constants::{CODE_BASE_ADDRESS, INSTRUCTION_SIZE, N_ARCH};
use apex_core::common::error::ProgramError;
use apex_core::common::reg::Flags;
use apex_core::isa::instruction::{Instruction, Opcode};

pub struct ReferenceState {
    pub regs: [i64; N_ARCH],
    pub flags: Flags,
    pub memory: Vec<i64>,
    pub retired: u64,
}

/// Runs `code` sequentially from `CODE_BASE_ADDRESS` until `HALT` or a
/// `ProgramError`, counting every instruction that actually executes
/// (taken branches included, not-taken ones excluded).
pub fn run_sequentially(code: &[Instruction], memory_size: usize) -> Result<ReferenceState, ProgramError> {
    let mut regs = [0i64; N_ARCH];
    let mut flags = Flags::default();
    let mut memory = vec![0i64; memory_size];
    let mut retired = 0u64;
    let mut pc = CODE_BASE_ADDRESS;

    loop {
        let index = ((pc - CODE_BASE_ADDRESS) / INSTRUCTION_SIZE) as usize;
        let insn = code[index];
        let mut next_pc = pc + INSTRUCTION_SIZE;

        match insn.opcode {
            Opcode::Nop => {}
            Opcode::Halt => {
                retired += 1;
                break;
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::And | Opcode::Or | Opcode::Xor => {
                let a = regs[insn.rs1.unwrap()];
                let b = regs[insn.rs2.unwrap()];
                let result = match insn.opcode {
                    Opcode::Add => a.wrapping_add(b),
                    Opcode::Sub => a.wrapping_sub(b),
                    Opcode::Mul => a.wrapping_mul(b),
                    Opcode::Div => {
                        if b == 0 {
                            return Err(ProgramError::DivideByZero { pc });
                        }
                        a.wrapping_div(b)
                    }
                    Opcode::And => a & b,
                    Opcode::Or => a | b,
                    Opcode::Xor => a ^ b,
                    _ => unreachable!(),
                };
                regs[insn.rd.unwrap()] = result;
                flags = Flags::from_result(result);
            }
            Opcode::Addl | Opcode::Subl => {
                let a = regs[insn.rs1.unwrap()];
                let imm = insn.imm.unwrap();
                let result = if insn.opcode == Opcode::Addl { a.wrapping_add(imm) } else { a.wrapping_sub(imm) };
                regs[insn.rd.unwrap()] = result;
                flags = Flags::from_result(result);
            }
            Opcode::Cmp => {
                let a = regs[insn.rs1.unwrap()];
                let b = regs[insn.rs2.unwrap()];
                flags = Flags::from_compare(a, b);
            }
            Opcode::Cml => {
                let a = regs[insn.rs1.unwrap()];
                let imm = insn.imm.unwrap();
                flags = Flags::from_compare(a, imm);
            }
            Opcode::Movc => {
                regs[insn.rd.unwrap()] = insn.imm.unwrap();
            }
            Opcode::Load | Opcode::Loadp => {
                let base = regs[insn.rs1.unwrap()];
                let addr = base + insn.imm.unwrap();
                let value = *memory
                    .get(addr as usize)
                    .ok_or(ProgramError::MemoryOutOfBounds { addr })?;
                regs[insn.rd.unwrap()] = value;
                if insn.opcode == Opcode::Loadp {
                    regs[insn.rs1.unwrap()] = base + INSTRUCTION_SIZE;
                }
            }
            Opcode::Store | Opcode::Storep => {
                let value = regs[insn.rs1.unwrap()];
                let base = regs[insn.rs2.unwrap()];
                let addr = base + insn.imm.unwrap();
                let slot = memory
                    .get_mut(addr as usize)
                    .ok_or(ProgramError::MemoryOutOfBounds { addr })?;
                *slot = value;
                if insn.opcode == Opcode::Storep {
                    regs[insn.rs2.unwrap()] = base + INSTRUCTION_SIZE;
                }
            }
            Opcode::Bz | Opcode::Bnz | Opcode::Bp | Opcode::Bnp | Opcode::Bn | Opcode::Bnn => {
                let taken = match insn.opcode {
                    Opcode::Bz => flags.z,
                    Opcode::Bnz => !flags.z,
                    Opcode::Bp => flags.p,
                    Opcode::Bnp => !flags.p,
                    Opcode::Bn => flags.n,
                    Opcode::Bnn => !flags.n,
                    _ => unreachable!(),
                };
                if taken {
                    next_pc = pc + insn.imm.unwrap();
                }
            }
            Opcode::Jump => {
                next_pc = regs[insn.rs1.unwrap()] + insn.imm.unwrap();
            }
            Opcode::Jalr => {
                let target = regs[insn.rs1.unwrap()] + insn.imm.unwrap();
                regs[insn.rd.unwrap()] = pc + INSTRUCTION_SIZE;
                next_pc = target;
            }
        }

        retired += 1;
        pc = next_pc;
    }

    Ok(ReferenceState { regs, flags, memory, retired })
}
