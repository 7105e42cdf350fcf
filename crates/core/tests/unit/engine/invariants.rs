//! Property-style checks that the engine's out-of-order result matches
//! sequential semantics (§8) for randomly generated programs mixing
//! straight-line arithmetic, memory ops, and forward branches. `DIV` is
//! excluded so random operand choices can't manufacture a spurious
//! divide-by-zero and turn the comparison into an error-path test instead
//! of an equivalence one; branches only ever jump forward (never loop),
//! so a generated program is always guaranteed to terminate.

use crate::common::harness::TestContext;
use crate::common::reference::run_sequentially;
use apex_core::isa::parser::parse_program;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Line {
    Movc { rd: usize, imm: i64 },
    Arith { mnemonic: &'static str, rd: usize, rs1: usize, rs2: usize },
    Addl { rd: usize, rs1: usize, imm: i64 },
    Cmp { rs1: usize, rs2: usize },
    Store { val_reg: usize, addr_reg: usize, addr: i64 },
    Load { rd: usize, addr_reg: usize, addr: i64 },
    Branch { mnemonic: &'static str, skip: usize },
}

/// Number of rendered assembly instructions a [`Line`] expands to. `Store`
/// and `Load` each expand to two (a `MOVC` to pin the address register to
/// a known-valid constant, then the memory op itself) so a forward branch
/// can never land between the two and use a stale address register.
fn instruction_count(line: &Line) -> usize {
    match line {
        Line::Store { .. } | Line::Load { .. } => 2,
        _ => 1,
    }
}

fn line_strategy() -> impl Strategy<Value = Line> {
    let reg = 0usize..4;
    let imm = -20i64..20;
    let addr = 0i64..64;
    prop_oneof![
        (reg.clone(), imm.clone()).prop_map(|(rd, imm)| Line::Movc { rd, imm }),
        (
            prop_oneof![Just("ADD"), Just("SUB"), Just("AND"), Just("OR"), Just("XOR"), Just("MUL")],
            reg.clone(),
            reg.clone(),
            reg.clone(),
        )
            .prop_map(|(mnemonic, rd, rs1, rs2)| Line::Arith { mnemonic, rd, rs1, rs2 }),
        (reg.clone(), reg.clone(), imm).prop_map(|(rd, rs1, imm)| Line::Addl { rd, rs1, imm }),
        (reg.clone(), reg.clone()).prop_map(|(rs1, rs2)| Line::Cmp { rs1, rs2 }),
        (reg.clone(), reg.clone(), addr.clone())
            .prop_map(|(val_reg, addr_reg, addr)| Line::Store { val_reg, addr_reg, addr }),
        (reg.clone(), reg.clone(), addr)
            .prop_map(|(rd, addr_reg, addr)| Line::Load { rd, addr_reg, addr }),
        (
            prop_oneof![Just("BZ"), Just("BNZ"), Just("BP"), Just("BNP"), Just("BN"), Just("BNN")],
            0usize..4,
        )
            .prop_map(|(mnemonic, skip)| Line::Branch { mnemonic, skip }),
    ]
}

/// Renders `lines` to assembly text, resolving every `Branch`'s skip count
/// into a byte offset that lands exactly on the start of a later line
/// (clamped so it never skips past the final line, i.e. past `HALT`).
fn render(lines: &[Line]) -> String {
    let counts: Vec<usize> = lines.iter().map(instruction_count).collect();

    let mut text = String::new();
    for (i, line) in lines.iter().enumerate() {
        match line {
            Line::Movc { rd, imm } => text.push_str(&format!("MOVC R{rd},#{imm}\n")),
            Line::Arith { mnemonic, rd, rs1, rs2 } => {
                text.push_str(&format!("{mnemonic} R{rd},R{rs1},R{rs2}\n"));
            }
            Line::Addl { rd, rs1, imm } => text.push_str(&format!("ADDL R{rd},R{rs1},#{imm}\n")),
            Line::Cmp { rs1, rs2 } => text.push_str(&format!("CMP R{rs1},R{rs2}\n")),
            Line::Store { val_reg, addr_reg, addr } => {
                text.push_str(&format!("MOVC R{addr_reg},#{addr}\n"));
                text.push_str(&format!("STORE R{val_reg},R{addr_reg},#0\n"));
            }
            Line::Load { rd, addr_reg, addr } => {
                text.push_str(&format!("MOVC R{addr_reg},#{addr}\n"));
                text.push_str(&format!("LOAD R{rd},R{addr_reg},#0\n"));
            }
            Line::Branch { mnemonic, skip } => {
                let remaining = lines.len() - 1 - i;
                let skip = (*skip).min(remaining);
                let skipped_instructions: usize = counts[i + 1..i + 1 + skip].iter().sum();
                let offset = (1 + skipped_instructions) as i64 * 4;
                text.push_str(&format!("{mnemonic} #{offset}\n"));
            }
        }
    }
    text.push_str("HALT\n");
    text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn matches_sequential_execution(lines in prop::collection::vec(line_strategy(), 1..24)) {
        let source = render(&lines);
        let code = parse_program(&source).expect("generated program must assemble");
        let reference = run_sequentially(&code, 4096).expect("generated program has no DIV, so no fault");

        let mut ctx = TestContext::new(&source);
        prop_assert!(ctx.run().is_none());
        prop_assert!(!ctx.is_hung());

        for r in 0..apex_core::common::constants::N_ARCH {
            prop_assert_eq!(ctx.reg(r), reference.regs[r], "register R{} diverged", r);
        }
        prop_assert_eq!(ctx.flags().z, reference.flags.z);
        prop_assert_eq!(ctx.flags().p, reference.flags.p);
        prop_assert_eq!(ctx.flags().n, reference.flags.n);
        prop_assert_eq!(ctx.retired(), reference.retired);

        for addr in 0..64usize {
            prop_assert_eq!(ctx.mem(addr), reference.memory[addr], "memory[{}] diverged", addr);
        }
    }
}
