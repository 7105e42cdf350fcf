//! The assembly parser (§4.9): turns a program file into a sequence of
//! decoded [`Instruction`] records. An external collaborator in the
//! distilled scope, but implemented here since nothing else builds it.

use crate::common::error::AssembleError;
use crate::isa::instruction::{Instruction, Opcode};
use std::path::Path;

/// Parses a program file into code memory.
///
/// One instruction per non-blank, non-comment line. A `;` begins a
/// trailing comment.
pub fn parse_file(path: &Path) -> Result<Vec<Instruction>, AssembleError> {
    let text = std::fs::read_to_string(path)?;
    parse_program(&text)
}

/// Parses program text (as [`parse_file`] does, minus the IO) into code
/// memory. Exposed separately so tests can build programs inline.
pub fn parse_program(text: &str) -> Result<Vec<Instruction>, AssembleError> {
    let mut code = Vec::new();
    for (idx, raw_line) in text.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        code.push(parse_line(line, idx + 1)?);
    }
    Ok(code)
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_line(line: &str, line_no: usize) -> Result<Instruction, AssembleError> {
    let mut tokens = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());

    let mnemonic = tokens
        .next()
        .ok_or_else(|| AssembleError::MalformedOperand {
            line: line_no,
            token: line.to_string(),
        })?;
    let operands: Vec<&str> = tokens.collect();

    let opcode = match mnemonic.to_ascii_uppercase().as_str() {
        "ADD" => Opcode::Add,
        "SUB" => Opcode::Sub,
        "MUL" => Opcode::Mul,
        "DIV" => Opcode::Div,
        "AND" => Opcode::And,
        "OR" => Opcode::Or,
        "XOR" => Opcode::Xor,
        "ADDL" => Opcode::Addl,
        "SUBL" => Opcode::Subl,
        "CMP" => Opcode::Cmp,
        "CML" => Opcode::Cml,
        "LOAD" => Opcode::Load,
        "LOADP" => Opcode::Loadp,
        "STORE" => Opcode::Store,
        "STOREP" => Opcode::Storep,
        "MOVC" => Opcode::Movc,
        "BZ" => Opcode::Bz,
        "BNZ" => Opcode::Bnz,
        "BP" => Opcode::Bp,
        "BNP" => Opcode::Bnp,
        "BN" => Opcode::Bn,
        "BNN" => Opcode::Bnn,
        "JUMP" => Opcode::Jump,
        "JALR" => Opcode::Jalr,
        "NOP" => return Ok(Instruction::control(Opcode::Nop)),
        "HALT" => return Ok(Instruction::control(Opcode::Halt)),
        other => {
            return Err(AssembleError::UnknownMnemonic {
                line: line_no,
                mnemonic: other.to_string(),
            });
        }
    };

    build_instruction(opcode, &operands, line_no)
}

fn build_instruction(
    opcode: Opcode,
    operands: &[&str],
    line_no: usize,
) -> Result<Instruction, AssembleError> {
    let (reads_rs1, reads_rs2, writes_rd, has_imm) = opcode.operand_shape();
    let mut cursor = operands.iter();
    let malformed = |token: &str| AssembleError::MalformedOperand {
        line: line_no,
        token: token.to_string(),
    };

    let mut next_reg = |slot_name: &'static str| -> Result<usize, AssembleError> {
        let tok = cursor.next().ok_or_else(|| malformed(slot_name))?;
        parse_register(tok).ok_or_else(|| malformed(tok))
    };

    // Operand order in APEX assembly is rd, rs1, rs2/#imm — but a handful
    // of opcodes have no destination and/or swap which source reads first.
    let rd = if writes_rd { Some(next_reg("rd")?) } else { None };

    let (rs1, rs2) = match opcode {
        Opcode::Store | Opcode::Storep => {
            let a = next_reg("rs1")?;
            let b = next_reg("rs2")?;
            (Some(a), Some(b))
        }
        Opcode::Cmp => {
            let a = next_reg("rs1")?;
            let b = next_reg("rs2")?;
            (Some(a), Some(b))
        }
        _ => {
            let a = if reads_rs1 {
                Some(next_reg("rs1")?)
            } else {
                None
            };
            let b = if reads_rs2 && opcode != Opcode::Cmp {
                Some(next_reg("rs2")?)
            } else {
                None
            };
            (a, b)
        }
    };

    let imm = if has_imm {
        let tok = cursor.next().ok_or_else(|| malformed("#imm"))?;
        Some(parse_immediate(tok).ok_or_else(|| malformed(tok))?)
    } else {
        None
    };

    Ok(Instruction {
        opcode,
        rd,
        rs1,
        rs2,
        imm,
    })
}

fn parse_register(tok: &str) -> Option<usize> {
    tok.strip_prefix('R').and_then(|n| n.parse::<usize>().ok())
}

fn parse_immediate(tok: &str) -> Option<i64> {
    tok.strip_prefix('#').and_then(|n| n.parse::<i64>().ok())
}
