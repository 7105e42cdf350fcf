//! The APEX instruction set and its assembly parser.

/// Opcodes, the decoded instruction record, and per-opcode operand shape.
pub mod instruction;

/// The assembly parser: program text to code memory.
pub mod parser;

pub use instruction::{FuKind, Instruction, Opcode};
