//! Program loading: turns an assembly file on disk into code memory.

use crate::common::error::AssembleError;
use crate::isa::instruction::Instruction;
use crate::isa::parser;
use std::path::Path;

/// Parses an APEX assembly file into a sequence of decoded instructions,
/// ready to hand to [`crate::sim::simulator::Simulator::new`].
pub fn load_program(path: &Path) -> Result<Vec<Instruction>, AssembleError> {
    parser::parse_file(path)
}
