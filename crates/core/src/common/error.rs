//! Error types raised by the engine and by the program it runs.
//!
//! Two independent hierarchies, matching the teacher's split between a
//! catchable runtime trap and a host-level IO/parse error: [`ProgramError`]
//! is raised by a functional unit for a misbehaving *simulated* program and
//! carried through the ROB to retirement; [`AssembleError`] is raised by the
//! parser before the engine ever sees an instruction.

use std::fmt;

/// A runtime error raised by the simulated program itself.
///
/// Distinct from an engine invariant violation (those are bugs and panic).
/// A `ProgramError` reaching retirement ends the run with a documented
/// non-zero exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    /// `DIV` divided by zero.
    #[error("divide by zero at pc={pc:#x}")]
    DivideByZero {
        /// Program counter of the faulting instruction.
        pc: i64,
    },
    /// A load or store addressed outside `data_memory`.
    #[error("memory access out of bounds: addr={addr}")]
    MemoryOutOfBounds {
        /// The out-of-range address.
        addr: i64,
    },
}

/// An error raised while assembling a program file into code memory.
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    /// The input file could not be opened or read.
    #[error("could not read program file: {0}")]
    Io(#[from] std::io::Error),
    /// A line did not begin with a recognized opcode mnemonic.
    #[error("line {line}: unknown mnemonic {mnemonic:?}")]
    UnknownMnemonic {
        /// 1-based source line number.
        line: usize,
        /// The unrecognized token.
        mnemonic: String,
    },
    /// A line's operand list did not match the shape its opcode requires.
    #[error("line {line}: malformed operand {token:?}")]
    MalformedOperand {
        /// 1-based source line number.
        line: usize,
        /// The offending token.
        token: String,
    },
}

/// Exit codes reported by the CLI driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitCode {
    /// Normal HALT-terminated run.
    Ok = 0,
    /// The program file was missing or malformed.
    AssembleFailure = 1,
    /// A [`ProgramError`] reached retirement.
    ProgramFailure = 2,
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as i32)
    }
}
