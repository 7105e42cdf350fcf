//! Common utilities and types shared across the APEX simulator.
//!
//! 1. **Constants:** Structural sizes for the ROB, IQ, LSQ, BQ, and BTB.
//! 2. **Error Handling:** Program-level and assemble-time error types.
//! 3. **Register Management:** The architectural register file and flags.

/// Structural size constants (N_PHYS, ROB/IQ/LSQ/BQ capacity, BTB slots, ...).
pub mod constants;

/// Program-level and assemble-time error types.
pub mod error;

/// Architectural register file and condition flags.
pub mod reg;

pub use error::{AssembleError, ExitCode, ProgramError};
pub use reg::{Flags, RegisterFile};
