//! A cycle-accurate simulator of a superscalar out-of-order APEX processor
//! pipeline.
//!
//! 1. **Core:** register renaming and the ten-stage engine (Fetch,
//!    Decode/Rename, Dispatch, Issue, IntFU/MulFU/AFU/BFU, LSQ, MAU, Retire).
//! 2. **ISA:** the APEX opcode set, decoded instruction record, and
//!    assembly parser.
//! 3. **Common:** structural constants, architectural register file and
//!    flags, and error types.
//! 4. **Simulation:** `Simulator` (owns the engine) and the program loader.

/// Structural constants, architectural register file and flags, and error
/// types.
pub mod common;
/// Simulator configuration (structural sizes, general run behavior).
pub mod config;
/// Register renaming and the pipeline engine.
pub mod core;
/// The APEX instruction set and its assembly parser.
pub mod isa;
/// Simulation: `Simulator` and the assembly file loader.
pub mod sim;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The tick-driven pipeline engine.
pub use crate::core::Engine;
/// Top-level simulator; owns the engine and drives it to completion.
pub use crate::sim::simulator::Simulator;
