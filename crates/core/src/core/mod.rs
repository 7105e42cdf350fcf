//! Core processor implementation: register renaming and the pipeline engine.

/// Physical register file, rename table, and free list.
pub mod rename;

/// Instruction pipeline implementation (queues, tables, latches, engine).
pub mod pipeline;

pub use self::pipeline::Engine;
pub use self::rename::Renamer;
