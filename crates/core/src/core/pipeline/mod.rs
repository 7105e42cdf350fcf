//! Instruction pipeline implementation: the superscalar out-of-order
//! engine's queues, tables, and latches, plus the top-level tick driver.
//!
//! 1. **Engine:** The top-level tick driver over every structure below.
//! 2. **ROB:** Reorder buffer for out-of-order completion, in-order commit.
//! 3. **IQ:** Unified issue queue (wakeup/select).
//! 4. **LSQ:** Load/store queue (disambiguation, forwarding, commit gating).
//! 5. **BQ:** Branch queue, mirroring in-flight branches/jumps for the BFU.
//! 6. **BTB:** Branch target buffer (prediction).
//! 7. **Bus:** The per-tick forwarding bus.
//! 8. **Latches:** Inter-stage buffers for communication between stages.

/// The top-level tick driver.
pub mod engine;

/// Inter-stage pipeline latches.
pub mod latches;

/// Reorder buffer for out-of-order completion, in-order commit.
pub mod rob;

/// Unified issue queue.
pub mod iq;

/// Load/store queue.
pub mod lsq;

/// Branch queue.
pub mod bq;

/// Branch target buffer.
pub mod btb;

/// Per-tick forwarding bus.
pub mod bus;

pub use engine::Engine;
