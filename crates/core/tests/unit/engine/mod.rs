//! Engine-level integration tests.

/// The six end-to-end scenarios plus divide-by-zero and out-of-bounds
/// programs.
pub mod scenarios;

/// Property-style invariant checks (I1-I5) over randomly generated
/// straight-line programs.
pub mod invariants;
