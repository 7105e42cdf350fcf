//! Global structural constants for the APEX engine.
//!
//! These mirror [`crate::config::Config`]'s defaults; the `Config` values are
//! what the engine actually builds against, while these constants document
//! the canonical sizes and are used directly by code (tests, the parser)
//! that has no `Config` in scope.

/// Number of architectural general-purpose registers.
pub const N_ARCH: usize = 16;

/// The condition-flags register is renamed through the same machinery as
/// the general-purpose registers, as a 17th architectural register past
/// the `N_ARCH` GPRs. This lets a conditional branch's flags dependency
/// ride the ordinary rename-table/forwarding-bus wakeup path instead of a
/// bespoke side channel.
pub const FLAGS_ARCH: usize = N_ARCH;

/// Total architectural registers the rename table covers: the GPRs plus
/// the flags pseudo-register.
pub const N_ARCH_TOTAL: usize = N_ARCH + 1;

/// Number of physical registers backing the rename table.
pub const N_PHYS: usize = 24;

/// Issue queue capacity.
pub const IQ_CAPACITY: usize = 24;

/// Reorder buffer capacity.
pub const ROB_CAPACITY: usize = 32;

/// Load/store queue capacity.
pub const LSQ_CAPACITY: usize = 16;

/// Branch queue capacity.
pub const BQ_CAPACITY: usize = 16;

/// Number of fully-associative BTB slots.
pub const BTB_SLOTS: usize = 4;

/// Code memory address of the first instruction.
pub const CODE_BASE_ADDRESS: i64 = 4000;

/// Address units occupied by one instruction.
pub const INSTRUCTION_SIZE: i64 = 4;

/// Size of the flat data memory, in signed-integer cells.
pub const DATA_MEMORY_SIZE: usize = 4096;

/// Hang-detection threshold: ticks without retirement before the driver
/// gives up rather than looping forever on a malformed/non-terminating
/// speculative path bug in the engine.
pub const HANG_DETECTION_THRESHOLD: u64 = 1_000_000;
