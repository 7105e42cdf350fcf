//! Pipeline latch structures for inter-stage communication (§4.8).
//!
//! Every latch is a single-entry buffer with a `has_insn` flag rather than
//! a queue: at most one instruction is in flight between two adjacent
//! stages at a time, since a stalled consumer blocks its producer from
//! overwriting the latch until it's read.

use crate::isa::instruction::Instruction;

/// Fetch -> Decode/Rename latch.
#[derive(Clone, Debug, Default)]
pub struct FetchDecodeLatch {
    /// Whether this latch currently holds an instruction.
    pub has_insn: bool,
    /// Program counter of the fetched instruction.
    pub pc: i64,
    /// The decoded instruction (decoding happens at fetch in this design,
    /// since APEX assembly is pre-parsed; Decode/Rename only renames).
    pub instruction: Instruction,
    /// Whether the BTB predicted this PC taken.
    pub predicted_taken: bool,
    /// The BTB's predicted target, if `predicted_taken`.
    pub predicted_target: i64,
    /// The BTB slot consulted, if this PC hit.
    pub btb_slot: Option<usize>,
}

/// Decode/Rename -> Dispatch latch.
#[derive(Clone, Debug, Default)]
pub struct DecodeDispatchLatch {
    /// Whether this latch currently holds an instruction.
    pub has_insn: bool,
    /// Program counter.
    pub pc: i64,
    /// The instruction, unchanged from fetch.
    pub instruction: Instruction,
    /// Physical register backing `rs1`, if the opcode reads one.
    pub src1_phys: Option<usize>,
    /// Physical register backing `rs2`, if the opcode reads one.
    pub src2_phys: Option<usize>,
    /// Newly allocated destination physical register, if the opcode writes one.
    pub dest_phys: Option<usize>,
    /// The physical register `rd` mapped to before this rename.
    pub prev_phys: Option<usize>,
    /// Newly allocated physical register for the flags pseudo-register, for
    /// opcodes `Opcode::writes_flags` covers.
    pub flags_dest_phys: Option<usize>,
    /// The flags physical register mapped to before this rename.
    pub flags_prev_phys: Option<usize>,
    /// Whether the BTB predicted this PC taken.
    pub predicted_taken: bool,
    /// The BTB's predicted target, if `predicted_taken`.
    pub predicted_target: i64,
    /// The BTB slot consulted, if this PC hit.
    pub btb_slot: Option<usize>,
}

/// A single-entry latch feeding one functional unit (IntFU, MulFU, AFU,
/// BFU, MAU). Issue fills it; the functional unit's own stage drains it
/// the following tick, so results broadcast one cycle after select.
#[derive(Clone, Debug, Default)]
pub struct FuLatch {
    /// Whether this latch currently holds an instruction.
    pub has_insn: bool,
    /// ROB tag of the occupying instruction.
    pub tag: crate::core::pipeline::rob::RobTag,
    /// Opcode being executed.
    pub opcode: crate::isa::instruction::Opcode,
    /// First operand value, already resolved by issue.
    pub val1: i64,
    /// Second operand value, already resolved by issue.
    pub val2: i64,
    /// Literal immediate, if the opcode has one.
    pub imm: Option<i64>,
    /// Destination physical register, if any.
    pub dest_phys: Option<usize>,
    /// Destination physical register for the flags pseudo-register, for
    /// opcodes `Opcode::writes_flags` covers.
    pub flags_dest_phys: Option<usize>,
    /// For `LOADP`/`STOREP`, the physical register the AFU writes the
    /// post-incremented source back into. `None` otherwise.
    pub writeback_phys: Option<usize>,
    /// Program counter, for branch/jump target computation.
    pub pc: i64,
    /// Index into the LSQ, for AFU-routed loads/stores.
    pub lsq_index: Option<usize>,
    /// Dispatch-order age, for misprediction-driven flush comparisons.
    pub age: u64,
}
