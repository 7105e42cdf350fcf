//! Issue Queue (IQ): unified, unordered wakeup/select pool (§4.4).
//!
//! Each entry waits on up to two source operands, each either already
//! available (captured as a value at dispatch) or pending on a physical
//! register tag. Every tick, [`Iq::wakeup`] resolves any pending operand
//! whose tag was just broadcast on the forwarding bus; [`Iq::select`] then
//! picks the oldest ready entry for a given functional unit.

use crate::core::pipeline::bus::ForwardingBus;
use crate::core::pipeline::rob::RobTag;
use crate::isa::instruction::{FuKind, Opcode};

/// A source operand as tracked in the issue queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Not used by this opcode.
    None,
    /// Already available (read from the physical register file, the
    /// architectural register file, or a literal immediate, at dispatch).
    Ready(i64),
    /// Waiting on the physical register tagged `phys`.
    Waiting(usize),
}

impl Operand {
    fn wake(&mut self, phys: usize, value: i64) {
        if *self == Operand::Waiting(phys) {
            *self = Operand::Ready(value);
        }
    }

    fn is_ready(self) -> bool {
        !matches!(self, Operand::Waiting(_))
    }
}

/// A single entry in the issue queue.
#[derive(Clone, Debug)]
pub struct IqEntry {
    /// ROB tag of the owning instruction.
    pub tag: RobTag,
    /// Opcode, used to route to the correct functional unit at select time.
    pub opcode: Opcode,
    /// First source operand.
    pub src1: Operand,
    /// Second source operand.
    pub src2: Operand,
    /// Literal immediate, if the opcode has one.
    pub imm: Option<i64>,
    /// Destination physical register, if any.
    pub dest_phys: Option<usize>,
    /// Destination physical register for the flags pseudo-register, if this
    /// opcode is one of the nine that produces a flags result
    /// (`Opcode::writes_flags`).
    pub flags_dest_phys: Option<usize>,
    /// For `LOADP`/`STOREP`, the physical register backing the
    /// post-incremented source (`rs1` for `LOADP`, `rs2` for `STOREP`);
    /// the AFU writes the incremented value straight back into this same
    /// physical register rather than renaming a fresh destination for it.
    /// `None` for every other opcode.
    pub writeback_phys: Option<usize>,
    /// Index into the LSQ, for memory ops routed to the AFU.
    pub lsq_index: Option<usize>,
    /// Program counter, carried through for branch/jump resolution.
    pub pc: i64,
    /// Dispatch order; lower is older. Breaks select ties.
    pub age: u64,
}

impl IqEntry {
    fn is_ready(&self) -> bool {
        self.src1.is_ready() && self.src2.is_ready()
    }
}

/// Unified unordered issue queue.
pub struct Iq {
    entries: Vec<IqEntry>,
    capacity: usize,
}

impl Iq {
    /// Creates an empty issue queue with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns true if the queue has no free slot.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Returns the number of occupied entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Inserts a dispatched instruction. Returns `false` if the queue is full.
    pub fn insert(&mut self, entry: IqEntry) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Wakes any entry operand waiting on a tag broadcast this tick.
    pub fn wakeup(&mut self, bus: &ForwardingBus) {
        for entry in &mut self.entries {
            for (phys, value) in bus.broadcasts() {
                entry.src1.wake(phys, value);
                entry.src2.wake(phys, value);
            }
        }
    }

    /// Selects and removes the oldest ready entry destined for `fu`, if any.
    pub fn select(&mut self, fu: FuKind) -> Option<IqEntry> {
        let mut best: Option<usize> = None;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.opcode.fu_kind() == fu && entry.is_ready() {
                match best {
                    Some(b) if self.entries[b].age <= entry.age => {}
                    _ => best = Some(i),
                }
            }
        }
        best.map(|i| self.entries.remove(i))
    }

    /// Discards entries dispatched after `age` (exclusive), on a
    /// misprediction: their producing branch is being squashed, so any
    /// instruction dispatched behind it in program order never happened.
    pub fn flush_after(&mut self, age: u64) {
        self.entries.retain(|e| e.age <= age);
    }

    /// Discards every entry (a fatal error or HALT at retire).
    pub fn flush_all(&mut self) {
        self.entries.clear();
    }
}
