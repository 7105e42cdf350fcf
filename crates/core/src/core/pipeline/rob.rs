//! Reorder Buffer (ROB) for out-of-order completion, in-order commit (§4.3).
//!
//! The ROB is a circular buffer that tracks in-flight instructions from
//! dispatch through retire. It provides:
//! 1. **Allocation:** Assigns a tag to each instruction entering the backend.
//! 2. **Completion:** Marks instructions done when their functional unit finishes.
//! 3. **In-order retire:** Commits from the head in program order.
//! 4. **Misprediction recovery:** Truncates speculative entries after a given tag.

use crate::common::error::ProgramError;

/// Unique tag identifying an in-flight instruction in the ROB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct RobTag(pub u32);

/// Lifecycle state of a ROB entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RobState {
    /// Allocated but not yet completed by its functional unit.
    #[default]
    Issued,
    /// Execution complete, result available, waiting to retire.
    Completed,
    /// Instruction faulted; the error surfaces when it reaches the head.
    Faulted,
}

/// A single entry in the Reorder Buffer.
#[derive(Clone, Debug, Default)]
pub struct RobEntry {
    /// Unique tag for this entry.
    pub tag: RobTag,
    /// Program counter of the instruction.
    pub pc: i64,
    /// Destination architectural register, if this instruction writes one.
    pub dest_arch: Option<usize>,
    /// Destination physical register, if this instruction writes one.
    pub dest_phys: Option<usize>,
    /// The physical register `dest_arch` mapped to before this instruction
    /// renamed it; released to the free list at retire.
    pub prev_phys: Option<usize>,
    /// Destination physical register for the flags pseudo-register, for the
    /// nine opcodes `Opcode::writes_flags` covers.
    pub flags_dest_phys: Option<usize>,
    /// The flags physical register mapped to before this instruction
    /// renamed it; released to the free list at retire.
    pub flags_prev_phys: Option<usize>,
    /// Index into the LSQ, for loads and stores.
    pub lsq_index: Option<usize>,
    /// Current lifecycle state.
    pub state: RobState,
    /// Runtime error, if this instruction faulted.
    pub error: Option<ProgramError>,
    /// Whether this slot is occupied.
    pub valid: bool,
    /// Whether retiring this entry should stop the simulation (`HALT`).
    pub is_halt: bool,
}

/// Reorder Buffer: circular buffer driving in-order retire.
pub struct Rob {
    entries: Vec<RobEntry>,
    /// Index of the oldest entry (retire point).
    head: usize,
    /// Index where the next entry will be allocated.
    tail: usize,
    /// Number of valid entries.
    count: usize,
    /// Monotonically increasing tag counter (never reused while in flight).
    next_tag: u32,
}

impl Rob {
    /// Creates a new ROB with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, RobEntry::default);
        Self {
            entries,
            head: 0,
            tail: 0,
            count: 0,
            next_tag: 1,
        }
    }

    /// Returns the ROB capacity.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of occupied entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the ROB is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the ROB is full.
    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    /// Allocates a new ROB entry at dispatch. Returns `None` if full.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate(
        &mut self,
        pc: i64,
        dest_arch: Option<usize>,
        dest_phys: Option<usize>,
        prev_phys: Option<usize>,
        flags_dest_phys: Option<usize>,
        flags_prev_phys: Option<usize>,
        lsq_index: Option<usize>,
    ) -> Option<RobTag> {
        if self.is_full() {
            return None;
        }

        let tag = RobTag(self.next_tag);
        self.next_tag = self.next_tag.wrapping_add(1);
        if self.next_tag == 0 {
            self.next_tag = 1;
        }

        self.entries[self.tail] = RobEntry {
            tag,
            pc,
            dest_arch,
            dest_phys,
            prev_phys,
            flags_dest_phys,
            flags_prev_phys,
            lsq_index,
            state: RobState::Issued,
            error: None,
            valid: true,
            is_halt: false,
        };

        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        Some(tag)
    }

    /// Allocates a control entry (`NOP`/`HALT`) that bypasses the issue
    /// queue and functional units entirely: dispatch allocates it directly
    /// in the `Completed` state, since there's nothing for a functional
    /// unit to compute. `is_halt` marks whether retiring it should stop
    /// the simulation.
    pub fn allocate_control(&mut self, pc: i64, is_halt: bool) -> Option<RobTag> {
        let tag = self.allocate(pc, None, None, None, None, None, None)?;
        self.complete(tag);
        if let Some(entry) = self.find_entry_mut(tag) {
            entry.is_halt = is_halt;
        }
        Some(tag)
    }

    /// Records the LSQ index for an entry after the fact. LSQ allocation
    /// needs the tag `allocate` only produces once it runs, so dispatch
    /// allocates the ROB entry first and patches this in afterward.
    pub fn set_lsq_index(&mut self, tag: RobTag, lsq_index: usize) {
        if let Some(entry) = self.find_entry_mut(tag) {
            entry.lsq_index = Some(lsq_index);
        }
    }

    /// Marks an entry Completed.
    pub fn complete(&mut self, tag: RobTag) {
        if let Some(entry) = self.find_entry_mut(tag) {
            entry.state = RobState::Completed;
        }
    }

    /// Marks an entry Faulted with the program error that caused it.
    pub fn fault(&mut self, tag: RobTag, error: ProgramError) {
        if let Some(entry) = self.find_entry_mut(tag) {
            entry.state = RobState::Faulted;
            entry.error = Some(error);
        }
    }

    /// Returns a reference to the head entry (oldest), if non-empty.
    pub fn peek_head(&self) -> Option<&RobEntry> {
        if self.count == 0 {
            None
        } else {
            Some(&self.entries[self.head])
        }
    }

    /// Retires the head entry. Returns `None` if the ROB is empty or the
    /// head is still Issued (not yet completed by its functional unit).
    pub fn commit_head(&mut self) -> Option<RobEntry> {
        if self.count == 0 || self.entries[self.head].state == RobState::Issued {
            return None;
        }

        let committed = self.entries[self.head].clone();
        self.entries[self.head].valid = false;
        self.head = (self.head + 1) % self.entries.len();
        self.count -= 1;
        Some(committed)
    }

    /// Flushes all entries (a fatal program error or HALT at retire).
    pub fn flush_all(&mut self) {
        for entry in &mut self.entries {
            entry.valid = false;
        }
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Truncates the ROB to entries at or before `tag` (inclusive), for
    /// misprediction recovery. Returns the discarded entries in
    /// youngest-to-oldest order so the caller can rewind rename state by
    /// walking `prev_phys` from the newest discarded entry backward.
    pub fn flush_after(&mut self, tag: RobTag) -> Vec<RobEntry> {
        if self.count == 0 {
            return Vec::new();
        }

        let mut idx = self.head;
        let mut found = false;
        for _ in 0..self.count {
            if self.entries[idx].tag == tag {
                found = true;
                break;
            }
            idx = (idx + 1) % self.entries.len();
        }
        if !found {
            return Vec::new();
        }

        let keep_idx = (idx + 1) % self.entries.len();
        let mut discarded = Vec::new();
        let mut remove_idx = {
            let prev = if self.tail == 0 { self.entries.len() - 1 } else { self.tail - 1 };
            prev
        };
        while remove_idx != idx {
            if self.entries[remove_idx].valid {
                discarded.push(self.entries[remove_idx].clone());
                self.entries[remove_idx].valid = false;
            }
            remove_idx = if remove_idx == 0 { self.entries.len() - 1 } else { remove_idx - 1 };
        }

        self.tail = keep_idx;
        self.count = 0;
        let mut i = self.head;
        while i != self.tail {
            if self.entries[i].valid {
                self.count += 1;
            }
            i = (i + 1) % self.entries.len();
        }
        discarded
    }

    fn find_entry_mut(&mut self, tag: RobTag) -> Option<&mut RobEntry> {
        if self.count == 0 {
            return None;
        }
        let mut idx = self.head;
        for _ in 0..self.count {
            if self.entries[idx].valid && self.entries[idx].tag == tag {
                return Some(&mut self.entries[idx]);
            }
            idx = (idx + 1) % self.entries.len();
        }
        None
    }
}
