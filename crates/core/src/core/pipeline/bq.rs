//! Branch Queue (BQ): a small ring mirroring every in-flight branch/jump
//! for the BFU (§4.7).
//!
//! The BFU needs the original prediction to decide whether resolving a
//! branch is a misprediction, and the BTB slot it used so the predictor
//! can be updated without re-deriving the hash index. The BQ carries both,
//! indexed by program age like the LSQ. Entries are allocated in order at
//! dispatch, but `take` isn't gated on FIFO order: select (§4.4) can
//! resolve a younger branch before an older one still waiting on an
//! operand, so lookup scans the occupied range by tag instead of assuming
//! the match sits at `head`.

use crate::core::pipeline::rob::RobTag;

/// A single entry in the branch queue.
#[derive(Clone, Debug, Default)]
pub struct BqEntry {
    /// ROB tag of the owning instruction.
    pub tag: RobTag,
    /// Program counter of the branch/jump.
    pub pc: i64,
    /// Whether the BTB predicted this branch taken.
    pub predicted_taken: bool,
    /// The BTB predicted this target (only meaningful if `predicted_taken`).
    pub predicted_target: i64,
    /// The BTB slot consulted at fetch, if this PC hit.
    pub btb_slot: Option<usize>,
    /// Whether this slot is occupied.
    pub valid: bool,
}

/// Branch Queue: ring of in-flight branches/jumps, allocated in program
/// order but resolvable out of order.
pub struct Bq {
    entries: Vec<BqEntry>,
    head: usize,
    tail: usize,
    count: usize,
}

impl Bq {
    /// Creates a new branch queue with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, BqEntry::default);
        Self {
            entries,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns true if the queue has no free slot.
    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    /// Returns the number of occupied entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Allocates an entry at dispatch. Returns `false` if full.
    pub fn allocate(
        &mut self,
        tag: RobTag,
        pc: i64,
        predicted_taken: bool,
        predicted_target: i64,
        btb_slot: Option<usize>,
    ) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries[self.tail] = BqEntry {
            tag,
            pc,
            predicted_taken,
            predicted_target,
            btb_slot,
            valid: true,
        };
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        true
    }

    /// Pops the entry for `tag` once the BFU resolves it. The BQ is drained
    /// by the BFU directly (not gated on ROB retire, since the branch
    /// itself is what decides whether anything after it survives).
    ///
    /// Select (§4.4) picks the oldest *ready* entry for the BFU, so a
    /// younger branch can resolve before an older one still waiting on a
    /// dependency; `tag` isn't necessarily at `head`. Scans the occupied
    /// range for it, then shifts every entry behind it forward by one to
    /// close the gap, keeping the ring contiguous from `head`.
    pub fn take(&mut self, tag: RobTag) -> Option<BqEntry> {
        if self.count == 0 {
            return None;
        }
        let cap = self.entries.len();
        let mut offset = None;
        for i in 0..self.count {
            let idx = (self.head + i) % cap;
            if self.entries[idx].tag == tag {
                offset = Some(i);
                break;
            }
        }
        let offset = offset?;
        let found_idx = (self.head + offset) % cap;
        let entry = self.entries[found_idx].clone();

        for step in offset..self.count - 1 {
            let from = (self.head + step + 1) % cap;
            let to = (self.head + step) % cap;
            self.entries[to] = self.entries[from].clone();
        }
        let last = (self.head + self.count - 1) % cap;
        self.entries[last].valid = false;
        self.tail = last;
        self.count -= 1;
        Some(entry)
    }

    /// Discards every entry (a fatal error or HALT at retire).
    pub fn flush_all(&mut self) {
        for entry in &mut self.entries {
            entry.valid = false;
        }
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }
}
