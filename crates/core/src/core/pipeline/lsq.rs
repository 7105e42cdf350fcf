//! Load/Store Queue (LSQ): age-ordered memory disambiguation and
//! store-to-load forwarding (§4.6).
//!
//! Unlike the reorder buffer, this tracks both loads and stores so a load's
//! address can be checked against every older, still in-flight store before
//! it reads `data_memory`. APEX has no sub-word access — every LOAD/STORE
//! addresses one whole memory cell — so forwarding is an exact address
//! match rather than the byte-range overlap a wider ISA would need.
//!
//! A store's value is written to `data_memory` only once it retires from
//! the ROB (`Lsq::commit_head`); the queue itself never touches memory.

use crate::core::pipeline::rob::RobTag;

/// Result of a store-to-load forwarding check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardResult {
    /// An older store to the same address has already resolved its data.
    Hit(i64),
    /// An older store targets the same address but hasn't resolved yet.
    Stall,
    /// No older in-flight store addresses the same location.
    Miss,
}

/// Lifecycle state of an LSQ entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LsqState {
    /// Allocated at dispatch; address not yet computed.
    #[default]
    Pending,
    /// Address (and, for stores, data) resolved by the AFU.
    Resolved,
    /// The ROB has retired this entry (stores only; loads are removed
    /// directly once they've read their value).
    Committed,
}

/// A single entry in the load/store queue.
#[derive(Clone, Debug, Default)]
pub struct LsqEntry {
    /// ROB tag of the owning instruction.
    pub tag: RobTag,
    /// True for STORE/STOREP, false for LOAD/LOADP.
    pub is_store: bool,
    /// Resolved memory address, once known.
    pub addr: Option<i64>,
    /// Store data, once known. Unused for loads.
    pub data: Option<i64>,
    /// Destination physical register, for loads.
    pub dest_phys: Option<usize>,
    /// Program order position; lower is older.
    pub age: u64,
    /// Current lifecycle state.
    pub state: LsqState,
    /// Whether this slot is occupied.
    pub valid: bool,
}

/// Load/Store Queue: a FIFO ring ordered by program age.
pub struct Lsq {
    entries: Vec<LsqEntry>,
    head: usize,
    tail: usize,
    count: usize,
}

impl Lsq {
    /// Creates a new LSQ with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, LsqEntry::default);
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

    /// Allocates a slot for a load or store at dispatch. Returns the
    /// entry's index (stable until it's removed), or `None` if full.
    pub fn allocate(&mut self, tag: RobTag, is_store: bool, age: u64) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let idx = self.tail;
        self.entries[idx] = LsqEntry {
            tag,
            is_store,
            addr: None,
            data: None,
            dest_phys: None,
            age,
            state: LsqState::Pending,
            valid: true,
        };
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        Some(idx)
    }

    /// Resolves a store's address and data after the AFU computes them.
    pub fn resolve_store(&mut self, idx: usize, addr: i64, data: i64) {
        self.entries[idx].addr = Some(addr);
        self.entries[idx].data = Some(data);
        self.entries[idx].state = LsqState::Resolved;
    }

    /// Resolves a load's address and destination after the AFU computes it.
    pub fn resolve_load(&mut self, idx: usize, addr: i64, dest_phys: Option<usize>) {
        self.entries[idx].addr = Some(addr);
        self.entries[idx].dest_phys = dest_phys;
        self.entries[idx].state = LsqState::Resolved;
    }

    /// Checks whether any store older than `load_idx` forwards to it.
    /// Searches from the newest older store backward, so a more recent
    /// store to the same address shadows an older one.
    pub fn forward_check(&self, load_idx: usize) -> ForwardResult {
        let load_age = self.entries[load_idx].age;
        let addr = match self.entries[load_idx].addr {
            Some(a) => a,
            None => return ForwardResult::Miss,
        };

        let mut found_stall = false;
        let mut idx = self.head;
        for _ in 0..self.count {
            let entry = &self.entries[idx];
            if entry.valid && entry.is_store && entry.age < load_age {
                match entry.addr {
                    Some(store_addr) if store_addr == addr => match entry.data {
                        Some(data) => return ForwardResult::Hit(data),
                        None => found_stall = true,
                    },
                    None => {
                        // Unresolved older store: its address might alias.
                        // Conservatively stall rather than risk a stale read.
                        found_stall = true;
                    }
                    _ => {}
                }
            }
            idx = (idx + 1) % self.entries.len();
        }

        if found_stall {
            ForwardResult::Stall
        } else {
            ForwardResult::Miss
        }
    }

    /// Returns the entry at a specific index, as returned by `allocate` or
    /// `find_ready_load`.
    pub fn entry(&self, idx: usize) -> &LsqEntry {
        &self.entries[idx]
    }

    /// Returns the head (oldest) entry without removing it, if non-empty.
    pub fn head_entry(&self) -> Option<&LsqEntry> {
        if self.count == 0 {
            None
        } else {
            Some(&self.entries[self.head])
        }
    }

    /// Finds the oldest resolved load not blocked by an older unresolved
    /// store, scanning oldest-to-youngest. Per §5's explicit allowance,
    /// loads may execute out of order relative to each other, so a load
    /// stalled by its own older store doesn't block a later, independent
    /// load behind it.
    pub fn find_ready_load(&self) -> Option<usize> {
        let mut idx = self.head;
        for _ in 0..self.count {
            let entry = &self.entries[idx];
            if entry.valid && !entry.is_store && entry.state == LsqState::Resolved {
                if !matches!(self.forward_check(idx), ForwardResult::Stall) {
                    return Some(idx);
                }
            }
            idx = (idx + 1) % self.entries.len();
        }
        None
    }

    /// Retires the head entry if it matches `tag`. For a store, returns
    /// its resolved `(addr, data)` so the caller can write `data_memory`.
    pub fn commit_head(&mut self, tag: RobTag) -> Option<(i64, i64)> {
        if self.count == 0 || self.entries[self.head].tag != tag {
            return None;
        }
        let entry = self.entries[self.head].clone();
        self.entries[self.head].valid = false;
        self.head = (self.head + 1) % self.entries.len();
        self.count -= 1;
        if entry.is_store {
            Some((entry.addr.unwrap_or(0), entry.data.unwrap_or(0)))
        } else {
            None
        }
    }

    /// Removes the entry at `idx` once a load has read its value (either
    /// forwarded or from memory) and no longer needs to be tracked.
    pub fn remove_load(&mut self, idx: usize) {
        if idx == self.head {
            self.entries[self.head].valid = false;
            self.head = (self.head + 1) % self.entries.len();
            self.count -= 1;
        } else {
            self.entries[idx].valid = false;
        }
    }

    /// Discards entries dispatched after `age` (exclusive), on a
    /// misprediction.
    pub fn flush_after(&mut self, age: u64) {
        if self.count == 0 {
            return;
        }
        let cap = self.entries.len();
        let mut new_tail = self.head;
        let mut new_count = 0;
        let mut idx = self.head;
        for _ in 0..self.count {
            if self.entries[idx].valid && self.entries[idx].age <= age {
                if idx != new_tail {
                    self.entries[new_tail] = self.entries[idx].clone();
                    self.entries[idx].valid = false;
                }
                new_tail = (new_tail + 1) % cap;
                new_count += 1;
            } else {
                self.entries[idx].valid = false;
            }
            idx = (idx + 1) % cap;
        }
        self.tail = new_tail;
        self.count = new_count;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_load_forwards() {
        let mut lsq = Lsq::new(4);
        let store_idx = lsq.allocate(RobTag(1), true, 0).unwrap();
        let load_idx = lsq.allocate(RobTag(2), false, 1).unwrap();
        lsq.resolve_store(store_idx, 100, 7);
        lsq.resolve_load(load_idx, 100, Some(5));
        assert_eq!(lsq.forward_check(load_idx), ForwardResult::Hit(7));
    }

    #[test]
    fn unresolved_older_store_stalls_load() {
        let mut lsq = Lsq::new(4);
        lsq.allocate(RobTag(1), true, 0).unwrap();
        let load_idx = lsq.allocate(RobTag(2), false, 1).unwrap();
        lsq.resolve_load(load_idx, 100, Some(5));
        assert_eq!(lsq.forward_check(load_idx), ForwardResult::Stall);
    }

    #[test]
    fn unrelated_store_misses() {
        let mut lsq = Lsq::new(4);
        let store_idx = lsq.allocate(RobTag(1), true, 0).unwrap();
        let load_idx = lsq.allocate(RobTag(2), false, 1).unwrap();
        lsq.resolve_store(store_idx, 200, 7);
        lsq.resolve_load(load_idx, 100, Some(5));
        assert_eq!(lsq.forward_check(load_idx), ForwardResult::Miss);
    }

    #[test]
    fn commit_head_returns_store_data_for_memory_write() {
        let mut lsq = Lsq::new(4);
        let idx = lsq.allocate(RobTag(1), true, 0).unwrap();
        lsq.resolve_store(idx, 42, 99);
        let (addr, data) = lsq.commit_head(RobTag(1)).unwrap();
        assert_eq!((addr, data), (42, 99));
        assert!(lsq.commit_head(RobTag(1)).is_none());
    }

    #[test]
    fn find_ready_load_skips_stalled_older_load_for_independent_younger_one() {
        let mut lsq = Lsq::new(4);
        lsq.allocate(RobTag(1), true, 0).unwrap(); // unresolved older store
        let blocked = lsq.allocate(RobTag(2), false, 1).unwrap();
        lsq.resolve_load(blocked, 100, Some(5));
        let free = lsq.allocate(RobTag(3), false, 2).unwrap();
        lsq.resolve_load(free, 200, Some(6));
        assert_eq!(lsq.find_ready_load(), Some(free));
    }

    #[test]
    fn head_entry_reflects_oldest_without_removing_it() {
        let mut lsq = Lsq::new(4);
        lsq.allocate(RobTag(1), true, 0).unwrap();
        assert_eq!(lsq.head_entry().unwrap().tag, RobTag(1));
        assert_eq!(lsq.len(), 1);
    }

    #[test]
    fn flush_after_discards_younger_entries() {
        let mut lsq = Lsq::new(4);
        lsq.allocate(RobTag(1), true, 0).unwrap();
        lsq.allocate(RobTag(2), false, 1).unwrap();
        lsq.flush_after(0);
        assert_eq!(lsq.len(), 1);
    }
}
