//! Branch Target Buffer (BTB): a 4-slot fully-associative predictor with a
//! 3-state saturating counter per entry (§4.2/§9).
//!
//! Replacement is LRU by shift-down: every lookup or resolve moves its
//! entry (inserting one if the PC missed) to slot 3, shifting everything
//! above it down by one and discarding whatever falls off slot 0. This
//! fixes an off-by-one in the original reference implementation's eviction
//! loop, which could leave a stale duplicate slot after an eviction.

use crate::isa::instruction::Opcode;

/// The predictor's three states: strongly-not-taken, weakly-taken,
/// strongly-taken. Reproduces the original encoding exactly rather than a
/// conventional 4-state 2-bit counter.
const STRONGLY_NOT_TAKEN: u8 = 0;
const WEAKLY_TAKEN: u8 = 1;
const STRONGLY_TAKEN: u8 = 2;

/// A single BTB entry.
#[derive(Clone, Copy, Debug)]
struct BtbEntry {
    pc: i64,
    target: i64,
    counter: u8,
}

/// Branch Target Buffer: fully-associative, fixed capacity, LRU by
/// shift-down.
pub struct Btb {
    /// Index 0 is least-recently-used, the last index is most-recently-used.
    slots: Vec<Option<BtbEntry>>,
}

impl Btb {
    /// Creates an empty BTB with the given number of slots.
    pub fn new(slots: usize) -> Self {
        Self {
            slots: vec![None; slots],
        }
    }

    /// Looks up `pc` without disturbing LRU order (a pure prediction read,
    /// used by fetch). Returns `(slot, predicted_taken, target)`.
    pub fn predict(&self, pc: i64) -> Option<(usize, bool, i64)> {
        self.slots.iter().enumerate().find_map(|(i, slot)| {
            slot.filter(|e| e.pc == pc)
                .map(|e| (i, e.counter >= WEAKLY_TAKEN, e.target))
        })
    }

    /// Records a branch's actual outcome at resolution (BFU). Updates the
    /// counter toward `taken` if the PC already has an entry, seeds a new
    /// entry at the opcode's initial polarity otherwise, and in both cases
    /// promotes the entry to the most-recently-used slot.
    pub fn resolve(&mut self, pc: i64, opcode: Opcode, taken: bool, target: i64) {
        let existing = self
            .slots
            .iter()
            .position(|slot| slot.is_some_and(|e| e.pc == pc));

        let mut entry = match existing {
            Some(i) => self.slots[i].take().expect("position found a Some slot"),
            None => BtbEntry {
                pc,
                target,
                counter: if opcode.initial_prediction_is_taken() {
                    WEAKLY_TAKEN
                } else {
                    STRONGLY_NOT_TAKEN
                },
            },
        };

        if let Some(i) = existing {
            self.shift_down_from(i);
        }

        entry.target = target;
        entry.counter = if taken {
            (entry.counter + 1).min(STRONGLY_TAKEN)
        } else {
            entry.counter.saturating_sub(1).max(STRONGLY_NOT_TAKEN)
        };

        self.insert_at_mru(entry);
    }

    /// Shifts every slot above `evicted_idx` down by one, opening a gap at
    /// the MRU end. Used both to drop a stale slot on eviction and to
    /// vacate the slot an existing entry is being promoted from.
    fn shift_down_from(&mut self, evicted_idx: usize) {
        for i in evicted_idx..self.slots.len() - 1 {
            self.slots[i] = self.slots[i + 1];
        }
        *self.slots.last_mut().expect("non-empty BTB") = None;
    }

    /// Places `entry` in the MRU slot, shifting every other occupant down
    /// (and dropping whichever entry falls off the LRU end).
    fn insert_at_mru(&mut self, entry: BtbEntry) {
        if self.slots[0].is_some() {
            self.shift_down_from(0);
        }
        *self.slots.last_mut().expect("non-empty BTB") = Some(entry);
    }
}
