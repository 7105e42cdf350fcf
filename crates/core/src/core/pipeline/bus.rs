//! The forwarding bus: a transient per-tick broadcast of completing
//! functional-unit results, keyed by destination physical register.
//!
//! A functional unit publishes `(phys, value)` the tick it completes. The
//! issue queue is the only consumer: an entry already parked on
//! `Operand::Waiting(phys)` needs an explicit wakeup event to notice the
//! value arrived. Decode needs no such mechanism — it reads the physical
//! register file directly at rename time, and stage execution runs in
//! reverse pipeline order each tick, so by the time decode runs, every
//! functional unit that completed this cycle has already written its
//! result into the register file. The bus is cleared at the end of every
//! tick; it carries no state across cycles.

/// One tick's worth of completed results, broadcast by destination.
#[derive(Default)]
pub struct ForwardingBus {
    entries: Vec<(usize, i64)>,
}

impl ForwardingBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a completed result for physical register `phys`.
    pub fn broadcast(&mut self, phys: usize, value: i64) {
        self.entries.push((phys, value));
    }

    /// Iterates this tick's broadcasts.
    pub fn broadcasts(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.entries.iter().copied()
    }

    /// Looks up a specific physical register's broadcast value this tick,
    /// if any functional unit completed it.
    pub fn get(&self, phys: usize) -> Option<i64> {
        self.entries
            .iter()
            .rev()
            .find(|(p, _)| *p == phys)
            .map(|(_, v)| *v)
    }

    /// Clears the bus. Called once at the end of every tick.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
