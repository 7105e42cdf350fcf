use apex_core::Config;
use apex_core::common::error::ProgramError;
use apex_core::common::reg::Flags;
use apex_core::isa::parser;
use apex_core::sim::simulator::Simulator;

/// Owns a `Simulator` built from inline assembly text and drives it to
/// completion, mirroring the teacher's `TestContext` builder style.
pub struct TestContext {
    sim: Simulator,
}

impl TestContext {
    /// Assembles `source` under a default `Config` and builds the simulator.
    pub fn new(source: &str) -> Self {
        Self::with_config(source, Config::default())
    }

    /// Assembles `source` under a caller-supplied `Config`.
    pub fn with_config(source: &str, config: Config) -> Self {
        let code = parser::parse_program(source).expect("test program must assemble");
        Self {
            sim: Simulator::new(&config, code),
        }
    }

    /// Runs to halt or hang, returning the program error if the run ended
    /// in one.
    pub fn run(&mut self) -> Option<ProgramError> {
        self.sim.run()
    }

    /// Advances by exactly one clock cycle.
    pub fn tick(&mut self) {
        self.sim.tick();
    }

    pub fn is_halted(&self) -> bool {
        self.sim.is_halted()
    }

    pub fn is_hung(&self) -> bool {
        self.sim.is_hung()
    }

    pub fn reg(&self, idx: usize) -> i64 {
        self.sim.registers().read(idx)
    }

    pub fn flags(&self) -> Flags {
        self.sim.flags()
    }

    pub fn mem(&self, addr: usize) -> i64 {
        self.sim.data_memory()[addr]
    }

    pub fn retired(&self) -> u64 {
        self.sim.retired_count()
    }

    pub fn ticks(&self) -> u64 {
        self.sim.tick_count()
    }
}
