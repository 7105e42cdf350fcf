//! Simulator: owns the engine and drives it to completion.

use crate::common::error::ProgramError;
use crate::common::reg::{Flags, RegisterFile};
use crate::config::Config;
use crate::core::Engine;
use crate::isa::instruction::Instruction;

/// Top-level simulator: wraps the engine and exposes a run-to-completion
/// entry point alongside the raw tick-by-tick one the CLI uses for tracing.
pub struct Simulator {
    engine: Engine,
}

impl Simulator {
    /// Creates a new simulator running `code` under `config`.
    pub fn new(config: &Config, code: Vec<Instruction>) -> Self {
        Self {
            engine: Engine::new(config, code),
        }
    }

    /// Advances the simulator by one clock cycle.
    pub fn tick(&mut self) {
        self.engine.tick();
    }

    /// True once the engine has halted (`HALT` retired or a [`ProgramError`]
    /// reached the head of the ROB).
    pub fn is_halted(&self) -> bool {
        self.engine.is_halted()
    }

    /// True once the engine has gone more ticks than
    /// [`crate::common::constants::HANG_DETECTION_THRESHOLD`] without
    /// retiring anything.
    pub fn is_hung(&self) -> bool {
        self.engine.is_hung()
    }

    /// Runs until halted or hung, returning the program error if one ended
    /// the run.
    pub fn run(&mut self) -> Option<ProgramError> {
        while !self.engine.is_halted() && !self.engine.is_hung() {
            self.engine.tick();
        }
        self.engine.program_error()
    }

    /// Number of ticks elapsed.
    pub fn tick_count(&self) -> u64 {
        self.engine.tick_count()
    }

    /// Number of instructions retired.
    pub fn retired_count(&self) -> u64 {
        self.engine.retired_count()
    }

    /// The architectural register file, as of the most recent retire.
    pub fn registers(&self) -> &RegisterFile {
        self.engine.registers()
    }

    /// The architectural condition flags, as of the most recent retire.
    pub fn flags(&self) -> Flags {
        self.engine.flags()
    }

    /// The flat data memory.
    pub fn data_memory(&self) -> &[i64] {
        self.engine.data_memory()
    }
}
