//! The top-level tick driver: wires every structure in this module into a
//! ten-stage pipeline and advances it one cycle at a time (§4).
//!
//! Stages run in *reverse* pipeline order within a single [`Engine::tick`]:
//! retire, MAU, LSQ, BFU, AFU, MulFU, IntFU, issue, decode/rename, fetch.
//! Running a later stage before the one that feeds it lets a functional
//! unit's result land in the renamer and on the forwarding bus before issue
//! runs in the same tick, and lets a stage that clears its own input latch
//! do so before issue tries to fill it again — so issue never needs a
//! separate busy check on any `FuLatch` it writes to.

use crate::common::constants::{CODE_BASE_ADDRESS, FLAGS_ARCH, HANG_DETECTION_THRESHOLD, INSTRUCTION_SIZE, N_ARCH_TOTAL};
use crate::common::error::ProgramError;
use crate::common::reg::{Flags, RegisterFile};
use crate::config::Config;
use crate::core::pipeline::bq::Bq;
use crate::core::pipeline::btb::Btb;
use crate::core::pipeline::bus::ForwardingBus;
use crate::core::pipeline::iq::{Iq, IqEntry, Operand};
use crate::core::pipeline::latches::{DecodeDispatchLatch, FetchDecodeLatch, FuLatch};
use crate::core::pipeline::lsq::{ForwardResult, Lsq, LsqState};
use crate::core::pipeline::rob::{Rob, RobState, RobTag};
use crate::core::rename::Renamer;
use crate::isa::instruction::{FuKind, Instruction, Opcode};

/// The engine: every pipeline structure, the architectural state retire
/// writes into, and the tick loop driving them.
pub struct Engine {
    renamer: Renamer,
    rob: Rob,
    iq: Iq,
    lsq: Lsq,
    bq: Bq,
    btb: Btb,
    bus: ForwardingBus,

    fd_latch: FetchDecodeLatch,
    dd_latch: DecodeDispatchLatch,
    int_latch: FuLatch,
    mul_latch: FuLatch,
    afu_latch: FuLatch,
    bfu_latch: FuLatch,
    mau_latch: FuLatch,

    code: Vec<Instruction>,
    data_memory: Vec<i64>,
    pc: i64,
    next_age: u64,

    arch_regs: RegisterFile,
    flags: Flags,

    fetch_enabled: bool,
    halted: bool,
    program_error: Option<ProgramError>,

    tick_count: u64,
    retired_count: u64,
    last_retire_tick: u64,

    trace: bool,
}

impl Engine {
    /// Builds an engine sized per `config`, ready to run `code` from
    /// `config.general.start_pc`.
    pub fn new(config: &Config, code: Vec<Instruction>) -> Self {
        let core = &config.core;
        Self {
            renamer: Renamer::new(N_ARCH_TOTAL, core.n_phys),
            rob: Rob::new(core.rob_capacity),
            iq: Iq::new(core.iq_capacity),
            lsq: Lsq::new(core.lsq_capacity),
            bq: Bq::new(core.bq_capacity),
            btb: Btb::new(core.btb_slots),
            bus: ForwardingBus::new(),

            fd_latch: FetchDecodeLatch::default(),
            dd_latch: DecodeDispatchLatch::default(),
            int_latch: FuLatch::default(),
            mul_latch: FuLatch::default(),
            afu_latch: FuLatch::default(),
            bfu_latch: FuLatch::default(),
            mau_latch: FuLatch::default(),

            code,
            data_memory: vec![0; core.data_memory_size],
            pc: config.general.start_pc,
            next_age: 0,

            arch_regs: RegisterFile::new(),
            flags: Flags::default(),

            fetch_enabled: true,
            halted: false,
            program_error: None,

            tick_count: 0,
            retired_count: 0,
            last_retire_tick: 0,

            trace: config.general.trace,
        }
    }

    /// Advances the engine by one cycle. A no-op once [`Engine::is_halted`].
    pub fn tick(&mut self) {
        if self.halted {
            return;
        }
        self.tick_count += 1;

        self.stage_retire();
        self.stage_mau();
        self.stage_lsq();
        self.stage_bfu();
        self.stage_afu();
        self.stage_mul_fu();
        self.stage_int_fu();
        self.stage_issue();
        self.stage_dispatch();
        self.stage_decode_rename();
        self.stage_fetch();

        self.bus.clear();
    }

    /// True once a `HALT` has retired or a [`ProgramError`] has reached the
    /// head of the ROB.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The runtime error that ended the run, if any.
    pub fn program_error(&self) -> Option<ProgramError> {
        self.program_error
    }

    /// Number of ticks elapsed.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of instructions retired so far.
    pub fn retired_count(&self) -> u64 {
        self.retired_count
    }

    /// True once more than [`HANG_DETECTION_THRESHOLD`] ticks have passed
    /// with nothing retiring — an engine bug, not a property of any valid
    /// program, since every real program terminates in a `HALT` or a
    /// trapped [`ProgramError`].
    pub fn is_hung(&self) -> bool {
        !self.halted && self.tick_count - self.last_retire_tick > HANG_DETECTION_THRESHOLD
    }

    /// The architectural register file, as of the most recent retire.
    pub fn registers(&self) -> &RegisterFile {
        &self.arch_regs
    }

    /// The architectural condition flags, as of the most recent retire.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// The flat data memory.
    pub fn data_memory(&self) -> &[i64] {
        &self.data_memory
    }

    fn fetch_instruction(&self, pc: i64) -> Option<Instruction> {
        let offset = (pc - CODE_BASE_ADDRESS) / INSTRUCTION_SIZE;
        usize::try_from(offset).ok().and_then(|i| self.code.get(i)).copied()
    }

    fn redirect(&mut self, target: i64) {
        self.pc = target;
        self.fd_latch = FetchDecodeLatch::default();
        self.dd_latch = DecodeDispatchLatch::default();
        self.fetch_enabled = true;
    }

    /// Rewinds rename state and discards every speculative entry younger
    /// than `branch_tag`/`branch_age`, on a misprediction or an
    /// unconditionally-redirecting jump (§4.8).
    fn recover_from_misprediction(&mut self, branch_tag: RobTag, branch_age: u64) {
        let discarded = self.rob.flush_after(branch_tag);
        for entry in &discarded {
            if let (Some(arch), Some(prev)) = (entry.dest_arch, entry.prev_phys) {
                let speculative = self.renamer.rewind(arch, prev);
                self.renamer.release(speculative);
            }
            if let Some(prev) = entry.flags_prev_phys {
                let speculative = self.renamer.rewind(FLAGS_ARCH, prev);
                self.renamer.release(speculative);
            }
        }
        self.iq.flush_after(branch_age);
        self.lsq.flush_after(branch_age);
        self.bq.flush_all();

        // The functional-unit latches aren't indexed by age, so a stage that
        // already cleared its own latch earlier this tick can't leave a
        // wrong-path entry behind — except `mau_latch`: `stage_lsq` runs
        // *before* `stage_bfu` in tick order and can refill `mau_latch` with
        // a younger load the same cycle an older branch resolves here, so it
        // needs the same age-gated squash as the other latches. A
        // store-commit entry routed into `mau_latch` by `stage_lsq` is
        // always the ROB head at that point, so it can never be younger than
        // a branch still resolving — its `age: 0` placeholder never
        // needs squashing for that reason.
        if self.int_latch.has_insn && self.int_latch.age > branch_age {
            self.int_latch = FuLatch::default();
        }
        if self.mul_latch.has_insn && self.mul_latch.age > branch_age {
            self.mul_latch = FuLatch::default();
        }
        if self.afu_latch.has_insn && self.afu_latch.age > branch_age {
            self.afu_latch = FuLatch::default();
        }
        if self.mau_latch.has_insn && self.mau_latch.age > branch_age {
            self.mau_latch = FuLatch::default();
        }
    }

    // ---- Fetch (§4.1) ----

    fn stage_fetch(&mut self) {
        if !self.fetch_enabled || self.fd_latch.has_insn {
            return;
        }
        let Some(instruction) = self.fetch_instruction(self.pc) else {
            // Ran off the end of code memory without a HALT: stall fetch
            // rather than fabricate an instruction.
            self.fetch_enabled = false;
            return;
        };

        let pc = self.pc;
        let (predicted_taken, predicted_target, btb_slot) = if instruction.opcode.is_conditional_branch() {
            match self.btb.predict(pc) {
                Some((slot, taken, target)) => (taken, target, Some(slot)),
                None => (false, 0, None),
            }
        } else {
            (false, 0, None)
        };

        self.fd_latch = FetchDecodeLatch {
            has_insn: true,
            pc,
            instruction,
            predicted_taken,
            predicted_target,
            btb_slot,
        };

        self.pc = if predicted_taken { predicted_target } else { pc + INSTRUCTION_SIZE };

        if instruction.opcode == Opcode::Halt {
            self.fetch_enabled = false;
        }
    }

    // ---- Decode/Rename (§4.2) ----

    fn stage_decode_rename(&mut self) {
        if !self.fd_latch.has_insn || self.dd_latch.has_insn {
            return;
        }
        let fetched = self.fd_latch.clone();
        let instruction = fetched.instruction;
        let opcode = instruction.opcode;

        if matches!(opcode, Opcode::Nop | Opcode::Halt) {
            self.fd_latch = FetchDecodeLatch::default();
            self.dd_latch = DecodeDispatchLatch {
                has_insn: true,
                pc: fetched.pc,
                instruction,
                ..DecodeDispatchLatch::default()
            };
            return;
        }

        let (reads_rs1, reads_rs2, writes_rd, _) = opcode.operand_shape();

        // Regular-destination allocation (gated on writes_rd) and
        // flags-destination allocation (gated on writes_flags) are
        // independent: CMP/CML write flags but not rd, so they still need
        // one free physical register, not zero.
        let needed = usize::from(writes_rd) + usize::from(opcode.writes_flags());
        if self.renamer.free_count() < needed || self.rob.is_full() {
            if self.trace {
                tracing::trace!(pc = fetched.pc, tick = self.tick_count, "decode/rename stall: renamer or ROB full");
            }
            return;
        }

        // Conditional branches have no register operand slot of their own;
        // they implicitly read the flags pseudo-register as their sole
        // source, riding the same rename/wakeup path as a real rs1.
        let src1_phys = if opcode.is_conditional_branch() {
            Some(self.renamer.lookup(FLAGS_ARCH))
        } else if reads_rs1 {
            instruction.rs1.map(|arch| self.renamer.lookup(arch))
        } else {
            None
        };
        let src2_phys = if reads_rs2 {
            instruction.rs2.map(|arch| self.renamer.lookup(arch))
        } else {
            None
        };

        let (dest_phys, prev_phys) = if writes_rd {
            let arch = instruction.rd.expect("writes_rd implies rd is Some");
            let (new_phys, prior) = self.renamer.allocate_dest(arch).expect("checked free_count above");
            (Some(new_phys), Some(prior))
        } else {
            (None, None)
        };

        let (flags_dest_phys, flags_prev_phys) = if opcode.writes_flags() {
            let (new_phys, prior) = self.renamer.allocate_dest(FLAGS_ARCH).expect("checked free_count above");
            (Some(new_phys), Some(prior))
        } else {
            (None, None)
        };

        self.fd_latch = FetchDecodeLatch::default();
        self.dd_latch = DecodeDispatchLatch {
            has_insn: true,
            pc: fetched.pc,
            instruction,
            src1_phys,
            src2_phys,
            dest_phys,
            prev_phys,
            flags_dest_phys,
            flags_prev_phys,
            predicted_taken: fetched.predicted_taken,
            predicted_target: fetched.predicted_target,
            btb_slot: fetched.btb_slot,
        };
    }

    // ---- Dispatch (§4.3) ----

    fn stage_dispatch(&mut self) {
        if !self.dd_latch.has_insn {
            return;
        }
        let dd = self.dd_latch.clone();
        let instruction = dd.instruction;
        let opcode = instruction.opcode;

        if matches!(opcode, Opcode::Nop | Opcode::Halt) {
            if self.rob.is_full() {
                return;
            }
            self.dd_latch = DecodeDispatchLatch::default();
            self.rob.allocate_control(dd.pc, opcode == Opcode::Halt);
            return;
        }

        let is_memory = opcode.is_memory_op();
        let is_branch_like = opcode.is_conditional_branch() || opcode.is_unconditional_jump();

        if self.iq.is_full() || self.rob.is_full() {
            if self.trace {
                tracing::trace!(pc = dd.pc, tick = self.tick_count, "dispatch stall: IQ or ROB full");
            }
            return;
        }
        if is_memory && self.lsq.is_full() {
            if self.trace {
                tracing::trace!(pc = dd.pc, tick = self.tick_count, "dispatch stall: LSQ full");
            }
            return;
        }
        if is_branch_like && self.bq.is_full() {
            if self.trace {
                tracing::trace!(pc = dd.pc, tick = self.tick_count, "dispatch stall: BQ full");
            }
            return;
        }

        let dest_arch = if dd.dest_phys.is_some() { instruction.rd } else { None };
        // Allocate the ROB entry first to obtain its tag, then the LSQ
        // entry keyed by that tag, then patch the LSQ index back into the
        // ROB entry — the two allocations need each other's output.
        let tag = self
            .rob
            .allocate(dd.pc, dest_arch, dd.dest_phys, dd.prev_phys, dd.flags_dest_phys, dd.flags_prev_phys, None)
            .expect("checked rob.is_full above");

        let lsq_index = if is_memory {
            let idx = self
                .lsq
                .allocate(tag, matches!(opcode, Opcode::Store | Opcode::Storep), self.next_age)
                .expect("checked lsq.is_full above");
            self.rob.set_lsq_index(tag, idx);
            Some(idx)
        } else {
            None
        };

        if is_branch_like {
            self.bq.allocate(tag, dd.pc, dd.predicted_taken, dd.predicted_target, dd.btb_slot);
        }

        let to_operand = |phys: Option<usize>| match phys {
            Some(p) if self.renamer.is_ready(p) => Operand::Ready(self.renamer.read(p)),
            Some(p) => Operand::Waiting(p),
            None => Operand::None,
        };

        // LOADP/STOREP write their post-incremented source straight back
        // into the same physical register already captured as rs1/rs2,
        // rather than renaming a fresh destination for it (§9 Open
        // Question 7).
        let writeback_phys = match opcode {
            Opcode::Loadp => dd.src1_phys,
            Opcode::Storep => dd.src2_phys,
            _ => None,
        };

        self.dd_latch = DecodeDispatchLatch::default();
        self.iq.insert(IqEntry {
            tag,
            opcode,
            src1: to_operand(dd.src1_phys),
            src2: to_operand(dd.src2_phys),
            imm: instruction.imm,
            dest_phys: dd.dest_phys,
            flags_dest_phys: dd.flags_dest_phys,
            writeback_phys,
            lsq_index,
            pc: dd.pc,
            age: self.next_age,
        });
        self.next_age += 1;
    }

    // ---- Issue (§4.4) ----

    fn stage_issue(&mut self) {
        self.iq.wakeup(&self.bus);

        if !self.int_latch.has_insn {
            if let Some(entry) = self.iq.select(FuKind::Int) {
                self.int_latch = Self::entry_to_latch(entry);
            }
        }
        if !self.mul_latch.has_insn {
            if let Some(entry) = self.iq.select(FuKind::Mul) {
                self.mul_latch = Self::entry_to_latch(entry);
            }
        }
        if !self.afu_latch.has_insn {
            if let Some(entry) = self.iq.select(FuKind::Addr) {
                self.afu_latch = Self::entry_to_latch(entry);
            }
        }
        if !self.bfu_latch.has_insn {
            if let Some(entry) = self.iq.select(FuKind::Branch) {
                self.bfu_latch = Self::entry_to_latch(entry);
            }
        }
    }

    fn entry_to_latch(entry: IqEntry) -> FuLatch {
        let val = |op: Operand| match op {
            Operand::Ready(v) => v,
            _ => 0,
        };
        FuLatch {
            has_insn: true,
            tag: entry.tag,
            opcode: entry.opcode,
            val1: val(entry.src1),
            val2: val(entry.src2),
            imm: entry.imm,
            dest_phys: entry.dest_phys,
            flags_dest_phys: entry.flags_dest_phys,
            writeback_phys: entry.writeback_phys,
            pc: entry.pc,
            lsq_index: entry.lsq_index,
            age: entry.age,
        }
    }

    // ---- IntFU (§4.5) ----

    fn stage_int_fu(&mut self) {
        if !self.int_latch.has_insn {
            return;
        }
        let latch = std::mem::take(&mut self.int_latch);
        let imm = latch.imm.unwrap_or(0);

        let (result, flags) = match latch.opcode {
            Opcode::Add => {
                let r = latch.val1.wrapping_add(latch.val2);
                (Some(r), Some(Flags::from_result(r)))
            }
            Opcode::Sub => {
                let r = latch.val1.wrapping_sub(latch.val2);
                (Some(r), Some(Flags::from_result(r)))
            }
            Opcode::And => {
                let r = latch.val1 & latch.val2;
                (Some(r), Some(Flags::from_result(r)))
            }
            Opcode::Or => {
                let r = latch.val1 | latch.val2;
                (Some(r), Some(Flags::from_result(r)))
            }
            Opcode::Xor => {
                let r = latch.val1 ^ latch.val2;
                (Some(r), Some(Flags::from_result(r)))
            }
            Opcode::Addl => {
                let r = latch.val1.wrapping_add(imm);
                (Some(r), Some(Flags::from_result(r)))
            }
            Opcode::Subl => {
                let r = latch.val1.wrapping_sub(imm);
                (Some(r), Some(Flags::from_result(r)))
            }
            Opcode::Div => {
                if latch.val2 == 0 {
                    self.rob.fault(latch.tag, ProgramError::DivideByZero { pc: latch.pc });
                    return;
                }
                let r = latch.val1.wrapping_div(latch.val2);
                (Some(r), Some(Flags::from_result(r)))
            }
            Opcode::Cmp => (None, Some(Flags::from_compare(latch.val1, latch.val2))),
            Opcode::Cml => (None, Some(Flags::from_compare(latch.val1, imm))),
            Opcode::Movc => (Some(imm), None),
            _ => unreachable!("only IntFU-class opcodes are ever placed in int_latch"),
        };

        if let (Some(value), Some(dest)) = (result, latch.dest_phys) {
            self.renamer.write(dest, value);
            self.bus.broadcast(dest, value);
        }
        if let (Some(flags), Some(flags_dest)) = (flags, latch.flags_dest_phys) {
            let packed = flags.pack();
            self.renamer.write(flags_dest, packed);
            self.bus.broadcast(flags_dest, packed);
        }
        self.rob.complete(latch.tag);
    }

    // ---- MulFU (§4.5) ----

    fn stage_mul_fu(&mut self) {
        if !self.mul_latch.has_insn {
            return;
        }
        let latch = std::mem::take(&mut self.mul_latch);
        let result = latch.val1.wrapping_mul(latch.val2);
        let flags = Flags::from_result(result);

        if let Some(dest) = latch.dest_phys {
            self.renamer.write(dest, result);
            self.bus.broadcast(dest, result);
        }
        if let Some(flags_dest) = latch.flags_dest_phys {
            let packed = flags.pack();
            self.renamer.write(flags_dest, packed);
            self.bus.broadcast(flags_dest, packed);
        }
        self.rob.complete(latch.tag);
    }

    // ---- AFU (§4.5) ----

    fn stage_afu(&mut self) {
        if !self.afu_latch.has_insn {
            return;
        }
        let latch = std::mem::take(&mut self.afu_latch);
        let imm = latch.imm.unwrap_or(0);
        let idx = latch.lsq_index.expect("every AFU-routed instruction carries an LSQ index");

        match latch.opcode {
            Opcode::Load => {
                self.lsq.resolve_load(idx, latch.val1 + imm, latch.dest_phys);
            }
            Opcode::Loadp => {
                self.lsq.resolve_load(idx, latch.val1 + imm, latch.dest_phys);
                if let Some(wb) = latch.writeback_phys {
                    let new_val = latch.val1 + 4;
                    self.renamer.write(wb, new_val);
                    self.bus.broadcast(wb, new_val);
                }
            }
            Opcode::Store => {
                self.lsq.resolve_store(idx, latch.val2 + imm, latch.val1);
            }
            Opcode::Storep => {
                self.lsq.resolve_store(idx, latch.val2 + imm, latch.val1);
                if let Some(wb) = latch.writeback_phys {
                    let new_val = latch.val2 + 4;
                    self.renamer.write(wb, new_val);
                    self.bus.broadcast(wb, new_val);
                }
            }
            _ => unreachable!("only memory ops are ever placed in afu_latch"),
        }
    }

    // ---- BFU (§4.5/§4.7/§4.8) ----

    fn stage_bfu(&mut self) {
        if !self.bfu_latch.has_insn {
            return;
        }
        let latch = std::mem::take(&mut self.bfu_latch);
        let opcode = latch.opcode;
        let pc = latch.pc;
        let imm = latch.imm.unwrap_or(0);
        let bq_entry = self.bq.take(latch.tag);

        if opcode.is_unconditional_jump() {
            let target = latch.val1 + imm;
            if opcode == Opcode::Jalr {
                if let Some(dest) = latch.dest_phys {
                    let link = pc + INSTRUCTION_SIZE;
                    self.renamer.write(dest, link);
                    self.bus.broadcast(dest, link);
                }
            }
            self.rob.complete(latch.tag);
            // JUMP/JALR are never BTB-predicted, so fetch always sped ahead
            // assuming fall-through; every fetched instruction behind them
            // this cycle is on the wrong path and needs the same recovery
            // as a misprediction.
            self.redirect(target);
            self.recover_from_misprediction(latch.tag, latch.age);
            return;
        }

        let flags = Flags::unpack(latch.val1);
        let actual_taken = match opcode {
            Opcode::Bz => flags.z,
            Opcode::Bnz => !flags.z,
            Opcode::Bp => flags.p,
            Opcode::Bnp => !flags.p,
            Opcode::Bn => flags.n,
            Opcode::Bnn => !flags.n,
            _ => unreachable!("only branches/jumps are ever placed in bfu_latch"),
        };
        let target = pc + imm;
        let predicted_taken = bq_entry.as_ref().is_some_and(|e| e.predicted_taken);

        self.btb.resolve(pc, opcode, actual_taken, target);
        self.rob.complete(latch.tag);

        if predicted_taken != actual_taken {
            let correct_pc = if actual_taken { target } else { pc + INSTRUCTION_SIZE };
            if self.trace {
                tracing::debug!(pc, tick = self.tick_count, correct_pc, "branch mispredict");
            }
            self.redirect(correct_pc);
            self.recover_from_misprediction(latch.tag, latch.age);
        }
    }

    // ---- LSQ / store commit gating (§4.6) ----

    fn stage_lsq(&mut self) {
        if let Some(head) = self.lsq.head_entry() {
            if head.is_store {
                let ready_to_commit =
                    head.state == LsqState::Resolved && self.rob.peek_head().is_some_and(|h| h.tag == head.tag);
                if ready_to_commit && !self.mau_latch.has_insn {
                    let tag = head.tag;
                    if let Some((addr, data)) = self.lsq.commit_head(tag) {
                        self.mau_latch = FuLatch {
                            has_insn: true,
                            tag,
                            opcode: Opcode::Store,
                            val1: addr,
                            val2: data,
                            imm: None,
                            dest_phys: None,
                            flags_dest_phys: None,
                            writeback_phys: None,
                            pc: 0,
                            lsq_index: None,
                            age: 0,
                        };
                    }
                }
                // A store at the head blocks every other memory op behind
                // it until it is both resolved and the ROB head.
                return;
            }
        }

        if self.mau_latch.has_insn {
            return;
        }
        let Some(idx) = self.lsq.find_ready_load() else {
            return;
        };
        let tag = self.lsq.entry(idx).tag;
        let dest_phys = self.lsq.entry(idx).dest_phys;

        match self.lsq.forward_check(idx) {
            ForwardResult::Hit(value) => {
                if let Some(dest) = dest_phys {
                    self.renamer.write(dest, value);
                    self.bus.broadcast(dest, value);
                }
                self.rob.complete(tag);
                self.lsq.remove_load(idx);
            }
            ForwardResult::Miss => {
                let addr = self.lsq.entry(idx).addr.unwrap_or(0);
                let age = self.lsq.entry(idx).age;
                self.mau_latch = FuLatch {
                    has_insn: true,
                    tag,
                    opcode: Opcode::Load,
                    val1: addr,
                    val2: 0,
                    imm: None,
                    dest_phys,
                    flags_dest_phys: None,
                    writeback_phys: None,
                    pc: 0,
                    lsq_index: Some(idx),
                    age,
                };
            }
            ForwardResult::Stall => {}
        }
    }

    // ---- MAU (§4.5/§4.6) ----

    fn stage_mau(&mut self) {
        if !self.mau_latch.has_insn {
            return;
        }
        let latch = std::mem::take(&mut self.mau_latch);
        let addr = latch.val1;

        if addr < 0 || addr as usize >= self.data_memory.len() {
            self.rob.fault(latch.tag, ProgramError::MemoryOutOfBounds { addr });
            if let Some(idx) = latch.lsq_index {
                self.lsq.remove_load(idx);
            }
            return;
        }

        match latch.opcode {
            Opcode::Load => {
                let value = self.data_memory[addr as usize];
                if let Some(dest) = latch.dest_phys {
                    self.renamer.write(dest, value);
                    self.bus.broadcast(dest, value);
                }
                if let Some(idx) = latch.lsq_index {
                    self.lsq.remove_load(idx);
                }
                self.rob.complete(latch.tag);
            }
            Opcode::Store => {
                self.data_memory[addr as usize] = latch.val2;
                self.rob.complete(latch.tag);
            }
            _ => unreachable!("only Load/Store generic latches reach the MAU"),
        }
    }

    // ---- Retire (§4.3/§4.7) ----

    fn stage_retire(&mut self) {
        let Some(entry) = self.rob.peek_head().cloned() else {
            return;
        };
        if entry.state == RobState::Issued {
            return;
        }

        if let Some(error) = entry.error {
            self.rob.commit_head();
            self.program_error = Some(error);
            self.halted = true;
            self.fetch_enabled = false;
            self.iq.flush_all();
            self.lsq.flush_all();
            self.bq.flush_all();
            if self.trace {
                tracing::debug!(pc = entry.pc, tick = self.tick_count, %error, "program error at retire");
            }
            return;
        }

        self.rob.commit_head();

        if let (Some(arch), Some(phys)) = (entry.dest_arch, entry.dest_phys) {
            let value = self.renamer.read(phys);
            self.arch_regs.write(arch, value);
        }
        if let Some(prev) = entry.prev_phys {
            self.renamer.release(prev);
        }
        if let Some(flags_phys) = entry.flags_dest_phys {
            self.flags = Flags::unpack(self.renamer.read(flags_phys));
        }
        if let Some(prev) = entry.flags_prev_phys {
            self.renamer.release(prev);
        }

        self.retired_count += 1;
        self.last_retire_tick = self.tick_count;

        if entry.is_halt {
            self.halted = true;
            self.fetch_enabled = false;
            if self.trace {
                tracing::debug!(pc = entry.pc, tick = self.tick_count, "HALT retired");
            }
        }
    }
}
