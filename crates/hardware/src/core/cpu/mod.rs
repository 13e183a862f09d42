//! SISD Core Definition and Tick Driver.
//!
//! This module defines the `SisdCore`, which owns every component of the
//! simulated machine and advances them once per core (driver) tick:
//! 1. **Timing:** Outstanding countdowns of the register file, memory banks, instruction
//!    buffer and cache advance by one core tick.
//! 2. **Execute:** The ALU and the I/O interface update first, so the writes of the
//!    previous cycle are visible to the hazard checks of this one. A branch resolution
//!    is handed to the decoder, which redirects fetch or closes the loop.
//! 3. **Front End:** Decode dispatches, then fetch refills the IF/ID latch.
//! 4. **Refill:** On its own clock edge the instruction buffer tops up from the generator.
//! 5. **Instrumentation:** Retirements, stalls and fetch-path counters are recorded.
//!
//! Clock domains can be retuned between ticks with `update_clock`.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::common::constants::SUPPLIER_CLOCK_RATIO;
use crate::common::{ConfigError, SimResult};
use crate::config::Config;
use crate::core::arch::RegisterBank;
use crate::core::pipeline::{DecodeOutcome, Decoder, FetchOutcome, InstructionFetcher, StallReason};
use crate::core::snapshot::{CoreSnapshot, StagedInstruction, TickReport};
use crate::core::units::{
    AddressedInstructionBuffer, Alu, AluOutcome, InstructionCache, IoInterface,
};
use crate::sim::CodeGenerator;
use crate::soc::WorkingMemory;
use crate::stats::{SimStats, ThroughputWindow};

/// An independently clocked part of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClockDomain {
    /// The driver clock: fetch, decode, ALU and I/O interface.
    Core,
    /// The addressed instruction buffer.
    InstructionMemory,
    /// Every working memory bank.
    WorkingMemory,
    /// The core register file.
    Registers,
}

impl fmt::Display for ClockDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Core => "core",
            Self::InstructionMemory => "instruction_memory",
            Self::WorkingMemory => "working_memory",
            Self::Registers => "registers",
        })
    }
}

/// The single-issue core and everything it drives.
#[derive(Debug)]
pub struct SisdCore {
    config: Config,
    cycle: u64,
    generator: CodeGenerator,
    buffer: AddressedInstructionBuffer,
    cache: Option<InstructionCache>,
    fetcher: InstructionFetcher,
    decoder: Decoder,
    alu: Alu,
    io: IoInterface,
    registers: RegisterBank,
    memory: WorkingMemory,
    stats: SimStats,
    window: ThroughputWindow,
    last_retired: u32,
}

impl SisdCore {
    /// Builds a core running randomly generated code.
    ///
    /// # Returns
    ///
    /// `ConfigError::Invalid` if `config` describes a machine the core cannot simulate.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let generator = CodeGenerator::new(&config);
        Self::with_generator(config, generator)
    }

    /// Builds a core fed by a prepared generator.
    ///
    /// Used with `CodeGenerator::scripted` to run hand-picked shapes.
    pub fn with_generator(config: Config, generator: CodeGenerator) -> Result<Self, ConfigError> {
        config.validate()?;
        let core_hz = config.clocks.core;
        let registers = RegisterBank::new(
            "registers",
            config.registers.count,
            config.registers.zero_register,
            config.registers.word_modulus,
            config.clocks.registers,
            config.registers.delay,
        );
        Ok(Self {
            cycle: 0,
            generator,
            buffer: AddressedInstructionBuffer::from_config(&config),
            cache: InstructionCache::from_config(&config.cache),
            fetcher: InstructionFetcher::new(core_hz),
            decoder: Decoder::from_config(&config),
            alu: Alu::new(config.registers.word_modulus, core_hz),
            io: IoInterface::new(core_hz),
            registers,
            memory: WorkingMemory::from_config(&config),
            stats: SimStats::default(),
            window: ThroughputWindow::new(config.general.stats_window),
            last_retired: 0,
            config,
        })
    }

    /// Advances the machine by one core tick.
    ///
    /// Any error is fatal; the core must not be ticked again afterwards.
    pub fn tick(&mut self) -> SimResult<TickReport> {
        let cycle = self.cycle;
        let core_hz = self.config.clocks.core;
        let mut retired = 0u32;
        let mut branch = None;

        self.registers.tick();
        self.memory.tick();
        self.buffer.tick();
        if let Some(cache) = self.cache.as_mut() {
            cache.tick();
        }

        match self.alu.update(&mut self.registers)? {
            AluOutcome::Retired { instruction, .. } => {
                self.stats.record_retired(&instruction);
                retired += 1;
            }
            AluOutcome::BranchResolved(resolution) => {
                self.decoder
                    .take_branch(resolution, &mut self.fetcher, &mut self.buffer);
                if resolution.taken {
                    self.stats.branches_taken += 1;
                } else {
                    self.stats.instructions_retired += 1;
                    self.stats.inst_branch += 1;
                    retired += 1;
                }
                branch = Some(resolution);
            }
            AluOutcome::Idle | AluOutcome::Busy => {}
        }

        if let Some((_, instruction)) = self.io.update(&mut self.memory, &mut self.registers)? {
            self.stats.record_retired(&instruction);
            retired += 1;
        }

        if let DecodeOutcome::Stalled(reason) =
            self.decoder
                .decode(&mut self.fetcher, &mut self.alu, &mut self.io)?
        {
            match reason {
                StallReason::Structural => self.stats.stalls_structural += 1,
                StallReason::Data(_) => self.stats.stalls_data += 1,
                StallReason::Control => self.stats.stalls_control += 1,
            }
        }

        if self.fetcher.fetch(&mut self.buffer, self.cache.as_mut())? == FetchOutcome::Waiting {
            self.stats.stalls_fetch += 1;
        }

        if self.buffer.cycle(core_hz) {
            let free = self.buffer.free();
            if free > 0 {
                let _ = self.buffer.write(&mut self.generator, free)?;
            }
        }

        self.cycle += 1;
        self.stats.cycles = self.cycle;
        if let Some(cache) = &self.cache {
            self.stats.icache_hits = cache.hits;
            self.stats.icache_misses = cache.misses;
            self.stats.icache_fills = cache.fills;
        }
        self.stats.iterate_entries = self.buffer.iterate_entries();
        self.stats.iterate_exits = self.buffer.iterate_exits();
        self.window.push(retired);
        self.last_retired = retired;

        Ok(TickReport {
            cycle,
            retired,
            branch,
        })
    }

    /// Runs `cycles` ticks, stopping at the first error.
    pub fn run(&mut self, cycles: u64) -> SimResult<()> {
        for _ in 0..cycles {
            let _ = self.tick()?;
        }
        Ok(())
    }

    /// Retunes one clock domain, keeping every supplier at most a third of the core clock.
    ///
    /// A supplier request above `core / 3` is clamped down; a core request below
    /// three times the fastest supplier is clamped up. Countdowns already running
    /// keep their length.
    ///
    /// # Returns
    ///
    /// The frequency applied, or `None` for a request of 0 Hz.
    pub fn update_clock(&mut self, domain: ClockDomain, hz: u32) -> Option<u32> {
        if hz == 0 {
            warn!(%domain, "ignoring request for a 0 Hz clock");
            return None;
        }
        let clocks = &self.config.clocks;
        let applied = match domain {
            ClockDomain::Core => hz.max(
                clocks
                    .instruction_memory
                    .max(clocks.working_memory)
                    .saturating_mul(SUPPLIER_CLOCK_RATIO),
            ),
            ClockDomain::InstructionMemory | ClockDomain::WorkingMemory => {
                hz.min(clocks.core / SUPPLIER_CLOCK_RATIO).max(1)
            }
            ClockDomain::Registers => hz,
        };
        if applied == hz {
            info!(%domain, hz, "clock updated");
        } else {
            warn!(%domain, requested = hz, applied, "clock request clamped");
        }

        let clocks = &mut self.config.clocks;
        match domain {
            ClockDomain::Core => {
                clocks.core = applied;
                self.fetcher.set_frequency(applied);
                self.alu.set_frequency(applied);
                self.io.set_frequency(applied);
            }
            ClockDomain::InstructionMemory => {
                clocks.instruction_memory = applied;
                self.buffer.set_frequency(applied);
            }
            ClockDomain::WorkingMemory => {
                clocks.working_memory = applied;
                self.memory.set_frequency(applied);
            }
            ClockDomain::Registers => {
                clocks.registers = applied;
                self.registers.set_frequency(applied);
            }
        }
        Some(applied)
    }

    /// Current frequency of a clock domain.
    pub const fn frequency(&self, domain: ClockDomain) -> u32 {
        let clocks = &self.config.clocks;
        match domain {
            ClockDomain::Core => clocks.core,
            ClockDomain::InstructionMemory => clocks.instruction_memory,
            ClockDomain::WorkingMemory => clocks.working_memory,
            ClockDomain::Registers => clocks.registers,
        }
    }

    /// Copies the observable state of the core.
    pub fn snapshot(&self) -> CoreSnapshot {
        let core_hz = self.config.clocks.core;
        CoreSnapshot {
            cycle: self.cycle,
            pc: self.fetcher.pc(),
            core_hz,
            fetch_latch: self.fetcher.latch().map(StagedInstruction::from),
            decode_slot: self.decoder.current().map(StagedInstruction::from),
            alu: self.alu.current().map(StagedInstruction::from),
            alu_branch_stalling: self.alu.is_branch_stalling(),
            io: self.io.current().map(StagedInstruction::from),
            registers: (0..self.registers.size())
                .map(|r| self.registers.peek(r).unwrap_or(0))
                .collect(),
            memory: self.memory.values(),
            buffer: self
                .buffer
                .instructions()
                .map(|(pc, inst)| StagedInstruction::new(pc, *inst))
                .collect(),
            buffer_floor: self.buffer.floor(),
            iterating: self.buffer.is_iterating(),
            cache_lines: self
                .cache
                .as_ref()
                .map(|c| c.lines().copied().collect())
                .unwrap_or_default(),
            retired_this_tick: self.last_retired,
            retired_total: self.stats.instructions_retired,
            ipc: self.window.ipc(),
            ips: self.window.ips(core_hz),
        }
    }

    /// Effective configuration, including clock changes.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Ticks completed.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Collected statistics.
    pub const fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Moving-average throughput.
    pub const fn throughput(&self) -> &ThroughputWindow {
        &self.window
    }

    /// The core register file.
    pub const fn registers(&self) -> &RegisterBank {
        &self.registers
    }

    /// Mutable register file, for setting up a run.
    pub const fn registers_mut(&mut self) -> &mut RegisterBank {
        &mut self.registers
    }

    /// Working memory.
    pub const fn memory(&self) -> &WorkingMemory {
        &self.memory
    }

    /// Mutable working memory, for setting up a run.
    pub const fn memory_mut(&mut self) -> &mut WorkingMemory {
        &mut self.memory
    }

    /// The addressed instruction buffer.
    pub const fn buffer(&self) -> &AddressedInstructionBuffer {
        &self.buffer
    }

    /// The instruction cache, `None` when disabled.
    pub const fn cache(&self) -> Option<&InstructionCache> {
        self.cache.as_ref()
    }

    /// The fetch stage.
    pub const fn fetcher(&self) -> &InstructionFetcher {
        &self.fetcher
    }

    /// The decode stage.
    pub const fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// The ALU.
    pub const fn alu(&self) -> &Alu {
        &self.alu
    }

    /// The I/O interface.
    pub const fn io(&self) -> &IoInterface {
        &self.io
    }

    /// The workload generator.
    pub const fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    /// Mutable workload generator, for pushing explicit shapes.
    pub const fn generator_mut(&mut self) -> &mut CodeGenerator {
        &mut self.generator
    }
}
