//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the SISD core. It provides:
//! 1. **Cycle and IPC:** Total cycles, retired instructions and derived metrics (IPC, CPI).
//! 2. **Instruction mix:** Retirement counts by class (ALU, load, store, branch).
//! 3. **Stalls:** Structural, data, control and fetch stall cycles.
//! 4. **Fetch path:** Instruction cache hits, misses and fills, and loop replay
//!    (iterate mode) entries and exits of the instruction buffer.
//! 5. **Throughput window:** Moving-average IPC / IPS over the most recent ticks.

use std::collections::VecDeque;
use std::time::Instant;

use serde::Serialize;

use crate::isa::{Instruction, InstructionClass};

/// Simulation statistics structure tracking all performance metrics.
#[derive(Debug, Clone, Serialize)]
pub struct SimStats {
    #[serde(skip)]
    start_time: Instant,
    /// Total core cycles elapsed.
    pub cycles: u64,
    /// Number of instructions retired.
    pub instructions_retired: u64,

    /// Arithmetic instructions retired.
    pub inst_alu: u64,
    /// LOAD instructions retired.
    pub inst_load: u64,
    /// STORE instructions retired.
    pub inst_store: u64,
    /// Branches retired (falling through).
    pub inst_branch: u64,
    /// Branches resolved taken.
    pub branches_taken: u64,

    /// Decode cycles lost to an occupied ALU or I/O interface.
    pub stalls_structural: u64,
    /// Decode cycles lost to register dependencies.
    pub stalls_data: u64,
    /// Decode cycles lost waiting for a branch resolution.
    pub stalls_control: u64,
    /// Fetch cycles waiting for the cache or the instruction buffer.
    pub stalls_fetch: u64,

    /// Instruction cache hits.
    pub icache_hits: u64,
    /// Instruction cache misses.
    pub icache_misses: u64,
    /// Instruction cache line fills.
    pub icache_fills: u64,

    /// Times the instruction buffer entered iterate mode.
    pub iterate_entries: u64,
    /// Times the instruction buffer left iterate mode.
    pub iterate_exits: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            inst_alu: 0,
            inst_load: 0,
            inst_store: 0,
            inst_branch: 0,
            branches_taken: 0,
            stalls_structural: 0,
            stalls_data: 0,
            stalls_control: 0,
            stalls_fetch: 0,
            icache_hits: 0,
            icache_misses: 0,
            icache_fills: 0,
            iterate_entries: 0,
            iterate_exits: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"pipeline"`, `"instruction_mix"`, `"fetch"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "pipeline", "instruction_mix", "fetch"];

impl SimStats {
    /// Counts one retired instruction under its class.
    pub fn record_retired(&mut self, instruction: &Instruction) {
        self.instructions_retired += 1;
        match instruction {
            Instruction::Alu { .. } | Instruction::AluImm { .. } => self.inst_alu += 1,
            Instruction::Load { .. } => self.inst_load += 1,
            Instruction::Store { .. } => self.inst_store += 1,
            Instruction::Branch { .. } => self.inst_branch += 1,
        }
    }

    /// Retired instructions of the given class.
    pub const fn retired_of(&self, class: InstructionClass) -> u64 {
        match class {
            InstructionClass::Arithmetic => self.inst_alu,
            InstructionClass::Memory => self.inst_load + self.inst_store,
            InstructionClass::Branch => self.inst_branch,
        }
    }

    /// Instructions retired per cycle over the whole run.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.instructions_retired as f64 / self.cycles as f64
        }
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of `"summary"`, `"pipeline"`,
    /// `"instruction_mix"` or `"fetch"`. Pass an empty slice to print all sections.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    /// * `core_hz` - Core clock, used to derive instructions per second.
    pub fn print_sections(&self, sections: &[String], core_hz: u32) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.start_time.elapsed().as_secs_f64();
        let cyc = self.cycles.max(1) as f64;
        let instr = self.instructions_retired.max(1) as f64;
        let pct = |n: u64, of: f64| (n as f64 / of) * 100.0;

        if want("summary") {
            let ipc = self.ipc();
            println!("\n==========================================================");
            println!("SISD CORE SIMULATION STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {seconds:.4} s");
            println!("sim_cycles               {}", self.cycles);
            println!("sim_insts                {}", self.instructions_retired);
            println!("sim_ipc                  {ipc:.4}");
            println!("sim_cpi                  {:.4}", cyc / instr);
            println!("sim_ips                  {:.2}", ipc * f64::from(core_hz));
            println!("----------------------------------------------------------");
        }
        if want("pipeline") {
            println!("PIPELINE");
            for (name, value) in [
                ("stalls.structural", self.stalls_structural),
                ("stalls.data", self.stalls_data),
                ("stalls.control", self.stalls_control),
                ("stalls.fetch", self.stalls_fetch),
            ] {
                println!("  {name:<22} {value} ({:.2}%)", pct(value, cyc));
            }
            println!("----------------------------------------------------------");
        }
        if want("instruction_mix") {
            println!("INSTRUCTION MIX");
            for (name, value) in [
                ("op.alu", self.inst_alu),
                ("op.load", self.inst_load),
                ("op.store", self.inst_store),
                ("op.branch", self.inst_branch),
            ] {
                println!("  {name:<22} {value} ({:.2}%)", pct(value, instr));
            }
            println!("  branches.taken         {}", self.branches_taken);
            println!("----------------------------------------------------------");
        }
        if want("fetch") {
            let accesses = self.icache_hits + self.icache_misses;
            let miss_rate = if accesses > 0 {
                pct(self.icache_misses, accesses as f64)
            } else {
                0.0
            };
            println!("FETCH PATH");
            println!(
                "  {:<6} accesses: {:<10} | hits: {:<10} | fills: {:<10} | miss_rate: {:.2}%",
                "L1-I", accesses, self.icache_hits, self.icache_fills, miss_rate
            );
            println!("  iterate.entries        {}", self.iterate_entries);
            println!("  iterate.exits          {}", self.iterate_exits);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    pub fn print(&self, core_hz: u32) {
        self.print_sections(&[], core_hz);
    }
}

/// Moving window of per-tick retirement counts.
#[derive(Debug, Clone)]
pub struct ThroughputWindow {
    samples: VecDeque<u32>,
    capacity: usize,
    sum: u64,
}

impl ThroughputWindow {
    /// Creates a window averaging the last `capacity` ticks.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0,
        }
    }

    /// Records the instructions retired by one tick.
    pub fn push(&mut self, retired: u32) {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.sum -= u64::from(evicted.unwrap_or(0));
        self.samples.push_back(retired);
        self.sum += u64::from(retired);
    }

    /// Mean retirements per tick over the window.
    pub fn ipc(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.sum as f64 / self.samples.len() as f64
        }
    }

    /// Instructions per second at the given core clock.
    pub fn ips(&self, core_hz: u32) -> f64 {
        self.ipc() * f64::from(core_hz)
    }
}
