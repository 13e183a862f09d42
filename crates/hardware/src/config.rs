//! Configuration system for the SISD simulator.
//!
//! This module defines all configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline machine constants (register count, memory banks, clocks, cache).
//! 2. **Structures:** Hierarchical config for general, clocks, registers, memory, cache,
//!    instruction buffer and workload generator settings.
//! 3. **Validation:** Rejection of impossible machines before any component is built.
//!
//! Configuration is supplied as JSON (`Config::from_json` / `Config::from_file`) or
//! built with `Config::default()`. It is immutable once a core has been constructed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;
use crate::common::constants::{
    DEFAULT_WORD_MODULUS, DOUBLED_LOOP_SPAN_OVERHEAD, LOOP_WINDOW_SLACK, MIN_SEQUENCE_LOADS,
    SUPPLIER_CLOCK_RATIO,
};

/// Default configuration constants for the simulator.
mod defaults {
    use crate::common::constants::DEFAULT_WORD_MODULUS;

    /// Seed of the workload generator.
    pub const SEED: u64 = 0x5EED_CAFE_F00D_0001;

    /// Ticks covered by the IPC moving average.
    pub const STATS_WINDOW: usize = 40;

    /// Core (driver) clock frequency.
    pub const CORE_HZ: u32 = 12;

    /// Instruction memory (addressed instruction buffer) clock frequency.
    pub const INSTRUCTION_MEMORY_HZ: u32 = 4;

    /// Working memory bank clock frequency.
    pub const WORKING_MEMORY_HZ: u32 = 2;

    /// Core register file clock frequency.
    pub const REGISTERS_HZ: u32 = 12;

    /// Number of core registers.
    pub const REGISTER_COUNT: usize = 16;

    /// Register index hard-wired to zero.
    pub const ZERO_REGISTER: usize = 0;

    /// Core register file access delay (always ready).
    pub const REGISTER_DELAY: u32 = 0;

    /// Word modulus applied on every write and ALU result.
    pub const WORD_MODULUS: u32 = DEFAULT_WORD_MODULUS;

    /// Number of working memory banks.
    pub const MEMORY_BANKS: usize = 4;

    /// Cells per working memory bank.
    pub const BANK_SIZE: usize = 16;

    /// Working memory access delay switch.
    pub const MEMORY_DELAY: u32 = 1;

    /// Number of single-instruction cache lines.
    pub const CACHE_LINES: usize = 4;

    /// Driver ticks between a cache hit request and the data being available.
    pub const CACHE_HIT_LATENCY: u64 = 1;

    /// Instruction buffer capacity.
    pub const BUFFER_CAPACITY: usize = 32;

    /// Instruction buffer access delay switch.
    pub const BUFFER_DELAY: u32 = 1;

    /// Probability of emitting a for-loop on refill.
    pub const FOR_LOOP_PROBABILITY: f64 = 0.3;

    /// Probability of emitting a conditional branch on refill.
    pub const BRANCH_PROBABILITY: f64 = 0.2;

    /// Probability of emitting a doubled (nested) for-loop on refill.
    pub const DOUBLED_LOOP_PROBABILITY: f64 = 0.1;

    /// Probability of a register-initialization preamble before a loop.
    pub const PREAMBLE_PROBABILITY: f64 = 0.3;

    /// Probability that a generated ALU operation uses its immediate form.
    pub const IMMEDIATE_PROBABILITY: f64 = 0.25;

    /// Upper bound `k` on loads, ALU ops and stores in one plain sequence.
    pub const MAX_SEQUENCE_LENGTH: usize = 4;

    /// Upper bound on iterations set by a loop preamble.
    pub const MAX_ITERATIONS: u32 = 6;
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use sisd_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.registers.count, 16);
/// assert_eq!(config.buffer.capacity, 32);
/// assert!(config.validate().is_ok());
/// ```
///
/// Deserializing from JSON; omitted fields take their defaults:
///
/// ```
/// use sisd_core::config::Config;
///
/// let json = r#"{
///     "general": { "seed": 7 },
///     "clocks": { "core": 24, "working_memory": 4 },
///     "cache": { "enabled": false }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.general.seed, 7);
/// assert_eq!(config.clocks.core, 24);
/// assert_eq!(config.clocks.instruction_memory, 4);
/// assert!(!config.cache.enabled);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Clock frequency of each domain.
    #[serde(default)]
    pub clocks: ClockConfig,
    /// Core register file.
    #[serde(default)]
    pub registers: RegisterConfig,
    /// Banked working memory.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Instruction cache in front of the instruction buffer.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Addressed instruction buffer.
    #[serde(default)]
    pub buffer: BufferConfig,
    /// Workload generator.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Number of addressable working memory cells.
    pub const fn memory_size(&self) -> usize {
        self.memory.banks * self.memory.bank_size
    }

    /// Checks the configuration for machines the core cannot simulate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        let clocks = &self.clocks;
        if [
            clocks.core,
            clocks.instruction_memory,
            clocks.working_memory,
            clocks.registers,
        ]
        .contains(&0)
        {
            return invalid("clock frequencies must be non-zero".into());
        }
        for (name, hz) in [
            ("instruction_memory", clocks.instruction_memory),
            ("working_memory", clocks.working_memory),
        ] {
            if hz.saturating_mul(SUPPLIER_CLOCK_RATIO) > clocks.core {
                return invalid(format!(
                    "{name} clock {hz} must stay at or below a third of the core clock {}",
                    clocks.core
                ));
            }
        }

        if self.general.stats_window == 0 {
            return invalid("stats_window must be non-zero".into());
        }

        let regs = &self.registers;
        if regs.count == 0 {
            return invalid("register count must be non-zero".into());
        }
        if regs.zero_register.is_some_and(|z| z >= regs.count) {
            return invalid(format!(
                "zero register {:?} outside register file of {}",
                regs.zero_register, regs.count
            ));
        }
        if regs.word_modulus < 2 {
            return invalid("word_modulus must be at least 2".into());
        }

        if self.memory.banks == 0 || self.memory.bank_size == 0 {
            return invalid("working memory needs at least one bank of one cell".into());
        }

        if self.cache.enabled && self.cache.lines == 0 {
            return invalid("an enabled cache needs at least one line".into());
        }

        let generator = &self.generator;
        let probabilities = [
            generator.for_loop_probability,
            generator.branch_probability,
            generator.doubled_loop_probability,
            generator.preamble_probability,
            generator.immediate_probability,
        ];
        if probabilities.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return invalid("generator probabilities must lie in [0, 1]".into());
        }
        let shape_total = generator.for_loop_probability
            + generator.branch_probability
            + generator.doubled_loop_probability;
        if shape_total > 1.0 {
            return invalid(format!("shape probabilities sum to {shape_total} > 1"));
        }
        if generator.max_sequence_length < MIN_SEQUENCE_LOADS {
            return invalid(format!(
                "max_sequence_length must be at least {MIN_SEQUENCE_LOADS}"
            ));
        }

        // Loads and results of one sequence, plus the four loop control registers
        // of a doubled loop and the zero register, must fit side by side.
        let needed = 2 * generator.max_sequence_length + 4 + usize::from(regs.zero_register.is_some());
        if regs.count < needed {
            return invalid(format!(
                "{} registers cannot hold the generator's working set of {needed}",
                regs.count
            ));
        }
        if self.memory_size() < generator.max_sequence_length {
            return invalid("working memory smaller than one generated sequence".into());
        }

        let span = self.max_loop_span();
        if self.buffer.capacity < span + LOOP_WINDOW_SLACK {
            return invalid(format!(
                "buffer capacity {} cannot hold a loop span of {span} plus {LOOP_WINDOW_SLACK} slots",
                self.buffer.capacity
            ));
        }
        Ok(())
    }

    /// Longest distance, in instructions, between a generated loop target and its branch.
    ///
    /// The doubled loop is the worst case: a full plain sequence as the inner
    /// body, wrapped in the inner and outer loop control instructions.
    pub const fn max_loop_span(&self) -> usize {
        3 * self.generator.max_sequence_length + DOUBLED_LOOP_SPAN_OVERHEAD
    }
}

/// General simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Seed of the deterministic workload generator.
    #[serde(default = "GeneralConfig::default_seed")]
    pub seed: u64,

    /// Emit per-instruction trace events.
    #[serde(default)]
    pub trace: bool,

    /// Number of ticks averaged for IPC / IPS.
    #[serde(default = "GeneralConfig::default_stats_window")]
    pub stats_window: usize,
}

impl GeneralConfig {
    /// Returns the default generator seed.
    const fn default_seed() -> u64 {
        defaults::SEED
    }

    /// Returns the default moving-average window.
    const fn default_stats_window() -> usize {
        defaults::STATS_WINDOW
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: defaults::SEED,
            trace: false,
            stats_window: defaults::STATS_WINDOW,
        }
    }
}

/// Clock frequencies of the independent clock domains.
///
/// The core clock drives the simulation; every other domain derives its own
/// cycles from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Core (fetch, decode, ALU, I/O) and driver frequency.
    #[serde(default = "ClockConfig::default_core")]
    pub core: u32,

    /// Addressed instruction buffer frequency.
    #[serde(default = "ClockConfig::default_instruction_memory")]
    pub instruction_memory: u32,

    /// Working memory bank frequency.
    #[serde(default = "ClockConfig::default_working_memory")]
    pub working_memory: u32,

    /// Core register file frequency.
    #[serde(default = "ClockConfig::default_registers")]
    pub registers: u32,
}

impl ClockConfig {
    /// Returns the default core frequency.
    const fn default_core() -> u32 {
        defaults::CORE_HZ
    }

    /// Returns the default instruction memory frequency.
    const fn default_instruction_memory() -> u32 {
        defaults::INSTRUCTION_MEMORY_HZ
    }

    /// Returns the default working memory frequency.
    const fn default_working_memory() -> u32 {
        defaults::WORKING_MEMORY_HZ
    }

    /// Returns the default register file frequency.
    const fn default_registers() -> u32 {
        defaults::REGISTERS_HZ
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            core: defaults::CORE_HZ,
            instruction_memory: defaults::INSTRUCTION_MEMORY_HZ,
            working_memory: defaults::WORKING_MEMORY_HZ,
            registers: defaults::REGISTERS_HZ,
        }
    }
}

/// Core register file configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConfig {
    /// Number of registers.
    #[serde(default = "RegisterConfig::default_count")]
    pub count: usize,

    /// Register hard-wired to zero, if any.
    #[serde(default = "RegisterConfig::default_zero_register")]
    pub zero_register: Option<usize>,

    /// Access delay switch; zero means always ready, otherwise accesses wait one own cycle.
    #[serde(default = "RegisterConfig::default_delay")]
    pub delay: u32,

    /// Modulus applied to every stored word and ALU result.
    #[serde(default = "RegisterConfig::default_word_modulus")]
    pub word_modulus: u32,
}

impl RegisterConfig {
    /// Returns the default register count.
    const fn default_count() -> usize {
        defaults::REGISTER_COUNT
    }

    /// Returns the default zero register.
    const fn default_zero_register() -> Option<usize> {
        Some(defaults::ZERO_REGISTER)
    }

    /// Returns the default register delay.
    const fn default_delay() -> u32 {
        defaults::REGISTER_DELAY
    }

    /// Returns the default word modulus.
    const fn default_word_modulus() -> u32 {
        defaults::WORD_MODULUS
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            count: defaults::REGISTER_COUNT,
            zero_register: Some(defaults::ZERO_REGISTER),
            delay: defaults::REGISTER_DELAY,
            word_modulus: DEFAULT_WORD_MODULUS,
        }
    }
}

/// Banked working memory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of independently timed banks.
    #[serde(default = "MemoryConfig::default_banks")]
    pub banks: usize,

    /// Cells per bank.
    #[serde(default = "MemoryConfig::default_bank_size")]
    pub bank_size: usize,

    /// Access delay switch; zero means always ready, otherwise accesses wait one own cycle.
    #[serde(default = "MemoryConfig::default_delay")]
    pub delay: u32,
}

impl MemoryConfig {
    /// Returns the default bank count.
    const fn default_banks() -> usize {
        defaults::MEMORY_BANKS
    }

    /// Returns the default bank size.
    const fn default_bank_size() -> usize {
        defaults::BANK_SIZE
    }

    /// Returns the default memory delay.
    const fn default_delay() -> u32 {
        defaults::MEMORY_DELAY
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            banks: defaults::MEMORY_BANKS,
            bank_size: defaults::BANK_SIZE,
            delay: defaults::MEMORY_DELAY,
        }
    }
}

/// Instruction cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When false the fetcher reads the instruction buffer directly.
    #[serde(default = "CacheConfig::default_enabled")]
    pub enabled: bool,

    /// Number of single-instruction lines.
    #[serde(default = "CacheConfig::default_lines")]
    pub lines: usize,

    /// Ticks between a hit request and the instruction being available.
    #[serde(default = "CacheConfig::default_hit_latency")]
    pub hit_latency: u64,
}

impl CacheConfig {
    /// Returns whether the cache is enabled by default.
    const fn default_enabled() -> bool {
        true
    }

    /// Returns the default line count.
    const fn default_lines() -> usize {
        defaults::CACHE_LINES
    }

    /// Returns the default hit latency.
    const fn default_hit_latency() -> u64 {
        defaults::CACHE_HIT_LATENCY
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lines: defaults::CACHE_LINES,
            hit_latency: defaults::CACHE_HIT_LATENCY,
        }
    }
}

/// Addressed instruction buffer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Number of instructions the window holds.
    #[serde(default = "BufferConfig::default_capacity")]
    pub capacity: usize,

    /// Access delay switch; zero means always ready, otherwise accesses wait one own cycle.
    #[serde(default = "BufferConfig::default_delay")]
    pub delay: u32,
}

impl BufferConfig {
    /// Returns the default capacity.
    const fn default_capacity() -> usize {
        defaults::BUFFER_CAPACITY
    }

    /// Returns the default delay.
    const fn default_delay() -> u32 {
        defaults::BUFFER_DELAY
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::BUFFER_CAPACITY,
            delay: defaults::BUFFER_DELAY,
        }
    }
}

/// Workload generator tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Probability of a for-loop shape.
    #[serde(default = "GeneratorConfig::default_for_loop")]
    pub for_loop_probability: f64,

    /// Probability of a conditional branch shape.
    #[serde(default = "GeneratorConfig::default_branch")]
    pub branch_probability: f64,

    /// Probability of a doubled (nested) for-loop shape.
    #[serde(default = "GeneratorConfig::default_doubled_loop")]
    pub doubled_loop_probability: f64,

    /// Probability of a register-initialization preamble before a loop.
    #[serde(default = "GeneratorConfig::default_preamble")]
    pub preamble_probability: f64,

    /// Probability that an ALU operation uses its immediate form.
    #[serde(default = "GeneratorConfig::default_immediate")]
    pub immediate_probability: f64,

    /// Upper bound `k` on loads, ALU operations and stores per sequence.
    #[serde(default = "GeneratorConfig::default_max_sequence_length")]
    pub max_sequence_length: usize,

    /// Upper bound on loop iterations set by a preamble.
    #[serde(default = "GeneratorConfig::default_max_iterations")]
    pub max_iterations: u32,
}

impl GeneratorConfig {
    /// Returns the default for-loop probability.
    const fn default_for_loop() -> f64 {
        defaults::FOR_LOOP_PROBABILITY
    }

    /// Returns the default conditional branch probability.
    const fn default_branch() -> f64 {
        defaults::BRANCH_PROBABILITY
    }

    /// Returns the default doubled-loop probability.
    const fn default_doubled_loop() -> f64 {
        defaults::DOUBLED_LOOP_PROBABILITY
    }

    /// Returns the default preamble probability.
    const fn default_preamble() -> f64 {
        defaults::PREAMBLE_PROBABILITY
    }

    /// Returns the default immediate-form probability.
    const fn default_immediate() -> f64 {
        defaults::IMMEDIATE_PROBABILITY
    }

    /// Returns the default sequence length bound.
    const fn default_max_sequence_length() -> usize {
        defaults::MAX_SEQUENCE_LENGTH
    }

    /// Returns the default iteration bound.
    const fn default_max_iterations() -> u32 {
        defaults::MAX_ITERATIONS
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            for_loop_probability: defaults::FOR_LOOP_PROBABILITY,
            branch_probability: defaults::BRANCH_PROBABILITY,
            doubled_loop_probability: defaults::DOUBLED_LOOP_PROBABILITY,
            preamble_probability: defaults::PREAMBLE_PROBABILITY,
            immediate_probability: defaults::IMMEDIATE_PROBABILITY,
            max_sequence_length: defaults::MAX_SEQUENCE_LENGTH,
            max_iterations: defaults::MAX_ITERATIONS,
        }
    }
}
