//! Instruction cache.
//!
//! A small fully associative set of single-instruction lines in front of the
//! addressed instruction buffer. Lines are kept in a queue: a fill overwrites the
//! line at the head and moves it to the tail, so replacement is strict FIFO over
//! fills. A hit also moves its line to the tail.
//!
//! Fills are driven by fetcher polling. A miss forwards a request to the buffer;
//! once the buffer reports the address ready, the next poll drains it into a line.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use crate::common::{Requester, SimError, SimResult};
use crate::config::CacheConfig;
use crate::core::units::prefetch::AddressedInstructionBuffer;
use crate::isa::Instruction;

/// A single-instruction cache line.
///
/// `tag` is only meaningful while `valid` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheLine {
    /// Line holds an instruction.
    pub valid: bool,
    /// Instruction address held by the line.
    pub tag: u64,
    /// Buffered instruction.
    pub instruction: Option<Instruction>,
}

impl CacheLine {
    const INVALID: Self = Self {
        valid: false,
        tag: 0,
        instruction: None,
    };

    fn matches(&self, address: u64) -> bool {
        self.valid && self.tag == address
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingHit {
    address: u64,
    remaining: u64,
}

/// FIFO instruction cache.
#[derive(Debug, Clone)]
pub struct InstructionCache {
    lines: VecDeque<CacheLine>,
    hit_latency: u64,
    pending: Option<PendingHit>,
    missing: Option<u64>,
    /// Lookups that found their line.
    pub hits: u64,
    /// Addresses that missed.
    pub misses: u64,
    /// Lines filled from the instruction buffer.
    pub fills: u64,
}

impl InstructionCache {
    /// Creates a cache of `lines` invalid lines.
    pub fn new(lines: usize, hit_latency: u64) -> Self {
        Self {
            lines: std::iter::repeat_n(CacheLine::INVALID, lines).collect(),
            hit_latency,
            pending: None,
            missing: None,
            hits: 0,
            misses: 0,
            fills: 0,
        }
    }

    /// Builds the cache described by `config`, or `None` when it is disabled.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.lines, config.hit_latency))
    }

    /// Lines in replacement order; the head is replaced next.
    pub fn lines(&self) -> impl Iterator<Item = &CacheLine> {
        self.lines.iter()
    }

    /// Returns `true` if a valid line holds `address`.
    pub fn contains(&self, address: u64) -> bool {
        self.lines.iter().any(|l| l.matches(address))
    }

    /// Polls for the instruction at `address`.
    ///
    /// On a hit the hit countdown starts. On a miss the request goes to the
    /// buffer; if the buffer is already ready for `address`, its instruction is
    /// drained into the head line, that line moves to the tail and the hit
    /// countdown starts.
    pub fn ask_for_instruction_at(
        &mut self,
        address: u64,
        buffer: &mut AddressedInstructionBuffer,
        requester_frequency: u32,
    ) -> SimResult<()> {
        if self.pending.is_some_and(|p| p.address == address) {
            return Ok(());
        }
        if self.contains(address) {
            self.hits += 1;
            self.start_hit(address);
            return Ok(());
        }

        if self.missing != Some(address) {
            self.misses += 1;
            self.missing = Some(address);
        }
        if buffer.is_ready(address) {
            if let Some(instruction) = buffer.fetch_instruction_at(address)? {
                self.fill(address, instruction);
                self.missing = None;
                self.start_hit(address);
            }
        } else {
            let _ = buffer.ask_for_instructions_at(Requester::Cache, requester_frequency, address);
        }
        Ok(())
    }

    /// Returns `true` once the hit countdown for `address` elapsed.
    pub fn is_ready(&self, address: u64) -> bool {
        self.pending
            .is_some_and(|p| p.address == address && p.remaining == 0)
    }

    /// Reads the instruction at `address` and moves its line to the tail.
    pub fn fetch_instruction_at(&mut self, address: u64) -> SimResult<Instruction> {
        let not_ready = || SimError::NotReady {
            component: "instruction cache",
            address,
        };
        if !self.is_ready(address) {
            return Err(not_ready());
        }
        let line = self
            .lines
            .iter()
            .position(|l| l.matches(address))
            .and_then(|index| self.lines.remove(index))
            .ok_or_else(not_ready)?;
        self.lines.push_back(line);
        self.pending = None;
        line.instruction.ok_or_else(not_ready)
    }

    /// Advances the hit countdown by one tick.
    pub fn tick(&mut self) {
        if let Some(p) = self.pending.as_mut() {
            p.remaining = p.remaining.saturating_sub(1);
        }
    }

    fn start_hit(&mut self, address: u64) {
        self.pending = Some(PendingHit {
            address,
            remaining: self.hit_latency,
        });
    }

    fn fill(&mut self, address: u64, instruction: Instruction) {
        if let Some(head) = self.lines.pop_front() {
            if head.valid {
                debug!(evicted = head.tag, filled = address, "icache replace");
            }
            self.lines.push_back(CacheLine {
                valid: true,
                tag: address,
                instruction: Some(instruction),
            });
            self.fills += 1;
        }
    }
}
