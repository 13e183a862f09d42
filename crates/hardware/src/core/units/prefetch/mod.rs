//! Addressed instruction buffer with loop replay.
//!
//! The `AddressedInstructionBuffer` is a bounded sliding window over the logical
//! instruction stream. It performs the following:
//! 1. **Addressing:** Every admitted instruction receives the next address; the window
//!    always covers `[address_reached - capacity, address_reached)`, filled from the
//!    bottom, so `highest_instruction_address() == address_reached - capacity + len()`.
//! 2. **Normal Mode:** A fetch evicts the fetched instruction and everything below it,
//!    stopping short of the first registered loop start.
//! 3. **Iterate Mode:** When the window floor is the target of a registered backward
//!    branch, fetches stop evicting so the loop body can be replayed. The mode ends when
//!    the anchoring branch resolves not-taken; the whole body is then evicted at once.
//! 4. **Timing:** Reads go through a [`ClockGate`] running at the instruction memory
//!    frequency, and refills happen once per own cycle.
//!
//! When several registered backward branches target the floor, the one with the highest
//! pc anchors iterate mode: it encloses the others, so only its fall-through ends the
//! replay. Not-taken resolutions of enclosed branches leave the window untouched.

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, trace};

use crate::common::{ClockGate, Requester, SimError, SimResult};
use crate::config::Config;
use crate::isa::Instruction;
use crate::sim::CodeGenerator;

/// Bounded, addressed look-ahead window over the instruction stream.
#[derive(Debug, Clone)]
pub struct AddressedInstructionBuffer {
    slots: VecDeque<Instruction>,
    capacity: usize,
    address_reached: u64,
    jumps: BTreeMap<u64, Instruction>,
    anchor: Option<u64>,
    gate: ClockGate,
    iterate_entries: u64,
    iterate_exits: u64,
}

impl AddressedInstructionBuffer {
    /// Creates an empty window whose first admitted instruction gets address 0.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of instructions the window holds.
    /// * `frequency` - Instruction memory clock frequency.
    /// * `delay` - Zero means always ready.
    pub fn new(capacity: usize, frequency: u32, delay: u32) -> Self {
        Self {
            slots: VecDeque::with_capacity(capacity),
            capacity,
            address_reached: capacity as u64,
            jumps: BTreeMap::new(),
            anchor: None,
            gate: ClockGate::new(frequency, delay),
            iterate_entries: 0,
            iterate_exits: 0,
        }
    }

    /// Builds the buffer described by `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.buffer.capacity,
            config.clocks.instruction_memory,
            config.buffer.delay,
        )
    }

    /// Number of instructions the window holds.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered instructions.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Free slots at the top of the window.
    pub fn free(&self) -> usize {
        self.capacity - self.slots.len()
    }

    /// Upper end of the addressable window.
    pub const fn address_reached(&self) -> u64 {
        self.address_reached
    }

    /// Lowest address in the window.
    pub const fn floor(&self) -> u64 {
        self.address_reached - self.capacity as u64
    }

    /// Address the next admitted instruction will receive.
    pub fn highest_instruction_address(&self) -> u64 {
        self.floor() + self.slots.len() as u64
    }

    /// Returns `true` while a loop body is being replayed.
    pub const fn is_iterating(&self) -> bool {
        self.anchor.is_some()
    }

    /// Branch pc anchoring iterate mode, if any.
    pub const fn anchor(&self) -> Option<u64> {
        self.anchor
    }

    /// Times iterate mode was entered.
    pub const fn iterate_entries(&self) -> u64 {
        self.iterate_entries
    }

    /// Times iterate mode was left.
    pub const fn iterate_exits(&self) -> u64 {
        self.iterate_exits
    }

    /// Timing gate of the buffer.
    pub const fn gate(&self) -> &ClockGate {
        &self.gate
    }

    /// Changes the instruction memory frequency.
    pub fn set_frequency(&mut self, frequency: u32) {
        self.gate.set_frequency(frequency);
    }

    /// Buffered instructions with their addresses, lowest first.
    pub fn instructions(&self) -> impl Iterator<Item = (u64, &Instruction)> {
        let floor = self.floor();
        self.slots.iter().enumerate().map(move |(i, inst)| (floor + i as u64, inst))
    }

    /// Registered branches as `(pc, branch)` pairs, lowest pc first.
    pub fn jump_instructions(&self) -> impl Iterator<Item = (u64, &Instruction)> {
        self.jumps.iter().map(|(&pc, inst)| (pc, inst))
    }

    /// Registers the branch at `pc` so its target can be recognized as a loop start.
    pub fn set_jump_instruction(&mut self, pc: u64, instruction: Instruction) {
        let _ = self.jumps.insert(pc, instruction);
        self.check_iterate();
    }

    /// Reports that the branch at `pc` resolved not-taken.
    ///
    /// If it anchors iterate mode, the replayed body up to and including `pc` is
    /// evicted in one shift and normal mode resumes.
    ///
    /// # Returns
    ///
    /// `true` if iterate mode was left.
    pub fn clear_jump_instruction(&mut self, pc: u64) -> bool {
        if self.anchor != Some(pc) {
            return false;
        }
        self.anchor = None;
        self.iterate_exits += 1;
        self.evict_through(pc);
        debug!(pc, floor = self.floor(), "leaving iterate mode");
        self.check_iterate();
        true
    }

    /// Appends `count` instructions from the generator's stream.
    ///
    /// Jump registrations queued by the generator are taken over in the same
    /// call. Fewer than `count` instructions are admitted only when a scripted
    /// stream runs dry.
    ///
    /// # Returns
    ///
    /// The number of admitted instructions, or `SimError::BufferOverflow` when
    /// `count` exceeds the free slots.
    pub fn write(&mut self, stream: &mut CodeGenerator, count: usize) -> SimResult<usize> {
        if count > self.free() {
            return Err(SimError::BufferOverflow {
                requested: count,
                available: self.free(),
            });
        }
        let mut written = 0;
        while written < count {
            let Some(instruction) = stream.next_instruction()? else {
                break;
            };
            self.slots.push_back(instruction);
            written += 1;
        }
        // Refills above may have generated new branches; all must be known
        // before the next fetch can move the floor.
        for (pc, branch) in stream.take_jump_registrations() {
            self.set_jump_instruction(pc, branch);
        }
        if written > 0 {
            trace!(written, highest = self.highest_instruction_address(), "buffer refilled");
        }
        Ok(written)
    }

    /// Requests a read of `address`; idempotent while the same request is outstanding.
    ///
    /// # Returns
    ///
    /// `true` if the request is outstanding (or the buffer is immediate).
    pub fn ask_for_instructions_at(
        &mut self,
        requester: Requester,
        requester_frequency: u32,
        address: u64,
    ) -> bool {
        self.gate.request(requester, requester_frequency, address)
    }

    /// Returns `true` if `address` may be fetched now.
    pub fn is_ready(&self, address: u64) -> bool {
        self.gate.is_ready(address)
    }

    /// Reads the instruction at `address`.
    ///
    /// In normal mode the instruction and everything below it are evicted, up to
    /// the first loop start at or below `address`; iterate mode is entered if the
    /// new floor is a loop start. A successful read closes the read port.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the slot has not been filled yet, `SimError::NotReady` without
    /// an elapsed request, `SimError::Evicted` below the floor.
    pub fn fetch_instruction_at(&mut self, address: u64) -> SimResult<Option<Instruction>> {
        if !self.gate.is_ready(address) {
            return Err(SimError::NotReady {
                component: "instruction buffer",
                address,
            });
        }
        let floor = self.floor();
        if address < floor {
            return Err(SimError::Evicted { address, floor });
        }
        if address >= self.address_reached {
            return Ok(None);
        }
        let local = self.capacity - (self.address_reached - address) as usize;
        let Some(&instruction) = self.slots.get(local) else {
            return Ok(None);
        };
        self.gate.release();

        if self.anchor.is_none() {
            match self.first_loop_start(address) {
                Some(start) if start == floor => {}
                Some(start) => self.evict_through(start - 1),
                None => self.evict_through(address),
            }
            self.check_iterate();
        }
        Ok(Some(instruction))
    }

    /// Advances the outstanding read request by one requester tick.
    pub fn tick(&mut self) {
        self.gate.tick();
    }

    /// Advances the own-cycle phase; `true` on the buffer's own clock edge.
    pub fn cycle(&mut self, driver_frequency: u32) -> bool {
        self.gate.cycle(driver_frequency)
    }

    /// Lowest target of a registered backward branch in `[floor, address]`.
    ///
    /// A normal fetch never evicts a loop start: the window stops there so the
    /// loop can be replayed, even when the fetch itself lies past it.
    fn first_loop_start(&self, address: u64) -> Option<u64> {
        let floor = self.floor();
        self.jumps
            .iter()
            .filter_map(|(&pc, inst)| inst.branch_target().filter(|&t| t < pc))
            .filter(|t| (floor..=address).contains(t))
            .min()
    }

    /// Evicts every instruction up to and including `address`.
    fn evict_through(&mut self, address: u64) {
        let floor = self.floor();
        if address < floor {
            return;
        }
        let count = ((address - floor + 1) as usize).min(self.slots.len());
        drop(self.slots.drain(..count));
        self.address_reached += count as u64;

        let floor = self.floor();
        self.jumps.retain(|&pc, _| pc >= floor);
    }

    /// Enters iterate mode if the floor is the target of a registered backward branch.
    ///
    /// A branch registered later with the same target and a higher pc takes
    /// over the anchor, since it encloses the current one.
    fn check_iterate(&mut self) {
        let floor = self.floor();
        let candidate = self
            .jumps
            .iter()
            .rev()
            .find(|&(&pc, inst)| inst.branch_target().is_some_and(|t| t == floor && pc > t))
            .map(|(&pc, _)| pc);
        match (self.anchor, candidate) {
            (None, Some(pc)) => {
                self.anchor = Some(pc);
                self.iterate_entries += 1;
                debug!(floor, branch = pc, "entering iterate mode");
            }
            (Some(current), Some(pc)) if pc > current => {
                self.anchor = Some(pc);
                debug!(floor, from = current, to = pc, "iterate anchor widened");
            }
            _ => {}
        }
    }
}
