//! Addressable word storage with access timing.
//!
//! This module implements the `RegisterBank`, the storage type shared by the
//! core register file and every working memory bank. It performs the following:
//! 1. **Storage:** A fixed number of unsigned words, wrapped modulo the word width on write.
//! 2. **Invariant Enforcement:** An optional hard-wired zero slot that discards writes.
//! 3. **Timing:** The uniform readiness contract of [`ClockGate`]: with `delay == 0`
//!    every access is immediate, otherwise `read`/`write` fail until a request elapsed.

use crate::common::{ClockGate, Requester, SimError, SimResult};
use crate::isa::Word;

/// Fixed-size addressable word array with optional access latency.
#[derive(Debug, Clone)]
pub struct RegisterBank {
    cells: Vec<Word>,
    zero_register: Option<usize>,
    word_modulus: u32,
    gate: ClockGate,
    name: &'static str,
}

/// Alternative name used by the memory side of the machine.
pub type DataCellArray = RegisterBank;

impl RegisterBank {
    /// Creates a bank of `size` zeroed cells.
    ///
    /// # Arguments
    ///
    /// * `name` - Component name used in error reports.
    /// * `size` - Number of cells.
    /// * `zero_register` - Index hard-wired to zero, if any.
    /// * `word_modulus` - Every written value is reduced modulo this width.
    /// * `frequency` - Own clock frequency.
    /// * `delay` - Zero means always ready.
    pub fn new(
        name: &'static str,
        size: usize,
        zero_register: Option<usize>,
        word_modulus: u32,
        frequency: u32,
        delay: u32,
    ) -> Self {
        Self {
            cells: vec![0; size],
            zero_register,
            word_modulus: word_modulus.max(1),
            gate: ClockGate::new(frequency, delay),
            name,
        }
    }

    /// Number of cells.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Index hard-wired to zero, if any.
    pub const fn zero_register(&self) -> Option<usize> {
        self.zero_register
    }

    /// Modulus applied to written values.
    pub const fn word_modulus(&self) -> u32 {
        self.word_modulus
    }

    /// Timing gate of the bank.
    pub const fn gate(&self) -> &ClockGate {
        &self.gate
    }

    /// Changes the bank's own clock frequency.
    pub fn set_frequency(&mut self, frequency: u32) {
        self.gate.set_frequency(frequency);
    }

    fn check_bounds(&self, address: usize) -> SimResult<()> {
        if address < self.cells.len() {
            Ok(())
        } else {
            Err(SimError::OutOfBounds {
                component: self.name,
                address,
                size: self.cells.len(),
            })
        }
    }

    /// Returns `true` if `address` may be accessed now.
    pub fn is_ready(&self, address: usize) -> bool {
        self.gate.is_ready(address as u64)
    }

    /// Returns `true` if the access port is open for any address.
    pub fn is_open(&self) -> bool {
        self.gate.is_open()
    }

    /// Requests an access to `address`; starts the countdown if none is running.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the request is outstanding for this requester, `Ok(false)` if
    /// another request holds the port, `SimError::OutOfBounds` for a bad address.
    pub fn ask_for_memory_operation(
        &mut self,
        requester: Requester,
        requester_frequency: u32,
        address: usize,
    ) -> SimResult<bool> {
        self.check_bounds(address)?;
        Ok(self.gate.request(requester, requester_frequency, address as u64))
    }

    /// Requests `address` and reports whether it may be accessed now.
    ///
    /// Combines `ask_for_memory_operation` and `is_ready` for callers that poll
    /// once per tick.
    pub fn acquire(
        &mut self,
        requester: Requester,
        requester_frequency: u32,
        address: usize,
    ) -> SimResult<bool> {
        let _ = self.ask_for_memory_operation(requester, requester_frequency, address)?;
        Ok(self.is_ready(address))
    }

    /// Reads a cell. The zero register always reads 0.
    pub fn read(&self, address: usize) -> SimResult<Word> {
        self.check_bounds(address)?;
        if !self.gate.is_ready(address as u64) {
            return Err(SimError::NotReady {
                component: self.name,
                address: address as u64,
            });
        }
        if self.zero_register == Some(address) {
            return Ok(0);
        }
        Ok(self.cells[address])
    }

    /// Writes a cell, wrapping the value into `[0, word_modulus)`.
    ///
    /// Writes to the zero register are silently discarded.
    pub fn write(&mut self, address: usize, value: u64) -> SimResult<()> {
        self.check_bounds(address)?;
        if !self.gate.is_ready(address as u64) {
            return Err(SimError::NotReady {
                component: self.name,
                address: address as u64,
            });
        }
        if self.zero_register != Some(address) {
            self.cells[address] = (value % u64::from(self.word_modulus)) as Word;
        }
        Ok(())
    }

    /// Closes the access port after the requester finished its access.
    pub fn release(&mut self) {
        self.gate.release();
    }

    /// Advances the outstanding request by one requester tick.
    pub fn tick(&mut self) {
        self.gate.tick();
    }

    /// Reads a cell for display, bypassing timing.
    pub fn peek(&self, address: usize) -> Option<Word> {
        if self.zero_register == Some(address) {
            return self.cells.get(address).map(|_| 0);
        }
        self.cells.get(address).copied()
    }

    /// Writes a cell bypassing timing, for setup before a run.
    pub fn poke(&mut self, address: usize, value: u64) -> SimResult<()> {
        self.check_bounds(address)?;
        if self.zero_register != Some(address) {
            self.cells[address] = (value % u64::from(self.word_modulus)) as Word;
        }
        Ok(())
    }

    /// All cell values, for display.
    pub fn values(&self) -> &[Word] {
        &self.cells
    }
}
