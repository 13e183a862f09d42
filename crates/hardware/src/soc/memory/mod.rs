//! Banked working memory.
//!
//! This module implements the data memory served to LOAD/STORE instructions. It provides:
//! 1. **Banking:** The address space is split into equal [`RegisterBank`] partitions,
//!    `bank = address / bank_size`, `local = address % bank_size`.
//! 2. **Independent Timing:** Every bank owns its own gate, so requests to different
//!    banks count down concurrently.
//! 3. **Loading:** Setup-time initialization of memory contents.

use crate::common::{Requester, SimError, SimResult};
use crate::config::Config;
use crate::core::arch::RegisterBank;
use crate::isa::Word;

/// Ordered collection of independently timed memory banks.
#[derive(Debug, Clone)]
pub struct WorkingMemory {
    banks: Vec<RegisterBank>,
    bank_size: usize,
}

impl WorkingMemory {
    /// Creates `banks` banks of `bank_size` cells each.
    ///
    /// # Arguments
    ///
    /// * `banks` - Number of banks.
    /// * `bank_size` - Cells per bank.
    /// * `word_modulus` - Modulus applied to stored words.
    /// * `frequency` - Clock frequency shared by all banks at construction.
    /// * `delay` - Zero means always ready.
    pub fn new(banks: usize, bank_size: usize, word_modulus: u32, frequency: u32, delay: u32) -> Self {
        let banks = (0..banks)
            .map(|_| RegisterBank::new("working memory", bank_size, None, word_modulus, frequency, delay))
            .collect();
        Self { banks, bank_size }
    }

    /// Builds the working memory described by `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.memory.banks,
            config.memory.bank_size,
            config.registers.word_modulus,
            config.clocks.working_memory,
            config.memory.delay,
        )
    }

    /// Total number of addressable cells.
    pub fn size(&self) -> usize {
        self.banks.len() * self.bank_size
    }

    /// Cells per bank.
    pub const fn bank_size(&self) -> usize {
        self.bank_size
    }

    /// The banks, in address order.
    pub fn banks(&self) -> &[RegisterBank] {
        &self.banks
    }

    /// Splits a global address into `(bank index, local address)`.
    pub fn locate(&self, address: usize) -> SimResult<(usize, usize)> {
        if address >= self.size() {
            return Err(SimError::OutOfBounds {
                component: "working memory",
                address,
                size: self.size(),
            });
        }
        Ok((address / self.bank_size, address % self.bank_size))
    }

    fn bank(&self, address: usize) -> SimResult<(&RegisterBank, usize)> {
        let (bank, local) = self.locate(address)?;
        Ok((&self.banks[bank], local))
    }

    fn bank_mut(&mut self, address: usize) -> SimResult<(&mut RegisterBank, usize)> {
        let (bank, local) = self.locate(address)?;
        Ok((&mut self.banks[bank], local))
    }

    /// Returns `true` if the bank holding `address` has an elapsed request for it.
    pub fn is_ready(&self, address: usize) -> bool {
        self.bank(address).is_ok_and(|(bank, local)| bank.is_ready(local))
    }

    /// Requests an access to `address` from its bank.
    pub fn ask_for_memory_operation(
        &mut self,
        requester: Requester,
        requester_frequency: u32,
        address: usize,
    ) -> SimResult<bool> {
        let (bank, local) = self.bank_mut(address)?;
        bank.ask_for_memory_operation(requester, requester_frequency, local)
    }

    /// Requests `address` and reports whether it may be accessed now.
    pub fn acquire(
        &mut self,
        requester: Requester,
        requester_frequency: u32,
        address: usize,
    ) -> SimResult<bool> {
        let _ = self.ask_for_memory_operation(requester, requester_frequency, address)?;
        Ok(self.is_ready(address))
    }

    /// Reads `address`; fails unless its bank is ready.
    pub fn read(&self, address: usize) -> SimResult<Word> {
        let (bank, local) = self.bank(address)?;
        bank.read(local).map_err(|e| globalize(e, address))
    }

    /// Writes `address`; fails unless its bank is ready.
    pub fn write(&mut self, address: usize, value: u64) -> SimResult<()> {
        let (bank, local) = self.bank_mut(address)?;
        bank.write(local, value).map_err(|e| globalize(e, address))
    }

    /// Closes the port of the bank holding `address`.
    pub fn release(&mut self, address: usize) -> SimResult<()> {
        let (bank, _) = self.bank_mut(address)?;
        bank.release();
        Ok(())
    }

    /// Advances every bank's outstanding request by one requester tick.
    pub fn tick(&mut self) {
        for bank in &mut self.banks {
            bank.tick();
        }
    }

    /// Changes the clock frequency of every bank.
    pub fn set_frequency(&mut self, frequency: u32) {
        for bank in &mut self.banks {
            bank.set_frequency(frequency);
        }
    }

    /// Copies `values` into memory starting at `offset`, bypassing timing.
    ///
    /// Intended for setting up a run before the first tick.
    pub fn load(&mut self, values: &[Word], offset: usize) -> SimResult<()> {
        let end = offset + values.len();
        if end > self.size() {
            return Err(SimError::OutOfBounds {
                component: "working memory",
                address: end.saturating_sub(1),
                size: self.size(),
            });
        }
        for (i, &value) in values.iter().enumerate() {
            let (bank, local) = self.bank_mut(offset + i)?;
            bank.poke(local, u64::from(value))?;
        }
        Ok(())
    }

    /// Reads a cell for display, bypassing timing.
    pub fn peek(&self, address: usize) -> Option<Word> {
        let (bank, local) = self.bank(address).ok()?;
        bank.peek(local)
    }

    /// All cell values in address order, for display.
    pub fn values(&self) -> Vec<Word> {
        self.banks.iter().flat_map(|b| b.values().iter().copied()).collect()
    }
}

/// Rewrites a bank-local error so it reports the global address.
fn globalize(error: SimError, address: usize) -> SimError {
    match error {
        SimError::NotReady { component, .. } => SimError::NotReady {
            component,
            address: address as u64,
        },
        other => other,
    }
}
