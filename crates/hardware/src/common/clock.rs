//! Cross-frequency readiness primitive.
//!
//! Every timed component of the simulator (register banks, memory banks, the
//! instruction buffer) embeds a [`ClockGate`]. The gate provides:
//! 1. **Request Countdowns:** `request` starts a countdown of
//!    `ceil(requester_hz / own_hz)` requester ticks; `tick` advances it.
//! 2. **Port Ownership:** once a countdown elapses the port stays open for the
//!    requester that started it until that requester calls `release`.
//! 3. **Own-Cycle Gating:** `cycle` turns driver ticks into the component's own
//!    slower cycles.
//!
//! A gate with `delay == 0` is always ready and never tracks requests.

use serde::Serialize;

/// Identity of a component that issues cross-domain requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Requester {
    /// Instruction fetcher reading the instruction buffer directly.
    Fetcher,
    /// Instruction cache filling a line from the instruction buffer.
    Cache,
    /// Arithmetic logic unit accessing the register file.
    Alu,
    /// I/O interface accessing working memory or the register file.
    Io,
}

/// Number of requester ticks one tick of a slower component spans.
///
/// Always at least one, so equal frequencies (or a faster target) cost a
/// single requester tick.
///
/// ```
/// use sisd_core::common::clock::frequency_ratio;
///
/// assert_eq!(frequency_ratio(4, 1), 4);
/// assert_eq!(frequency_ratio(12, 5), 3);
/// assert_eq!(frequency_ratio(2, 8), 1);
/// ```
pub fn frequency_ratio(requester_frequency: u32, own_frequency: u32) -> u64 {
    let own = own_frequency.max(1);
    u64::from(requester_frequency.div_ceil(own).max(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRequest {
    requester: Requester,
    address: u64,
    remaining: u64,
}

/// Readiness gate shared by every timed component.
#[derive(Debug, Clone)]
pub struct ClockGate {
    frequency: u32,
    delay: u32,
    pending: Option<PendingRequest>,
    phase: u64,
}

impl ClockGate {
    /// Creates a gate for a component running at `frequency` with the given access delay.
    ///
    /// # Arguments
    ///
    /// * `frequency` - Own clock frequency; zero is treated as one.
    /// * `delay` - Zero makes the component always ready; any other value makes
    ///   every access wait for an elapsed request.
    pub fn new(frequency: u32, delay: u32) -> Self {
        Self {
            frequency: frequency.max(1),
            delay,
            pending: None,
            phase: 0,
        }
    }

    /// Own clock frequency.
    pub const fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Changes the own clock frequency.
    ///
    /// A countdown already in flight keeps its original length.
    pub fn set_frequency(&mut self, frequency: u32) {
        self.frequency = frequency.max(1);
    }

    /// Configured access delay.
    pub const fn delay(&self) -> u32 {
        self.delay
    }

    /// Returns `true` when the component needs no request before access.
    pub const fn is_immediate(&self) -> bool {
        self.delay == 0
    }

    /// Length in requester ticks of a countdown started by a requester at `requester_frequency`.
    pub fn request_ticks(&self, requester_frequency: u32) -> u64 {
        if self.is_immediate() {
            return 0;
        }
        frequency_ratio(requester_frequency, self.frequency)
    }

    /// Requests access to `address` on behalf of `requester`.
    ///
    /// Repeating the request that is already outstanding is a no-op. A request
    /// still counting down is never replaced; an elapsed request may only be
    /// replaced by the requester that owns it.
    ///
    /// # Returns
    ///
    /// `true` if a request for `(requester, address)` is now outstanding (or the
    /// gate is immediate), `false` if the port is held by someone else.
    pub fn request(&mut self, requester: Requester, requester_frequency: u32, address: u64) -> bool {
        if self.is_immediate() {
            return true;
        }
        match self.pending {
            Some(p) if p.requester == requester && p.address == address => true,
            Some(p) if p.remaining > 0 || p.requester != requester => false,
            _ => {
                self.pending = Some(PendingRequest {
                    requester,
                    address,
                    remaining: self.request_ticks(requester_frequency),
                });
                true
            }
        }
    }

    /// Advances the outstanding countdown by one requester tick.
    pub fn tick(&mut self) {
        if let Some(p) = self.pending.as_mut() {
            p.remaining = p.remaining.saturating_sub(1);
        }
    }

    /// Returns `true` if `address` may be accessed now.
    pub fn is_ready(&self, address: u64) -> bool {
        self.is_immediate()
            || self
                .pending
                .is_some_and(|p| p.address == address && p.remaining == 0)
    }

    /// Returns `true` if the port is open (immediate gate or an elapsed request).
    pub fn is_open(&self) -> bool {
        self.is_immediate() || self.pending.is_some_and(|p| p.remaining == 0)
    }

    /// Address of the outstanding request, if any.
    pub fn pending_address(&self) -> Option<u64> {
        self.pending.map(|p| p.address)
    }

    /// Requester owning the outstanding request, if any.
    pub fn pending_requester(&self) -> Option<Requester> {
        self.pending.map(|p| p.requester)
    }

    /// Requester ticks left on the outstanding countdown.
    pub fn remaining(&self) -> Option<u64> {
        self.pending.map(|p| p.remaining)
    }

    /// Closes the port after a completed access.
    ///
    /// Countdowns are never cancelled: releasing while a request is still
    /// counting down leaves it in place.
    pub fn release(&mut self) {
        if self.pending.is_some_and(|p| p.remaining == 0) {
            self.pending = None;
        }
    }

    /// Advances the own-cycle phase by one driver tick.
    ///
    /// # Returns
    ///
    /// `true` once every `ceil(driver_frequency / frequency)` driver ticks, i.e.
    /// when the component's own clock edge falls on this driver tick.
    pub fn cycle(&mut self, driver_frequency: u32) -> bool {
        self.phase += 1;
        if self.phase >= frequency_ratio(driver_frequency, self.frequency) {
            self.phase = 0;
            true
        } else {
            false
        }
    }
}
