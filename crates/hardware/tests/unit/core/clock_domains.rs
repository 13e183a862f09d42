//! Cross-frequency readiness and clock domain updates.

use rstest::rstest;
use sisd_core::common::{ClockGate, Requester};
use sisd_core::soc::WorkingMemory;
use sisd_core::{ClockDomain, SisdCore};

use crate::common::harness::TestContext;

#[rstest]
#[case::slow_bank_fast_requester(1, 4, 1, 4)]
#[case::default_memory(2, 12, 1, 6)]
#[case::equal_clocks(4, 4, 1, 1)]
#[case::larger_delay_value_is_not_a_multiplier(4, 4, 2, 1)]
#[case::faster_bank(12, 4, 1, 1)]
#[case::uneven_ratio_rounds_up(5, 12, 1, 3)]
#[case::immediate(1, 12, 0, 0)]
fn bank_becomes_ready_after_frequency_ratio(
    #[case] own_hz: u32,
    #[case] requester_hz: u32,
    #[case] delay: u32,
    #[case] expected_ticks: u32,
) {
    let mut memory = WorkingMemory::new(1, 4, 16, own_hz, delay);
    for _ in 0..expected_ticks {
        assert!(!memory.acquire(Requester::Io, requester_hz, 2).unwrap());
        memory.tick();
    }
    assert!(memory.acquire(Requester::Io, requester_hz, 2).unwrap());
}

#[test]
fn repeated_request_does_not_restart_the_countdown() {
    let mut gate = ClockGate::new(1, 1);
    assert!(gate.request(Requester::Io, 4, 3));
    gate.tick();
    gate.tick();
    assert!(gate.request(Requester::Io, 4, 3));
    assert_eq!(gate.remaining(), Some(2));
}

#[test]
fn frequency_change_spares_running_countdown() {
    let mut gate = ClockGate::new(1, 1);
    assert!(gate.request(Requester::Io, 4, 0));
    gate.set_frequency(4);
    assert_eq!(gate.remaining(), Some(4));
    for _ in 0..4 {
        gate.tick();
    }
    assert!(gate.is_ready(0));
    gate.release();
    assert!(gate.request(Requester::Io, 4, 1));
    assert_eq!(gate.remaining(), Some(1));
}

#[test]
fn supplier_requests_are_clamped() {
    let mut ctx = TestContext::new(TestContext::config());
    let core: &mut SisdCore = &mut ctx.core;
    assert_eq!(core.update_clock(ClockDomain::WorkingMemory, 100), Some(4));
    assert_eq!(core.update_clock(ClockDomain::InstructionMemory, 3), Some(3));
    assert_eq!(core.update_clock(ClockDomain::Core, 6), Some(12));
    assert_eq!(core.update_clock(ClockDomain::Registers, 1), Some(1));
    assert_eq!(core.update_clock(ClockDomain::InstructionMemory, 0), None);
    assert_eq!(core.frequency(ClockDomain::InstructionMemory), 3);
    assert_eq!(core.config().clocks.working_memory, 4);
}

#[test]
fn slower_memory_keeps_running() {
    let mut ctx = TestContext::new(TestContext::config());
    let _ = ctx.run(200);
    let before = ctx.core.stats().instructions_retired;
    assert_eq!(ctx.core.update_clock(ClockDomain::WorkingMemory, 1), Some(1));
    let _ = ctx.run(400);
    assert!(ctx.core.stats().instructions_retired > before);
}
