//! Register bank and working memory storage properties.

use proptest::prelude::*;
use sisd_core::common::{Requester, SimError};
use sisd_core::core::arch::RegisterBank;
use sisd_core::soc::WorkingMemory;

const MODULUS: u32 = 1 << 8;

fn registers() -> RegisterBank {
    RegisterBank::new("registers", 16, Some(0), MODULUS, 12, 0)
}

proptest! {
    #[test]
    fn writes_wrap_into_the_word_range(address in 1usize..16, value in any::<u64>()) {
        let mut bank = registers();
        bank.write(address, value).unwrap();
        let read = bank.read(address).unwrap();
        prop_assert_eq!(u64::from(read), value % u64::from(MODULUS));
        prop_assert!(read < MODULUS);
    }

    #[test]
    fn zero_register_always_reads_zero(value in any::<u64>()) {
        let mut bank = registers();
        bank.write(0, value).unwrap();
        prop_assert_eq!(bank.read(0).unwrap(), 0);
        bank.poke(0, value).unwrap();
        prop_assert_eq!(bank.peek(0), Some(0));
    }

    #[test]
    fn memory_addresses_split_into_bank_and_offset(address in 0usize..64) {
        let memory = WorkingMemory::new(4, 16, MODULUS, 2, 1);
        prop_assert_eq!(memory.locate(address).unwrap(), (address / 16, address % 16));
    }
}

#[test]
fn memory_out_of_range_is_fatal() {
    let mut memory = WorkingMemory::new(4, 16, MODULUS, 2, 0);
    assert!(matches!(
        memory.read(64),
        Err(SimError::OutOfBounds { address: 64, size: 64, .. })
    ));
    assert!(memory.acquire(Requester::Io, 12, 70).is_err());
}

#[test]
fn banks_count_down_independently() {
    let mut memory = WorkingMemory::new(2, 4, MODULUS, 1, 1);
    assert!(!memory.acquire(Requester::Io, 2, 1).unwrap());
    // Bank 1 has its own port, so a second requester is accepted there.
    assert!(!memory.acquire(Requester::Alu, 2, 5).unwrap());
    memory.tick();
    memory.tick();
    assert!(memory.is_ready(1));
    assert!(memory.is_ready(5));
    memory.write(5, 300).unwrap();
    assert_eq!(memory.read(5).unwrap(), 300 % MODULUS);
}

#[test]
fn premature_access_reports_the_global_address() {
    let memory = WorkingMemory::new(2, 4, MODULUS, 1, 1);
    assert_eq!(
        memory.read(6),
        Err(SimError::NotReady {
            component: "working memory",
            address: 6
        })
    );
}
