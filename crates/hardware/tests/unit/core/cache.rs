//! Instruction cache replacement and hit path.

use sisd_core::config::Config;
use sisd_core::core::units::{AddressedInstructionBuffer, InstructionCache};
use sisd_core::isa::Instruction;
use sisd_core::sim::CodeGenerator;

fn load(address: usize) -> Instruction {
    Instruction::Load { rd: 1, address }
}

fn filled_buffer(count: usize) -> AddressedInstructionBuffer {
    let mut generator = CodeGenerator::scripted(&Config::default());
    for address in 0..count {
        generator.push_instruction(load(address));
    }
    let mut buffer = AddressedInstructionBuffer::new(8, 4, 0);
    let _ = buffer.write(&mut generator, count).unwrap();
    buffer
}

fn fetch(cache: &mut InstructionCache, buffer: &mut AddressedInstructionBuffer, address: u64) -> Instruction {
    cache.ask_for_instruction_at(address, buffer, 12).unwrap();
    assert!(cache.is_ready(address));
    cache.fetch_instruction_at(address).unwrap()
}

#[test]
fn fills_replace_the_oldest_line() {
    let mut buffer = filled_buffer(3);
    let mut cache = InstructionCache::new(2, 0);

    for address in 0..3 {
        assert_eq!(fetch(&mut cache, &mut buffer, address), load(address as usize));
    }
    assert!(!cache.contains(0));
    assert!(cache.contains(1));
    assert!(cache.contains(2));
    assert_eq!((cache.hits, cache.misses, cache.fills), (0, 3, 3));
}

#[test]
fn hit_is_served_without_the_buffer() {
    let mut buffer = filled_buffer(2);
    let mut cache = InstructionCache::new(2, 0);
    let _ = fetch(&mut cache, &mut buffer, 0);
    let _ = fetch(&mut cache, &mut buffer, 1);

    // Both addresses are below the buffer floor now; only the cache holds them.
    assert_eq!(buffer.floor(), 2);
    assert_eq!(fetch(&mut cache, &mut buffer, 0), load(0));
    assert_eq!(cache.hits, 1);
}

#[test]
fn hit_latency_delays_readiness() {
    let mut buffer = filled_buffer(1);
    let mut cache = InstructionCache::new(1, 2);
    cache.ask_for_instruction_at(0, &mut buffer, 12).unwrap();
    assert!(!cache.is_ready(0));
    cache.tick();
    assert!(!cache.is_ready(0));
    cache.tick();
    assert!(cache.is_ready(0));
}
