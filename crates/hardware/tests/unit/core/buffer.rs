//! Addressed instruction buffer: window addressing and loop replay bookkeeping.

use proptest::prelude::*;
use sisd_core::common::SimError;
use sisd_core::config::Config;
use sisd_core::core::units::AddressedInstructionBuffer;
use sisd_core::isa::{AluOp, Instruction};
use sisd_core::sim::CodeGenerator;

fn load(pc: u64) -> Instruction {
    Instruction::Load {
        rd: 1 + (pc as usize) % 8,
        address: (pc as usize) % 64,
    }
}

fn straight_line(count: u64) -> CodeGenerator {
    let mut generator = CodeGenerator::scripted(&Config::default());
    for pc in 0..count {
        generator.push_instruction(load(pc));
    }
    generator
}

proptest! {
    #[test]
    fn window_addresses_stay_monotonic(ops in prop::collection::vec(any::<bool>(), 1..80)) {
        let mut generator = straight_line(200);
        let mut buffer = AddressedInstructionBuffer::new(8, 4, 0);
        let mut pc = 0u64;
        let mut floor = buffer.floor();

        for write in ops {
            if write {
                let free = buffer.free();
                let _ = buffer.write(&mut generator, free).unwrap();
            } else if let Some(instruction) = buffer.fetch_instruction_at(pc).unwrap() {
                prop_assert_eq!(instruction, load(pc));
                pc += 1;
            }
            prop_assert!(buffer.floor() >= floor);
            floor = buffer.floor();
            prop_assert!(buffer.len() <= buffer.capacity());
            prop_assert_eq!(
                buffer.highest_instruction_address(),
                buffer.floor() + buffer.len() as u64
            );
            prop_assert_eq!(buffer.floor(), pc);
        }
    }
}

#[test]
fn writing_past_capacity_overflows() {
    let mut generator = straight_line(10);
    let mut buffer = AddressedInstructionBuffer::new(4, 4, 0);
    assert_eq!(buffer.write(&mut generator, 3).unwrap(), 3);
    assert_eq!(
        buffer.write(&mut generator, 2),
        Err(SimError::BufferOverflow {
            requested: 2,
            available: 1
        })
    );
}

#[test]
fn evicted_address_cannot_be_fetched() {
    let mut generator = straight_line(4);
    let mut buffer = AddressedInstructionBuffer::new(4, 4, 0);
    let _ = buffer.write(&mut generator, 4).unwrap();
    assert_eq!(buffer.fetch_instruction_at(2).unwrap(), Some(load(2)));
    assert_eq!(
        buffer.fetch_instruction_at(1),
        Err(SimError::Evicted {
            address: 1,
            floor: 3
        })
    );
}

#[test]
fn delayed_buffer_needs_a_request() {
    let mut generator = straight_line(2);
    let mut buffer = AddressedInstructionBuffer::new(4, 4, 1);
    let _ = buffer.write(&mut generator, 2).unwrap();
    assert!(matches!(
        buffer.fetch_instruction_at(0),
        Err(SimError::NotReady { address: 0, .. })
    ));
}

#[test]
fn backward_branch_to_floor_replays_the_window() {
    let mut generator = CodeGenerator::scripted(&Config::default());
    let branch = Instruction::Branch {
        op: AluOp::Lt,
        rs1: 1,
        rs2: 2,
        target: 1,
    };
    generator.push_instruction(load(0));
    generator.push_instruction(load(1));
    generator.push_instruction(load(2));
    generator.push_instruction(branch);
    generator.push_instruction(load(4));

    let mut buffer = AddressedInstructionBuffer::new(8, 4, 0);
    let _ = buffer.write(&mut generator, 5).unwrap();
    assert_eq!(buffer.jump_instructions().count(), 1);

    let _ = buffer.fetch_instruction_at(0).unwrap();
    assert!(buffer.is_iterating());
    assert_eq!(buffer.anchor(), Some(3));

    for _ in 0..3 {
        for pc in 1..=3 {
            assert!(buffer.fetch_instruction_at(pc).unwrap().is_some());
        }
        assert_eq!(buffer.floor(), 1);
    }

    assert!(!buffer.clear_jump_instruction(2));
    assert!(buffer.is_iterating());
    assert!(buffer.clear_jump_instruction(3));
    assert!(!buffer.is_iterating());
    assert_eq!(buffer.floor(), 4);
    assert_eq!(buffer.iterate_entries(), 1);
    assert_eq!(buffer.iterate_exits(), 1);
    assert_eq!(buffer.fetch_instruction_at(4).unwrap(), Some(load(4)));
}
