//! Dispatch rules of the single-issue pipeline.

use pretty_assertions::assert_eq;
use sisd_core::common::SimError;
use sisd_core::config::Config;
use sisd_core::core::pipeline::{DecodeOutcome, Decoder, FetchOutcome, InstructionFetcher, StallReason};
use sisd_core::core::units::{AddressedInstructionBuffer, Alu, IoInterface};
use sisd_core::isa::{AluOp, Instruction};
use sisd_core::sim::CodeGenerator;

use crate::common::harness::TestContext;

fn add(rd: usize, rs1: usize, rs2: usize) -> Instruction {
    Instruction::Alu {
        op: AluOp::Add,
        rd,
        rs1,
        rs2,
    }
}

fn latch(fetcher: &mut InstructionFetcher, buffer: &mut AddressedInstructionBuffer) {
    assert!(matches!(fetcher.fetch(buffer, None).unwrap(), FetchOutcome::Fetched { .. }));
}

#[test]
fn busy_alu_blocks_only_alu_instructions() {
    let mut generator = CodeGenerator::scripted(&Config::default());
    generator.push_instruction(add(4, 5, 6));
    generator.push_instruction(Instruction::Load { rd: 7, address: 3 });
    let mut buffer = AddressedInstructionBuffer::new(4, 4, 0);
    let _ = buffer.write(&mut generator, 2).unwrap();

    let mut fetcher = InstructionFetcher::new(12);
    let mut decoder = Decoder::new(16, 64, Some(0));
    let mut alu = Alu::new(16, 12);
    let mut io = IoInterface::new(12);
    alu.dispatch(100, add(1, 2, 3)).unwrap();

    latch(&mut fetcher, &mut buffer);
    assert_eq!(
        decoder.decode(&mut fetcher, &mut alu, &mut io).unwrap(),
        DecodeOutcome::Stalled(StallReason::Structural)
    );
    // The stalled instruction keeps its place; fetch refills the latch behind it.
    latch(&mut fetcher, &mut buffer);
    assert_eq!(decoder.current(), Some((0, add(4, 5, 6))));
    assert_eq!(fetcher.latch(), Some((1, Instruction::Load { rd: 7, address: 3 })));
}

#[test]
fn second_memory_instruction_is_refused() {
    let mut io = IoInterface::new(12);
    io.enqueue(0, Instruction::Load { rd: 1, address: 0 }).unwrap();
    assert_eq!(
        io.enqueue(1, Instruction::Store { rs: 1, address: 1 }),
        Err(SimError::IoOccupied)
    );
}

#[test]
fn dependent_program_waits_and_computes() {
    let mut config = TestContext::config();
    config.cache.enabled = false;
    let mut ctx = TestContext::scripted(config, |generator| {
        generator.push_instruction(Instruction::Load { rd: 1, address: 0 });
        generator.push_instruction(add(2, 1, 1));
        generator.push_instruction(Instruction::Store { rs: 2, address: 17 });
        Ok(())
    });
    ctx.core.memory_mut().load(&[7], 0).unwrap();

    let _ = ctx.drain(500);
    let stats = ctx.core.stats();
    assert_eq!(stats.instructions_retired, 3);
    assert_eq!((stats.inst_load, stats.inst_alu, stats.inst_store), (1, 1, 1));
    assert!(stats.stalls_data > 0);
    assert_eq!(ctx.core.registers().peek(2), Some(14));
    assert_eq!(ctx.core.memory().peek(17), Some(14));
}

#[test]
fn loads_queue_behind_the_single_memory_slot() {
    let mut ctx = TestContext::scripted(TestContext::config(), |generator| {
        for address in 0..3 {
            generator.push_instruction(Instruction::Load { rd: 1 + address, address });
        }
        Ok(())
    });

    let mut in_flight = Vec::new();
    while ctx.core.stats().inst_load < 3 {
        let _ = ctx.run(1);
        in_flight.extend(ctx.core.io().current().map(|(pc, _)| pc));
        assert!(ctx.core.cycle() < 500);
    }
    in_flight.dedup();
    assert_eq!(in_flight, vec![0, 1, 2]);
    assert!(ctx.core.stats().stalls_structural > 0);
}

#[test]
fn snapshot_does_not_disturb_the_run() {
    let mut observed = TestContext::new(TestContext::config());
    let mut plain = TestContext::new(TestContext::config());
    for _ in 0..150 {
        let _ = observed.core.snapshot();
        let a = observed.core.tick().unwrap();
        let b = plain.core.tick().unwrap();
        assert_eq!(a, b);
    }
    assert_eq!(observed.core.snapshot(), plain.core.snapshot());
}
