//! Loop replay through the whole pipeline.
//!
//! Generated loops are fetched from the instruction buffer window while it is
//! in iterate mode, then the window moves past the loop once the closing branch
//! falls through.

use pretty_assertions::assert_eq;
use rstest::rstest;
use sisd_core::common::constants::LOOP_WINDOW_SLACK;
use sisd_core::config::Config;
use sisd_core::isa::{AluOp, Instruction};
use sisd_core::sim::{LoopShape, SequenceShape};

use crate::common::harness::TestContext;

fn context(cache: bool, script: impl FnOnce(&mut sisd_core::sim::CodeGenerator) -> sisd_core::SimResult<()>) -> TestContext {
    let mut config = TestContext::config();
    config.cache.enabled = cache;
    TestContext::scripted(config, script)
}

#[rstest]
#[case::with_cache(true)]
#[case::without_cache(false)]
fn for_loop_is_replayed_from_the_window(#[case] cache: bool) {
    let mut ctx = context(cache, |generator| {
        generator.push_for_loop(LoopShape {
            body: SequenceShape::new(2, 1, 2),
            iterations: Some(3),
        })
    });

    let _ = ctx.run_until(2_000, |core| core.buffer().is_iterating());
    assert_eq!(ctx.core.buffer().floor(), 2);
    assert_eq!(ctx.core.buffer().anchor(), Some(8));

    let _ = ctx.run_until(5_000, |core| core.stats().iterate_exits == 1);
    let _ = ctx.drain(2_000);

    let stats = ctx.core.stats();
    assert_eq!(stats.iterate_entries, 1);
    assert_eq!(stats.iterate_exits, 1);
    assert_eq!(stats.branches_taken, 2);
    assert_eq!(stats.inst_branch, 1);
    // Two preamble instructions, three passes over body and increment, one fall-through.
    assert_eq!(stats.instructions_retired, 2 + 3 * 6 + 1);
    assert_eq!(ctx.core.buffer().floor(), 9);
    assert!(!ctx.core.buffer().is_iterating());
}

#[rstest]
#[case::with_cache(true)]
#[case::without_cache(false)]
fn doubled_loop_keeps_the_outer_anchor(#[case] cache: bool) {
    let mut ctx = context(cache, |generator| {
        generator.push_doubled_loop(
            Some(2),
            LoopShape {
                body: SequenceShape::new(2, 1, 1),
                iterations: Some(2),
            },
        )
    });

    let _ = ctx.run_until(5_000, |core| core.stats().iterate_exits == 1);
    let _ = ctx.drain(2_000);

    let stats = ctx.core.stats();
    // The inner loop exits twice inside the anchored region without leaving iterate mode.
    assert_eq!(stats.iterate_entries, 1);
    assert_eq!(stats.iterate_exits, 1);
    assert_eq!(stats.branches_taken, 3);
    assert_eq!(stats.inst_branch, 3);
    assert_eq!(stats.instructions_retired, 30);
}

#[test]
fn taken_forward_branch_skips_its_body() {
    let mut ctx = context(true, |generator| {
        generator.push_branch(SequenceShape::new(2, 1, 1))
    });
    let _ = ctx.drain(2_000);

    let stats = ctx.core.stats();
    // Both compared registers start at zero, so neither GT nor LT holds.
    assert_eq!(stats.branches_taken, 0);
    assert_eq!(stats.instructions_retired, 5);
    assert_eq!(stats.iterate_entries, 0);
}

const fn reset(rd: usize) -> Instruction {
    Instruction::AluImm {
        op: AluOp::Add,
        rd,
        rs1: 0,
        imm: 0,
    }
}

const fn count(rd: usize) -> Instruction {
    Instruction::AluImm {
        op: AluOp::Add,
        rd,
        rs1: rd,
        imm: 1,
    }
}

const fn loop_back(rs1: usize, rs2: usize, target: u64) -> Instruction {
    Instruction::Branch {
        op: AluOp::Lt,
        rs1,
        rs2,
        target,
    }
}

/// A scripted core running `program`, with `limits` set to two before the first tick.
fn program(cache: bool, buffer_delay: u32, program: &[Instruction], limits: &[usize]) -> TestContext {
    let mut config = TestContext::config();
    config.cache.enabled = cache;
    config.buffer.delay = buffer_delay;
    let mut ctx = TestContext::scripted(config, |generator| {
        for &instruction in program {
            generator.push_instruction(instruction);
        }
        Ok(())
    });
    for &reg in limits {
        ctx.core.registers_mut().poke(reg, 2).unwrap();
    }
    ctx
}

#[rstest]
#[case::cached(true, 1)]
#[case::uncached(false, 1)]
#[case::uncached_immediate_buffer(false, 0)]
#[case::cached_immediate_buffer(true, 0)]
fn loop_directly_after_a_loop_is_replayed(#[case] cache: bool, #[case] buffer_delay: u32) {
    let mut ctx = program(
        cache,
        buffer_delay,
        &[
            reset(1),
            count(3),
            count(1),
            loop_back(1, 2, 1),
            reset(4),
            count(6),
            count(4),
            loop_back(4, 5, 5),
        ],
        &[2, 5],
    );
    let _ = ctx.run_until(5_000, |core| core.stats().iterate_exits == 2);
    let _ = ctx.drain(2_000);

    let stats = ctx.core.stats();
    assert_eq!(stats.iterate_entries, 2);
    assert_eq!(stats.branches_taken, 2);
    assert_eq!(stats.inst_branch, 2);
    assert_eq!(stats.instructions_retired, 12);
    assert_eq!(ctx.core.registers().peek(3), Some(2));
    assert_eq!(ctx.core.registers().peek(6), Some(2));
    assert_eq!(ctx.core.buffer().floor(), 8);
}

#[rstest]
#[case::cached(true, 1)]
#[case::uncached(false, 1)]
#[case::uncached_immediate_buffer(false, 0)]
fn doubled_loop_directly_after_a_loop_is_replayed(#[case] cache: bool, #[case] buffer_delay: u32) {
    let mut ctx = program(
        cache,
        buffer_delay,
        &[
            reset(1),
            count(3),
            count(1),
            loop_back(1, 2, 1),
            reset(7),
            reset(8),
            count(10),
            count(8),
            loop_back(8, 9, 6),
            count(7),
            loop_back(7, 11, 5),
        ],
        &[2, 9, 11],
    );
    let _ = ctx.run_until(8_000, |core| core.stats().iterate_exits == 2);
    let _ = ctx.drain(2_000);

    let stats = ctx.core.stats();
    // The outer start is the floor, so the outer branch anchors the second replay.
    assert_eq!(stats.iterate_entries, 2);
    assert_eq!(stats.branches_taken, 4);
    assert_eq!(stats.inst_branch, 4);
    assert_eq!(stats.instructions_retired, 22);
    assert_eq!(ctx.core.registers().peek(10), Some(4));
    assert_eq!(ctx.core.buffer().floor(), 11);
}

const SEEDS: u64 = 12;
const TICKS: u64 = 4_000;

#[rstest]
#[case::default_machine(|_: &mut Config| {})]
#[case::delayed_registers(|config: &mut Config| {
    config.registers.delay = 1;
    config.clocks.registers = 3;
})]
#[case::smallest_immediate_buffer(|config: &mut Config| {
    config.buffer.capacity = config.max_loop_span() + LOOP_WINDOW_SLACK;
    config.buffer.delay = 0;
})]
#[case::loops_only(|config: &mut Config| {
    config.generator.for_loop_probability = 0.5;
    config.generator.branch_probability = 0.0;
    config.generator.doubled_loop_probability = 0.5;
})]
#[case::loops_only_uncached_immediate(|config: &mut Config| {
    config.generator.for_loop_probability = 0.6;
    config.generator.branch_probability = 0.0;
    config.generator.doubled_loop_probability = 0.4;
    config.cache.enabled = false;
    config.buffer.delay = 0;
    config.memory.delay = 0;
})]
fn random_workloads_run_without_faults(#[case] machine: fn(&mut Config)) {
    for seed in 1..=SEEDS {
        let mut config = TestContext::config();
        config.general.seed = seed;
        machine(&mut config);
        let mut ctx = TestContext::new(config);
        if let Err(e) = ctx.core.run(TICKS) {
            panic!("seed {seed} failed at cycle {}: {e}", ctx.core.cycle());
        }
        assert!(ctx.core.stats().instructions_retired > 0, "seed {seed} made no progress");
    }
}
