//! Code generator: addressing, determinism and register budget failures.

use proptest::prelude::*;
use sisd_core::common::{GeneratorError, SimError};
use sisd_core::config::Config;
use sisd_core::isa::Instruction;
use sisd_core::sim::{CodeGenerator, LoopShape, SequenceShape};

fn drain(generator: &mut CodeGenerator) -> Vec<Instruction> {
    std::iter::from_fn(|| generator.next_instruction().unwrap()).collect()
}

proptest! {
    #[test]
    fn addresses_grow_by_one_per_instruction(
        shapes in prop::collection::vec((2usize..=4, 1usize..=4, 1usize..=4, 0u8..3), 1..12)
    ) {
        let mut generator = CodeGenerator::scripted(&Config::default());
        let mut emitted = 0u64;
        for (loads, alu_ops, stores, kind) in shapes {
            let shape = SequenceShape::new(loads, alu_ops, stores);
            let before = generator.next_address();
            match kind {
                0 => generator.push_sequence(shape).unwrap(),
                1 => generator.push_branch(shape).unwrap(),
                _ => generator.push_for_loop(LoopShape { body: shape, iterations: Some(2) }).unwrap(),
            }
            prop_assert!(generator.next_address() > before);
            emitted = generator.next_address();
        }
        prop_assert_eq!(drain(&mut generator).len() as u64, emitted);
    }

    #[test]
    fn branch_targets_stay_inside_generated_code(seed in any::<u64>()) {
        let mut config = Config::default();
        config.general.seed = seed;
        let mut generator = CodeGenerator::new(&config);
        generator.refill().unwrap();
        let end = generator.next_address();
        for (pc, branch) in generator.take_jump_registrations() {
            let target = branch.branch_target().unwrap();
            prop_assert!(target <= end);
            prop_assert_ne!(target, pc);
        }
    }
}

#[test]
fn same_seed_same_stream() {
    let config = Config::default();
    let mut a = CodeGenerator::new(&config);
    let mut b = CodeGenerator::new(&config);
    for _ in 0..200 {
        assert_eq!(a.next_instruction().unwrap(), b.next_instruction().unwrap());
    }
}

#[test]
fn refill_reaches_the_low_water_mark() {
    let config = Config::default();
    let mut generator = CodeGenerator::new(&config);
    generator.refill().unwrap();
    assert!(generator.len() >= generator.low_water_mark());
    assert_eq!(generator.low_water_mark(), 2 * config.buffer.capacity);
}

#[test]
fn tiny_register_file_exhausts_loop_body() {
    let mut config = Config::default();
    config.registers.count = 6;
    let mut generator = CodeGenerator::scripted(&config);
    let err = generator
        .push_for_loop(LoopShape {
            body: SequenceShape::new(3, 1, 1),
            iterations: None,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        SimError::Generator(GeneratorError::RegisterExhaustion { .. })
    ));
}

#[test]
fn oversized_shape_is_rejected() {
    let mut generator = CodeGenerator::scripted(&Config::default());
    let err = generator.push_sequence(SequenceShape::new(9, 1, 1)).unwrap_err();
    assert_eq!(
        err,
        SimError::Generator(GeneratorError::ShapeTooLarge { length: 9, limit: 4 })
    );
}

#[test]
fn scripted_generator_runs_dry() {
    let mut generator = CodeGenerator::scripted(&Config::default());
    generator.push_sequence(SequenceShape::new(2, 1, 1)).unwrap();
    assert_eq!(drain(&mut generator).len(), 4);
    assert_eq!(generator.next_instruction().unwrap(), None);
}
