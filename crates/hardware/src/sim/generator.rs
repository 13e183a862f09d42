//! Synthetic instruction workload generator.
//!
//! The `CodeGenerator` produces the unbounded logical instruction stream that the
//! addressed instruction buffer consumes. It performs the following:
//! 1. **Shapes:** Plain sequences, for-loops, conditional branches and doubled
//!    (nested) for-loops, chosen by independently tunable probabilities.
//! 2. **Locality:** Register and memory operands are allocated as wrap-around
//!    consecutive windows, avoiding registers held live by an enclosing shape.
//! 3. **Jump Registration:** Every branch is queued together with its address as
//!    soon as it is generated; the buffer takes the queue over on every write.
//! 4. **Determinism:** All choices come from a seeded xorshift generator.
//!
//! Addresses are implicit: the n-th instruction ever emitted has address n, which
//! is exactly the address the buffer assigns when it admits it.

use std::collections::VecDeque;

use tracing::trace;

use crate::common::constants::{MIN_SEQUENCE_LOADS, REGISTER_ALLOCATION_RETRIES};
use crate::common::{GeneratorError, SimResult};
use crate::config::{Config, GeneratorConfig};
use crate::isa::{AluOp, Instruction, Word};
use crate::sim::rng::XorShift64;

/// Largest immediate operand the generator emits.
const MAX_IMMEDIATE: usize = 15;

/// Composition of a plain straight-line sequence.
///
/// Zero counts are raised to one: every sequence loads, computes and stores at
/// least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceShape {
    /// LOAD instructions into consecutive registers.
    pub loads: usize,
    /// ALU operations over the loaded registers.
    pub alu_ops: usize,
    /// STORE instructions draining the results.
    pub stores: usize,
}

impl SequenceShape {
    /// Creates a shape with the given counts.
    pub const fn new(loads: usize, alu_ops: usize, stores: usize) -> Self {
        Self {
            loads,
            alu_ops,
            stores,
        }
    }

    /// The shape with zero counts raised to one.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::new(self.loads.max(1), self.alu_ops.max(1), self.stores.max(1))
    }

    /// Number of instructions the shape emits.
    pub fn instruction_count(self) -> usize {
        let n = self.normalized();
        n.loads + n.alu_ops + n.stores
    }
}

/// Composition of a for-loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopShape {
    /// Loop body.
    pub body: SequenceShape,
    /// Iteration count set by a preamble; `None` leaves the limit register as is.
    pub iterations: Option<u32>,
}

/// Workload generator feeding the addressed instruction buffer.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    rng: XorShift64,
    stream: VecDeque<Instruction>,
    jumps: Vec<(u64, Instruction)>,
    next_address: u64,
    register_count: usize,
    zero_register: Option<usize>,
    memory_size: usize,
    settings: GeneratorConfig,
    low_water_mark: usize,
    autofill: bool,
}

impl CodeGenerator {
    /// Creates a generator that tops its stream up with random shapes.
    ///
    /// The low-water mark is twice the instruction buffer capacity.
    pub fn new(config: &Config) -> Self {
        Self {
            rng: XorShift64::new(config.general.seed),
            stream: VecDeque::new(),
            jumps: Vec::new(),
            next_address: 0,
            register_count: config.registers.count,
            zero_register: config.registers.zero_register,
            memory_size: config.memory_size(),
            settings: config.generator.clone(),
            low_water_mark: 2 * config.buffer.capacity,
            autofill: true,
        }
    }

    /// Creates a generator that only emits explicitly pushed shapes.
    ///
    /// Once those are consumed the stream stays dry.
    pub fn scripted(config: &Config) -> Self {
        Self {
            autofill: false,
            ..Self::new(config)
        }
    }

    /// Stream length below which a refill generates new shapes.
    pub const fn low_water_mark(&self) -> usize {
        self.low_water_mark
    }

    /// Instructions generated but not yet handed out.
    pub fn len(&self) -> usize {
        self.stream.len()
    }

    /// Returns `true` when no generated instruction is waiting.
    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    /// Address the next emitted instruction will receive.
    pub const fn next_address(&self) -> u64 {
        self.next_address
    }

    /// Instructions generated but not yet handed out, in stream order.
    pub fn pending(&self) -> impl Iterator<Item = &Instruction> {
        self.stream.iter()
    }

    /// Generates random shapes until the stream reaches the low-water mark.
    ///
    /// Does nothing for a scripted generator.
    pub fn refill(&mut self) -> SimResult<()> {
        while self.autofill && self.stream.len() < self.low_water_mark {
            self.push_random()?;
        }
        Ok(())
    }

    /// Hands out the next instruction of the stream, refilling first.
    pub fn next_instruction(&mut self) -> SimResult<Option<Instruction>> {
        self.refill()?;
        Ok(self.stream.pop_front())
    }

    /// Drains the queued `(branch pc, branch instruction)` registrations.
    pub fn take_jump_registrations(&mut self) -> Vec<(u64, Instruction)> {
        std::mem::take(&mut self.jumps)
    }

    /// Emits a single hand-written instruction.
    ///
    /// Branches are queued for registration like generated ones.
    pub fn push_instruction(&mut self, instruction: Instruction) {
        let pc = self.emit(instruction);
        if instruction.branch_target().is_some() {
            self.jumps.push((pc, instruction));
        }
    }

    /// Emits one randomly chosen shape.
    pub fn push_random(&mut self) -> SimResult<()> {
        let roll = self.rng.unit();
        let s = &self.settings;
        let for_loop = s.for_loop_probability;
        let branch = for_loop + s.branch_probability;
        let doubled = branch + s.doubled_loop_probability;

        if roll < for_loop {
            let shape = self.random_loop_shape();
            self.push_for_loop(shape)
        } else if roll < branch {
            let body = self.random_sequence_shape();
            self.push_branch(body)
        } else if roll < doubled {
            let outer = self.random_iterations();
            let inner = self.random_loop_shape();
            self.push_doubled_loop(outer, inner)
        } else {
            let shape = self.random_sequence_shape();
            self.push_sequence(shape)
        }
    }

    /// Emits a plain sequence: loads, ALU operations over the loaded
    /// registers, then stores draining the results.
    pub fn push_sequence(&mut self, shape: SequenceShape) -> SimResult<()> {
        self.emit_sequence(shape, &[])
    }

    /// Emits a for-loop.
    ///
    /// Layout: optional `ADDI lim, zero, n`, `ADDI i, zero, 0`, the body (the
    /// branch target), `ADDI i, i, 1`, `BRANCH LT i, lim -> body`.
    pub fn push_for_loop(&mut self, shape: LoopShape) -> SimResult<()> {
        let control = self.allocate_window(2, &[])?;
        let (i, limit) = (control[0], control[1]);

        if let Some(n) = shape.iterations {
            self.emit_constant(limit, n);
        }
        self.emit_constant(i, 0);
        let target = self.next_address;
        self.emit_sequence(shape.body, &control)?;
        self.emit_increment(i);
        self.emit_branch(AluOp::Lt, i, limit, target);
        Ok(())
    }

    /// Emits a conditional branch over a body.
    ///
    /// The branch compares two fresh registers and, when taken, skips the body.
    pub fn push_branch(&mut self, body: SequenceShape) -> SimResult<()> {
        let compared = self.allocate_window(2, &[])?;
        let op = AluOp::COMPARISONS[self.rng.below(AluOp::COMPARISONS.len())];
        let target = self.next_address + 1 + body.instruction_count() as u64;
        self.emit_branch(op, compared[0], compared[1], target);
        self.emit_sequence(body, &compared)
    }

    /// Emits a doubled (nested) for-loop.
    ///
    /// Layout: optional limit preambles, `i = 0`, outer start: `j = 0`, inner
    /// start: body, `j += 1`, `BRANCH LT j, limj -> inner`, `i += 1`,
    /// `BRANCH LT i, limi -> outer`.
    pub fn push_doubled_loop(&mut self, outer_iterations: Option<u32>, inner: LoopShape) -> SimResult<()> {
        let control = self.allocate_window(4, &[])?;
        let (i, limit_i, j, limit_j) = (control[0], control[1], control[2], control[3]);

        if let Some(n) = outer_iterations {
            self.emit_constant(limit_i, n);
        }
        if let Some(n) = inner.iterations {
            self.emit_constant(limit_j, n);
        }
        self.emit_constant(i, 0);
        let outer_start = self.next_address;
        self.emit_constant(j, 0);
        let inner_start = self.next_address;
        self.emit_sequence(inner.body, &control)?;
        self.emit_increment(j);
        self.emit_branch(AluOp::Lt, j, limit_j, inner_start);
        self.emit_increment(i);
        self.emit_branch(AluOp::Lt, i, limit_i, outer_start);
        Ok(())
    }

    fn random_sequence_shape(&mut self) -> SequenceShape {
        let k = self.settings.max_sequence_length;
        SequenceShape::new(
            self.rng.range(MIN_SEQUENCE_LOADS, k),
            self.rng.range(1, k),
            self.rng.range(1, k),
        )
    }

    fn random_iterations(&mut self) -> Option<u32> {
        if self.rng.chance(self.settings.preamble_probability) {
            let max = self.settings.max_iterations.max(1) as usize;
            Some(self.rng.range(1, max) as u32)
        } else {
            None
        }
    }

    fn random_loop_shape(&mut self) -> LoopShape {
        let iterations = self.random_iterations();
        LoopShape {
            body: self.random_sequence_shape(),
            iterations,
        }
    }

    fn check_shape(&self, shape: SequenceShape) -> Result<(), GeneratorError> {
        let limit = self.settings.max_sequence_length;
        let longest = shape.loads.max(shape.alu_ops).max(shape.stores);
        if longest > limit {
            return Err(GeneratorError::ShapeTooLarge {
                length: longest,
                limit,
            });
        }
        Ok(())
    }

    fn emit_sequence(&mut self, shape: SequenceShape, excepted: &[usize]) -> SimResult<()> {
        self.check_shape(shape)?;
        let shape = shape.normalized();

        let loaded = self.allocate_window(shape.loads, excepted)?;
        let blocked: Vec<usize> = excepted.iter().chain(&loaded).copied().collect();
        let after_loads = loaded.last().map_or(0, |&r| r + 1);
        let mut results = self.allocate_following(shape.alu_ops, after_loads, &blocked)?;

        let base = self.rng.below(self.memory_size);
        for (offset, &rd) in loaded.iter().enumerate() {
            let address = (base + offset) % self.memory_size;
            let _ = self.emit(Instruction::Load { rd, address });
        }

        for &rd in &results {
            let rs1 = loaded[self.rng.below(loaded.len())];
            let instruction = if self.rng.chance(self.settings.immediate_probability) {
                Instruction::AluImm {
                    op: AluOp::IMMEDIATE[self.rng.below(AluOp::IMMEDIATE.len())],
                    rd,
                    rs1,
                    imm: self.rng.range(1, MAX_IMMEDIATE) as Word,
                }
            } else {
                Instruction::Alu {
                    op: AluOp::ARITHMETIC[self.rng.below(AluOp::ARITHMETIC.len())],
                    rd,
                    rs1,
                    rs2: loaded[self.rng.below(loaded.len())],
                }
            };
            let _ = self.emit(instruction);
        }

        let base = self.rng.below(self.memory_size);
        for offset in 0..shape.stores {
            // The last remaining result register is stored repeatedly.
            let rs = if results.len() > 1 {
                results.pop()
            } else {
                results.first().copied()
            };
            if let Some(rs) = rs {
                let address = (base + offset) % self.memory_size;
                let _ = self.emit(Instruction::Store { rs, address });
            }
        }
        Ok(())
    }

    fn emit(&mut self, instruction: Instruction) -> u64 {
        let pc = self.next_address;
        trace!(pc, %instruction, "generated");
        self.stream.push_back(instruction);
        self.next_address += 1;
        pc
    }

    fn emit_branch(&mut self, op: AluOp, rs1: usize, rs2: usize, target: u64) {
        let branch = Instruction::Branch { op, rs1, rs2, target };
        let pc = self.emit(branch);
        self.jumps.push((pc, branch));
    }

    fn emit_increment(&mut self, reg: usize) {
        let _ = self.emit(Instruction::AluImm {
            op: AluOp::Add,
            rd: reg,
            rs1: reg,
            imm: 1,
        });
    }

    /// Loads `value` into `reg`, through the zero register when there is one.
    fn emit_constant(&mut self, reg: usize, value: u32) {
        match self.zero_register {
            Some(zero) => {
                let _ = self.emit(Instruction::AluImm {
                    op: AluOp::Add,
                    rd: reg,
                    rs1: zero,
                    imm: value,
                });
            }
            None => {
                let _ = self.emit(Instruction::Alu {
                    op: AluOp::Sub,
                    rd: reg,
                    rs1: reg,
                    rs2: reg,
                });
                if value > 0 {
                    let _ = self.emit(Instruction::AluImm {
                        op: AluOp::Add,
                        rd: reg,
                        rs1: reg,
                        imm: value,
                    });
                }
            }
        }
    }

    fn is_usable(&self, reg: usize, excepted: &[usize]) -> bool {
        self.zero_register != Some(reg) && !excepted.contains(&reg)
    }

    /// Allocates `n` wrap-around consecutive registers avoiding `excepted`.
    ///
    /// Starts at a random register and tries successive starting points.
    fn allocate_window(&mut self, n: usize, excepted: &[usize]) -> Result<Vec<usize>, GeneratorError> {
        let count = self.register_count;
        let attempts = count.min(REGISTER_ALLOCATION_RETRIES);
        let start = self.rng.below(count);

        if n <= count {
            for attempt in 0..attempts {
                let first = (start + attempt) % count;
                let window: Vec<usize> = (0..n).map(|i| (first + i) % count).collect();
                if window.iter().all(|&r| self.is_usable(r, excepted)) {
                    return Ok(window);
                }
            }
        }
        Err(GeneratorError::RegisterExhaustion {
            needed: n,
            excepted: excepted.len(),
            attempts,
        })
    }

    /// Allocates the first `n` usable registers at or after `from`, wrapping around.
    fn allocate_following(
        &self,
        n: usize,
        from: usize,
        excepted: &[usize],
    ) -> Result<Vec<usize>, GeneratorError> {
        let count = self.register_count;
        let picked: Vec<usize> = (0..count)
            .map(|i| (from + i) % count)
            .filter(|&r| self.is_usable(r, excepted))
            .take(n)
            .collect();
        if picked.len() < n {
            return Err(GeneratorError::RegisterExhaustion {
                needed: n,
                excepted: excepted.len(),
                attempts: count.min(REGISTER_ALLOCATION_RETRIES),
            });
        }
        Ok(picked)
    }
}
