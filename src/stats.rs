//! Aggregate counters for the whole analysis run.
//!
//! `Statistics` is a commutative monoid under [`Statistics::merge`]: every
//! record operation is an element-wise addition, so the classify-and-count
//! step can be partitioned across rayon workers and the partial accumulators
//! combined in any order without changing the totals.

use rayon::prelude::*;

use crate::bytecode::Instruction;
use crate::opcodes::{Category, classify};

/// Process-scoped totals and the per-opcode histogram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Statistics {
    pub(crate) classes: u64,
    pub(crate) methods: u64,
    pub(crate) instructions: u64,
    pub(crate) invocations: u64,
    pub(crate) branches: u64,
    pub(crate) histogram: [u64; 256],
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            classes: 0,
            methods: 0,
            instructions: 0,
            invocations: 0,
            branches: 0,
            histogram: [0; 256],
        }
    }
}

impl Statistics {
    /// Records one successfully parsed class.
    pub(crate) fn record_class(&mut self) {
        self.classes += 1;
    }

    /// Records a decoded method body. Methods whose instruction sequence is
    /// empty (abstract/native, or an empty code array) do not count.
    pub(crate) fn record_method(&mut self, instructions: &[Instruction]) {
        if instructions.is_empty() {
            return;
        }
        self.methods += 1;
        self.merge(&tally(instructions));
    }

    /// Records a single classified instruction.
    pub(crate) fn record_instruction(&mut self, opcode: u8, category: Category) {
        self.instructions += 1;
        self.histogram[opcode as usize] += 1;
        match category {
            Category::Invocation => self.invocations += 1,
            Category::ConditionalBranch => self.branches += 1,
            Category::Other => {}
        }
    }

    /// Element-wise addition of another accumulator into this one.
    pub(crate) fn merge(&mut self, other: &Statistics) {
        self.classes += other.classes;
        self.methods += other.methods;
        self.instructions += other.instructions;
        self.invocations += other.invocations;
        self.branches += other.branches;
        for (slot, count) in self.histogram.iter_mut().zip(other.histogram.iter()) {
            *slot += count;
        }
    }
}

/// Classifies and counts a decoded instruction slice in parallel partitions.
///
/// Decoding stays sequential; this reduction is the only parallel step, and
/// the merge law above guarantees the result is independent of partitioning
/// and worker count.
fn tally(instructions: &[Instruction]) -> Statistics {
    instructions
        .par_iter()
        .fold(Statistics::default, |mut partial, instruction| {
            partial.record_instruction(instruction.opcode, classify(instruction.opcode));
            partial
        })
        .reduce(Statistics::default, |mut left, right| {
            left.merge(&right);
            left
        })
}
