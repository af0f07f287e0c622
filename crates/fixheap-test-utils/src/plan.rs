//! Deterministic allocate/release workloads.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One step of a workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Allocate this many bytes.
    Allocate(usize),
    /// Release the live allocation at this index (modulo the live count).
    Release(usize),
}

/// Parameters for a seeded workload.
#[derive(Clone, Copy, Debug)]
pub struct ChurnPlan {
    /// RNG seed; equal seeds give equal plans.
    pub seed: u64,
    /// Number of operations.
    pub len: usize,
    /// Allocation sizes are drawn from `1..=max_size`.
    pub max_size: usize,
    /// Percentage of operations that are allocations.
    pub allocate_percent: u64,
}

impl ChurnPlan {
    pub fn new(seed: u64, len: usize, max_size: usize) -> Self {
        Self {
            seed,
            len,
            max_size,
            allocate_percent: 60,
        }
    }

    /// Generate the operations.
    pub fn ops(&self) -> Vec<Op> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let max_size = self.max_size.max(1) as u64;
        (0..self.len)
            .map(|_| {
                if rng.next_u64() % 100 < self.allocate_percent {
                    Op::Allocate((rng.next_u64() % max_size) as usize + 1)
                } else {
                    Op::Release(rng.next_u64() as usize)
                }
            })
            .collect()
    }
}
