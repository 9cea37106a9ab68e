//! Deterministic random number generation for synthetic datasets.
//!
//! RULE: the generator never touches a platform RNG. Every stream is
//! derived from one master seed, so a seed fully determines the table.
//!
//! Each concern gets its own stream, seeded from
//! (master_seed XOR stream_index * golden ratio). Changing how amounts are
//! drawn never shifts the purchase schedule, and vice versa.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Stable stream assignments.
/// NEVER reorder — only append. Reordering changes every generated table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Stream {
    Schedule = 0,
    Site = 1,
    Amount = 2,
    Dirt = 3,
}

pub struct SeededRng {
    inner: Pcg64Mcg,
}

impl SeededRng {
    pub fn new(master_seed: u64, stream: Stream) -> Self {
        let derived_seed = master_seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n). Returns 0 when n is 0.
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Sample from a simplified Pareto distribution.
    /// x_min: minimum value, alpha: shape (higher = less skewed).
    pub fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }

    /// Integer count with the given mean: floor(mean) certain, the fraction
    /// decided by a coin flip.
    pub fn count_with_mean(&mut self, mean: f64) -> u64 {
        let mean = mean.max(0.0);
        let whole = mean.floor();
        whole as u64 + u64::from(self.chance(mean - whole))
    }
}
