//! Deterministic RNG utilities for reproducible tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strider_core::types::JointVector;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Joint vector with entries drawn uniformly from `[-scale, scale)`.
pub fn random_joint_vector(seed: u64, scale: f64) -> JointVector {
    let mut rng = seeded_rng(seed);
    JointVector::from_fn(|_, _| rng.gen_range(-scale..scale))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
