//! Explicit random streams.
//!
//! Every solver run owns its generator; nothing in the crate touches a
//! process-wide RNG except [`seed_or_random`] when no seed is configured.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Creates a seeded generator.
///
/// The same seed always yields the same stream, which makes seeded solver
/// runs reproducible as long as draws happen on one thread.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Returns `seed` or, if absent, a fresh seed from the thread-local RNG.
pub fn seed_or_random(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random::<u64>)
}

/// Uniformly shuffles a slice in place (Fisher-Yates).
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}
