//! Selection strategies for the GA.
//!
//! Selection draws the chromosomes that make up the next generation.
//! Fitness is **maximised**: higher fitness means a higher chance of being
//! drawn.
//!
//! # References
//!
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"
//! - Baker (1985), "Adaptive Selection Methods for Genetic Algorithms"

use rand::Rng;

use super::types::Chromosome;

/// Selection strategy.
///
/// # Examples
///
/// ```
/// use u_gateplan::ga::Selection;
///
/// // Fitness-proportionate, the default.
/// assert_eq!(Selection::default(), Selection::Roulette);
///
/// // Tournament of 3 for stronger pressure.
/// let sel = Selection::Tournament(3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Pick `k` chromosomes uniformly and keep the fittest.
    ///
    /// # Complexity
    /// O(k) per selection
    Tournament(usize),

    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// Falls back to uniform selection when every fitness is zero, which
    /// happens while no feasible chromosome exists.
    ///
    /// # Complexity
    /// O(n) per selection
    #[default]
    Roulette,

    /// Linear ranking: the fittest gets weight `n`, the least fit weight 1.
    ///
    /// # Complexity
    /// O(n log n) per selection
    Rank,
}

impl Selection {
    /// Selects an index from the population.
    ///
    /// # Panics
    /// Panics if `population` is empty.
    pub fn select<G, R: Rng>(&self, population: &[Chromosome<G>], rng: &mut R) -> usize {
        assert!(
            !population.is_empty(),
            "cannot select from empty population"
        );

        match self {
            Selection::Tournament(k) => tournament(population, *k, rng),
            Selection::Roulette => roulette(population, rng),
            Selection::Rank => rank(population, rng),
        }
    }
}

fn tournament<G, R: Rng>(population: &[Chromosome<G>], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if population[idx].fitness > population[best_idx].fitness {
            best_idx = idx;
        }
    }
    best_idx
}

fn roulette<G, R: Rng>(population: &[Chromosome<G>], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    let total: f64 = population.iter().map(|c| c.fitness.max(0.0)).sum();
    if !(total > 0.0 && total.is_finite()) {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, c) in population.iter().enumerate() {
        cumulative += c.fitness.max(0.0);
        if cumulative > threshold {
            return i;
        }
    }

    n - 1 // floating-point fallback
}

fn rank<G, R: Rng>(population: &[Chromosome<G>], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    // Best first.
    let mut indexed: Vec<usize> = (0..n).collect();
    indexed.sort_by(|&a, &b| population[b].fitness.total_cmp(&population[a].fitness));

    let total = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (rank, &idx) in indexed.iter().enumerate() {
        cumulative += (n - rank) as f64;
        if cumulative > threshold {
            return idx;
        }
    }

    indexed[n - 1]
}
