//! Gene-exchange crossover and per-locus mutation.
//!
//! Crossover here works in place on two equal-length gene vectors: the
//! selected loci are swapped between the parents, so both become children.
//! Genes are opaque, which keeps the operators valid for any locus-wise
//! encoding (every gene stays a legal value for its locus).
//!
//! # Crossover Operators
//!
//! - [`single_point_exchange`]: swap the prefix `[0, pivot)`
//! - [`double_point_exchange`]: swap the segment `[p1, p2)`
//! - [`uniform_exchange`]: swap each locus with probability 0.5
//!
//! # Mutation
//!
//! - [`mutate_genes`]: re-draw each locus with probability `1 / n`

use rand::Rng;

use super::types::GaProblem;

/// Crossover method used by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrossoverMethod {
    /// One pivot; the prefix is exchanged.
    #[default]
    SinglePoint,
    /// Two pivots; the segment between them is exchanged.
    DoublePoint,
    /// Every locus is exchanged independently with probability 0.5.
    Uniform,
}

impl CrossoverMethod {
    /// Applies the method to two gene vectors in place.
    ///
    /// # Panics
    /// Panics if the vectors have different lengths.
    pub fn exchange<G, R: Rng>(&self, a: &mut [G], b: &mut [G], rng: &mut R) {
        match self {
            CrossoverMethod::SinglePoint => single_point_exchange(a, b, rng),
            CrossoverMethod::DoublePoint => double_point_exchange(a, b, rng),
            CrossoverMethod::Uniform => uniform_exchange(a, b, rng),
        }
    }
}

/// Swaps the loci `[0, pivot)` with `pivot` uniform in `[0, n)`.
///
/// # Panics
/// Panics if the vectors have different lengths.
pub fn single_point_exchange<G, R: Rng>(a: &mut [G], b: &mut [G], rng: &mut R) {
    assert_eq!(a.len(), b.len(), "parents must have equal length");
    if a.is_empty() {
        return;
    }
    let pivot = rng.random_range(0..a.len());
    a[..pivot].swap_with_slice(&mut b[..pivot]);
}

/// Swaps the loci `[p1, p2)` for two uniform pivots `p1 <= p2`.
///
/// # Panics
/// Panics if the vectors have different lengths.
pub fn double_point_exchange<G, R: Rng>(a: &mut [G], b: &mut [G], rng: &mut R) {
    assert_eq!(a.len(), b.len(), "parents must have equal length");
    if a.is_empty() {
        return;
    }
    let n = a.len();
    let mut p1 = rng.random_range(0..n);
    let mut p2 = rng.random_range(0..n);
    if p1 > p2 {
        std::mem::swap(&mut p1, &mut p2);
    }
    a[p1..p2].swap_with_slice(&mut b[p1..p2]);
}

/// Swaps each locus independently with probability 0.5.
///
/// # Panics
/// Panics if the vectors have different lengths.
pub fn uniform_exchange<G, R: Rng>(a: &mut [G], b: &mut [G], rng: &mut R) {
    assert_eq!(a.len(), b.len(), "parents must have equal length");
    for (x, y) in a.iter_mut().zip(b.iter_mut()) {
        if rng.random_bool(0.5) {
            std::mem::swap(x, y);
        }
    }
}

/// Re-draws each locus with probability `1 / n`.
pub fn mutate_genes<P: GaProblem, R: Rng>(problem: &P, genes: &mut [P::Gene], rng: &mut R) {
    if genes.is_empty() {
        return;
    }
    let p = 1.0 / genes.len() as f64;
    for (locus, gene) in genes.iter_mut().enumerate() {
        if rng.random::<f64>() < p {
            *gene = problem.random_gene(locus, rng);
        }
    }
}

/// Mutable references to two distinct elements.
///
/// # Panics
/// Panics if `i == j` or either index is out of bounds.
pub(crate) fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    assert_ne!(i, j, "pair_mut needs distinct indices");
    if i < j {
        let (left, right) = items.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}
