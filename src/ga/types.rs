//! Core trait and chromosome type for the GA framework.
//!
//! [`GaProblem`] is the contract between the generic engine and a
//! domain-specific encoding: a fixed-length vector of genes, a way to draw
//! a random gene for each locus, and a fitness to **maximise**.

use rand::Rng;

/// Defines a GA optimization problem over fixed-length gene vectors.
///
/// # Thread Safety
///
/// `GaProblem` must be `Send + Sync` because the runner may evaluate
/// chromosomes in parallel when the `parallel` feature is enabled.
///
/// # Implementing
///
/// ```
/// use rand::Rng;
/// use u_gateplan::ga::GaProblem;
///
/// /// Maximise the number of `true` bits.
/// struct OneMax(usize);
///
/// impl GaProblem for OneMax {
///     type Gene = bool;
///     fn gene_count(&self) -> usize { self.0 }
///     fn random_gene<R: Rng>(&self, _locus: usize, rng: &mut R) -> bool { rng.random_bool(0.5) }
///     fn fitness(&self, genes: &[bool]) -> f64 { genes.iter().filter(|&&b| b).count() as f64 }
/// }
/// ```
pub trait GaProblem: Send + Sync {
    /// Value stored at one locus.
    type Gene: Clone + Send + Sync + std::fmt::Debug;

    /// Number of loci in every chromosome.
    fn gene_count(&self) -> usize;

    /// Draws a random valid gene for `locus`.
    ///
    /// Used both for initialization and for mutation.
    fn random_gene<R: Rng>(&self, locus: usize, rng: &mut R) -> Self::Gene;

    /// Fitness of a gene vector. Must be non-negative; higher is better.
    ///
    /// This is typically the most expensive operation and may be called in
    /// parallel across the population.
    fn fitness(&self, genes: &[Self::Gene]) -> f64;

    /// Draws a complete random gene vector.
    fn random_genes<R: Rng>(&self, rng: &mut R) -> Vec<Self::Gene> {
        (0..self.gene_count())
            .map(|locus| self.random_gene(locus, rng))
            .collect()
    }

    /// Called at the end of each generation with the best fitness so far.
    ///
    /// The default implementation is a no-op.
    fn on_generation(&self, _generation: usize, _best_fitness: f64) {}
}

/// A candidate solution: genes plus their cached fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome<G> {
    /// One gene per locus.
    pub genes: Vec<G>,
    /// Fitness of `genes` as last evaluated.
    pub fitness: f64,
}

impl<G> Chromosome<G> {
    /// Wraps `genes` with a zero (unevaluated) fitness.
    pub fn new(genes: Vec<G>) -> Self {
        Self {
            genes,
            fitness: 0.0,
        }
    }

    /// Number of loci.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// True if the chromosome has no loci.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}
