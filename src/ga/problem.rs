//! Gateway allocation as a GA problem.
//!
//! One gene per end-device: the [`Link`] it uses. Genes are always drawn
//! from the device's valid domain (a candidate gateway and an SF between the
//! gateway's minimum and the device's maximum), so only capacity can make a
//! chromosome infeasible.

use rand::Rng;

use super::runner::GaResult;
use super::types::GaProblem;
use crate::model::{Allocation, Evaluation, Link, Objective};
use crate::report::PlanReport;

/// Adapts an [`Objective`] to [`GaProblem`] through a fitness function.
///
/// The fitness function turns an [`Evaluation`] into a value to maximise;
/// see [`fitness`](super::fitness) for the provided ones.
///
/// # Examples
///
/// ```
/// use u_gateplan::ga::{fitness, AllocationProblem, GaConfig, GaRunner};
/// use u_gateplan::model::{Objective, Topology, TuningParameters};
///
/// let topo = Topology::new(vec![vec![7, 9], vec![8, 7]], vec![3200, 3200]).unwrap();
/// let objective = Objective::new(&topo, TuningParameters::default());
/// let problem = AllocationProblem::new(objective, fitness::inverse_cost);
///
/// let config = GaConfig::fast().with_seed(42);
/// let result = GaRunner::run(&problem, &config).unwrap();
/// assert!(problem.report(&result).feasible);
/// ```
pub struct AllocationProblem<'t, F> {
    objective: Objective<'t>,
    fitness_fn: F,
}

impl<'t, F> AllocationProblem<'t, F>
where
    F: Fn(&Evaluation) -> f64 + Send + Sync,
{
    /// Creates the adapter.
    pub fn new(objective: Objective<'t>, fitness_fn: F) -> Self {
        Self {
            objective,
            fitness_fn,
        }
    }

    /// The wrapped objective.
    pub fn objective(&self) -> &Objective<'t> {
        &self.objective
    }

    /// Scores a chromosome.
    pub fn evaluate(&self, genes: &[Link]) -> Evaluation {
        self.objective.evaluate(genes)
    }

    /// Warm-start genes from a complete allocation, e.g. a greedy result.
    ///
    /// Returns `None` if a device is unconnected or the allocation belongs
    /// to a topology of another size.
    pub fn genes_from(&self, allocation: &Allocation<'_>) -> Option<Vec<Link>> {
        allocation
            .to_links()
            .filter(|links| links.len() == self.gene_count())
    }

    /// Rebuilds an allocation from genes without capacity checks.
    ///
    /// Genes past the device count are ignored.
    pub fn to_allocation(&self, genes: &[Link]) -> Allocation<'t> {
        let mut allocation = Allocation::new(self.objective.topology());
        for (device, link) in genes
            .iter()
            .enumerate()
            .take(self.objective.topology().device_count())
        {
            allocation.connect(device, link.gateway, Some(link.sf));
        }
        allocation
    }

    /// Result record for the best chromosome of a run.
    pub fn report(&self, result: &GaResult<Link>) -> PlanReport {
        PlanReport::new(
            &self.evaluate(&result.best.genes),
            result.elapsed_ms,
            result.termination,
        )
    }
}

impl<F> GaProblem for AllocationProblem<'_, F>
where
    F: Fn(&Evaluation) -> f64 + Send + Sync,
{
    type Gene = Link;

    fn gene_count(&self) -> usize {
        self.objective.topology().device_count()
    }

    fn random_gene<R: Rng>(&self, locus: usize, rng: &mut R) -> Link {
        self.objective.topology().random_link(locus, rng)
    }

    fn fitness(&self, genes: &[Link]) -> f64 {
        (self.fitness_fn)(&self.objective.evaluate(genes))
    }

    fn on_generation(&self, generation: usize, best_fitness: f64) {
        tracing::trace!("GA: generation {} best fitness {}", generation, best_fitness);
    }
}
