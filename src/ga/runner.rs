//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates one run: initialization → evaluation, then per
//! generation selection → sort → crossover → mutation → evaluation, until a
//! termination condition holds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;

use super::config::GaConfig;
use super::operators::{mutate_genes, pair_mut};
use super::types::{Chromosome, GaProblem};
use crate::error::{PlanError, Result};
use crate::random::{create_rng, seed_or_random};
use crate::report::TerminationReason;

/// Result of a GA optimization run.
#[derive(Debug, Clone)]
pub struct GaResult<G> {
    /// The best chromosome found during the entire run.
    pub best: Chromosome<G>,

    /// Best fitness value (same as `best.fitness`).
    pub best_fitness: f64,

    /// Number of generations executed.
    pub generations: usize,

    /// Wall-clock run time.
    pub elapsed_ms: u64,

    /// Why the run stopped.
    pub termination: TerminationReason,

    /// Best fitness after initialization and after each generation.
    ///
    /// Non-decreasing; has `generations + 1` entries.
    pub fitness_history: Vec<f64>,
}

/// Executes the GA evolutionary loop.
///
/// # Usage
///
/// ```
/// use rand::Rng;
/// use u_gateplan::ga::{GaConfig, GaProblem, GaRunner};
///
/// struct OneMax;
///
/// impl GaProblem for OneMax {
///     type Gene = bool;
///     fn gene_count(&self) -> usize { 16 }
///     fn random_gene<R: Rng>(&self, _locus: usize, rng: &mut R) -> bool { rng.random_bool(0.5) }
///     fn fitness(&self, genes: &[bool]) -> f64 { genes.iter().filter(|&&b| b).count() as f64 }
/// }
///
/// let config = GaConfig::default().with_population_size(30).with_seed(42);
/// let result = GaRunner::run(&OneMax, &config).unwrap();
/// assert!(result.best_fitness >= 10.0);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA from a random population.
    ///
    /// # Errors
    /// [`PlanError::InvalidConfig`] if `config` fails validation.
    pub fn run<P: GaProblem>(problem: &P, config: &GaConfig) -> Result<GaResult<P::Gene>> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs the GA with an optional cancellation token.
    ///
    /// If the flag is set, the GA stops at the end of the current
    /// generation and returns the best chromosome found so far.
    pub fn run_with_cancel<P: GaProblem>(
        problem: &P,
        config: &GaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GaResult<P::Gene>> {
        let mut rng = create_rng(seed_or_random(config.seed));
        Self::run_with_rng(problem, config, &mut rng, Vec::new(), cancel)
    }

    /// Runs the GA with part of the initial population supplied.
    ///
    /// At most `population_size` of the `initial` gene vectors are used;
    /// the rest of the population is random.
    ///
    /// # Errors
    /// [`PlanError::DimensionMismatch`] if a vector's length differs from
    /// [`GaProblem::gene_count`].
    pub fn run_with_population<P: GaProblem>(
        problem: &P,
        config: &GaConfig,
        initial: Vec<Vec<P::Gene>>,
    ) -> Result<GaResult<P::Gene>> {
        let mut rng = create_rng(seed_or_random(config.seed));
        Self::run_with_rng(problem, config, &mut rng, initial, None)
    }

    /// Runs the GA drawing from a caller-supplied generator.
    ///
    /// `config.seed` is ignored.
    #[tracing::instrument(level = "debug", name = "GA", skip_all)]
    pub fn run_with_rng<P: GaProblem, R: Rng>(
        problem: &P,
        config: &GaConfig,
        rng: &mut R,
        initial: Vec<Vec<P::Gene>>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GaResult<P::Gene>> {
        config.validate()?;
        let start = Instant::now();
        let n = config.population_size;
        let gene_count = problem.gene_count();

        // 1. Initialize population
        let mut population: Vec<Chromosome<P::Gene>> = Vec::with_capacity(n);
        for genes in initial.into_iter().take(n) {
            if genes.len() != gene_count {
                return Err(PlanError::DimensionMismatch {
                    what: "initial chromosome",
                    expected: gene_count,
                    found: genes.len(),
                });
            }
            population.push(Chromosome::new(genes));
        }
        let seeded = population.len();
        while population.len() < n {
            population.push(Chromosome::new(problem.random_genes(rng)));
        }
        tracing::debug!("GA: population of {} ({} seeded)", n, seeded);

        // 2. Evaluate initial population
        evaluate_population(problem, &mut population, config.parallel);

        // 3. Track best
        let mut best = find_best(&population).clone();
        let mut fitness_history = Vec::with_capacity(config.max_generations + 1);
        fitness_history.push(best.fitness);

        let elite = config.elite_count();
        let stagnation_limit = config.stagnation_limit();
        let mut stagnated = 0usize;
        let mut generation = 0usize;

        // 4. Evolutionary loop
        let termination = loop {
            generation += 1;

            // Selection
            let selected: Vec<Chromosome<P::Gene>> = (0..n)
                .map(|_| population[config.selection.select(&population, rng)].clone())
                .collect();
            population = selected;

            // Sort by fitness (descending = best first)
            population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

            // Crossover (elites are left alone)
            for i in elite..n {
                if rng.random::<f64>() < config.crossover_rate {
                    let j = rng.random_range(elite..n);
                    if i != j {
                        let (a, b) = pair_mut(&mut population, i, j);
                        config
                            .crossover_method
                            .exchange(&mut a.genes, &mut b.genes, rng);
                    }
                }
            }

            // Mutation
            for chromosome in &mut population[elite..] {
                if rng.random::<f64>() < config.mutation_rate {
                    mutate_genes(problem, &mut chromosome.genes, rng);
                }
            }

            // Evaluate non-elites; elites keep their fitness
            evaluate_population(problem, &mut population[elite..], config.parallel);

            // Update best
            let gen_best = find_best(&population);
            if gen_best.fitness > best.fitness {
                best = gen_best.clone();
                tracing::debug!("GA: new best {} at generation {}", best.fitness, generation);
            } else {
                stagnated += 1;
            }

            fitness_history.push(best.fitness);
            problem.on_generation(generation, best.fitness);

            // Termination
            if cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                break TerminationReason::Cancelled;
            }
            if elapsed_ms(start) >= config.time_limit_ms {
                break TerminationReason::Timeout;
            }
            if stagnated > stagnation_limit {
                break TerminationReason::Stagnated;
            }
            if generation >= config.max_generations {
                break TerminationReason::MaxGenerations;
            }
        };

        let elapsed_ms = elapsed_ms(start);
        tracing::info!(
            "GA: finished after {} generations in {} ms ({}), best fitness {}",
            generation,
            elapsed_ms,
            termination,
            best.fitness
        );

        Ok(GaResult {
            best_fitness: best.fitness,
            best,
            generations: generation,
            elapsed_ms,
            termination,
            fitness_history,
        })
    }
}

/// Evaluate all chromosomes in the slice.
#[cfg(feature = "parallel")]
fn evaluate_population<P: GaProblem>(
    problem: &P,
    population: &mut [Chromosome<P::Gene>],
    parallel: bool,
) {
    use rayon::prelude::*;

    if parallel {
        population.par_iter_mut().for_each(|c| {
            c.fitness = problem.fitness(&c.genes);
        });
    } else {
        evaluate_sequential(problem, population);
    }
}

/// Evaluate all chromosomes in the slice.
#[cfg(not(feature = "parallel"))]
fn evaluate_population<P: GaProblem>(
    problem: &P,
    population: &mut [Chromosome<P::Gene>],
    _parallel: bool,
) {
    evaluate_sequential(problem, population);
}

fn evaluate_sequential<P: GaProblem>(problem: &P, population: &mut [Chromosome<P::Gene>]) {
    for c in population.iter_mut() {
        c.fitness = problem.fitness(&c.genes);
    }
}

/// Find the chromosome with the best (highest) fitness; the first on ties.
fn find_best<G>(population: &[Chromosome<G>]) -> &Chromosome<G> {
    let mut best = &population[0];
    for c in &population[1..] {
        if c.fitness > best.fitness {
            best = c;
        }
    }
    best
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::{CrossoverMethod, Selection};

    // ---- OneMax: maximize the number of true bits ----

    struct OneMax {
        n: usize,
    }

    impl GaProblem for OneMax {
        type Gene = bool;

        fn gene_count(&self) -> usize {
            self.n
        }

        fn random_gene<R: Rng>(&self, _locus: usize, rng: &mut R) -> bool {
            rng.random_bool(0.5)
        }

        fn fitness(&self, genes: &[bool]) -> f64 {
            genes.iter().filter(|&&b| b).count() as f64
        }
    }

    fn base() -> GaConfig {
        GaConfig::default()
            .with_population_size(40)
            .with_max_generations(100)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_onemax_improves() {
        let problem = OneMax { n: 30 };
        let config = base()
            .with_selection(Selection::Tournament(3))
            .with_stagnation_window(1.0)
            .with_mutation_rate(0.3);
        let result = GaRunner::run(&problem, &config).unwrap();
        assert!(
            result.best_fitness >= 24.0,
            "expected >= 24 of 30 bits, got {}",
            result.best_fitness
        );
        assert_eq!(result.best_fitness, problem.fitness(&result.best.genes));
    }

    #[test]
    fn test_fitness_history_is_monotonic() {
        let problem = OneMax { n: 20 };
        for selection in [Selection::Roulette, Selection::Tournament(3), Selection::Rank] {
            for method in [
                CrossoverMethod::SinglePoint,
                CrossoverMethod::DoublePoint,
                CrossoverMethod::Uniform,
            ] {
                let config = base()
                    .with_selection(selection)
                    .with_crossover_method(method)
                    .with_elitism_rate(0.0);
                let result = GaRunner::run(&problem, &config).unwrap();
                assert_eq!(result.fitness_history.len(), result.generations + 1);
                for w in result.fitness_history.windows(2) {
                    assert!(w[1] >= w[0], "{selection:?}/{method:?}: {} < {}", w[1], w[0]);
                }
            }
        }
    }

    #[test]
    fn test_max_generations_termination() {
        let problem = OneMax { n: 10 };
        let config = base().with_max_generations(15).with_stagnation_window(1.0);
        let result = GaRunner::run(&problem, &config).unwrap();
        assert_eq!(result.termination, TerminationReason::MaxGenerations);
        assert_eq!(result.generations, 15);
        assert_eq!(result.fitness_history.len(), 16);
    }

    #[test]
    fn test_stagnation_termination() {
        // Constant fitness never improves.
        struct Flat;
        impl GaProblem for Flat {
            type Gene = u8;
            fn gene_count(&self) -> usize {
                4
            }
            fn random_gene<R: Rng>(&self, _locus: usize, rng: &mut R) -> u8 {
                rng.random()
            }
            fn fitness(&self, _genes: &[u8]) -> f64 {
                1.0
            }
        }

        let config = base().with_max_generations(100).with_stagnation_window(0.1);
        let result = GaRunner::run(&Flat, &config).unwrap();
        assert_eq!(result.termination, TerminationReason::Stagnated);
        // Stops once more than floor(0.1 · 100) = 10 generations stagnate.
        assert_eq!(result.generations, 11);
    }

    #[test]
    fn test_timeout_termination() {
        struct Slow;
        impl GaProblem for Slow {
            type Gene = u8;
            fn gene_count(&self) -> usize {
                2
            }
            fn random_gene<R: Rng>(&self, _locus: usize, rng: &mut R) -> u8 {
                rng.random()
            }
            fn fitness(&self, genes: &[u8]) -> f64 {
                std::thread::sleep(std::time::Duration::from_millis(1));
                f64::from(genes[0])
            }
        }

        let config = base()
            .with_population_size(10)
            .with_max_generations(1_000_000)
            .with_stagnation_window(1.0)
            .with_time_limit_ms(30);
        let result = GaRunner::run(&Slow, &config).unwrap();
        assert_eq!(result.termination, TerminationReason::Timeout);
        assert!(result.generations < 1_000_000);
    }

    #[test]
    fn test_cancellation() {
        let problem = OneMax { n: 10 };
        let cancel = Arc::new(AtomicBool::new(true));
        let result = GaRunner::run_with_cancel(&problem, &base(), Some(cancel)).unwrap();
        assert_eq!(result.termination, TerminationReason::Cancelled);
        assert_eq!(result.generations, 1);
    }

    #[test]
    fn test_warm_start_keeps_seeded_best() {
        let problem = OneMax { n: 25 };
        let config = base().with_max_generations(5);
        let result =
            GaRunner::run_with_population(&problem, &config, vec![vec![true; 25]]).unwrap();
        assert_eq!(result.fitness_history[0], 25.0);
        assert_eq!(result.best_fitness, 25.0);
    }

    #[test]
    fn test_warm_start_rejects_wrong_length() {
        let problem = OneMax { n: 25 };
        let err = GaRunner::run_with_population(&problem, &base(), vec![vec![true; 3]]).unwrap_err();
        assert_eq!(
            err,
            PlanError::DimensionMismatch {
                what: "initial chromosome",
                expected: 25,
                found: 3
            }
        );
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let problem = OneMax { n: 20 };
        let a = GaRunner::run(&problem, &base()).unwrap();
        let b = GaRunner::run(&problem, &base()).unwrap();
        assert_eq!(a.best.genes, b.best.genes);
        assert_eq!(a.fitness_history, b.fitness_history);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let problem = OneMax { n: 5 };
        let config = base().with_population_size(1);
        assert!(matches!(
            GaRunner::run(&problem, &config),
            Err(PlanError::InvalidConfig(_))
        ));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let problem = OneMax { n: 20 };
        let seq = GaRunner::run(&problem, &base()).unwrap();
        let par = GaRunner::run(&problem, &base().with_parallel(true)).unwrap();
        assert_eq!(seq.fitness_history, par.fitness_history);
    }
}
