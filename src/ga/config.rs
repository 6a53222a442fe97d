//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control the evolutionary loop.

use super::operators::CrossoverMethod;
use super::selection::Selection;
use crate::error::{PlanError, Result};

/// Configuration for the Genetic Algorithm.
///
/// # Defaults
///
/// ```
/// use u_gateplan::ga::{CrossoverMethod, GaConfig};
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_generations, 100);
/// assert_eq!(config.crossover_method, CrossoverMethod::SinglePoint);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_gateplan::ga::{CrossoverMethod, GaConfig, Selection};
///
/// let config = GaConfig::default()
///     .with_population_size(200)
///     .with_crossover_method(CrossoverMethod::Uniform)
///     .with_selection(Selection::Tournament(3))
///     .with_elitism_rate(0.05)
///     .with_mutation_rate(0.2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaConfig {
    /// Number of chromosomes in the population.
    pub population_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Probability that a non-elite chromosome is mutated (0.0–1.0).
    ///
    /// A mutated chromosome re-draws each locus with probability `1 / n`.
    pub mutation_rate: f64,

    /// Probability that a non-elite chromosome undergoes crossover (0.0–1.0).
    pub crossover_rate: f64,

    /// Fraction of the population, best first, that skips crossover and
    /// mutation (0.0–1.0).
    pub elitism_rate: f64,

    /// How parents exchange genes.
    pub crossover_method: CrossoverMethod,

    /// Selection strategy for building each generation.
    pub selection: Selection,

    /// Wall-clock time limit in milliseconds.
    ///
    /// Checked at the end of every generation, so a run overshoots by at
    /// most one generation.
    pub time_limit_ms: u64,

    /// Fraction of `max_generations` allowed without a new best (0.0–1.0).
    ///
    /// The run stops as soon as the number of non-improving generations
    /// exceeds `floor(stagnation_window · max_generations)`. The count is
    /// cumulative over the run.
    pub stagnation_window: f64,

    /// Whether to evaluate chromosomes in parallel using rayon.
    ///
    /// Only takes effect when the crate is built with the `parallel`
    /// feature.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 100,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            elitism_rate: 0.1,
            crossover_method: CrossoverMethod::default(),
            selection: Selection::default(),
            time_limit_ms: 360_000,
            stagnation_window: 0.7,
            parallel: false,
            seed: None,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the elitism rate.
    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover method.
    pub fn with_crossover_method(mut self, method: CrossoverMethod) -> Self {
        self.crossover_method = method;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Sets the stagnation window as a fraction of `max_generations`.
    pub fn with_stagnation_window(mut self, fraction: f64) -> Self {
        self.stagnation_window = fraction.clamp(0.0, 1.0);
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Preset for quick runs: small population, short time limit.
    ///
    /// - Population: 50, Generations: 100, Time limit: 10s
    pub fn fast() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            time_limit_ms: 10_000,
            ..Self::default()
        }
    }

    /// Preset balancing solution quality and run time.
    ///
    /// - Population: 100, Generations: 300, Time limit: 30s
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            max_generations: 300,
            time_limit_ms: 30_000,
            ..Self::default()
        }
    }

    /// Preset for quality: large population, many generations.
    ///
    /// - Population: 150, Generations: 500, Time limit: 60s
    pub fn quality() -> Self {
        Self {
            population_size: 150,
            max_generations: 500,
            time_limit_ms: 60_000,
            ..Self::default()
        }
    }

    /// Picks a preset from the number of end-devices.
    ///
    /// - `device_count < 50` → [`fast()`](Self::fast)
    /// - `50 ≤ device_count < 500` → [`balanced()`](Self::balanced)
    /// - `device_count ≥ 500` → [`quality()`](Self::quality)
    pub fn auto_select(device_count: usize) -> Self {
        if device_count < 50 {
            Self::fast()
        } else if device_count < 500 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    /// Number of elite chromosomes per generation.
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elitism_rate) as usize
    }

    /// Largest tolerated number of non-improving generations.
    pub fn stagnation_limit(&self) -> usize {
        (self.stagnation_window * self.max_generations as f64).floor() as usize
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(PlanError::InvalidConfig(msg.into()));
        if self.population_size < 2 {
            return invalid("population_size must be at least 2");
        }
        if self.max_generations == 0 {
            return invalid("max_generations must be at least 1");
        }
        for (name, rate) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
            ("elitism_rate", self.elitism_rate),
            ("stagnation_window", self.stagnation_window),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(PlanError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {rate}"
                )));
            }
        }
        if self.elite_count() >= self.population_size {
            return invalid("elitism_rate too high: elites fill entire population");
        }
        if self.time_limit_ms == 0 {
            return invalid("time_limit_ms must be positive");
        }
        Ok(())
    }
}
