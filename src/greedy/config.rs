//! Greedy solver configuration.

use crate::error::{PlanError, Result};

/// Configuration for the staged greedy constructor.
///
/// # Examples
///
/// ```
/// use u_gateplan::greedy::GreedyConfig;
///
/// let config = GreedyConfig::default()
///     .with_time_limit_ms(5_000)
///     .with_stall_percent_threshold(0.5)
///     .with_seed(42);
/// assert_eq!(config.max_stalled_trials, 1000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GreedyConfig {
    /// Relative improvement, in percent per trial, below which a tier is
    /// considered converged.
    ///
    /// After a new best is adopted the improvement is measured as
    /// `100 · (previous − new) / trials_since_previous / new`. Set to 0.0
    /// to never converge early.
    pub stall_percent_threshold: f64,

    /// Wall-clock limit for the whole run, shared across tiers.
    ///
    /// Checked before every trial, so a run overshoots by at most one trial.
    pub time_limit_ms: u64,

    /// Consecutive non-improving trials after which a tier ends.
    pub max_stalled_trials: usize,

    /// Keep scanning higher SF tiers after the first covering tier ends.
    ///
    /// When `false` only the lowest covering tier is searched.
    pub explore_all_tiers: bool,

    /// Run the reallocation post-pass on the best allocation.
    pub reallocate: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            stall_percent_threshold: 1.0,
            time_limit_ms: 60_000,
            max_stalled_trials: 1000,
            explore_all_tiers: true,
            reallocate: true,
            seed: None,
        }
    }
}

impl GreedyConfig {
    /// Sets the convergence threshold in percent.
    pub fn with_stall_percent_threshold(mut self, percent: f64) -> Self {
        self.stall_percent_threshold = percent.max(0.0);
        self
    }

    /// Sets the wall-clock limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Sets the non-improvement cap per tier.
    pub fn with_max_stalled_trials(mut self, n: usize) -> Self {
        self.max_stalled_trials = n;
        self
    }

    /// Enables or disables scanning tiers above the first covering one.
    pub fn with_explore_all_tiers(mut self, explore: bool) -> Self {
        self.explore_all_tiers = explore;
        self
    }

    /// Enables or disables the reallocation post-pass.
    pub fn with_reallocate(mut self, reallocate: bool) -> Self {
        self.reallocate = reallocate;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.time_limit_ms == 0 {
            return Err(PlanError::InvalidConfig("time_limit_ms must be positive".into()));
        }
        if self.max_stalled_trials == 0 {
            return Err(PlanError::InvalidConfig(
                "max_stalled_trials must be at least 1".into(),
            ));
        }
        if !self.stall_percent_threshold.is_finite() {
            return Err(PlanError::InvalidConfig(
                "stall_percent_threshold must be finite".into(),
            ));
        }
        Ok(())
    }
}
