//! Greedy solver execution.
//!
//! # Algorithm
//!
//! 1. Find the lowest SF tier at which every device reaches some gateway
//! 2. Connect essential devices (single candidate gateway) once
//! 3. For each tier from the covering one up to SF 12, run randomized
//!    trials: shuffle the gateway lists, start from the essential snapshot
//!    and place every other device on the first gateway that takes it
//! 4. Keep the cheapest feasible trial; end a tier on convergence or after
//!    too many non-improving trials
//! 5. Optionally run the reallocation post-pass on the winner

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;

use super::config::GreedyConfig;
use super::reallocation::reallocate;
use crate::error::{PlanError, Result};
use crate::model::{Allocation, Evaluation, Objective, Topology, Violation, MAX_SF, MIN_SF};
use crate::random::{create_rng, seed_or_random, shuffle};
use crate::report::{PlanReport, TerminationReason};

/// Result of a greedy run.
#[derive(Debug, Clone)]
pub struct GreedyResult<'t> {
    /// Best feasible allocation, `None` if no trial ever completed feasibly.
    pub best: Option<Allocation<'t>>,

    /// Evaluation of `best`.
    ///
    /// When `best` is `None` this is infeasible and carries the violation of
    /// the last failed trial, or no violation if no trial ran.
    pub evaluation: Evaluation,

    /// Lowest SF tier at which every device is covered.
    pub coverage_tier: u8,

    /// Number of tiers searched.
    pub tiers_explored: usize,

    /// Total trials across all tiers.
    pub trials: usize,

    /// Wall-clock run time.
    pub elapsed_ms: u64,

    /// Why the run stopped.
    pub termination: TerminationReason,
}

impl GreedyResult<'_> {
    /// True if a feasible allocation was found.
    pub fn is_feasible(&self) -> bool {
        self.best.is_some()
    }

    /// Result record for callers.
    pub fn report(&self) -> PlanReport {
        PlanReport::new(&self.evaluation, self.elapsed_ms, self.termination)
    }
}

/// Staged greedy constructor with randomized restarts.
///
/// # Usage
///
/// ```
/// use u_gateplan::greedy::{GreedyConfig, GreedyRunner};
/// use u_gateplan::model::{Objective, Topology, TuningParameters};
///
/// let topo = Topology::new(vec![vec![7, 9], vec![8, 7]], vec![3200, 3200]).unwrap();
/// let objective = Objective::new(&topo, TuningParameters::default());
/// let config = GreedyConfig::default().with_seed(42).with_time_limit_ms(1_000);
///
/// let result = GreedyRunner::run(&objective, &config).unwrap();
/// assert!(result.is_feasible());
/// assert_eq!(result.coverage_tier, 7);
/// ```
pub struct GreedyRunner;

impl GreedyRunner {
    /// Runs the greedy solver.
    ///
    /// # Errors
    /// - [`PlanError::InvalidConfig`] if `config` fails validation.
    /// - [`PlanError::NoCoverage`] if no tier covers every device.
    /// - [`PlanError::EssentialOverload`] if an essential device does not
    ///   fit on its only gateway.
    pub fn run<'t>(objective: &Objective<'t>, config: &GreedyConfig) -> Result<GreedyResult<'t>> {
        Self::run_with_cancel(objective, config, None)
    }

    /// Runs the greedy solver with an optional cancellation token.
    ///
    /// The flag is polled before every trial.
    pub fn run_with_cancel<'t>(
        objective: &Objective<'t>,
        config: &GreedyConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GreedyResult<'t>> {
        let mut rng = create_rng(seed_or_random(config.seed));
        Self::run_with_rng(objective, config, &mut rng, cancel)
    }

    /// Runs the greedy solver drawing from a caller-supplied generator.
    ///
    /// `config.seed` is ignored.
    #[tracing::instrument(level = "debug", name = "Greedy", skip_all)]
    pub fn run_with_rng<'t, R: Rng>(
        objective: &Objective<'t>,
        config: &GreedyConfig,
        rng: &mut R,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GreedyResult<'t>> {
        config.validate()?;
        let start = Instant::now();
        let topo = objective.topology();

        let coverage_tier = coverage_tier(topo).ok_or(PlanError::NoCoverage)?;
        tracing::debug!("Greedy: every device covered from SF {}", coverage_tier);

        let plan = EssentialPlan::build(topo)?;
        tracing::debug!(
            "Greedy: {} essential devices on {} essential gateways (of {})",
            plan.devices.len(),
            plan.gateways.len(),
            topo.gateway_count()
        );

        let mut essential_gateways = plan.gateways.clone();
        let mut other_gateways: Vec<usize> = (0..topo.gateway_count())
            .filter(|g| !plan.gateways.contains(g))
            .collect();
        let order = placement_order(topo, &plan);

        let mut best: Option<Allocation<'t>> = None;
        let mut best_eval = Evaluation::unscored();
        let mut last_violation: Option<Violation> = None;
        let mut trials = 0usize;
        let mut since_best = 0usize;
        let mut tiers_explored = 0usize;
        let mut termination = TerminationReason::Exhausted;

        'tiers: for tier in coverage_tier..=MAX_SF {
            tiers_explored += 1;
            let mut stalled = 0usize;

            let tier_end = loop {
                if cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                    termination = TerminationReason::Cancelled;
                    break 'tiers;
                }
                if elapsed_ms(start) >= config.time_limit_ms {
                    termination = TerminationReason::Timeout;
                    break 'tiers;
                }
                if stalled >= config.max_stalled_trials {
                    break TerminationReason::StallLimit;
                }

                trials += 1;
                since_best += 1;
                shuffle(&mut essential_gateways, rng);
                shuffle(&mut other_gateways, rng);

                let mut trial = plan.snapshot.clone();
                let gateways: Vec<usize> = essential_gateways
                    .iter()
                    .chain(&other_gateways)
                    .copied()
                    .collect();
                if let Err(device) = place_all(&mut trial, &order, &gateways, tier) {
                    tracing::trace!("Greedy: trial {} could not place device {}", trials, device);
                    last_violation = Some(Violation::Unassigned { device });
                    stalled += 1;
                    continue;
                }

                let eval = objective.evaluate_allocation(&trial);
                if !(eval.feasible && eval.cost < best_eval.cost) {
                    if !eval.feasible {
                        last_violation = eval.violation;
                    }
                    stalled += 1;
                    continue;
                }

                let improvement = best
                    .is_some()
                    .then(|| 100.0 * (best_eval.cost - eval.cost) / since_best as f64 / eval.cost);
                tracing::debug!(
                    "Greedy: new best {} at trial {} (SF tier {})",
                    eval.cost,
                    trials,
                    tier
                );
                best = Some(trial);
                best_eval = eval;
                stalled = 0;
                since_best = 0;

                if improvement.is_some_and(|p| p < config.stall_percent_threshold) {
                    break TerminationReason::Converged;
                }
            };

            tracing::debug!("Greedy: SF tier {} ended ({})", tier, tier_end);
            if !config.explore_all_tiers {
                termination = tier_end;
                break;
            }
        }

        if best.is_none() {
            best_eval.violation = last_violation;
        }

        if config.reallocate {
            if let Some(current) = &best {
                if let Some((improved, eval)) = reallocate(objective, current, best_eval.cost) {
                    best = Some(improved);
                    best_eval = eval;
                }
            }
        }

        let elapsed_ms = elapsed_ms(start);
        tracing::info!(
            "Greedy: finished after {} trials in {} ms ({}), cost {}",
            trials,
            elapsed_ms,
            termination,
            best_eval.cost
        );

        Ok(GreedyResult {
            best,
            evaluation: best_eval,
            coverage_tier,
            tiers_explored,
            trials,
            elapsed_ms,
            termination,
        })
    }
}

/// Devices with a single candidate gateway, already connected.
struct EssentialPlan<'t> {
    devices: Vec<usize>,
    /// Distinct gateways of essential devices, ascending.
    gateways: Vec<usize>,
    snapshot: Allocation<'t>,
}

impl<'t> EssentialPlan<'t> {
    fn build(topo: &'t Topology) -> Result<Self> {
        let mut snapshot = Allocation::new(topo);
        let mut devices = Vec::new();
        let mut gateways = Vec::new();

        for device in 0..topo.device_count() {
            let &[gateway] = topo.candidate_gateways(device) else {
                continue;
            };
            if !snapshot.check_and_connect(device, gateway, None) {
                return Err(PlanError::EssentialOverload { device, gateway });
            }
            devices.push(device);
            gateways.push(gateway);
        }
        gateways.sort_unstable();
        gateways.dedup();

        Ok(Self {
            devices,
            gateways,
            snapshot,
        })
    }

    fn is_essential(&self, device: usize) -> bool {
        self.devices.binary_search(&device).is_ok()
    }
}

/// Lowest tier at which every device has a gateway within reach.
///
/// Unions the per-gateway clusters of each tier; clusters are cumulative,
/// so the first fully covered tier is the answer.
fn coverage_tier(topo: &Topology) -> Option<u8> {
    (MIN_SF..=MAX_SF).find(|&tier| {
        let mut covered = vec![false; topo.device_count()];
        for gateway in 0..topo.gateway_count() {
            for device in topo.reachable_devices(gateway, tier) {
                covered[device] = true;
            }
        }
        let count = covered.iter().filter(|&&c| c).count();
        tracing::debug!(
            "Greedy: SF {} covers {} of {} devices",
            tier,
            count,
            topo.device_count()
        );
        count == topo.device_count()
    })
}

/// Non-essential devices, fewest candidate gateways first.
fn placement_order(topo: &Topology, plan: &EssentialPlan<'_>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..topo.device_count())
        .filter(|&e| !plan.is_essential(e))
        .collect();
    order.sort_by_key(|&e| topo.candidate_gateways(e).len());
    order
}

/// Places each device on the first gateway in `gateways` that hears it at
/// `tier` or below and has room. Returns the first device that fits nowhere.
fn place_all(
    trial: &mut Allocation<'_>,
    order: &[usize],
    gateways: &[usize],
    tier: u8,
) -> std::result::Result<(), usize> {
    let topo = trial.topology();
    for &device in order {
        let placed = gateways
            .iter()
            .any(|&g| topo.min_sf(device, g) <= tier && trial.check_and_connect(device, g, None));
        if !placed {
            return Err(device);
        }
    }
    Ok(())
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

// ============================================================================
// Tests
// ============================================================================
