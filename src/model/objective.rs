//! Weighted cost of a complete assignment.
//!
//! `cost = alpha·gateways_used + beta·total_energy + gamma·peak_utilization`
//! for feasible assignments, [`INFEASIBLE_COST`] otherwise.

use super::allocation::{Allocation, Link};
use super::topology::{airtime, Topology, MAX_SF, MIN_SF};
use super::uf::UtilizationFactor;

/// Cost reported for infeasible assignments.
pub const INFEASIBLE_COST: f64 = f64::MAX;

/// Penalty added per violation by [`Objective::penalized_cost`].
pub const VIOLATION_PENALTY: f64 = 1_000_000.0;

/// Weights of the three cost terms.
///
/// # Examples
///
/// ```
/// use u_gateplan::model::TuningParameters;
///
/// let tp = TuningParameters::default();
/// assert_eq!((tp.alpha, tp.beta, tp.gamma), (1.0, 0.1, 7.8));
///
/// let gateways_only = TuningParameters::new(1.0, 0.0, 0.0);
/// assert_eq!(gateways_only.beta, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TuningParameters {
    /// Weight of the number of used gateways.
    pub alpha: f64,
    /// Weight of the total transmit energy.
    pub beta: f64,
    /// Weight of the peak channel utilization.
    pub gamma: f64,
}

impl TuningParameters {
    /// Creates a weight triple.
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }
}

impl Default for TuningParameters {
    fn default() -> Self {
        Self::new(1.0, 0.1, 7.8)
    }
}

/// Why an assignment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Violation {
    /// The device's SF is outside `[min_sf(e, g), max_sf(e)]`.
    SfOutOfRange {
        /// Offending device.
        device: usize,
    },
    /// A gateway channel reached the duty-cycle limit.
    Overloaded {
        /// Saturated gateway.
        gateway: usize,
    },
    /// The device has no link.
    Unassigned {
        /// First unassigned device.
        device: usize,
    },
    /// The device points at a gateway index outside the topology.
    UnknownGateway {
        /// Offending device.
        device: usize,
    },
}

/// Outcome of scoring one assignment.
///
/// For infeasible assignments the metric fields are zero and
/// `cost == INFEASIBLE_COST`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// Weighted cost, or [`INFEASIBLE_COST`].
    pub cost: f64,
    /// Whether every constraint holds.
    pub feasible: bool,
    /// Gateways carrying traffic.
    pub gateways_used: usize,
    /// Sum of `airtime(sf)` over devices.
    pub total_energy: u64,
    /// Largest channel utilization over all gateways.
    pub peak_utilization: f64,
    /// First violation found, if any.
    pub violation: Option<Violation>,
}

impl Evaluation {
    /// An infeasible evaluation carrying `violation`.
    pub fn infeasible(violation: Violation) -> Self {
        Self {
            cost: INFEASIBLE_COST,
            feasible: false,
            gateways_used: 0,
            total_energy: 0,
            peak_utilization: 0.0,
            violation: Some(violation),
        }
    }

    /// An infeasible evaluation with no violation: nothing was scored.
    pub fn unscored() -> Self {
        Self {
            violation: None,
            ..Self::infeasible(Violation::Unassigned { device: 0 })
        }
    }
}

/// Scoring function bound to one topology and weight triple.
///
/// Evaluation never mutates the topology, so one `Objective` can be shared
/// across threads.
#[derive(Debug, Clone, Copy)]
pub struct Objective<'t> {
    topology: &'t Topology,
    params: TuningParameters,
}

impl<'t> Objective<'t> {
    /// Creates an objective over `topology`.
    pub fn new(topology: &'t Topology, params: TuningParameters) -> Self {
        Self { topology, params }
    }

    /// The scored topology.
    pub fn topology(&self) -> &'t Topology {
        self.topology
    }

    /// The weight triple.
    pub fn params(&self) -> TuningParameters {
        self.params
    }

    /// Weighted sum of the three metrics.
    pub fn weighted(&self, gateways_used: usize, total_energy: u64, peak_utilization: f64) -> f64 {
        self.params.alpha * gateways_used as f64
            + self.params.beta * total_energy as f64
            + self.params.gamma * peak_utilization
    }

    /// Scores a complete assignment, one link per device.
    ///
    /// Scoring stops at the first violation. Links past the device count are
    /// ignored.
    pub fn evaluate(&self, links: &[Link]) -> Evaluation {
        let topo = self.topology;
        let mut gateway_uf = vec![UtilizationFactor::zero(); topo.gateway_count()];
        let mut total_energy = 0u64;

        for device in 0..topo.device_count() {
            let Some(&Link { gateway, sf }) = links.get(device) else {
                return Evaluation::infeasible(Violation::Unassigned { device });
            };
            if gateway >= topo.gateway_count() {
                return Evaluation::infeasible(Violation::UnknownGateway { device });
            }
            if !topo.sf_in_range(device, gateway, sf) {
                return Evaluation::infeasible(Violation::SfOutOfRange { device });
            }
            gateway_uf[gateway] += topo.uf(device, sf);
            if gateway_uf[gateway].is_full() {
                return Evaluation::infeasible(Violation::Overloaded { gateway });
            }
            total_energy += u64::from(airtime(sf));
        }

        let gateways_used = gateway_uf.iter().filter(|uf| uf.is_used()).count();
        let peak_utilization = gateway_uf.iter().map(UtilizationFactor::max).fold(0.0, f64::max);

        Evaluation {
            cost: self.weighted(gateways_used, total_energy, peak_utilization),
            feasible: true,
            gateways_used,
            total_energy,
            peak_utilization,
            violation: None,
        }
    }

    /// Scores an allocation; incomplete allocations are infeasible.
    pub fn evaluate_allocation(&self, allocation: &Allocation<'_>) -> Evaluation {
        match allocation.to_links() {
            Some(links) => self.evaluate(&links),
            None => {
                let device = allocation.links().iter().position(Option::is_none).unwrap_or(0);
                Evaluation::infeasible(Violation::Unassigned { device })
            }
        }
    }

    /// Cost that stays comparable across infeasible assignments.
    ///
    /// Equals the weighted cost plus [`VIOLATION_PENALTY`] for every device
    /// with an invalid or missing link and every device added to an already
    /// saturated gateway. Feasible assignments get exactly their
    /// [`evaluate`](Self::evaluate) cost.
    pub fn penalized_cost(&self, links: &[Link]) -> f64 {
        let topo = self.topology;
        let mut gateway_uf = vec![UtilizationFactor::zero(); topo.gateway_count()];
        let mut total_energy = 0u64;
        let mut penalty = 0.0;

        for device in 0..topo.device_count() {
            let Some(&Link { gateway, sf }) = links.get(device) else {
                penalty += VIOLATION_PENALTY;
                continue;
            };
            if gateway >= topo.gateway_count() || !(MIN_SF..=MAX_SF).contains(&sf) {
                penalty += VIOLATION_PENALTY;
                continue;
            }
            if !topo.sf_in_range(device, gateway, sf) {
                penalty += VIOLATION_PENALTY;
            }
            gateway_uf[gateway] += topo.uf(device, sf);
            if gateway_uf[gateway].is_full() {
                penalty += VIOLATION_PENALTY;
            }
            total_energy += u64::from(airtime(sf));
        }

        let gateways_used = gateway_uf.iter().filter(|uf| uf.is_used()).count();
        let peak_utilization = gateway_uf.iter().map(UtilizationFactor::max).fold(0.0, f64::max);
        penalty + self.weighted(gateways_used, total_energy, peak_utilization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topology::fixtures;
    use crate::random::create_rng;
    use proptest::prelude::*;

    fn link(gateway: usize, sf: u8) -> Link {
        Link { gateway, sf }
    }

    #[test]
    fn test_one_gateway_gateways_only_costs_one() {
        let topo = fixtures::pair();
        let obj = Objective::new(&topo, TuningParameters::new(1.0, 0.0, 0.0));
        // Both devices on gateway 0: device 0 at SF7, device 1 at SF8.
        let eval = obj.evaluate(&[link(0, 7), link(0, 8)]);
        assert!(eval.feasible);
        assert_eq!(eval.gateways_used, 1);
        assert_eq!(eval.cost, 1.0);
    }

    #[test]
    fn test_metrics() {
        let topo = fixtures::pair();
        let obj = Objective::new(&topo, TuningParameters::default());
        let eval = obj.evaluate(&[link(0, 7), link(1, 7)]);
        assert!(eval.feasible);
        assert_eq!(eval.gateways_used, 2);
        assert_eq!(eval.total_energy, 2);
        assert!((eval.peak_utilization - 1.0 / 3200.0).abs() < 1e-12);
        let expected = 2.0 + 0.1 * 2.0 + 7.8 / 3200.0;
        assert!((eval.cost - expected).abs() < 1e-12);
        assert_eq!(eval.violation, None);
    }

    #[test]
    fn test_sf_below_min_is_infeasible() {
        let topo = fixtures::pair();
        let obj = Objective::new(&topo, TuningParameters::default());
        // Gateway 1 needs SF 9 for device 0.
        let eval = obj.evaluate(&[link(1, 8), link(1, 7)]);
        assert!(!eval.feasible);
        assert_eq!(eval.cost, INFEASIBLE_COST);
        assert_eq!(eval.violation, Some(Violation::SfOutOfRange { device: 0 }));
    }

    #[test]
    fn test_sf_above_max_is_infeasible() {
        // Period 400 caps the device at SF 9.
        let topo = Topology::new(vec![vec![7]], vec![400]).unwrap();
        let obj = Objective::new(&topo, TuningParameters::default());
        assert!(obj.evaluate(&[link(0, 9)]).feasible);
        let eval = obj.evaluate(&[link(0, 10)]);
        assert_eq!(eval.violation, Some(Violation::SfOutOfRange { device: 0 }));
    }

    #[test]
    fn test_overload_is_infeasible() {
        // 128 devices at 1/128 each saturate SF7.
        let topo = Topology::new(vec![vec![7]; 128], vec![128; 128]).unwrap();
        let obj = Objective::new(&topo, TuningParameters::default());
        let links = vec![link(0, 7); 128];
        let eval = obj.evaluate(&links);
        assert_eq!(eval.violation, Some(Violation::Overloaded { gateway: 0 }));
        let short = obj.evaluate(&links[..127]);
        assert_eq!(short.violation, Some(Violation::Unassigned { device: 127 }));
    }

    #[test]
    fn test_unknown_gateway() {
        let topo = fixtures::pair();
        let obj = Objective::new(&topo, TuningParameters::default());
        let eval = obj.evaluate(&[link(0, 7), link(5, 7)]);
        assert_eq!(eval.violation, Some(Violation::UnknownGateway { device: 1 }));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let topo = fixtures::line(30, 4, 1600);
        let obj = Objective::new(&topo, TuningParameters::default());
        let mut alloc = Allocation::new(&topo);
        for e in 0..30 {
            let g = topo.candidate_gateways(e)[0];
            assert!(alloc.check_and_connect(e, g, None));
        }
        let first = obj.evaluate_allocation(&alloc);
        let second = obj.evaluate_allocation(&alloc);
        assert!(first.feasible);
        assert_eq!(first, second);
    }

    #[test]
    fn test_incomplete_allocation_is_infeasible() {
        let topo = fixtures::pair();
        let obj = Objective::new(&topo, TuningParameters::default());
        let mut alloc = Allocation::new(&topo);
        alloc.connect(0, 0, None);
        let eval = obj.evaluate_allocation(&alloc);
        assert_eq!(eval.violation, Some(Violation::Unassigned { device: 1 }));
    }

    #[test]
    fn test_penalized_cost_grades_infeasible() {
        let topo = fixtures::pair();
        let obj = Objective::new(&topo, TuningParameters::default());
        let feasible = [link(0, 7), link(1, 7)];
        assert_eq!(obj.penalized_cost(&feasible), obj.evaluate(&feasible).cost);

        let one_bad = obj.penalized_cost(&[link(1, 8), link(1, 7)]);
        let two_bad = obj.penalized_cost(&[link(1, 8), link(0, 7)]);
        assert!(one_bad >= VIOLATION_PENALTY && one_bad < 2.0 * VIOLATION_PENALTY);
        assert!(two_bad >= 2.0 * VIOLATION_PENALTY);
        assert!(obj.penalized_cost(&[link(0, 7)]) >= VIOLATION_PENALTY);
    }

    #[test]
    fn test_unscored_has_no_violation() {
        let eval = Evaluation::unscored();
        assert!(!eval.feasible);
        assert_eq!(eval.cost, INFEASIBLE_COST);
        assert_eq!(eval.violation, None);
    }

    proptest! {
        /// One out-of-range SF makes the whole vector infeasible, whatever
        /// the other devices do.
        #[test]
        fn prop_one_bad_sf_is_infeasible(
            seed in any::<u64>(),
            device in 0usize..20,
            pick in any::<prop::sample::Index>(),
            below in any::<bool>(),
        ) {
            // Period 800: SF 10 at most, so every in-domain vector fits.
            let topo = fixtures::line(20, 4, 800);
            let objective = Objective::new(&topo, TuningParameters::default());
            let mut rng = create_rng(seed);
            let mut links: Vec<Link> =
                (0..20).map(|e| topo.random_link(e, &mut rng)).collect();
            prop_assert!(objective.evaluate(&links).feasible);

            let candidates = topo.candidate_gateways(device);
            let gateway = candidates[pick.index(candidates.len())];
            let lowest = topo.min_sf(device, gateway);
            let sf = if below && lowest > MIN_SF {
                lowest - 1
            } else {
                topo.max_sf(device) + 1
            };
            links[device] = link(gateway, sf);

            let eval = objective.evaluate(&links);
            prop_assert!(!eval.feasible);
            prop_assert_eq!(eval.cost, INFEASIBLE_COST);
            prop_assert_eq!(eval.violation, Some(Violation::SfOutOfRange { device }));
        }
    }
}
