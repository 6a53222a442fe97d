//! Solver-independent result record.

use std::fmt;

use crate::model::Evaluation;

/// Why a solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminationReason {
    /// The wall-clock limit elapsed.
    Timeout,
    /// The GA went too many generations without a new best.
    Stagnated,
    /// The GA ran its full generation budget.
    MaxGenerations,
    /// Greedy hit the cap of consecutive non-improving trials.
    StallLimit,
    /// Greedy improvement fell below the stall threshold.
    Converged,
    /// Greedy ran out of tiers to explore.
    Exhausted,
    /// The caller raised the cancellation flag.
    Cancelled,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Stagnated => "stagnated",
            Self::MaxGenerations => "max generations",
            Self::StallLimit => "stall limit",
            Self::Converged => "converged",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Summary handed to callers for logging or export.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanReport {
    /// Whether a feasible allocation was found.
    pub feasible: bool,
    /// Cost of the best allocation (`INFEASIBLE_COST` if none).
    pub cost: f64,
    /// Gateways used by the best allocation.
    pub gateways_used: usize,
    /// Total energy of the best allocation.
    pub total_energy: u64,
    /// Peak channel utilization of the best allocation.
    pub peak_utilization: f64,
    /// Wall-clock run time.
    pub elapsed_ms: u64,
    /// Why the solver stopped.
    pub termination: TerminationReason,
}

impl PlanReport {
    /// Builds a report from an evaluation and run metadata.
    pub fn new(evaluation: &Evaluation, elapsed_ms: u64, termination: TerminationReason) -> Self {
        Self {
            feasible: evaluation.feasible,
            cost: evaluation.cost,
            gateways_used: evaluation.gateways_used,
            total_energy: evaluation.total_energy,
            peak_utilization: evaluation.peak_utilization,
            elapsed_ms,
            termination,
        }
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.feasible {
            return write!(f, "infeasible ({}, {} ms)", self.termination, self.elapsed_ms);
        }
        write!(
            f,
            "cost={:.4} (GW={}, E={}, U={:.4}) {}, {} ms",
            self.cost,
            self.gateways_used,
            self.total_energy,
            self.peak_utilization,
            self.termination,
            self.elapsed_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Violation, INFEASIBLE_COST};

    #[test]
    fn test_report_from_feasible_evaluation() {
        let eval = Evaluation {
            cost: 2.5,
            feasible: true,
            gateways_used: 2,
            total_energy: 5,
            peak_utilization: 0.25,
            violation: None,
        };
        let report = PlanReport::new(&eval, 12, TerminationReason::Converged);
        assert!(report.feasible);
        assert_eq!(report.gateways_used, 2);
        let text = report.to_string();
        assert!(text.contains("GW=2"), "{text}");
        assert!(text.contains("converged"), "{text}");
    }

    #[test]
    fn test_report_from_infeasible_evaluation() {
        let eval = Evaluation::infeasible(Violation::Unassigned { device: 0 });
        let report = PlanReport::new(&eval, 3, TerminationReason::Timeout);
        assert!(!report.feasible);
        assert_eq!(report.cost, INFEASIBLE_COST);
        assert_eq!(report.to_string(), "infeasible (timeout, 3 ms)");
    }
}
