//! Fitness functions for [`AllocationProblem`](super::AllocationProblem).
//!
//! Each maps an [`Evaluation`] to a non-negative value to maximise:
//! `1e3 / metric` for feasible allocations and 0 otherwise, so infeasible
//! chromosomes are never drawn by roulette selection while a feasible one
//! exists.

use crate::model::Evaluation;

const SCALE: f64 = 1e3;

fn inverse(evaluation: &Evaluation, metric: f64) -> f64 {
    if evaluation.feasible {
        SCALE / metric.max(f64::EPSILON)
    } else {
        0.0
    }
}

/// Inverse of the weighted cost.
pub fn inverse_cost(evaluation: &Evaluation) -> f64 {
    inverse(evaluation, evaluation.cost)
}

/// Inverse of the number of used gateways.
pub fn inverse_gateways(evaluation: &Evaluation) -> f64 {
    inverse(evaluation, evaluation.gateways_used as f64)
}

/// Inverse of the total transmit energy.
pub fn inverse_energy(evaluation: &Evaluation) -> f64 {
    inverse(evaluation, evaluation.total_energy as f64)
}

/// Inverse of the peak channel utilization.
pub fn inverse_utilization(evaluation: &Evaluation) -> f64 {
    inverse(evaluation, evaluation.peak_utilization)
}
