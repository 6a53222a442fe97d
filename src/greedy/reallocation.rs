//! Post-pass that tries to empty lightly loaded gateways.
//!
//! Gateways in use are visited from the fewest devices to the most. Each of
//! their devices is offered to the other used gateways, busiest first, at
//! the target's minimum SF. A move is taken when it lowers the device's SF
//! or when the device is the last one on its gateway. The rewritten
//! allocation is kept only if it is feasible and strictly cheaper.

use crate::model::{Allocation, Evaluation, Objective};

/// Returns a strictly cheaper allocation derived from `best`, if any.
pub(crate) fn reallocate<'t>(
    objective: &Objective<'t>,
    best: &Allocation<'t>,
    best_cost: f64,
) -> Option<(Allocation<'t>, Evaluation)> {
    let topo = objective.topology();
    let mut counts = vec![0usize; topo.gateway_count()];
    for link in best.links().iter().flatten() {
        counts[link.gateway] += 1;
    }

    let mut order = best.used_gateways();
    order.sort_by_key(|&g| counts[g]);

    let mut candidate = best.clone();
    let mut moves = 0usize;

    for &from in &order {
        for device in candidate.devices_of(from) {
            if topo.candidate_gateways(device).len() < 2 {
                continue;
            }
            let Some(current) = candidate.link(device) else {
                continue;
            };

            let mut targets: Vec<usize> = order
                .iter()
                .copied()
                .filter(|&g| g != from && counts[g] > 0 && topo.is_candidate(device, g))
                .collect();
            targets.sort_by_key(|&g| std::cmp::Reverse(counts[g]));

            for to in targets {
                let sf = topo.min_sf(device, to);
                if sf >= current.sf && counts[from] != 1 {
                    continue;
                }
                if candidate.check_and_move(device, to) {
                    tracing::debug!(
                        "Greedy: reallocated device {} from gateway {} to {} (SF {} -> {})",
                        device,
                        from,
                        to,
                        current.sf,
                        sf
                    );
                    counts[from] -= 1;
                    counts[to] += 1;
                    moves += 1;
                    break;
                }
            }
        }
    }

    if moves == 0 {
        return None;
    }
    let evaluation = objective.evaluate_allocation(&candidate);
    if evaluation.feasible && evaluation.cost < best_cost {
        tracing::debug!(
            "Greedy: reallocation improved cost {} -> {} ({} moves)",
            best_cost,
            evaluation.cost,
            moves
        );
        Some((candidate, evaluation))
    } else {
        tracing::debug!("Greedy: reallocation did not improve ({} moves)", moves);
        None
    }
}
