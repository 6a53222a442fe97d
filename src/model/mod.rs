//! Problem model shared by both solvers.
//!
//! - [`Topology`]: read-only reachability and period data
//! - [`UtilizationFactor`]: per-gateway, per-SF channel load
//! - [`Allocation`]: mutable assignment with incremental capacity checks
//! - [`Objective`]: pure weighted scoring of complete assignments

mod allocation;
mod objective;
pub(crate) mod topology;
mod uf;

pub use allocation::{Allocation, Link};
pub use objective::{
    Evaluation, Objective, TuningParameters, Violation, INFEASIBLE_COST, VIOLATION_PENALTY,
};
pub use topology::{airtime, max_sf_for_period, Topology, MAX_SF, MIN_SF, SF_COUNT, SF_UNREACHABLE};
pub use uf::{UtilizationFactor, FULL_THRESHOLD, USED_THRESHOLD};
