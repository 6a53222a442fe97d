//! Gateway allocation planning for LoRa networks.
//!
//! Given which gateways hear each end-device and at what spreading factor
//! (SF), assign every device one gateway and one SF so that no gateway
//! channel is saturated, while minimising a weighted mix of gateways used,
//! transmit energy and peak channel utilization.
//!
//! - **Model**: [`model::Topology`] (input), [`model::Allocation`]
//!   (capacity-checked assignment state), [`model::Objective`] (scoring).
//! - **Greedy**: Randomised constructive heuristic that fills gateways SF
//!   tier by tier, with an optional reallocation post-pass.
//! - **Genetic Algorithm (GA)**: Population-based search over complete
//!   assignments, optionally warm-started from a greedy result.
//!
//! # Example
//!
//! ```
//! use u_gateplan::greedy::{GreedyConfig, GreedyRunner};
//! use u_gateplan::model::{Objective, Topology, TuningParameters};
//!
//! let topo = Topology::new(vec![vec![7, 9], vec![8, 7]], vec![3200, 3200]).unwrap();
//! let objective = Objective::new(&topo, TuningParameters::default());
//! let result = GreedyRunner::run(&objective, &GreedyConfig::default().with_seed(1)).unwrap();
//! assert!(result.is_feasible());
//! ```

pub mod error;
pub mod ga;
pub mod greedy;
pub mod model;
pub mod random;
pub mod report;

pub use error::{PlanError, Result};
