//! Staged greedy constructor.
//!
//! Builds complete allocations tier by tier: first the lowest SF at which
//! every device is covered, then progressively higher SFs. Devices with a
//! single candidate gateway are pinned once; the rest are placed by
//! randomized first-fit over shuffled gateway lists, restarting until the
//! search converges, stalls, or runs out of time.
//!
//! # Key Types
//!
//! - [`GreedyConfig`]: stall threshold, time limit, tier policy
//! - [`GreedyRunner`]: executes the search
//! - [`GreedyResult`]: best allocation with run statistics

mod config;
mod reallocation;
mod runner;

pub use config::GreedyConfig;
pub use runner::{GreedyResult, GreedyRunner};
