//! Genetic Algorithm.
//!
//! A generic GA over fixed-length chromosomes with one gene per locus.
//! Users define their problem by implementing [`GaProblem`], which says how
//! to draw a random gene for each locus and how fit a chromosome is.
//! [`AllocationProblem`] is the gateway-allocation instance.
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters (population size, rates, presets)
//! - [`GaRunner`]: Executes the evolutionary loop
//! - [`GaResult`]: Best chromosome, termination reason and fitness history
//!
//! # Submodules
//!
//! - [`operators`]: Position-wise crossover and per-locus mutation
//! - [`fitness`]: Fitness functions for [`AllocationProblem`]
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
pub mod fitness;
pub mod operators;
mod problem;
mod runner;
mod selection;
mod types;

pub use config::GaConfig;
pub use operators::CrossoverMethod;
pub use problem::AllocationProblem;
pub use runner::{GaResult, GaRunner};
pub use selection::Selection;
pub use types::{Chromosome, GaProblem};
