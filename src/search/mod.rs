//! Evolutionary PFC search.
//!
//! Finds item quantities whose combined protein / fat / carbohydrate totals
//! approach a target, within per-item upper bounds and with whole-number
//! quantities for discrete items.
//!
//! # Key Types
//!
//! - [`SearchProblem`]: bounds, integer dimensions and target for one request
//! - [`SearchConfig`]: algorithm parameters and seed
//! - [`Optimizer`]: executes the generational loop
//! - [`EliteArchive`]: best distinct candidates seen during a run
//!
//! # Algorithm
//!
//! Each generation fills a pool by tournament selection, recombines
//! consecutive pairs with uniform swap crossover, mutates by resampling
//! dimensions uniformly, re-evaluates changed candidates and merges the
//! population into the elite archive. Genotypes may stray outside their
//! bounds during the loop; they are repaired only when reported.
//!
//! # References
//!
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Bäck, Fogel & Michalewicz (2000), *Evolutionary Computation 1: Basic
//!   Algorithms and Operators*

mod archive;
mod candidate;
mod config;
pub mod operators;
mod problem;
mod runner;

pub use archive::EliteArchive;
pub use candidate::Candidate;
pub use config::SearchConfig;
pub use problem::{ItemRequest, PfcTriple, SearchProblem};
pub use runner::{GenerationProgress, Optimizer, RunStats, SearchOutcome};
