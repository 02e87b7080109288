//! Evolutionary PFC balancing.
//!
//! Recommends a quantity for each selected food item so that the combined
//! protein / fat / carbohydrate (PFC) totals approach a target, subject to
//! per-item upper bounds and whole-number quantities for items sold by the
//! piece.
//!
//! - **Catalog** ([`catalog`]): per-unit nutrient profiles, CSV loading,
//!   name search.
//! - **Search** ([`search`]): problem construction and the genetic
//!   algorithm (tournament selection, uniform swap crossover, resampling
//!   mutation, elite archive, bound repair).
//! - **Report** ([`report`]): named, unit-aware menus with achieved totals
//!   and deviations.
//! - **Jobs** ([`jobs`]): background searches with per-job, poll-able
//!   progress and cancellation.
//!
//! # Example
//!
//! ```
//! use pfc_balance::catalog::{ItemCatalog, ItemProfile};
//! use pfc_balance::search::{ItemRequest, Optimizer, PfcTriple, SearchConfig, SearchProblem};
//!
//! let catalog = ItemCatalog::new()
//!     .with_item("eggs", ItemProfile::new(6.0, 5.0, 0.5, "個"))
//!     .with_item("rice", ItemProfile::new(2.5, 0.3, 28.0, "g"));
//! let problem = SearchProblem::build(
//!     &catalog,
//!     &[ItemRequest::new("eggs", 4.0), ItemRequest::new("rice", 200.0)],
//!     PfcTriple::new(20.0, 10.0, 50.0),
//! )?;
//! let config = SearchConfig::default()
//!     .with_population_size(50)
//!     .with_generations(20)
//!     .with_seed(42);
//! let outcome = Optimizer::run(&problem, &config)?;
//! assert!(outcome.result.best().is_some());
//! # Ok::<(), pfc_balance::error::SearchError>(())
//! ```

pub mod catalog;
pub mod error;
pub mod jobs;
pub mod report;
pub mod search;
