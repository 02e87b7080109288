//! Item catalog.
//!
//! Maps an item name to its per-unit nutrient profile. The optimizer only
//! ever reads the catalog through [`CatalogLookup`], so any keyed store can
//! stand in for the in-memory [`ItemCatalog`].
//!
//! # Key Types
//!
//! - [`ItemProfile`]: protein / fat / carbohydrate per unit, plus unit label
//! - [`UnitKind`]: whether quantities are continuous or whole numbers
//! - [`ItemCatalog`]: ordered in-memory catalog with CSV loading and search

mod loader;
mod types;

pub use loader::parse_csv;
pub use types::{CatalogLookup, ItemCatalog, ItemProfile, UnitKind};
