//! Catalog data types.

use std::collections::HashMap;

/// Unit label marking items sold by the piece.
pub const PIECE_UNIT: &str = "個";

/// How quantities of an item are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitKind {
    /// Any non-negative real quantity (grams, millilitres, ...).
    Continuous,
    /// Whole-number quantities only (eggs, slices, ...).
    Discrete,
}

impl UnitKind {
    /// Classifies a unit label.
    ///
    /// `個` and its ASCII spellings `piece` / `pcs` are discrete; every
    /// other label is continuous.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label == PIECE_UNIT
            || label.eq_ignore_ascii_case("piece")
            || label.eq_ignore_ascii_case("pcs")
        {
            UnitKind::Discrete
        } else {
            UnitKind::Continuous
        }
    }
}

/// Nutrient content of one unit of an item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemProfile {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    /// Display label of the unit, e.g. `g` or `個`.
    pub unit: String,
    pub kind: UnitKind,
}

impl ItemProfile {
    /// Builds a profile, deriving [`UnitKind`] from the unit label.
    pub fn new(protein: f64, fat: f64, carbs: f64, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        let kind = UnitKind::from_label(&unit);
        Self {
            protein,
            fat,
            carbs,
            unit,
            kind,
        }
    }

    /// Whether quantities of this item must be whole numbers.
    pub fn is_discrete(&self) -> bool {
        self.kind == UnitKind::Discrete
    }
}

/// Read access to item profiles by name.
///
/// Implementations must be `Send + Sync`: searches run on background
/// workers that share the catalog.
pub trait CatalogLookup: Send + Sync {
    /// Returns the profile for `name`, or `None` if the item is unknown.
    fn get_profile(&self, name: &str) -> Option<&ItemProfile>;
}

/// In-memory catalog preserving insertion order.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    names: Vec<String>,
    profiles: HashMap<String, ItemProfile>,
}

impl ItemCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an item. A replaced item keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, profile: ItemProfile) {
        let name = name.into();
        if self.profiles.insert(name.clone(), profile).is_none() {
            self.names.push(name);
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_item(mut self, name: impl Into<String>, profile: ItemProfile) -> Self {
        self.insert(name, profile);
        self
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All item names in load order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Case-insensitive substring search over item names, in load order.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();
        self.names
            .iter()
            .filter(|name| name.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }
}

impl CatalogLookup for ItemCatalog {
    fn get_profile(&self, name: &str) -> Option<&ItemProfile> {
        self.profiles.get(name)
    }
}

impl CatalogLookup for HashMap<String, ItemProfile> {
    fn get_profile(&self, name: &str) -> Option<&ItemProfile> {
        self.get(name)
    }
}
