//! Search problem construction.
//!
//! A [`SearchProblem`] is the optimizer's view of one request: the ordered
//! item dimensions, their bounds and unit kinds, and the target totals. It
//! copies the profiles it needs out of the catalog, so a running search
//! holds no borrow on the catalog.

use crate::catalog::{CatalogLookup, ItemProfile};
use crate::error::SearchError;

/// A protein / fat / carbohydrate triple.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PfcTriple {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl PfcTriple {
    pub fn new(protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            protein,
            fat,
            carbs,
        }
    }

    /// Component-wise `self - other`.
    pub fn delta(&self, other: &PfcTriple) -> PfcTriple {
        PfcTriple::new(
            self.protein - other.protein,
            self.fat - other.fat,
            self.carbs - other.carbs,
        )
    }

    /// Sum of the absolute values of the components.
    pub fn abs_sum(&self) -> f64 {
        self.protein.abs() + self.fat.abs() + self.carbs.abs()
    }
}

/// One requested item and its quantity cap.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemRequest {
    pub name: String,
    pub upper_bound: f64,
}

impl ItemRequest {
    pub fn new(name: impl Into<String>, upper_bound: f64) -> Self {
        Self {
            name: name.into(),
            upper_bound,
        }
    }
}

/// The optimizer's immutable description of one search.
///
/// Dimension `i` of every genotype is the quantity of `items[i]`.
#[derive(Debug, Clone)]
pub struct SearchProblem {
    items: Vec<String>,
    profiles: Vec<ItemProfile>,
    lower_bounds: Vec<f64>,
    upper_bounds: Vec<f64>,
    integer_dims: Vec<usize>,
    target: PfcTriple,
}

impl SearchProblem {
    /// Builds a problem from a request.
    ///
    /// # Errors
    ///
    /// - [`SearchError::EmptySelection`] if `requests` is empty
    /// - [`SearchError::UnknownItem`] for the first name the catalog lacks
    /// - [`SearchError::InvalidUpperBound`] for a non-finite or non-positive cap
    /// - [`SearchError::InvalidTarget`] for a non-finite or negative target
    pub fn build<C: CatalogLookup + ?Sized>(
        catalog: &C,
        requests: &[ItemRequest],
        target: PfcTriple,
    ) -> Result<Self, SearchError> {
        if requests.is_empty() {
            return Err(SearchError::EmptySelection);
        }
        for (component, value) in [
            ("protein", target.protein),
            ("fat", target.fat),
            ("carbs", target.carbs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SearchError::InvalidTarget { component, value });
            }
        }

        let mut items = Vec::with_capacity(requests.len());
        let mut profiles = Vec::with_capacity(requests.len());
        let mut upper_bounds = Vec::with_capacity(requests.len());
        let mut integer_dims = Vec::new();

        for (i, req) in requests.iter().enumerate() {
            let profile = catalog
                .get_profile(&req.name)
                .ok_or_else(|| SearchError::UnknownItem(req.name.clone()))?;
            if !req.upper_bound.is_finite() || req.upper_bound <= 0.0 {
                return Err(SearchError::InvalidUpperBound {
                    item: req.name.clone(),
                    bound: req.upper_bound,
                });
            }
            if profile.is_discrete() {
                integer_dims.push(i);
            }
            items.push(req.name.clone());
            profiles.push(profile.clone());
            upper_bounds.push(req.upper_bound);
        }

        Ok(Self {
            lower_bounds: vec![0.0; items.len()],
            items,
            profiles,
            upper_bounds,
            integer_dims,
            target,
        })
    }

    /// Number of dimensions (selected items).
    pub fn dims(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn profiles(&self) -> &[ItemProfile] {
        &self.profiles
    }

    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower_bounds
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper_bounds
    }

    /// Indices of whole-number dimensions, ascending.
    pub fn integer_dims(&self) -> &[usize] {
        &self.integer_dims
    }

    pub fn is_integer(&self, dim: usize) -> bool {
        self.integer_dims.binary_search(&dim).is_ok()
    }

    pub fn target(&self) -> PfcTriple {
        self.target
    }

    /// Achieved totals: the dot product of `genes` with each nutrient column.
    pub fn totals(&self, genes: &[f64]) -> PfcTriple {
        genes
            .iter()
            .zip(&self.profiles)
            .fold(PfcTriple::default(), |acc, (&q, p)| {
                PfcTriple::new(
                    acc.protein + p.protein * q,
                    acc.fat + p.fat * q,
                    acc.carbs + p.carbs * q,
                )
            })
    }

    /// Total absolute deviation of `genes` from the target. Lower is better.
    pub fn fitness(&self, genes: &[f64]) -> f64 {
        self.totals(genes).delta(&self.target).abs_sum()
    }
}
