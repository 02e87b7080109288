//! Error types.
//!
//! Catalog loading, problem construction and job management each get their
//! own error enum. Conditions inside the generational loop never fail: a
//! poor search simply yields a recommendation with a large deviation.

use crate::jobs::JobId;

/// Errors raised while loading an item catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The underlying reader failed.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// The header row lacks a required column.
    #[error("catalog header is missing column `{0}`")]
    MissingColumn(&'static str),

    /// A row carries a value that is not a number.
    ///
    /// Such rows are skipped during loading; this variant describes the
    /// skipped row in diagnostics.
    #[error("line {line}: `{field}` is not numeric (got {value:?})")]
    MalformedEntry {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Errors raised while turning a request into a search problem.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error("{0} is not in the catalog")]
    UnknownItem(String),

    /// Upper bounds must be finite and strictly positive.
    #[error("upper bound for {item} must be a positive finite number (got {bound})")]
    InvalidUpperBound { item: String, bound: f64 },

    #[error("target {component} must be a non-negative finite number (got {value})")]
    InvalidTarget {
        component: &'static str,
        value: f64,
    },

    #[error("at least one item must be selected")]
    EmptySelection,

    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised by the job registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobError {
    #[error("no job with id {0}")]
    UnknownJob(JobId),

    #[error(transparent)]
    Search(#[from] SearchError),
}
