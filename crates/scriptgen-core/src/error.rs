use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Required input was missing or blank. Nothing is mutated when this is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputError {
    #[error("diagnostic output must not be empty")]
    EmptyDiagnostic,
    #[error("site name must not be empty")]
    EmptySiteName,
    #[error("site URL must not be empty")]
    EmptyUrl,
    #[error("config name must not be empty")]
    EmptyConfigName,
}

/// Input was present but unusable. State is left unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("`{raw}` is not a valid URL (example: https://example.com/checkout)")]
    InvalidUrl { raw: String },
    #[error("candidate index {index} is out of range (have {len} candidate(s))")]
    CandidateOutOfRange { index: i64, len: usize },
    #[error("site index {index} is out of range (have {len} site(s))")]
    SiteOutOfRange { index: i64, len: usize },
    #[error("no candidate selected")]
    NoSelection,
    #[error("auto-select threshold must be within 0..=100 (got {value})")]
    InvalidThreshold { value: u32 },
    #[error("{field} must be a percentage within 0..=100 (got {value})")]
    PercentOutOfRange { field: String, value: u8 },
}

/// Top-level error for every fallible operation exposed by the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
