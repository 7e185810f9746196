//! Error types for sampling and dataset generation.

use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("universe too small: need at least {needed} identifiers, have {available}")]
    UniverseTooSmall { needed: usize, available: usize },

    #[error("invalid sampling parameters: {what}")]
    InvalidParameters { what: String },

    #[error("no common blueprint that supports all components could be found")]
    NoCommonBlueprint,

    #[error("multiple possible blueprints found: {candidates}")]
    AmbiguousBlueprint { candidates: String },

    #[error(transparent)]
    Compose(#[from] strand_compose::ComposeError),

    #[error(transparent)]
    Core(#[from] strand_core::CoreError),

    #[error("worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("label serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
