//! strand-dataset: labeled dataset generation over the build pipeline.
//!
//! Provides:
//! - Seedable sampling strategies (simple, random, walk) over a universe of
//!   component identifiers
//! - Classification task generation with centroid-anchored classes, noise,
//!   and deliberate mislabeling
//! - A fixed-size parallel fan-out that builds each sample in an isolated
//!   working directory and aggregates a `labels.json` document

pub mod classification;
pub mod engine;
pub mod error;
pub mod labels;
pub mod sampling;

pub use classification::{classification, ClassificationParams};
pub use engine::{default_workers, resolve_blueprint, DatasetRunner};
pub use error::{DatasetError, DatasetResult};
pub use labels::{write_labels, LabelEntry, LabelMap};
pub use sampling::{random, simple, walk};
