//! Multi-label dataset container.
//!
//! # Layout
//!
//! - Features are **sample-major**: `[n_samples, n_features]`. Chain inference
//!   walks one instance at a time, so each instance's features are contiguous.
//! - Labels are `[n_samples, n_labels]` holding value indices in `[0, K_j)`.
//!
//! Each label `j` has a value space of size `K_j` (2 for binary multi-label,
//! more for multi-target problems).

mod dataset;
mod error;

pub use dataset::MultiLabelDataset;
pub use error::DatasetError;
