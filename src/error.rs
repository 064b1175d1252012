//! Error types for grid localization

use thiserror::Error;

use crate::common::types::{GridShape, Pose};

/// Errors raised by grid construction, filtering and simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocalizationError {
    /// The distribution has no probability mass to normalize
    #[error("belief distribution is degenerate (total mass is zero or not finite)")]
    DegenerateDistribution,

    /// Two grids that must line up cell-for-cell do not
    #[error("grid shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: GridShape, found: GridShape },

    #[error("grid must have at least one row and one column")]
    EmptyGrid,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("pose {pose} lies outside a {shape} grid")]
    PoseOutOfBounds { pose: Pose, shape: GridShape },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl LocalizationError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        LocalizationError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, LocalizationError>;
