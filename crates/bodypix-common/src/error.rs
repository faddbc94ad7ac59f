//! Error types shared by the geometry helpers
//!
//! Every fallible operation in the workspace returns [`Result`], which wraps
//! [`GeometryError`]. Degenerate geometry (zero-sized images, single-pixel
//! padded dimensions, a zero output stride) is reported here instead of being
//! allowed to turn into `NaN`/`inf` values further down a pipeline.

use thiserror::Error;

/// Errors produced while computing or applying segmentation geometry
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Output stride must be non-zero")]
    ZeroOutputStride,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Unsupported tensor rank: expected {expected}, got {actual}")]
    UnsupportedRank {
        expected: &'static str,
        actual: usize,
    },

    #[error("Tensor has no samples along the batch axis")]
    EmptyBatch,

    #[error("Box index {index} out of range for batch of {batch}")]
    BoxIndexOutOfRange { index: usize, batch: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeometryError {
    /// Shorthand for building an [`GeometryError::InvalidGeometry`]
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry(reason.into())
    }

    /// Returns true if the error comes from degenerate input geometry
    #[inline]
    #[must_use]
    pub const fn is_geometry_error(&self) -> bool {
        matches!(
            self,
            Self::ZeroOutputStride
                | Self::InvalidGeometry(_)
                | Self::UnsupportedRank { .. }
                | Self::EmptyBatch
                | Self::BoxIndexOutOfRange { .. }
                | Self::Shape(_)
        )
    }

    /// Returns true if the error comes from loading or validating configuration
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::Yaml(_) | Self::Io(_))
    }
}

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, GeometryError>;
