//! Common types shared by the BodyPix geometry crates

pub mod config;
pub mod error;

pub use config::{
    InternalResolution, OutputStride, SegmentationConfig, MAX_INTERNAL_RESOLUTION,
    MIN_INTERNAL_RESOLUTION,
};
pub use error::{GeometryError, Result};
