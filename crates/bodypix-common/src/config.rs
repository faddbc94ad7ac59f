//! Segmentation configuration
//!
//! Configuration can be built in code (`SegmentationConfig::default()`,
//! [`SegmentationConfig::fast`], [`SegmentationConfig::accurate`]) or loaded
//! from YAML:
//!
//! ```yaml
//! internal_resolution: medium   # low | medium | high | full | 0.1..=2.0
//! output_stride: 16             # 8 | 16 | 32
//! segmentation_threshold: 0.7
//! apply_sigmoid: true
//! ```

use crate::error::{GeometryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Smallest accepted internal resolution fraction
pub const MIN_INTERNAL_RESOLUTION: f64 = 0.1;

/// Largest accepted internal resolution fraction
pub const MAX_INTERNAL_RESOLUTION: f64 = 2.0;

/// Fraction of the source image size the model runs at
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    try_from = "InternalResolutionRepr",
    into = "InternalResolutionRepr"
)]
pub enum InternalResolution {
    /// 25% of the source size
    Low,
    /// 50% of the source size
    #[default]
    Medium,
    /// 75% of the source size
    High,
    /// Full source size
    Full,
    /// Arbitrary fraction
    Custom(f64),
}

impl InternalResolution {
    /// Scale factor applied to the source height and width
    #[must_use]
    pub const fn fraction(self) -> f64 {
        match self {
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 0.75,
            Self::Full => 1.0,
            Self::Custom(fraction) => fraction,
        }
    }

    /// Map a fraction onto a preset when it matches one exactly
    #[must_use]
    pub fn from_fraction(fraction: f64) -> Self {
        match fraction {
            f if f == 0.25 => Self::Low,
            f if f == 0.5 => Self::Medium,
            f if f == 0.75 => Self::High,
            f if f == 1.0 => Self::Full,
            f => Self::Custom(f),
        }
    }
}

impl std::fmt::Display for InternalResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Full => write!(f, "full"),
            Self::Custom(fraction) => write!(f, "{fraction}"),
        }
    }
}

impl std::str::FromStr for InternalResolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "full" => Ok(Self::Full),
            other => other.parse::<f64>().map(Self::from_fraction).map_err(|_| {
                format!(
                    "Unknown internal resolution '{s}'. Expected: low, medium, high, full, or a number (e.g., 0.6)"
                )
            }),
        }
    }
}

/// Serde shape for [`InternalResolution`]: a preset name or a bare number
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum InternalResolutionRepr {
    Preset(String),
    Fraction(f64),
}

impl TryFrom<InternalResolutionRepr> for InternalResolution {
    type Error = String;

    fn try_from(repr: InternalResolutionRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            InternalResolutionRepr::Preset(name) => name.parse(),
            InternalResolutionRepr::Fraction(fraction) => Ok(Self::from_fraction(fraction)),
        }
    }
}

impl From<InternalResolution> for InternalResolutionRepr {
    fn from(resolution: InternalResolution) -> Self {
        match resolution {
            InternalResolution::Custom(fraction) => Self::Fraction(fraction),
            preset => Self::Preset(preset.to_string()),
        }
    }
}

/// Downsampling factor between the model input and its output maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum OutputStride {
    Eight,
    #[default]
    Sixteen,
    ThirtyTwo,
}

impl OutputStride {
    /// Stride in pixels
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
            Self::ThirtyTwo => 32,
        }
    }
}

impl TryFrom<u32> for OutputStride {
    type Error = String;

    fn try_from(stride: u32) -> std::result::Result<Self, Self::Error> {
        match stride {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            32 => Ok(Self::ThirtyTwo),
            other => Err(format!(
                "Unsupported output stride {other}. Expected: 8, 16 or 32"
            )),
        }
    }
}

impl From<OutputStride> for u32 {
    fn from(stride: OutputStride) -> Self {
        stride.as_u32()
    }
}

/// Configuration for segmentation post-processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Fraction of the source resolution fed to the model
    pub internal_resolution: InternalResolution,
    /// Output stride of the model
    pub output_stride: OutputStride,
    /// Minimum probability for a pixel to count as foreground (0.0-1.0)
    pub segmentation_threshold: f32,
    /// Whether model outputs are logits that need a sigmoid
    pub apply_sigmoid: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            internal_resolution: InternalResolution::Medium,
            output_stride: OutputStride::Sixteen,
            segmentation_threshold: 0.7,
            apply_sigmoid: true,
        }
    }
}

impl SegmentationConfig {
    /// Low internal resolution for quick, coarse masks
    #[must_use]
    pub fn fast() -> Self {
        Self {
            internal_resolution: InternalResolution::Low,
            output_stride: OutputStride::Sixteen,
            segmentation_threshold: 0.7,
            apply_sigmoid: true,
        }
    }

    /// Full internal resolution with the finest stride
    #[must_use]
    pub fn accurate() -> Self {
        Self {
            internal_resolution: InternalResolution::Full,
            output_stride: OutputStride::Eight,
            segmentation_threshold: 0.7,
            apply_sigmoid: true,
        }
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`GeometryError::InvalidConfig`] when the internal resolution
    /// falls outside `[0.1, 2.0]` or the threshold outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let fraction = self.internal_resolution.fraction();
        if !fraction.is_finite()
            || !(MIN_INTERNAL_RESOLUTION..=MAX_INTERNAL_RESOLUTION).contains(&fraction)
        {
            return Err(GeometryError::InvalidConfig(format!(
                "internal_resolution must be between {MIN_INTERNAL_RESOLUTION} and {MAX_INTERNAL_RESOLUTION}, got {fraction}"
            )));
        }

        if !self.segmentation_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.segmentation_threshold)
        {
            return Err(GeometryError::InvalidConfig(format!(
                "segmentation_threshold must be between 0 and 1, got {}",
                self.segmentation_threshold
            )));
        }

        Ok(())
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        debug!("Parsed segmentation config: {:?}", config);
        Ok(config)
    }

    /// Load and validate configuration from a YAML file
    pub fn from_yaml(yaml_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_path = yaml_path.as_ref();
        info!("Loading segmentation config from {}", yaml_path.display());
        let contents = std::fs::read_to_string(yaml_path)?;
        Self::from_yaml_str(&contents)
    }
}
