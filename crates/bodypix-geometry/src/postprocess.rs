//! Segmentation post-processing driven by [`SegmentationConfig`]
//!
//! Ties the free functions together the way an inference pipeline uses them:
//!
//! 1. [`SegmentationPostprocessor::input_geometry`] picks the stride-valid
//!    model input size for a source image and the padding to reach it.
//! 2. The caller letterboxes the image and runs the model.
//! 3. [`SegmentationPostprocessor::segment`] maps the logits back onto the
//!    source image and thresholds them into a mask.

use crate::mask::{foreground_fraction, to_mask_tensor};
use crate::padding::{calc_padding_for_dims, Padding};
use crate::resolution::to_input_resolution_height_and_width;
use crate::restore::scale_and_crop_to_input_tensor_shape;
use bodypix_common::{GeometryError, Result, SegmentationConfig};
use ndarray::{Array3, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Model input size and letterbox padding for one source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputGeometry {
    /// Stride-valid model input height
    pub input_height: usize,
    /// Stride-valid model input width
    pub input_width: usize,
    /// Padding that gives the source image the input aspect ratio
    pub padding: Padding,
}

/// Binary segmentation of one source image
#[derive(Debug, Clone)]
pub struct SegmentationMask {
    /// Foreground probabilities, `(height, width, channels)`
    pub probabilities: Array3<f32>,
    /// `probabilities > segmentation_threshold`
    pub mask: Array3<bool>,
    /// Share of foreground pixels (0-1)
    pub foreground_fraction: f32,
}

/// Post-processor for segmentation logits
#[derive(Debug, Clone, Default)]
pub struct SegmentationPostprocessor {
    config: SegmentationConfig,
}

impl SegmentationPostprocessor {
    /// Create a post-processor from a validated configuration
    ///
    /// # Errors
    /// [`GeometryError::InvalidConfig`] if the configuration is out of range.
    pub fn new(config: SegmentationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Model input size for a `height x width` source image, and the padding to reach it
    pub fn input_geometry(&self, height: u32, width: u32) -> Result<InputGeometry> {
        let (input_height, input_width) = to_input_resolution_height_and_width(
            self.config.internal_resolution.fraction(),
            self.config.output_stride.as_u32(),
            height,
            width,
        )?;
        let padding =
            calc_padding_for_dims(height as usize, width as usize, input_height, input_width)?;

        debug!(
            "Input geometry for {}x{}: {}x{} with {:?}",
            height, width, input_height, input_width, padding
        );

        Ok(InputGeometry {
            input_height,
            input_width,
            padding,
        })
    }

    /// Map `logits` onto a `height x width` image, applying the sigmoid when configured
    pub fn probabilities<S, D>(
        &self,
        logits: &ArrayBase<S, D>,
        height: usize,
        width: usize,
        padding: Padding,
    ) -> Result<Array3<f32>>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        scale_and_crop_to_input_tensor_shape(
            logits,
            height,
            width,
            padding.top,
            padding.bottom,
            padding.left,
            padding.right,
            self.config.apply_sigmoid,
        )
    }

    /// Probabilities and binary mask for a `height x width` image
    pub fn segment<S, D>(
        &self,
        logits: &ArrayBase<S, D>,
        height: usize,
        width: usize,
        padding: Padding,
    ) -> Result<SegmentationMask>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        if height == 0 || width == 0 {
            return Err(GeometryError::invalid_geometry(format!(
                "cannot segment an empty {height}x{width} image"
            )));
        }

        let probabilities = self.probabilities(logits, height, width, padding)?;
        let mask = to_mask_tensor(&probabilities, self.config.segmentation_threshold);
        let fraction = foreground_fraction(&mask);

        info!(
            "Segmented {}x{} image: {:.1}% foreground",
            height,
            width,
            fraction * 100.0
        );

        Ok(SegmentationMask {
            probabilities,
            mask,
            foreground_fraction: fraction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodypix_common::{InternalResolution, OutputStride};
    use ndarray::{s, Array3};

    #[test]
    fn test_rejects_invalid_config() {
        let config = SegmentationConfig {
            segmentation_threshold: 2.0,
            ..SegmentationConfig::default()
        };
        assert!(SegmentationPostprocessor::new(config).is_err());
    }

    #[test]
    fn test_input_geometry_default_config() {
        let postprocessor = SegmentationPostprocessor::default();
        // 500 * 0.5 = 250 -> 241, 700 * 0.5 = 350 -> 337
        let geometry = postprocessor.input_geometry(500, 700).unwrap();
        assert_eq!(geometry.input_height, 241);
        assert_eq!(geometry.input_width, 337);
        assert_eq!(geometry.padding.left, geometry.padding.right);
        assert_eq!(geometry.padding.top, geometry.padding.bottom);
    }

    #[test]
    fn test_input_geometry_full_resolution() {
        let config = SegmentationConfig {
            internal_resolution: InternalResolution::Full,
            output_stride: OutputStride::ThirtyTwo,
            ..SegmentationConfig::default()
        };
        let postprocessor = SegmentationPostprocessor::new(config).unwrap();
        let geometry = postprocessor.input_geometry(257, 257).unwrap();
        assert_eq!((geometry.input_height, geometry.input_width), (257, 257));
        assert!(geometry.padding.is_zero());
    }

    #[test]
    fn test_segment_thresholds_probabilities() {
        let postprocessor = SegmentationPostprocessor::default();

        // left half strongly foreground, right half strongly background
        let mut logits = Array3::<f32>::from_elem((8, 8, 1), -10.0);
        logits.slice_mut(s![.., ..4, ..]).fill(10.0);

        let result = postprocessor
            .segment(&logits, 16, 16, Padding::default())
            .unwrap();
        assert_eq!(result.mask.dim(), (16, 16, 1));
        assert!(result.mask[[8, 0, 0]]);
        assert!(!result.mask[[8, 15, 0]]);
        assert!((result.foreground_fraction - 0.5).abs() < 0.1);
    }

    #[test]
    fn test_segment_rejects_empty_image() {
        let postprocessor = SegmentationPostprocessor::default();
        let logits = Array3::<f32>::zeros((4, 4, 1));
        assert!(postprocessor
            .segment(&logits, 0, 16, Padding::default())
            .is_err());
    }
}
