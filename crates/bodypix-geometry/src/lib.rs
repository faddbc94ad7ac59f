//! Geometry helpers for BodyPix-style person segmentation
//!
//! Pre- and post-processing around a segmentation network whose input must
//! line up with its output stride:
//!
//! - **Resolution**: test and snap input sizes onto the stride grid
//!   ([`is_valid_input_resolution`], [`to_valid_input_resolution`],
//!   [`to_input_resolution_height_and_width`])
//! - **Padding**: symmetric letterbox padding to a target aspect ratio
//!   ([`calc_padding`])
//! - **Restore**: map low-resolution model output back onto the unpadded
//!   source image ([`remove_padding_and_resize_back`],
//!   [`scale_and_crop_to_input_tensor_shape`])
//! - **Mask**: threshold scores into a boolean mask ([`to_mask_tensor`])
//!
//! Tensors are `ndarray` arrays of `f32` in HWC or NHWC order. Every function
//! is pure: inputs are borrowed, outputs are freshly allocated.
//!
//! # Example
//! ```no_run
//! use bodypix_geometry::{SegmentationPostprocessor, SegmentationConfig};
//! use ndarray::Array3;
//!
//! # fn main() -> anyhow::Result<()> {
//! let postprocessor = SegmentationPostprocessor::new(SegmentationConfig::default())?;
//! let geometry = postprocessor.input_geometry(480, 640)?;
//!
//! // ... letterbox the image to geometry.input_height x geometry.input_width
//! // and run the model to get low-resolution logits ...
//! let logits = Array3::<f32>::zeros((31, 41, 1));
//!
//! let result = postprocessor.segment(&logits, 480, 640, geometry.padding)?;
//! println!("{:.1}% foreground", result.foreground_fraction * 100.0);
//! # Ok(())
//! # }
//! ```

pub mod image_tensor;
pub mod mask;
pub mod padding;
pub mod postprocess;
pub mod resize;
pub mod resolution;
pub mod restore;

pub use bodypix_common::{
    GeometryError, InternalResolution, OutputStride, Result, SegmentationConfig,
};
pub use image_tensor::rgb_image_to_tensor;
pub use mask::{foreground_fraction, is_foreground_pixel, mask_to_gray_image, to_mask_tensor};
pub use padding::{calc_padding, calc_padding_for_dims, Padding};
pub use postprocess::{InputGeometry, SegmentationMask, SegmentationPostprocessor};
pub use resize::{crop_and_resize, resize_bilinear, resize_with_pad, sigmoid, CropBox};
pub use resolution::{
    is_valid_input_resolution, to_input_resolution_height_and_width, to_valid_input_resolution,
};
pub use restore::{remove_padding_and_resize_back, scale_and_crop_to_input_tensor_shape};
