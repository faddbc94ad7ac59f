//! Thresholding segmentation scores into binary masks

// Intentional conversions: pixel counts and image dimensions
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

use bodypix_common::{GeometryError, Result};
use image::{GrayImage, Luma};
use ndarray::{Array, ArrayBase, Data, Dimension};

/// Elementwise `segment_scores > threshold`
///
/// The comparison is strict, so scores equal to the threshold are
/// background. The output has the same shape as the input.
#[must_use]
pub fn to_mask_tensor<S, D>(segment_scores: &ArrayBase<S, D>, threshold: f32) -> Array<bool, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    segment_scores.mapv(|score| score > threshold)
}

/// Share of mask elements that are foreground, `0.0` for an empty mask
#[must_use]
pub fn foreground_fraction<S, D>(mask: &ArrayBase<S, D>) -> f32
where
    S: Data<Elem = bool>,
    D: Dimension,
{
    if mask.is_empty() {
        return 0.0;
    }
    let foreground = mask.iter().filter(|&&is_foreground| is_foreground).count();
    foreground as f32 / mask.len() as f32
}

/// Render a mask as an 8-bit image: foreground 255, background 0
///
/// Accepts `(height, width)` or `(height, width, 1)` masks.
///
/// # Errors
/// [`GeometryError::UnsupportedRank`] for any other shape, and
/// [`GeometryError::InvalidGeometry`] if a side does not fit in `u32`.
pub fn mask_to_gray_image<S, D>(mask: &ArrayBase<S, D>) -> Result<GrayImage>
where
    S: Data<Elem = bool>,
    D: Dimension,
{
    let shape = mask.shape();
    let (height, width) = match *shape {
        [height, width] | [height, width, 1] => (height, width),
        _ => {
            return Err(GeometryError::UnsupportedRank {
                expected: "(H, W) or (H, W, 1)",
                actual: shape.len(),
            })
        }
    };

    let to_u32 = |side: usize| {
        u32::try_from(side).map_err(|_| {
            GeometryError::invalid_geometry(format!("mask side {side} does not fit in an image"))
        })
    };
    let (img_width, img_height) = (to_u32(width)?, to_u32(height)?);

    // Row-major iteration visits pixels in the same order as the image buffer
    let pixels: Vec<u8> = mask
        .iter()
        .map(|&is_foreground| if is_foreground { 255 } else { 0 })
        .collect();

    GrayImage::from_raw(img_width, img_height, pixels).ok_or_else(|| {
        GeometryError::invalid_geometry(format!(
            "mask of {height}x{width} does not match its pixel buffer"
        ))
    })
}

/// Pixel value of a mask image at `(x, y)`, for callers working with `image` buffers
#[must_use]
pub fn is_foreground_pixel(mask_image: &GrayImage, x: u32, y: u32) -> bool {
    matches!(mask_image.get_pixel_checked(x, y), Some(Luma([value])) if *value > 0)
}
