//! Tensor resampling primitives on NHWC `f32` arrays
//!
//! Pure Rust versions of the image ops a segmentation post-processor needs:
//! half-pixel bilinear resize, letterboxed resize-with-pad, box
//! crop-and-resize and an elementwise sigmoid. Sampling matches the
//! TensorFlow 2 `resize`, `resize_with_pad` and `crop_and_resize` kernels.

// Intentional ML conversions: tensor indices, image dimensions
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use bodypix_common::{GeometryError, Result};
use ndarray::{
    s, Array, Array3, Array4, ArrayBase, ArrayView3, ArrayView4, Axis, Data, Dimension, Ix4,
};

/// Sample positions this close past an image edge are clamped onto it
const EDGE_TOLERANCE: f32 = 1e-3;

/// Normalized crop region in `[0, 1]` image coordinates
///
/// `(y1, x1)` is the top-left and `(y2, x2)` the bottom-right sample. Both
/// corners map onto pixel centres: `0.0` is the first row, `1.0` the last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    pub y1: f32,
    pub x1: f32,
    pub y2: f32,
    pub x2: f32,
}

impl CropBox {
    #[must_use]
    pub const fn new(y1: f32, x1: f32, y2: f32, x2: f32) -> Self {
        Self { y1, x1, y2, x2 }
    }

    /// The box covering the whole image
    #[must_use]
    pub const fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// View a rank-3 (HWC) or rank-4 (NHWC) tensor as NHWC
///
/// Rank-3 input becomes a batch of one without copying.
///
/// # Errors
/// [`GeometryError::UnsupportedRank`] for any other rank.
pub fn to_batched_view<S, D>(tensor: &ArrayBase<S, D>) -> Result<ArrayView4<'_, f32>>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let view = tensor.view().into_dyn();
    match view.ndim() {
        3 => Ok(view.insert_axis(Axis(0)).into_dimensionality::<Ix4>()?),
        4 => Ok(view.into_dimensionality::<Ix4>()?),
        actual => Err(GeometryError::UnsupportedRank {
            expected: "3 (HWC) or 4 (NHWC)",
            actual,
        }),
    }
}

/// Bilinear resize of an HWC image with half-pixel centres
///
/// Source coordinates are `(dst + 0.5) * scale - 0.5`, clamped to the image
/// edge.
#[must_use]
pub fn resize_bilinear(
    src: ArrayView3<'_, f32>,
    new_height: usize,
    new_width: usize,
) -> Array3<f32> {
    let (src_height, src_width, channels) = src.dim();
    let mut dst = Array3::<f32>::zeros((new_height, new_width, channels));
    if src_height == 0 || src_width == 0 {
        return dst;
    }

    let scale_y = src_height as f32 / new_height as f32;
    let scale_x = src_width as f32 / new_width as f32;
    let max_y = src_height as i64 - 1;
    let max_x = src_width as i64 - 1;

    for y in 0..new_height {
        let src_y = (y as f32 + 0.5).mul_add(scale_y, -0.5);
        let y0 = src_y.floor();
        let fy = src_y - y0;
        let y1 = (y0 as i64 + 1).clamp(0, max_y) as usize;
        let y0 = (y0 as i64).clamp(0, max_y) as usize;

        for x in 0..new_width {
            let src_x = (x as f32 + 0.5).mul_add(scale_x, -0.5);
            let x0 = src_x.floor();
            let fx = src_x - x0;
            let x1 = (x0 as i64 + 1).clamp(0, max_x) as usize;
            let x0 = (x0 as i64).clamp(0, max_x) as usize;

            for c in 0..channels {
                let v00 = src[[y0, x0, c]];
                let v01 = src[[y0, x1, c]];
                let v10 = src[[y1, x0, c]];
                let v11 = src[[y1, x1, c]];

                let v0 = (1.0 - fx).mul_add(v00, v01 * fx);
                let v1 = (1.0 - fx).mul_add(v10, v11 * fx);
                dst[[y, x, c]] = (1.0 - fy).mul_add(v0, v1 * fy);
            }
        }
    }

    dst
}

/// Resize every image in the batch to fit `target_height x target_width`, then zero-pad
///
/// The aspect ratio is preserved. With `ratio = max(w / tw, h / th)` each
/// image is resized to `floor(h / ratio) x floor(w / ratio)` and placed at
/// offset `(floor((th - h / ratio) / 2), floor((tw - w / ratio) / 2))`.
///
/// # Errors
/// [`GeometryError::InvalidGeometry`] for an empty image or target, or when
/// the aspect ratio is so extreme that one side would shrink to nothing.
pub fn resize_with_pad<S, D>(
    tensor: &ArrayBase<S, D>,
    target_height: usize,
    target_width: usize,
) -> Result<Array4<f32>>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let batched = to_batched_view(tensor)?;
    let (batch, height, width, channels) = batched.dim();

    if height == 0 || width == 0 {
        return Err(GeometryError::invalid_geometry(format!(
            "cannot resize an empty {height}x{width} image"
        )));
    }
    if target_height == 0 || target_width == 0 {
        return Err(GeometryError::invalid_geometry(format!(
            "resize target {target_height}x{target_width} has a zero side"
        )));
    }

    let ratio = (width as f64 / target_width as f64).max(height as f64 / target_height as f64);
    let resized_height_f = height as f64 / ratio;
    let resized_width_f = width as f64 / ratio;
    let resized_height = (resized_height_f.floor() as usize).min(target_height);
    let resized_width = (resized_width_f.floor() as usize).min(target_width);
    if resized_height == 0 || resized_width == 0 {
        return Err(GeometryError::invalid_geometry(format!(
            "{height}x{width} image collapses to nothing inside {target_height}x{target_width}"
        )));
    }

    let offset_y = ((target_height as f64 - resized_height_f) / 2.0).floor().max(0.0) as usize;
    let offset_x = ((target_width as f64 - resized_width_f) / 2.0).floor().max(0.0) as usize;

    let mut padded = Array4::<f32>::zeros((batch, target_height, target_width, channels));
    for (image, mut out) in batched.outer_iter().zip(padded.outer_iter_mut()) {
        let resized = resize_bilinear(image, resized_height, resized_width);
        out.slice_mut(s![
            offset_y..offset_y + resized_height,
            offset_x..offset_x + resized_width,
            ..
        ])
        .assign(&resized);
    }

    Ok(padded)
}

/// Extract `boxes` from `image` and resample each to `crop_size` with bilinear sampling
///
/// Box `i` is cut from batch element `box_indices[i]`. For a crop height
/// above one, output row `y` samples source row
/// `y1 * (H - 1) + y * (y2 - y1) * (H - 1) / (crop_height - 1)`; a crop of
/// height one samples the box centre. Columns work the same way. Samples
/// that land outside the image take `extrapolation_value`; samples within
/// rounding distance of an edge are clamped onto it.
///
/// # Errors
/// [`GeometryError::InvalidGeometry`] for a zero crop size or mismatched
/// box/index counts, [`GeometryError::BoxIndexOutOfRange`] for a bad index.
pub fn crop_and_resize(
    image: ArrayView4<'_, f32>,
    boxes: &[CropBox],
    box_indices: &[usize],
    crop_size: (usize, usize),
    extrapolation_value: f32,
) -> Result<Array4<f32>> {
    let (batch, image_height, image_width, channels) = image.dim();
    let (crop_height, crop_width) = crop_size;

    if crop_height == 0 || crop_width == 0 {
        return Err(GeometryError::invalid_geometry(format!(
            "crop size {crop_height}x{crop_width} must be positive"
        )));
    }
    if image_height == 0 || image_width == 0 {
        return Err(GeometryError::invalid_geometry(format!(
            "cannot crop from an empty {image_height}x{image_width} image"
        )));
    }
    if boxes.len() != box_indices.len() {
        return Err(GeometryError::invalid_geometry(format!(
            "{} boxes but {} box indices",
            boxes.len(),
            box_indices.len()
        )));
    }

    let mut crops = Array4::<f32>::from_elem(
        (boxes.len(), crop_height, crop_width, channels),
        extrapolation_value,
    );
    let max_y = image_height as f32 - 1.0;
    let max_x = image_width as f32 - 1.0;

    for (b, (crop_box, &index)) in boxes.iter().zip(box_indices).enumerate() {
        if index >= batch {
            return Err(GeometryError::BoxIndexOutOfRange { index, batch });
        }
        let source = image.index_axis(Axis(0), index);

        let height_scale = if crop_height > 1 {
            (crop_box.y2 - crop_box.y1) * max_y / (crop_height - 1) as f32
        } else {
            0.0
        };
        let width_scale = if crop_width > 1 {
            (crop_box.x2 - crop_box.x1) * max_x / (crop_width - 1) as f32
        } else {
            0.0
        };

        for y in 0..crop_height {
            let in_y = if crop_height > 1 {
                crop_box.y1.mul_add(max_y, y as f32 * height_scale)
            } else {
                0.5 * (crop_box.y1 + crop_box.y2) * max_y
            };
            let Some(in_y) = clamp_to_edge(in_y, max_y) else {
                continue;
            };
            let top_y = in_y.floor() as usize;
            let bottom_y = in_y.ceil() as usize;
            let y_lerp = in_y - in_y.floor();

            for x in 0..crop_width {
                let in_x = if crop_width > 1 {
                    crop_box.x1.mul_add(max_x, x as f32 * width_scale)
                } else {
                    0.5 * (crop_box.x1 + crop_box.x2) * max_x
                };
                let Some(in_x) = clamp_to_edge(in_x, max_x) else {
                    continue;
                };
                let left_x = in_x.floor() as usize;
                let right_x = in_x.ceil() as usize;
                let x_lerp = in_x - in_x.floor();

                for c in 0..channels {
                    let top_left = source[[top_y, left_x, c]];
                    let top_right = source[[top_y, right_x, c]];
                    let bottom_left = source[[bottom_y, left_x, c]];
                    let bottom_right = source[[bottom_y, right_x, c]];

                    let top = (top_right - top_left).mul_add(x_lerp, top_left);
                    let bottom = (bottom_right - bottom_left).mul_add(x_lerp, bottom_left);
                    crops[[b, y, x, c]] = (bottom - top).mul_add(y_lerp, top);
                }
            }
        }
    }

    Ok(crops)
}

fn clamp_to_edge(position: f32, max: f32) -> Option<f32> {
    if position < -EDGE_TOLERANCE || position > max + EDGE_TOLERANCE {
        None
    } else {
        Some(position.clamp(0.0, max))
    }
}

/// Elementwise logistic function
#[must_use]
pub fn sigmoid<S, D>(tensor: &ArrayBase<S, D>) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    tensor.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}
