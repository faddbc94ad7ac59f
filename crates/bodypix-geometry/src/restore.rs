//! Mapping model outputs back onto the unpadded source image
//!
//! A model sees the source image letterboxed to its input size. These
//! functions undo that: they cut the padding back out of a tensor and
//! resample what is left to the source `(height, width)`.

// Intentional ML conversions: image dimensions to normalized coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

use crate::resize::{crop_and_resize, resize_with_pad, sigmoid, to_batched_view, CropBox};
use bodypix_common::{GeometryError, Result};
use ndarray::{Array3, ArrayBase, Axis, Data, Dimension};
use tracing::debug;

/// Normalized box selecting the unpadded region of a padded image
///
/// The padded image is `H' = original_height + pad_t + pad_b` by
/// `W' = original_width + pad_l + pad_r`, and the box is
/// `[pad_t / (H' - 1), pad_l / (W' - 1), (pad_t + original_height - 1) / (H' - 1), (pad_l + original_width - 1) / (W' - 1)]`.
///
/// # Errors
/// [`GeometryError::InvalidGeometry`] for a zero original side, or when a
/// padded side is a single pixel.
pub fn unpadded_crop_box(
    original_height: usize,
    original_width: usize,
    pad_t: usize,
    pad_b: usize,
    pad_l: usize,
    pad_r: usize,
) -> Result<CropBox> {
    if original_height == 0 || original_width == 0 {
        return Err(GeometryError::invalid_geometry(format!(
            "original size {original_height}x{original_width} has a zero side"
        )));
    }

    let padded_height = original_height + pad_t + pad_b;
    let padded_width = original_width + pad_l + pad_r;
    if padded_height == 1 || padded_width == 1 {
        return Err(GeometryError::invalid_geometry(format!(
            "padded size {padded_height}x{padded_width} has a single-pixel side"
        )));
    }

    let y_extent = (padded_height - 1) as f64;
    let x_extent = (padded_width - 1) as f64;

    Ok(CropBox::new(
        (pad_t as f64 / y_extent) as f32,
        (pad_l as f64 / x_extent) as f32,
        ((pad_t + original_height - 1) as f64 / y_extent) as f32,
        ((pad_l + original_width - 1) as f64 / x_extent) as f32,
    ))
}

/// Cut the padding out of `resized_and_padded` and resize back to the original size
///
/// The input is NHWC (or HWC, read as a batch of one) and only batch element
/// 0 is used. The result is HWC with shape
/// `(original_height, original_width, channels)`.
///
/// # Errors
/// [`GeometryError::UnsupportedRank`] for tensors that are not rank 3 or 4,
/// [`GeometryError::EmptyBatch`] for an empty batch, and the degenerate
/// geometry errors of [`unpadded_crop_box`].
pub fn remove_padding_and_resize_back<S, D>(
    resized_and_padded: &ArrayBase<S, D>,
    original_height: usize,
    original_width: usize,
    pad_t: usize,
    pad_b: usize,
    pad_l: usize,
    pad_r: usize,
) -> Result<Array3<f32>>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let batched = to_batched_view(resized_and_padded)?;
    if batched.len_of(Axis(0)) == 0 {
        return Err(GeometryError::EmptyBatch);
    }

    let crop_box = unpadded_crop_box(original_height, original_width, pad_t, pad_b, pad_l, pad_r)?;
    let crops = crop_and_resize(
        batched,
        &[crop_box],
        &[0],
        (original_height, original_width),
        0.0,
    )?;

    Ok(crops.index_axis_move(Axis(0), 0))
}

/// Letterbox `tensor` to the input size, optionally apply a sigmoid, then strip the padding
///
/// `tensor` is typically a model's low-resolution logits (HWC or NHWC). The
/// padding quadruple should describe the letterbox applied upstream; it is
/// not checked against the tensor, and a mismatch shifts the output.
///
/// # Errors
/// Propagates the errors of [`resize_with_pad`] and
/// [`remove_padding_and_resize_back`].
pub fn scale_and_crop_to_input_tensor_shape<S, D>(
    tensor: &ArrayBase<S, D>,
    input_tensor_height: usize,
    input_tensor_width: usize,
    pad_t: usize,
    pad_b: usize,
    pad_l: usize,
    pad_r: usize,
    apply_sigmoid_activation: bool,
) -> Result<Array3<f32>>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let mut in_resized_and_padded =
        resize_with_pad(tensor, input_tensor_height, input_tensor_width)?;
    debug!(
        "Resized {:?} to {:?} with padding",
        tensor.shape(),
        in_resized_and_padded.shape()
    );

    if apply_sigmoid_activation {
        in_resized_and_padded = sigmoid(&in_resized_and_padded);
    }

    let restored = remove_padding_and_resize_back(
        &in_resized_and_padded,
        input_tensor_height,
        input_tensor_width,
        pad_t,
        pad_b,
        pad_l,
        pad_r,
    )?;
    debug!(
        "Removed padding (t={}, b={}, l={}, r={}) -> {:?}",
        pad_t,
        pad_b,
        pad_l,
        pad_r,
        restored.shape()
    );

    Ok(restored)
}
