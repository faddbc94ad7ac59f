//! Letterbox padding to a target aspect ratio

// Intentional conversions: image dimensions and rounded pixel counts
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use bodypix_common::{GeometryError, Result};
use ndarray::{ArrayBase, Dimension, RawData};
use serde::{Deserialize, Serialize};

/// Pixels of padding on each side of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Padding {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Padding {
    #[must_use]
    pub const fn new(top: usize, bottom: usize, left: usize, right: usize) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// True when no side is padded
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.top == 0 && self.bottom == 0 && self.left == 0 && self.right == 0
    }

    /// Total padding added to the height
    #[must_use]
    pub const fn vertical(&self) -> usize {
        self.top + self.bottom
    }

    /// Total padding added to the width
    #[must_use]
    pub const fn horizontal(&self) -> usize {
        self.left + self.right
    }

    /// `(height, width)` of an image of the given size once padded
    #[must_use]
    pub const fn padded_dims(&self, height: usize, width: usize) -> (usize, usize) {
        (height + self.vertical(), width + self.horizontal())
    }
}

impl From<(usize, usize, usize, usize)> for Padding {
    fn from((top, bottom, left, right): (usize, usize, usize, usize)) -> Self {
        Self::new(top, bottom, left, right)
    }
}

impl From<Padding> for (usize, usize, usize, usize) {
    fn from(padding: Padding) -> Self {
        (padding.top, padding.bottom, padding.left, padding.right)
    }
}

/// Symmetric padding that gives `input_tensor` the aspect ratio of `target_h x target_w`
///
/// Height and width are read from the first two axes of the tensor, so an
/// HWC image works directly. Only one axis pair is ever padded: left/right
/// when the image is narrower than the target, top/bottom otherwise.
///
/// # Errors
/// [`GeometryError::UnsupportedRank`] for tensors with fewer than two axes,
/// otherwise see [`calc_padding_for_dims`].
pub fn calc_padding<S, D>(
    input_tensor: &ArrayBase<S, D>,
    target_h: usize,
    target_w: usize,
) -> Result<Padding>
where
    S: RawData,
    D: Dimension,
{
    let shape = input_tensor.shape();
    if shape.len() < 2 {
        return Err(GeometryError::UnsupportedRank {
            expected: "at least 2",
            actual: shape.len(),
        });
    }
    calc_padding_for_dims(shape[0], shape[1], target_h, target_w)
}

/// [`calc_padding`] on bare `(height, width)` dimensions
///
/// Each padding amount is `0.5 * deficit` rounded half to even, so a deficit
/// of 5 pixels pads 2 on each side and a deficit of 7 pads 4.
///
/// # Errors
/// [`GeometryError::InvalidGeometry`] when `height`, `target_h` or
/// `target_w` is zero.
pub fn calc_padding_for_dims(
    height: usize,
    width: usize,
    target_h: usize,
    target_w: usize,
) -> Result<Padding> {
    if height == 0 {
        return Err(GeometryError::invalid_geometry(
            "cannot compute padding for an image of height 0",
        ));
    }
    if target_h == 0 || target_w == 0 {
        return Err(GeometryError::invalid_geometry(format!(
            "target size {target_h}x{target_w} has a zero side"
        )));
    }

    let (height, width) = (height as f64, width as f64);
    let target_aspect = target_w as f64 / target_h as f64;
    let aspect = width / height;

    if aspect < target_aspect {
        let pad = half_round(target_aspect * height - width);
        Ok(Padding::new(0, 0, pad, pad))
    } else {
        let pad = half_round((1.0 / target_aspect) * width - height);
        Ok(Padding::new(pad, pad, 0, 0))
    }
}

fn half_round(deficit: f64) -> usize {
    (0.5 * deficit).round_ties_even().max(0.0) as usize
}
