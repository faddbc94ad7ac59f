//! Stride-compatible input resolutions
//!
//! A convolutional model with output stride `S` maps an input side of `R`
//! pixels onto an output grid exactly when `(R - 1) mod S == 0`. These helpers
//! test that rule and snap arbitrary sizes onto it.

// Resolutions are small positive pixel counts
#![allow(clippy::cast_possible_truncation)]

use bodypix_common::{GeometryError, Result};

/// Returns true when `resolution` lines up with `output_stride`
///
/// Uses a floor modulo, so the remainder is never negative. The check is
/// done in `i128` and holds for the whole `i64` range.
///
/// # Errors
/// [`GeometryError::ZeroOutputStride`] when `output_stride` is zero.
pub fn is_valid_input_resolution(resolution: i64, output_stride: u32) -> Result<bool> {
    if output_stride == 0 {
        return Err(GeometryError::ZeroOutputStride);
    }
    Ok((i128::from(resolution) - 1).rem_euclid(i128::from(output_stride)) == 0)
}

/// Snap `input_resolution` onto the stride grid with a floor rule
///
/// Already-valid inputs are returned unchanged. Anything else becomes
/// `floor(input_resolution / output_stride) * output_stride + 1`. The result
/// is above the input only when the input lies less than one pixel past a
/// stride multiple (512 -> 513 for stride 16, 256.5 -> 257); every other
/// input is rounded down. Inputs smaller than the stride collapse to `1`.
///
/// # Errors
/// [`GeometryError::ZeroOutputStride`] for a zero stride and
/// [`GeometryError::InvalidGeometry`] for a non-finite input.
pub fn to_valid_input_resolution(input_resolution: f64, output_stride: u32) -> Result<i64> {
    if output_stride == 0 {
        return Err(GeometryError::ZeroOutputStride);
    }
    if !input_resolution.is_finite() {
        return Err(GeometryError::invalid_geometry(format!(
            "input resolution must be finite, got {input_resolution}"
        )));
    }

    let stride = f64::from(output_stride);
    if (input_resolution - 1.0).rem_euclid(stride) == 0.0 {
        return Ok(input_resolution as i64);
    }

    Ok(((input_resolution / stride).floor() * stride + 1.0) as i64)
}

/// Model input `(height, width)` for a source image scaled by `internal_resolution`
///
/// Each side is scaled independently and snapped with
/// [`to_valid_input_resolution`]. The tuple is always `(height, width)`.
///
/// # Errors
/// [`GeometryError::InvalidGeometry`] when `internal_resolution` is not a
/// positive finite number, [`GeometryError::ZeroOutputStride`] for a zero stride.
pub fn to_input_resolution_height_and_width(
    internal_resolution: f64,
    output_stride: u32,
    input_height: u32,
    input_width: u32,
) -> Result<(usize, usize)> {
    if !internal_resolution.is_finite() || internal_resolution <= 0.0 {
        return Err(GeometryError::invalid_geometry(format!(
            "internal resolution must be a positive fraction, got {internal_resolution}"
        )));
    }

    let height = to_valid_input_resolution(
        f64::from(input_height) * internal_resolution,
        output_stride,
    )?;
    let width = to_valid_input_resolution(
        f64::from(input_width) * internal_resolution,
        output_stride,
    )?;

    Ok((to_dimension(height)?, to_dimension(width)?))
}

fn to_dimension(resolution: i64) -> Result<usize> {
    usize::try_from(resolution).map_err(|_| {
        GeometryError::invalid_geometry(format!("resolution {resolution} is not a valid size"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_input_resolution() {
        assert!(is_valid_input_resolution(513, 16).unwrap());
        assert!(is_valid_input_resolution(257, 32).unwrap());
        assert!(is_valid_input_resolution(1, 8).unwrap());
        assert!(!is_valid_input_resolution(500, 16).unwrap());
        assert!(!is_valid_input_resolution(512, 16).unwrap());
    }

    #[test]
    fn test_is_valid_input_resolution_extremes() {
        // i64::MIN - 1 = -2^63 - 1, which is 15 mod 16
        assert!(!is_valid_input_resolution(i64::MIN, 16).unwrap());
        assert!(is_valid_input_resolution(i64::MIN, 1).unwrap());
        assert!(is_valid_input_resolution(i64::MIN + 1, 16).unwrap());
        // i64::MAX - 1 = 2^63 - 2, which is 14 mod 16
        assert!(!is_valid_input_resolution(i64::MAX, 16).unwrap());
        assert!(is_valid_input_resolution(-15, 16).unwrap());
    }

    #[test]
    fn test_zero_stride_is_an_error() {
        assert!(matches!(
            is_valid_input_resolution(513, 0),
            Err(GeometryError::ZeroOutputStride)
        ));
        assert!(matches!(
            to_valid_input_resolution(513.0, 0),
            Err(GeometryError::ZeroOutputStride)
        ));
    }

    #[test]
    fn test_to_valid_input_resolution_rounds_down() {
        assert_eq!(to_valid_input_resolution(500.0, 16).unwrap(), 497);
        assert_eq!(to_valid_input_resolution(513.0, 16).unwrap(), 513);
        assert_eq!(to_valid_input_resolution(511.0, 16).unwrap(), 497);
        assert_eq!(to_valid_input_resolution(514.0, 16).unwrap(), 513);
    }

    #[test]
    fn test_to_valid_input_resolution_stride_multiple() {
        // floor rule on an exact multiple lands one pixel above the input
        assert_eq!(to_valid_input_resolution(512.0, 16).unwrap(), 513);
        assert_eq!(to_valid_input_resolution(256.0, 32).unwrap(), 257);
    }

    #[test]
    fn test_to_valid_input_resolution_below_stride() {
        assert_eq!(to_valid_input_resolution(10.0, 16).unwrap(), 1);
        assert_eq!(to_valid_input_resolution(15.0, 32).unwrap(), 1);
    }

    #[test]
    fn test_to_valid_input_resolution_fractional_input() {
        // 600 * 0.75 = 450 -> floor(450 / 16) * 16 + 1
        assert_eq!(to_valid_input_resolution(600.0 * 0.75, 16).unwrap(), 449);
        assert_eq!(to_valid_input_resolution(256.5, 16).unwrap(), 257);
        assert!(to_valid_input_resolution(f64::NAN, 16).is_err());
    }

    #[test]
    fn test_to_input_resolution_height_and_width() {
        // 500 * 0.5 = 250 -> 241, 700 * 0.5 = 350 -> 337
        assert_eq!(
            to_input_resolution_height_and_width(0.5, 16, 500, 700).unwrap(),
            (241, 337)
        );
        // order is (height, width)
        assert_eq!(
            to_input_resolution_height_and_width(1.0, 16, 513, 257).unwrap(),
            (513, 257)
        );
    }

    #[test]
    fn test_to_input_resolution_rejects_bad_fraction() {
        assert!(to_input_resolution_height_and_width(0.0, 16, 480, 640).is_err());
        assert!(to_input_resolution_height_and_width(-0.5, 16, 480, 640).is_err());
        assert!(to_input_resolution_height_and_width(f64::INFINITY, 16, 480, 640).is_err());
    }
}
