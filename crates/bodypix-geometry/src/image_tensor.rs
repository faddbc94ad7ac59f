//! Bridge from `image` buffers to HWC tensors

use image::RgbImage;
use ndarray::Array3;

/// Convert an RGB image to an HWC `f32` tensor of raw channel values (0-255)
#[must_use]
pub fn rgb_image_to_tensor(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array3::<f32>::zeros((height as usize, width as usize, 3));

    for (y, row) in image.enumerate_rows() {
        for (x, _, pixel) in row {
            array[[y as usize, x as usize, 0]] = f32::from(pixel[0]);
            array[[y as usize, x as usize, 1]] = f32::from(pixel[1]);
            array[[y as usize, x as usize, 2]] = f32::from(pixel[2]);
        }
    }

    array
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn test_rgb_image_to_tensor_layout() {
        let image: RgbImage =
            ImageBuffer::from_fn(4, 2, |x, y| Rgb([x as u8, y as u8, (x + y) as u8]));
        let tensor = rgb_image_to_tensor(&image);

        assert_eq!(tensor.dim(), (2, 4, 3));
        assert_eq!(tensor[[1, 3, 0]], 3.0);
        assert_eq!(tensor[[1, 3, 1]], 1.0);
        assert_eq!(tensor[[1, 3, 2]], 4.0);
    }
}
