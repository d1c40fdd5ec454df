use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use log::debug;

use crate::error::Result;

/// Decode raw bytes in any format the enabled codecs understand.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(data)?;
    debug!(
        "Decoded {}x{} image, color type {:?}",
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

/// Bring any decoded image to 8-bit RGB. Grayscale, alpha, paletted (already
/// expanded by the decoder) and high bit-depth inputs are converted.
pub fn normalize(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => {
            debug!("Converting {:?} image to Rgb8", other.color());
            other.to_rgb8()
        }
    }
}

/// Center-crop the largest square and scale it to `size x size`.
///
/// Cropping happens on the source pixels, so memory stays bounded by the
/// decoded image however elongated it is.
pub fn center_square(rgb: &RgbImage, size: u32) -> RgbImage {
    let (w, h) = rgb.dimensions();
    let side = w.min(h);
    let square = imageops::crop_imm(rgb, (w - side) / 2, (h - side) / 2, side, side).to_image();

    imageops::resize(&square, size, size, FilterType::Triangle)
}

/// Flatten to NHWC floats in `[0, 1]`.
pub fn to_values(rgb: &RgbImage) -> Vec<f32> {
    rgb.as_raw().iter().map(|x| *x as f32 / 255f32).collect()
}

pub fn to_input(rgb: &RgbImage, size: u32) -> Vec<f32> {
    to_values(&center_square(rgb, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, GrayImage, ImageFormat, Luma, LumaA, Rgb, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn decodes_png_and_keeps_dimensions() {
        let rgb = RgbImage::from_pixel(7, 5, Rgb([10, 20, 30]));
        let decoded = decode(&png_bytes(DynamicImage::ImageRgb8(rgb))).unwrap();

        assert_eq!((decoded.width(), decoded.height()), (7, 5));
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(decode(b"definitely not an image").is_err());
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn rejects_truncated_png() {
        let bytes = png_bytes(DynamicImage::ImageRgb8(RgbImage::new(32, 32)));
        assert!(decode(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn grayscale_becomes_rgb() {
        let gray = GrayImage::from_pixel(4, 4, Luma([200]));
        let rgb = normalize(DynamicImage::ImageLuma8(gray));

        assert_eq!(rgb.get_pixel(0, 0), &Rgb([200, 200, 200]));
    }

    #[test]
    fn alpha_channel_is_dropped() {
        let rgba = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 0]));
        let rgb = normalize(DynamicImage::ImageRgba8(rgba));
        assert_eq!(rgb.get_pixel(2, 2), &Rgb([1, 2, 3]));

        let la = GrayAlphaImage::from_pixel(3, 3, LumaA([9, 128]));
        let rgb = normalize(DynamicImage::ImageLumaA8(la));
        assert_eq!(rgb.get_pixel(1, 1), &Rgb([9, 9, 9]));
    }

    #[test]
    fn input_is_square_and_scaled() {
        let rgb = RgbImage::from_pixel(40, 20, Rgb([255, 0, 51]));
        let input = to_input(&rgb, 8);

        assert_eq!(input.len(), 8 * 8 * 3);
        assert!((input[0] - 1.0).abs() < 1e-6);
        assert!(input[1].abs() < 1e-6);
        assert!((input[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn elongated_image_stays_bounded() {
        let strip = RgbImage::from_pixel(1, 4000, Rgb([0, 255, 0]));
        let square = center_square(&strip, 224);
        assert_eq!(square.dimensions(), (224, 224));

        let input = to_input(&strip, 224);
        assert_eq!(input.len(), 224 * 224 * 3);
        assert!((input[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn input_crops_the_center() {
        // Left and right thirds are black, middle third is white.
        let rgb = RgbImage::from_fn(60, 20, |x, _| {
            if (20..40).contains(&x) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let input = to_input(&rgb, 10);

        assert_eq!(input.len(), 10 * 10 * 3);
        let center = (5 * 10 + 5) * 3;
        assert!((input[center] - 1.0).abs() < 1e-6);
        assert!(input.iter().all(|v| *v > 0.5));
    }
}
