//! services/api/src/imaging.rs
//!
//! Validation and preprocessing of uploaded part photos before they are searched
//! on or sent to the vision model.

use image::{imageops::FilterType, DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Images must be strictly larger than this in both dimensions.
pub const MIN_DIMENSION: u32 = 10;
/// Longest side sent to the vision model.
pub const MAX_DIMENSION: u32 = 1024;

const ALLOWED_FORMATS: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Unsupported image format; use JPG, PNG or WEBP")]
    UnsupportedFormat,
    #[error("Image could not be decoded: {0}")]
    Undecodable(String),
    #[error("Image is too small ({0}x{1})")]
    TooSmall(u32, u32),
    #[error("Image could not be encoded: {0}")]
    Encode(String),
}

/// A decoded upload that passed validation.
pub struct ValidImage {
    pub format: ImageFormat,
    pub image: DynamicImage,
}

/// Decodes the bytes and checks the format allow-list and minimum size.
pub fn validate_image(bytes: &[u8]) -> Result<ValidImage, ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Undecodable(e.to_string()))?;

    let format = reader
        .format()
        .filter(|f| ALLOWED_FORMATS.contains(f))
        .ok_or(ImageError::UnsupportedFormat)?;

    let image = reader
        .decode()
        .map_err(|e| ImageError::Undecodable(e.to_string()))?;

    let (width, height) = (image.width(), image.height());
    if width <= MIN_DIMENSION || height <= MIN_DIMENSION {
        return Err(ImageError::TooSmall(width, height));
    }

    Ok(ValidImage { format, image })
}

/// Validates, shrinks to fit the bounding box, converts to RGB and re-encodes as JPEG.
pub fn prepare_for_vision(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let ValidImage { image, .. } = validate_image(bytes)?;

    let image = if image.width() > MAX_DIMENSION || image.height() > MAX_DIMENSION {
        image.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Triangle)
    } else {
        image
    };
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Passes through a JPEG that already fits the bounding box, reading only its
/// header. Anything else goes through `prepare_for_vision`.
pub fn into_vision_ready(bytes: Vec<u8>) -> Result<Vec<u8>, ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| ImageError::Undecodable(e.to_string()))?;

    if reader.format() == Some(ImageFormat::Jpeg) {
        if let Ok((width, height)) = reader.into_dimensions() {
            let fits = |side: u32| side > MIN_DIMENSION && side <= MAX_DIMENSION;
            if fits(width) && fits(height) {
                return Ok(bytes);
            }
        }
    }
    prepare_for_vision(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let buffer = ImageBuffer::from_pixel(width, height, Rgba([200u8, 30, 30, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(buffer)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn accepts_reasonable_png() {
        let valid = validate_image(&png_bytes(64, 32)).unwrap();
        assert_eq!(valid.format, ImageFormat::Png);
        assert_eq!(valid.image.width(), 64);
    }

    #[test]
    fn rejects_tiny_images() {
        assert!(matches!(
            validate_image(&png_bytes(10, 200)),
            Err(ImageError::TooSmall(10, 200))
        ));
    }

    #[test]
    fn rejects_non_images() {
        assert!(validate_image(b"definitely not a picture").is_err());
    }

    #[test]
    fn vision_copy_is_bounded_rgb_jpeg() {
        let prepared = prepare_for_vision(&png_bytes(2048, 512)).unwrap();
        let decoded = image::load_from_memory(&prepared).unwrap();
        assert_eq!(
            image::guess_format(&prepared).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(decoded.width(), MAX_DIMENSION);
        assert_eq!(decoded.height(), 256);
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn prepared_jpeg_is_passed_through() {
        let prepared = prepare_for_vision(&png_bytes(300, 200)).unwrap();
        let ready = into_vision_ready(prepared.clone()).unwrap();
        assert_eq!(ready, prepared);

        let from_png = into_vision_ready(png_bytes(300, 200)).unwrap();
        assert_eq!(image::guess_format(&from_png).unwrap(), ImageFormat::Jpeg);
    }
}
