//! Loader for standard image formats (PNG, JPEG, BMP, TIFF, WebP).
//!
//! Every image is converted to 8-bit RGB; grayscale inputs are promoted by
//! channel replication. The original channel count is kept for reference.

use std::path::Path;

use image::error::{ImageFormatHint, UnsupportedError, UnsupportedErrorKind};
use image::{ImageError, RgbImage};

use crate::error::{AnnotateError, Result};

/// A decoded source image and the path it is known by.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Store key of the image
    pub path: String,
    pub pixels: RgbImage,
    /// Channel count of the file before RGB conversion
    pub channels: u8,
}

impl SourceImage {
    /// Wrap an already decoded RGB image.
    pub fn from_rgb(path: impl Into<String>, pixels: RgbImage) -> Self {
        Self {
            path: path.into(),
            pixels,
            channels: 3,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Check common image magic bytes.
pub fn can_load(data: &[u8]) -> bool {
    if data.len() < 8 {
        return false;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return true;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return true;
    }

    // BMP: 42 4D (BM)
    if data.starts_with(&[0x42, 0x4D]) {
        return true;
    }

    // TIFF: 49 49 2A 00 (little endian) or 4D 4D 00 2A (big endian)
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return true;
    }

    // WebP: RIFF....WEBP
    data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP"
}

/// Decode `data`, known to the store as `path`.
pub fn load_from_bytes(path: &str, data: &[u8]) -> std::result::Result<SourceImage, ImageError> {
    if !can_load(data) {
        return Err(ImageError::Unsupported(
            UnsupportedError::from_format_and_kind(
                ImageFormatHint::Unknown,
                UnsupportedErrorKind::Format(ImageFormatHint::Unknown),
            ),
        ));
    }

    let decoded = image::load_from_memory(data)?;
    let channels = decoded.color().channel_count();
    let pixels = decoded.to_rgb8();

    log::trace!(
        "Loaded {}x{} image with {} channels from {}",
        pixels.width(),
        pixels.height(),
        channels,
        path
    );

    Ok(SourceImage {
        path: path.to_string(),
        pixels,
        channels,
    })
}

/// Read and decode the image at `path`.
pub fn load_image(path: &Path) -> Result<SourceImage> {
    let to_error = |source: ImageError| AnnotateError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };
    let data = std::fs::read(path).map_err(|e| to_error(ImageError::IoError(e)))?;
    let image = load_from_bytes(&path.to_string_lossy(), &data).map_err(to_error)?;
    log::info!(
        "Loaded image {:?} ({}x{})",
        path,
        image.width(),
        image.height()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{GrayImage, ImageFormat, Luma};

    use super::*;

    #[test]
    fn test_magic_detection_png() {
        let png_magic = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(can_load(&png_magic));
    }

    #[test]
    fn test_magic_detection_jpeg() {
        let jpeg_magic = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert!(can_load(&jpeg_magic));
    }

    #[test]
    fn test_magic_detection_webp() {
        assert!(can_load(b"RIFF\x10\x00\x00\x00WEBPVP8 "));
        assert!(!can_load(b"RIFF\x10\x00\x00\x00WAVEfmt "));
    }

    #[test]
    fn test_magic_detection_invalid() {
        let random_data = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        assert!(!can_load(&random_data));
        assert!(load_from_bytes("x.bin", &random_data).is_err());
    }

    #[test]
    fn test_grayscale_is_promoted() {
        let gray = GrayImage::from_pixel(4, 3, Luma([90]));
        let mut bytes = Vec::new();
        gray.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let image = load_from_bytes("gray.png", &bytes).unwrap();
        assert_eq!(image.channels, 1);
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.pixels.get_pixel(2, 1).0, [90, 90, 90]);
    }

    #[test]
    fn test_missing_file_is_image_load_error() {
        let path = std::env::temp_dir().join("segannot_does_not_exist.png");
        assert!(matches!(
            load_image(&path),
            Err(AnnotateError::ImageLoad { .. })
        ));
    }
}
