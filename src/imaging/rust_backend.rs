//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::ImageReader` → `to_rgba8` |
//! | Encode → PNG | `image::RgbaImage::save_with_format` |
//!
//! Decoded images are always expanded to RGBA8. The row stride reported by
//! the decoded buffer is checked against `width * 4` before the pixels are
//! handed to the quantizer, which assumes a tightly packed layout.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::grid::PixelGrid;
use image::{ImageFormat, ImageReader, RgbaImage};
use std::path::Path;
use std::sync::LazyLock;

const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the image file extensions that have decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)
}

fn decode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open(path)?
            .into_dimensions()
            .map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<PixelGrid, BackendError> {
        let img = open(path)?.decode().map_err(|e| decode_error(path, e))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let stride = rgba.as_flat_samples().layout.height_stride;
        Ok(PixelGrid::from_raw(width, height, stride, rgba.into_raw())?)
    }

    fn encode(&self, grid: &PixelGrid, path: &Path) -> Result<(), BackendError> {
        let encode_error = |message: String| BackendError::Encode {
            path: path.display().to_string(),
            message,
        };
        let (width, height) = grid.dimensions();
        let img = RgbaImage::from_raw(width, height, grid.as_bytes().to_vec())
            .ok_or_else(|| encode_error("pixel buffer does not match dimensions".to_string()))?;
        img.save_with_format(path, ImageFormat::Png)
            .map_err(|e| encode_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use image::{ImageEncoder, RgbImage};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let backend = RustBackend::new();
        let dims = backend.identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let backend = RustBackend::new();
        let result = backend.identify(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn decode_jpeg_expands_to_opaque_rgba() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 64, 40);

        let grid = RustBackend::new().decode(&path).unwrap();
        assert_eq!(grid.dimensions(), (64, 40));
        assert_eq!(grid.stride(), 64 * 4);
        assert!(grid.row(0).all(|p| p.a == 255));
    }

    #[test]
    fn decode_png_preserves_exact_pixels() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("exact.png");
        let img = RgbaImage::from_fn(3, 2, |x, y| image::Rgba([x as u8 * 80, y as u8 * 90, 7, 200]));
        img.save(&path).unwrap();

        let grid = RustBackend::new().decode(&path).unwrap();
        assert_eq!(grid.pixel(2, 1), Color::new(160, 90, 7, 200));
        assert_eq!(grid.pixel(0, 0), Color::new(0, 0, 7, 200));
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = RustBackend::new().decode(&path).unwrap_err();
        assert!(matches!(err, BackendError::Decode { .. }));
    }

    #[test]
    fn encode_writes_png_that_decodes_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let mut grid = PixelGrid::filled(320, 10, Color::from_hex(0x352879));
        grid.set_pixel(5, 5, Color::from_hex(0xFFFFFF));

        let backend = RustBackend::new();
        backend.encode(&grid, &path).unwrap();

        let back = backend.decode(&path).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn encode_into_missing_directory_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nope").join("out.png");
        let err = RustBackend::new()
            .encode(&PixelGrid::new(2, 2), &path)
            .unwrap_err();
        assert!(matches!(err, BackendError::Encode { .. }));
    }
}
