//! Shared test utilities for the c64image test suite.
//!
//! Provides synthetic source grids, on-disk fixture writers, and assertions
//! about the shape of converted images.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = uniform_grid(640, 400, Color::rgb(10, 20, 30));
//! let out = quantize(&source, c64(), QuantizeOptions::default()).unwrap();
//!
//! assert_doubled(&out.image);
//! assert_uniform(&out.image, C64_COLORS[0]);
//! ```

use std::path::Path;

use crate::color::Color;
use crate::imaging::grid::PixelGrid;
use crate::scan::SourceImage;

// =========================================================================
// Grid builders
// =========================================================================

/// A `width × height` grid filled with one color.
pub fn uniform_grid(width: u32, height: u32, color: Color) -> PixelGrid {
    PixelGrid::filled(width, height, color)
}

/// A grid with a smooth red/green gradient across and blue down.
///
/// Covers many palette entries, so conversions exercise real decisions.
pub fn gradient_grid(width: u32, height: u32) -> PixelGrid {
    let mut grid = PixelGrid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            let g = 255 - r;
            let b = (y * 255 / height.max(1)) as u8;
            grid.set_pixel(x, y, Color::rgb(r, g, b));
        }
    }
    grid
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `grid` as a PNG at `path`, creating parent directories.
pub fn write_png(path: &Path, grid: &PixelGrid) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let (width, height) = grid.dimensions();
    image::RgbaImage::from_raw(width, height, grid.as_bytes().to_vec())
        .unwrap()
        .save(path)
        .unwrap();
}

/// A [`SourceImage`] at the root of a scan, for driving `process` directly.
pub fn source_image(path: &Path) -> SourceImage {
    SourceImage {
        path: path.to_path_buf(),
        relative_dir: Default::default(),
        stem: path.file_stem().unwrap().to_string_lossy().into_owned(),
    }
}

// =========================================================================
// Output assertions: panic with a clear message on mismatch
// =========================================================================

/// Assert every pixel of `grid` is `color`.
pub fn assert_uniform(grid: &PixelGrid, color: Color) {
    for y in 0..grid.height() {
        for (x, pixel) in grid.row(y).enumerate() {
            assert_eq!(pixel, color, "pixel ({x}, {y}) is {pixel}, expected {color}");
        }
    }
}

/// Assert every even-indexed pixel equals the odd pixel to its right.
pub fn assert_doubled(grid: &PixelGrid) {
    assert_eq!(grid.width() % 2, 0, "odd width {}", grid.width());
    for y in 0..grid.height() {
        let row: Vec<Color> = grid.row(y).collect();
        for (pair, cells) in row.chunks_exact(2).enumerate() {
            assert_eq!(
                cells[0],
                cells[1],
                "row {y}: pixels {} and {} differ",
                pair * 2,
                pair * 2 + 1
            );
        }
    }
}
