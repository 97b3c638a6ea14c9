//! Palette quantization: source grid → 320-pixel-wide C64 image.
//!
//! For every output cell the quantizer averages the matching source block
//! ([`average_block`]), picks the closest palette entry under the chosen
//! [`Metric`] ([`Palette::closest`]), and writes that color to two adjacent
//! output pixels. The doubling emulates the wide pixels of the C64
//! multicolor mode.
//!
//! ```text
//!  source (W × H)                output (320 × ceil(320·H/W))
//! ┌────┬────┬──   ─┐           ┌──┬──┬──┬──   ─┐
//! │ bw │    │      │   avg +   │c0│c0│c1│c1    │
//! │×bh │    │  ... │  nearest  ├──┼──┼──┼──   ─┤
//! ├────┼────┼──   ─┤  ───────▶ │  │  │  │      │
//! ```
//!
//! Quantization is pure: the source grid and palette are only read, so
//! [`quantize_all`] runs one task per metric on the rayon pool over the same
//! borrowed source.

use crate::color::{Compatibility, Metric};
use crate::imaging::average::average_block;
use crate::imaging::calculations::{BlockRect, Geometry, LOGICAL_COLUMNS};
use crate::imaging::grid::PixelGrid;
use crate::palette::{PALETTE_SIZE, Palette};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantizeError {
    #[error("Unsupported pixel layout: stride {stride} for width {width} (expected {expected})")]
    UnsupportedLayout {
        width: u32,
        stride: usize,
        expected: usize,
    },
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
    #[error("Degenerate block {0:?}: no pixels to average")]
    DegenerateBlock(BlockRect),
    #[error("A {width}x{height} source would need more than u32::MAX output rows")]
    OutputTooLarge { width: u32, height: u32 },
    #[error("Block {rect:?} extends outside the {width}x{height} source")]
    OutOfBounds {
        rect: BlockRect,
        width: u32,
        height: u32,
    },
}

/// Settings for one conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuantizeOptions {
    pub metric: Metric,
    pub compatibility: Compatibility,
}

/// Result of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantized {
    pub image: PixelGrid,
    /// How many output cells (pixel pairs) use each palette entry.
    pub usage: [u32; PALETTE_SIZE],
}

impl Quantized {
    /// Number of distinct palette colors in the image.
    pub fn colors_used(&self) -> usize {
        self.usage.iter().filter(|&&n| n > 0).count()
    }
}

/// Convert `source` to the palette under one metric.
pub fn quantize(
    source: &PixelGrid,
    palette: &Palette,
    options: QuantizeOptions,
) -> Result<Quantized, QuantizeError> {
    let geometry = Geometry::new(source.width(), source.height())?;
    let mut image = PixelGrid::new(geometry.target_width, geometry.target_height);
    let mut usage = [0u32; PALETTE_SIZE];

    for row in 0..geometry.target_height {
        for column in 0..LOGICAL_COLUMNS {
            let rect = geometry.block_rect(column, row, options.compatibility);
            let sample = average_block(source, rect)?;
            let index = palette.closest(&sample, options.metric, options.compatibility);
            let color = palette.color(index);

            image.set_pixel(column * 2, row, color);
            image.set_pixel(column * 2 + 1, row, color);
            usage[index] += 1;
        }
    }

    Ok(Quantized { image, usage })
}

/// Run [`quantize`] once per metric, in parallel.
///
/// Results come back in the order of `metrics`.
pub fn quantize_all(
    source: &PixelGrid,
    palette: &Palette,
    metrics: &[Metric],
    compatibility: Compatibility,
) -> Vec<(Metric, Result<Quantized, QuantizeError>)> {
    metrics
        .par_iter()
        .map(|&metric| {
            let options = QuantizeOptions {
                metric,
                compatibility,
            };
            (metric, quantize(source, palette, options))
        })
        .collect()
}
