//! Pure geometry for the downsampling grid.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! The C64 multicolor bitmap mode is 160 logical columns wide, each column
//! two physical pixels. Output images are therefore always [`TARGET_WIDTH`]
//! (320) pixels wide but sampled at [`LOGICAL_COLUMNS`] (160) blocks per row.
//!
//! Block sizes use integer division, so when the source is not an exact
//! multiple of the block count the right and bottom edges are not sampled.

use crate::color::Compatibility;
use crate::quantize::QuantizeError;

/// Width of every output image, in pixels.
pub const TARGET_WIDTH: u32 = 320;

/// Number of sampled columns per row; each fills two output pixels.
pub const LOGICAL_COLUMNS: u32 = TARGET_WIDTH / 2;

/// Output height for a source of `width × height`: `ceil(320 / (W/H))`.
///
/// Evaluated as `ceil(320·H / W)` in integers so that exact ratios never pick
/// up a floating-point remainder.
///
/// # Examples
/// ```
/// # use c64image::imaging::calculations::target_height;
/// assert_eq!(target_height(640, 400), Ok(200));
/// assert_eq!(target_height(1000, 333), Ok(107));
/// ```
///
/// Fails when the result does not fit in a `u32`, which only happens for
/// sources more than 13 million times taller than wide.
pub fn target_height(width: u32, height: u32) -> Result<u32, QuantizeError> {
    debug_assert!(width > 0);
    let rows = (TARGET_WIDTH as u64 * height as u64).div_ceil(width as u64);
    u32::try_from(rows).map_err(|_| QuantizeError::OutputTooLarge { width, height })
}

/// A half-open pixel rectangle `[x0, x1) × [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl BlockRect {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Clamp to a `width × height` grid, keeping at least one pixel.
    ///
    /// The grid itself must not be empty.
    pub fn clamp_to(self, width: u32, height: u32) -> Self {
        debug_assert!(width > 0 && height > 0);
        let x0 = self.x0.min(width - 1);
        let y0 = self.y0.min(height - 1);
        let x1 = self.x1.min(width).max(x0 + 1);
        let y1 = self.y1.min(height).max(y0 + 1);
        Self { x0, y0, x1, y1 }
    }
}

/// Sizes derived from one source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub source_width: u32,
    pub source_height: u32,
    pub target_width: u32,
    pub target_height: u32,
    /// Source pixels per logical column (at least 1).
    pub block_width: u32,
    /// Source pixels per output row (at least 1).
    pub block_height: u32,
}

impl Geometry {
    /// Compute the downsampling grid for a `width × height` source.
    ///
    /// Sources narrower than 160 pixels or shorter than the target height get
    /// one-pixel blocks; neighbouring output cells then resample the same
    /// edge pixels.
    pub fn new(width: u32, height: u32) -> Result<Self, QuantizeError> {
        if width == 0 || height == 0 {
            return Err(QuantizeError::DegenerateBlock(BlockRect::new(
                0, 0, width, height,
            )));
        }
        let target_height = target_height(width, height)?;
        Ok(Self {
            source_width: width,
            source_height: height,
            target_width: TARGET_WIDTH,
            target_height,
            block_width: (width / LOGICAL_COLUMNS).max(1),
            block_height: (height / target_height).max(1),
        })
    }

    pub fn target_dimensions(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Source rectangle sampled for logical column `column`, output row `row`.
    ///
    /// In [`Compatibility::Legacy`] the right and bottom edges are pulled in
    /// by one pixel, as earlier releases did. The result is clamped to the
    /// source and never empty.
    pub fn block_rect(&self, column: u32, row: u32, compat: Compatibility) -> BlockRect {
        block_rect(column, row, (self.block_width, self.block_height), compat)
            .clamp_to(self.source_width, self.source_height)
    }
}

/// Unclamped source rectangle for one output cell.
pub fn block_rect(
    column: u32,
    row: u32,
    block: (u32, u32),
    compat: Compatibility,
) -> BlockRect {
    let (bw, bh) = block;
    let inset = match compat {
        Compatibility::Corrected => 0,
        Compatibility::Legacy => 1,
    };
    BlockRect {
        x0: column * bw,
        y0: row * bh,
        x1: ((column + 1) * bw).saturating_sub(inset),
        y1: ((row + 1) * bh).saturating_sub(inset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // target_height
    // =========================================================================

    #[test]
    fn target_height_exact_ratios() {
        assert_eq!(target_height(640, 400), Ok(200));
        assert_eq!(target_height(640, 480), Ok(240));
        assert_eq!(target_height(320, 320), Ok(320));
        assert_eq!(target_height(1920, 1080), Ok(180));
    }

    #[test]
    fn target_height_rounds_up() {
        // 320 * 333 / 1000 = 106.56
        assert_eq!(target_height(1000, 333), Ok(107));
        // 320 * 1 / 3 = 106.67
        assert_eq!(target_height(3, 1), Ok(107));
    }

    #[test]
    fn target_height_portrait() {
        assert_eq!(target_height(400, 800), Ok(640));
    }

    #[test]
    fn target_height_tiny_height_is_at_least_one() {
        assert_eq!(target_height(10_000, 1), Ok(1));
    }

    #[test]
    fn target_height_overflow_is_an_error() {
        // 320 * 20_000_000 exceeds u32::MAX
        assert_eq!(
            target_height(1, 20_000_000),
            Err(QuantizeError::OutputTooLarge {
                width: 1,
                height: 20_000_000
            })
        );
        assert!(Geometry::new(1, u32::MAX).is_err());
        // Largest height that still fits
        assert_eq!(target_height(1, u32::MAX / 320), Ok(u32::MAX / 320 * 320));
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    #[test]
    fn geometry_for_exact_multiple() {
        let g = Geometry::new(640, 400).unwrap();
        assert_eq!(g.target_dimensions(), (320, 200));
        assert_eq!(g.block_width, 4);
        assert_eq!(g.block_height, 2);
    }

    #[test]
    fn geometry_truncates_block_size() {
        // 1000 / 160 = 6.25, 750 / 240 = 3.125
        let g = Geometry::new(1000, 750).unwrap();
        assert_eq!(g.target_height, 240);
        assert_eq!(g.block_width, 6);
        assert_eq!(g.block_height, 3);
    }

    #[test]
    fn geometry_small_source_gets_unit_blocks() {
        let g = Geometry::new(40, 25).unwrap();
        assert_eq!(g.target_height, 200);
        assert_eq!(g.block_width, 1);
        assert_eq!(g.block_height, 1);
    }

    #[test]
    fn geometry_rejects_empty_source() {
        assert!(matches!(
            Geometry::new(0, 100),
            Err(QuantizeError::DegenerateBlock(_))
        ));
        assert!(matches!(
            Geometry::new(100, 0),
            Err(QuantizeError::DegenerateBlock(_))
        ));
    }

    // =========================================================================
    // Block rectangles
    // =========================================================================

    #[test]
    fn corrected_blocks_tile_the_source() {
        let r = block_rect(2, 3, (4, 2), Compatibility::Corrected);
        assert_eq!(r, BlockRect::new(8, 6, 12, 8));
        assert_eq!(r.area(), 8);
    }

    #[test]
    fn legacy_blocks_are_inset_by_one() {
        let r = block_rect(2, 3, (4, 2), Compatibility::Legacy);
        assert_eq!(r, BlockRect::new(8, 6, 11, 7));
    }

    #[test]
    fn legacy_unit_blocks_are_empty_before_clamping() {
        let r = block_rect(5, 5, (1, 1), Compatibility::Legacy);
        assert!(r.is_empty());
        let clamped = r.clamp_to(100, 100);
        assert_eq!(clamped, BlockRect::new(5, 5, 6, 6));
    }

    #[test]
    fn clamp_pulls_rect_inside_grid() {
        let r = BlockRect::new(98, 40, 104, 60).clamp_to(100, 50);
        assert_eq!(r, BlockRect::new(98, 40, 100, 50));
    }

    #[test]
    fn clamp_rect_fully_outside_keeps_last_pixel() {
        let r = BlockRect::new(120, 70, 130, 80).clamp_to(100, 50);
        assert_eq!(r, BlockRect::new(99, 49, 100, 50));
        assert_eq!(r.area(), 1);
    }

    #[test]
    fn geometry_block_rect_stays_in_bounds() {
        let g = Geometry::new(170, 90).unwrap();
        for compat in [Compatibility::Corrected, Compatibility::Legacy] {
            for row in 0..g.target_height {
                for column in 0..LOGICAL_COLUMNS {
                    let r = g.block_rect(column, row, compat);
                    assert!(!r.is_empty());
                    assert!(r.x1 <= 170 && r.y1 <= 90, "{r:?}");
                }
            }
        }
    }

    #[test]
    fn empty_rect_dimensions_saturate() {
        let r = BlockRect::new(10, 10, 5, 5);
        assert_eq!(r.width(), 0);
        assert_eq!(r.height(), 0);
        assert!(r.is_empty());
    }
}
