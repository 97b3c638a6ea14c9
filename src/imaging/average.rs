//! Block averaging.
//!
//! Reduces a rectangle of source pixels to one [`Sample`]: the mean of the
//! pixels' L\*a\*b\* values and, separately, the mean of their raw RGB
//! channels. The RGB metric compares the RGB mean; the CIE metrics compare
//! the Lab mean. Averaging in Lab rather than converting the RGB mean keeps
//! the Lab result perceptual.

use super::calculations::BlockRect;
use super::grid::PixelGrid;
use crate::color::{Color, Lab, Sample, rgb_to_lab};
use crate::quantize::QuantizeError;

/// Average every pixel in `rect`.
///
/// The RGB mean is truncated to whole 8-bit values and is fully opaque.
/// `rect` must be non-empty and lie inside `grid`.
pub fn average_block(grid: &PixelGrid, rect: BlockRect) -> Result<Sample, QuantizeError> {
    if rect.is_empty() {
        return Err(QuantizeError::DegenerateBlock(rect));
    }
    if rect.x1 > grid.width() || rect.y1 > grid.height() {
        return Err(QuantizeError::OutOfBounds {
            rect,
            width: grid.width(),
            height: grid.height(),
        });
    }

    let mut lab_sum = Lab::default();
    let mut rgb_sum = [0u64; 3];

    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            let color = grid.pixel(x, y);
            let lab = rgb_to_lab(color);
            lab_sum.l += lab.l;
            lab_sum.a += lab.a;
            lab_sum.b += lab.b;

            rgb_sum[0] += color.r as u64;
            rgb_sum[1] += color.g as u64;
            rgb_sum[2] += color.b as u64;
        }
    }

    let count = rect.area();
    let n = count as f64;
    let lab = Lab::new(lab_sum.l / n, lab_sum.a / n, lab_sum.b / n);
    let rgb = Color::rgb(
        (rgb_sum[0] / count) as u8,
        (rgb_sum[1] / count) as u8,
        (rgb_sum[2] / count) as u8,
    );
    Ok(Sample::new(lab, rgb))
}
