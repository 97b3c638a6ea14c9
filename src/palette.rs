//! The Commodore 64 palette and nearest-color search.
//!
//! Colors follow the measurements published at
//! <http://hitmen.c02.at/temp/palstuff/>. The table is a `const`; the
//! L\*a\*b\* form of every entry is computed once when a [`Palette`] is built
//! and reused for every comparison afterwards. [`c64`] returns a
//! process-wide instance that every conversion shares.

use crate::color::{Color, Compatibility, Metric, Sample};
use std::sync::LazyLock;

/// Number of entries in the palette.
pub const PALETTE_SIZE: usize = 16;

/// The 16 C64 colors, in hardware index order.
pub const C64_COLORS: [Color; PALETTE_SIZE] = [
    Color::from_hex(0x000000), //  0 - black
    Color::from_hex(0xFFFFFF), //  1 - white
    Color::from_hex(0x67372B), //  2 - red
    Color::from_hex(0x6FA3B1), //  3 - cyan
    Color::from_hex(0x6F3C85), //  4 - purple
    Color::from_hex(0x588C43), //  5 - green
    Color::from_hex(0x342879), //  6 - blue
    Color::from_hex(0xB7C66E), //  7 - yellow
    Color::from_hex(0x6F4F25), //  8 - orange
    Color::from_hex(0x423900), //  9 - brown
    Color::from_hex(0x996659), // 10 - light red
    Color::from_hex(0x434343), // 11 - dark grey
    Color::from_hex(0x6B6B6B), // 12 - grey
    Color::from_hex(0x9AD183), // 13 - light green
    Color::from_hex(0x6B5EB4), // 14 - light blue
    Color::from_hex(0x959595), // 15 - light grey
];

/// Display names, indexed like [`C64_COLORS`].
pub const C64_COLOR_NAMES: [&str; PALETTE_SIZE] = [
    "black",
    "white",
    "red",
    "cyan",
    "purple",
    "green",
    "blue",
    "yellow",
    "orange",
    "brown",
    "light red",
    "dark grey",
    "grey",
    "light green",
    "light blue",
    "light grey",
];

static C64_PALETTE: LazyLock<Palette> = LazyLock::new(Palette::c64);

/// Shared C64 palette with its Lab values already computed.
pub fn c64() -> &'static Palette {
    &C64_PALETTE
}

/// A 16-color palette with cached L\*a\*b\* values.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: [Sample; PALETTE_SIZE],
}

impl Palette {
    pub fn new(colors: [Color; PALETTE_SIZE]) -> Self {
        Self {
            entries: colors.map(Sample::from),
        }
    }

    pub fn c64() -> Self {
        Self::new(C64_COLORS)
    }

    /// RGB color at `index`.
    ///
    /// # Panics
    /// If `index >= 16`.
    pub fn color(&self, index: usize) -> Color {
        self.entries[index].rgb
    }

    /// Cached sample (Lab + RGB) at `index`.
    pub fn sample(&self, index: usize) -> &Sample {
        &self.entries[index]
    }

    pub fn len(&self) -> usize {
        PALETTE_SIZE
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Distance from palette entry `index` to `sample`.
    #[inline]
    pub fn distance(
        &self,
        index: usize,
        sample: &Sample,
        metric: Metric,
        compat: Compatibility,
    ) -> f64 {
        // The sample is the reference color, which matters for the
        // asymmetric CIE94 weights.
        metric.distance(sample, &self.entries[index], compat)
    }

    /// Index of the entry closest to `sample`.
    ///
    /// Ties go to the lowest index. A NaN distance never wins, so the result
    /// is always a valid index.
    pub fn closest(&self, sample: &Sample, metric: Metric, compat: Compatibility) -> usize {
        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;
        for index in 0..PALETTE_SIZE {
            let d = self.distance(index, sample, metric, compat);
            if d < best_distance {
                best_index = index;
                best_distance = d;
            }
        }
        best_index
    }
}
