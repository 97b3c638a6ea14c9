//! Color types, color-space conversion, and perceptual distance.
//!
//! | Piece | Where |
//! |---|---|
//! | 8-bit sRGB color | [`Color`] |
//! | CIE L\*a\*b\* / XYZ | [`Lab`], [`Xyz`] |
//! | Conversions | [`space`] |
//! | Distance metrics | [`metric`] ([`Metric`], [`Compatibility`]) |
//!
//! A [`Sample`] carries both the Lab and the RGB form of one color. Block
//! averages and palette entries are compared as samples because the RGB
//! metric works on raw channels while the CIE metrics work on Lab.

pub mod metric;
pub mod space;

pub use metric::{Compatibility, Metric, ParseMetricError};
pub use space::{lab_to_rgb, rgb_to_lab, rgb_to_xyz, xyz_to_lab};

use std::fmt;

/// An 8-bit sRGB color with opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    /// Opaque color from a `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A CIE L\*a\*b\* color (D65).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Chroma, the distance from the neutral axis.
    #[inline]
    pub fn chroma(self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

/// A CIE XYZ tristimulus value, Y scaled to 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One color in both representations the metrics need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub lab: Lab,
    pub rgb: Color,
}

impl Sample {
    pub fn new(lab: Lab, rgb: Color) -> Self {
        Self { lab, rgb }
    }
}

impl From<Color> for Sample {
    fn from(rgb: Color) -> Self {
        Self {
            lab: rgb_to_lab(rgb),
            rgb,
        }
    }
}
