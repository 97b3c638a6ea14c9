//! sRGB ↔ CIE XYZ ↔ CIE L\*a\*b\* conversion.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## Conventions
//!
//! | Space | Range | Notes |
//! |---|---|---|
//! | sRGB | 0–255 per channel | gamma-encoded, 8 bits |
//! | XYZ | 0–100 (Y) | D65 white, 2° observer |
//! | L\*a\*b\* | L 0–100, a/b roughly ±128 | relative to D65 |
//!
//! The forward path (`rgb_to_lab`) is what the quantizer uses. The inverse
//! path (`lab_to_rgb`) exists so averaged Lab values can be inspected as
//! colors and so the conversion can be checked for round-trip accuracy.

use super::{Color, Lab, Xyz};
use std::sync::LazyLock;

/// D65 reference white, scaled so that Y = 100.
pub const D65_WHITE: Xyz = Xyz {
    x: 95.047,
    y: 100.0,
    z: 108.883,
};

/// CIE ε expressed in the `f(t)` domain: `(24/116)^3 ≈ 0.008856`.
const LAB_EPSILON: f64 = (24.0 / 116.0) * (24.0 / 116.0) * (24.0 / 116.0);

/// Slope of the linear segment of `f(t)`, `(29/6)^2 / 3 = 841/108`.
const LAB_SLOPE: f64 = 841.0 / 108.0;

const LAB_OFFSET: f64 = 16.0 / 116.0;

/// Linear-light value of every 8-bit sRGB level.
static SRGB_TO_LINEAR: LazyLock<[f64; 256]> = LazyLock::new(|| {
    std::array::from_fn(|i| {
        let v = i as f64 / 255.0;
        if v > 0.04045 {
            ((v + 0.055) / 1.055).powf(2.4)
        } else {
            v / 12.92
        }
    })
});

/// Expand one gamma-encoded sRGB channel (0–255) to linear light (0–1).
#[inline]
fn srgb_to_linear(channel: u8) -> f64 {
    SRGB_TO_LINEAR[channel as usize]
}

/// Compress linear light (0–1) back to a gamma-encoded 8-bit channel.
#[inline]
fn linear_to_srgb(v: f64) -> u8 {
    let encoded = if v > 0.0031308 {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * v
    };
    (encoded * 255.0).round().clamp(0.0, 255.0) as u8
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        LAB_SLOPE * t + LAB_OFFSET
    }
}

#[inline]
fn lab_f_inv(u: f64) -> f64 {
    if u > 24.0 / 116.0 {
        u * u * u
    } else {
        (u - LAB_OFFSET) / LAB_SLOPE
    }
}

/// Convert an sRGB color to CIE XYZ (D65, Y scaled to 0–100).
///
/// Alpha is ignored.
pub fn rgb_to_xyz(color: Color) -> Xyz {
    let r = srgb_to_linear(color.r) * 100.0;
    let g = srgb_to_linear(color.g) * 100.0;
    let b = srgb_to_linear(color.b) * 100.0;

    Xyz {
        x: 0.4124564 * r + 0.3575761 * g + 0.1804375 * b,
        y: 0.2126729 * r + 0.7151522 * g + 0.0721750 * b,
        z: 0.0193339 * r + 0.1191920 * g + 0.9503041 * b,
    }
}

/// Convert CIE XYZ to L\*a\*b\* relative to [`D65_WHITE`].
pub fn xyz_to_lab(xyz: Xyz) -> Lab {
    let fx = lab_f(xyz.x / D65_WHITE.x);
    let fy = lab_f(xyz.y / D65_WHITE.y);
    let fz = lab_f(xyz.z / D65_WHITE.z);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Convert an sRGB color straight to L\*a\*b\*.
#[inline]
pub fn rgb_to_lab(color: Color) -> Lab {
    xyz_to_lab(rgb_to_xyz(color))
}

/// Inverse of [`xyz_to_lab`].
pub fn lab_to_xyz(lab: Lab) -> Xyz {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = fy + lab.a / 500.0;
    let fz = fy - lab.b / 200.0;

    Xyz {
        x: lab_f_inv(fx) * D65_WHITE.x,
        y: lab_f_inv(fy) * D65_WHITE.y,
        z: lab_f_inv(fz) * D65_WHITE.z,
    }
}

/// Convert XYZ back to an opaque sRGB color, clamping out-of-gamut values.
pub fn xyz_to_rgb(xyz: Xyz) -> Color {
    let x = xyz.x / 100.0;
    let y = xyz.y / 100.0;
    let z = xyz.z / 100.0;

    let r = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
    let g = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
    let b = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

    Color::rgb(linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b))
}

/// Approximate inverse of [`rgb_to_lab`].
///
/// Exact up to 8-bit rounding for every in-gamut color.
#[inline]
pub fn lab_to_rgb(lab: Lab) -> Color {
    xyz_to_rgb(lab_to_xyz(lab))
}
