//! Perceptual color distance.
//!
//! Four metrics, from cheapest to most accurate:
//!
//! | Metric | Space | Formula |
//! |---|---|---|
//! | [`Metric::Rgb`] | raw sRGB | ΔR² + ΔG² + ΔB² |
//! | [`Metric::Cie76`] | L\*a\*b\* | ΔL² + Δa² + Δb² |
//! | [`Metric::Cie94`] | L\*a\*b\* | ΔE94² (graphic arts weights) |
//! | [`Metric::Cie2000`] | L\*a\*b\* | ΔE00² with hue rotation |
//!
//! Every metric returns a *squared* difference. Nearest-color search only
//! compares distances, so the square root is never taken. A color's distance
//! to itself is zero.
//!
//! ## Compatibility
//!
//! Images produced by earlier releases used a CIE76 formula whose b term was
//! always zero, and a CIEDE2000 whose hue angles were never wrapped into
//! `[0, 360)`. [`Compatibility::Legacy`] reproduces both, together with the
//! one-pixel-inset block rectangles of those releases (see
//! [`crate::imaging::calculations::block_rect`]). [`Compatibility::Corrected`]
//! is the default.

use super::{Lab, Sample};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Below this, a chroma product counts as zero and hue is undefined.
const CHROMA_EPSILON: f64 = 1e-8;

/// 25^7, the chroma pivot of the CIEDE2000 G and RC terms.
const POW25_7: f64 = 6_103_515_625.0;

/// Color distance metric, chosen once per conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Rgb,
    Cie76,
    Cie94,
    #[default]
    Cie2000,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Rgb, Metric::Cie76, Metric::Cie94, Metric::Cie2000];

    /// Upper-case label used in output filenames.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Rgb => "RGB",
            Metric::Cie76 => "CIE76",
            Metric::Cie94 => "CIE94",
            Metric::Cie2000 => "CIE2000",
        }
    }

    /// Config/CLI spelling.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Rgb => "rgb",
            Metric::Cie76 => "cie76",
            Metric::Cie94 => "cie94",
            Metric::Cie2000 => "cie2000",
        }
    }

    /// Squared difference between two samples under this metric.
    #[inline]
    pub fn distance(self, a: &Sample, b: &Sample, compat: Compatibility) -> f64 {
        match self {
            Metric::Rgb => rgb_distance(a, b),
            Metric::Cie76 => match compat {
                Compatibility::Corrected => cie76_distance(a.lab, b.lab),
                Compatibility::Legacy => cie76_legacy_distance(a.lab, b.lab),
            },
            Metric::Cie94 => cie94_distance(a.lab, b.lab),
            Metric::Cie2000 => match compat {
                Compatibility::Corrected => cie2000_distance(a.lab, b.lab),
                Compatibility::Legacy => cie2000_legacy_distance(a.lab, b.lab),
            },
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown metric '{0}' (expected rgb, cie76, cie94 or cie2000)")]
pub struct ParseMetricError(pub String);

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(Metric::Rgb),
            "cie76" => Ok(Metric::Cie76),
            "cie94" => Ok(Metric::Cie94),
            "cie2000" | "ciede2000" => Ok(Metric::Cie2000),
            _ => Err(ParseMetricError(s.to_string())),
        }
    }
}

/// Whether to reproduce the palette choices of earlier releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compatibility {
    #[default]
    Corrected,
    Legacy,
}

impl Compatibility {
    pub fn name(self) -> &'static str {
        match self {
            Compatibility::Corrected => "corrected",
            Compatibility::Legacy => "legacy",
        }
    }
}

impl fmt::Display for Compatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sum of squared channel differences in 8-bit sRGB.
pub fn rgb_distance(a: &Sample, b: &Sample) -> f64 {
    let dr = a.rgb.r as f64 - b.rgb.r as f64;
    let dg = a.rgb.g as f64 - b.rgb.g as f64;
    let db = a.rgb.b as f64 - b.rgb.b as f64;
    dr * dr + dg * dg + db * db
}

/// Squared Euclidean distance in L\*a\*b\*.
pub fn cie76_distance(c1: Lab, c2: Lab) -> f64 {
    let dl = c2.l - c1.l;
    let da = c2.a - c1.a;
    let db = c2.b - c1.b;
    dl * dl + da * da + db * db
}

/// CIE76 as computed by earlier releases: the b axis never contributes.
pub fn cie76_legacy_distance(c1: Lab, c2: Lab) -> f64 {
    let dl = c2.l - c1.l;
    let da = c2.a - c1.a;
    dl * dl + da * da
}

/// Squared CIE94 difference with graphic-arts weights (kL = kC = kH = 1).
///
/// `c1` is the reference color: its chroma drives the SC and SH weights.
pub fn cie94_distance(c1: Lab, c2: Lab) -> f64 {
    let c1_chroma = c1.chroma();
    let c2_chroma = c2.chroma();
    let dl = c2.l - c1.l;
    let dc = c2_chroma - c1_chroma;

    let de2 = cie76_distance(c1, c2);
    let dh2 = de2 - dl * dl - dc * dc;
    let dh = if dh2 > 0.0 { dh2.sqrt() } else { 0.0 };

    let sc = 1.0 + 0.045 * c1_chroma;
    let sh = 1.0 + 0.015 * c1_chroma;

    let dc = dc / sc;
    let dh = dh / sh;
    dl * dl + dc * dc + dh * dh
}

/// Hue angle in degrees, normalized to `[0, 360)`.
#[inline]
fn hue_degrees(a: f64, b: f64) -> f64 {
    b.atan2(a).to_degrees().rem_euclid(360.0)
}

/// Hue angle in degrees as `atan2` returns it, in `(-180, 180]`.
#[inline]
fn signed_hue_degrees(a: f64, b: f64) -> f64 {
    b.atan2(a).to_degrees()
}

/// Squared CIEDE2000 difference (kL = kC = kH = 1).
pub fn cie2000_distance(c1: Lab, c2: Lab) -> f64 {
    // |RT| <= 2, so the sum is non-negative up to rounding
    ciede2000(c1, c2, hue_degrees).max(0.0)
}

/// CIEDE2000 as computed by earlier releases.
///
/// Hues are left in `(-180, 180]`, so the hue mean of colors with negative
/// b\* lands outside the blue-region rotation term and the result differs
/// from [`cie2000_distance`] for many blues and purples.
pub fn cie2000_legacy_distance(c1: Lab, c2: Lab) -> f64 {
    ciede2000(c1, c2, signed_hue_degrees)
}

fn ciede2000(c1: Lab, c2: Lab, hue: fn(f64, f64) -> f64) -> f64 {
    let c_mean = (c1.chroma() + c2.chroma()) / 2.0;
    let c_mean7 = c_mean.powi(7);
    let g = 0.5 * (1.0 - (c_mean7 / (c_mean7 + POW25_7)).sqrt());

    let a1 = (1.0 + g) * c1.a;
    let a2 = (1.0 + g) * c2.a;
    let c1p = (a1 * a1 + c1.b * c1.b).sqrt();
    let c2p = (a2 * a2 + c2.b * c2.b).sqrt();
    let h1p = hue(a1, c1.b);
    let h2p = hue(a2, c2.b);

    let achromatic = (c1p * c2p).abs() < CHROMA_EPSILON;

    let dl = c2.l - c1.l;
    let dc = c2p - c1p;
    let dh_angle = if achromatic {
        0.0
    } else {
        let diff = h2p - h1p;
        if diff.abs() <= 180.0 {
            diff
        } else if diff > 180.0 {
            diff - 360.0
        } else {
            diff + 360.0
        }
    };
    let dh = 2.0 * (c1p * c2p).sqrt() * (dh_angle / 2.0).to_radians().sin();

    let l_mean = (c1.l + c2.l) / 2.0;
    let cp_mean = (c1p + c2p) / 2.0;
    let h_mean = if achromatic {
        h1p + h2p
    } else if (h1p - h2p).abs() > 180.0 {
        if h1p + h2p < 360.0 {
            (h1p + h2p + 360.0) / 2.0
        } else {
            (h1p + h2p - 360.0) / 2.0
        }
    } else {
        (h1p + h2p) / 2.0
    };

    let t = 1.0 - 0.17 * (h_mean - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_mean).to_radians().cos()
        + 0.32 * (3.0 * h_mean + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_mean - 63.0).to_radians().cos();
    let d_theta = 30.0 * (-((h_mean - 275.0) / 25.0).powi(2)).exp();
    let cp_mean7 = cp_mean.powi(7);
    let rc = 2.0 * (cp_mean7 / (cp_mean7 + POW25_7)).sqrt();

    let l50 = (l_mean - 50.0) * (l_mean - 50.0);
    let sl = 1.0 + (0.015 * l50) / (20.0 + l50).sqrt();
    let sc = 1.0 + 0.045 * cp_mean;
    let sh = 1.0 + 0.015 * cp_mean * t;
    let rt = -(2.0 * d_theta).to_radians().sin() * rc;

    let dl = dl / sl;
    let dc = dc / sc;
    let dh = dh / sh;

    dl * dl + dc * dc + dh * dh + rt * dc * dh
}
