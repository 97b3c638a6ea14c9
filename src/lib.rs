//! # c64image
//!
//! Converts photos into Commodore 64 style images: 320 pixels wide, 16 fixed
//! colors, every pixel doubled horizontally like the C64's multicolor bitmap
//! mode.
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan      source/        →  [SourceImage]     (files or a directory)
//! 2. Decode    SourceImage    →  PixelGrid         (RGBA8, `image` crate)
//! 3. Quantize  PixelGrid      →  PixelGrid × N     (one per metric, in parallel)
//! 4. Encode    PixelGrid      →  out/c64_<stem>_<METRIC>.png
//! ```
//!
//! Quantizing a grid samples it in 160 × H blocks. Each block is averaged
//! (in L\*a\*b\* and in RGB), matched against the palette under one distance
//! metric, and written as two identical output pixels.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`color`] | `Color`/`Lab` types, sRGB ↔ L\*a\*b\* conversion, distance metrics |
//! | [`palette`] | The 16-color C64 palette with cached Lab values; nearest-color search |
//! | [`imaging`] | Pixel grids, block geometry, block averaging, `image`-crate I/O |
//! | [`quantize`] | Block → palette conversion of one grid, for one or many metrics |
//! | [`scan`] | Source discovery: single files or (recursive) directories |
//! | [`naming`] | `<prefix><stem>_<METRIC>.png` output names and their parsing |
//! | [`cache`] | Content-addressed skip of conversions whose inputs haven't changed |
//! | [`process`] | Batch driver: cache lookup, decode once, convert, encode, report |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Squared Distances
//!
//! Every metric returns a squared difference. Nearest-color search only
//! compares distances, so no square roots are taken in the inner loop.
//!
//! ## One Decode, Many Metrics
//!
//! The decoded source is shared read-only by every metric. Each metric runs
//! as its own rayon task and owns its output grid, so there is no locking on
//! the hot path.
//!
//! ## Compatibility Mode
//!
//! Earlier releases computed CIE76 without its b term, left CIEDE2000 hue
//! angles signed, and sampled blocks one pixel short on the right and bottom.
//! `compatibility = "legacy"` reproduces their palette choices; the default
//! is the corrected behavior.

pub mod cache;
pub mod color;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod palette;
pub mod process;
pub mod quantize;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
