//! Image I/O backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the converter
//! needs from the outside world: identify, decode, and encode. Everything
//! between decode and encode works on in-memory [`PixelGrid`]s.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the `MockBackend` in this module's test submodule.

use super::grid::PixelGrid;
use crate::quantize::QuantizeError;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: String, message: String },
    #[error("{0}")]
    Layout(#[from] QuantizeError),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image I/O backends.
///
/// `Sync` so one backend can be shared by the parallel metric tasks.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where the format allows.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an image into an unpadded RGBA8 grid.
    fn decode(&self, path: &Path) -> Result<PixelGrid, BackendError>;

    /// Write a grid as a lossless image at `path`.
    fn encode(&self, grid: &PixelGrid, path: &Path) -> Result<(), BackendError>;
}
