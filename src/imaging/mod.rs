//! Pixel buffers, downsampling geometry, and image I/O.
//!
//! | Operation | Where |
//! |---|---|
//! | **Decode / encode** | [`ImageBackend`] trait, [`RustBackend`] (`image` crate) |
//! | **Pixel buffer** | [`PixelGrid`]: validated, unpadded RGBA8 |
//! | **Geometry** | [`calculations`]: target size, block size, block rectangles |
//! | **Averaging** | [`average::average_block`]: one (Lab, RGB) sample per block |
//!
//! The module is split into:
//! - **Calculations** and **averaging**: pure functions (unit testable)
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod average;
pub mod backend;
pub mod calculations;
pub mod grid;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use grid::PixelGrid;
pub use rust_backend::{RustBackend, supported_input_extensions};
