//! In-memory RGBA8 pixel buffer.
//!
//! A [`PixelGrid`] is row-major, four bytes per pixel, with no row padding:
//! the stride is always `width * 4`. Buffers that arrive with any other
//! layout are rejected by [`PixelGrid::from_raw`] before any processing
//! starts.

use crate::color::Color;
use crate::quantize::QuantizeError;

const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelGrid {
    /// A grid of transparent black pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// A grid where every pixel is `color`.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let data = color
            .to_array()
            .repeat(width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap a raw RGBA8 buffer.
    ///
    /// `stride` is the distance in bytes between the starts of two rows as
    /// reported by the decoder. It must equal `width * 4`, and `data` must
    /// hold exactly `stride * height` bytes.
    pub fn from_raw(
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, QuantizeError> {
        let expected = width as usize * BYTES_PER_PIXEL;
        if stride != expected {
            return Err(QuantizeError::UnsupportedLayout {
                width,
                stride,
                expected,
            });
        }
        let expected_len = stride * height as usize;
        if data.len() != expected_len {
            return Err(QuantizeError::BufferLength {
                expected: expected_len,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.stride() + x as usize * BYTES_PER_PIXEL
    }

    /// Color at `(x, y)`.
    ///
    /// # Panics
    /// If the coordinates are outside the grid.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let i = self.offset(x, y);
        let p = &self.data[i..i + BYTES_PER_PIXEL];
        Color::new(p[0], p[1], p[2], p[3])
    }

    /// Overwrite the pixel at `(x, y)`.
    ///
    /// # Panics
    /// If the coordinates are outside the grid.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let i = self.offset(x, y);
        self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&color.to_array());
    }

    /// Pixels of row `y`, left to right.
    pub fn row(&self, y: u32) -> impl Iterator<Item = Color> + '_ {
        let start = y as usize * self.stride();
        self.data[start..start + self.stride()]
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|p| Color::new(p[0], p[1], p[2], p[3]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}
