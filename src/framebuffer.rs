//! Frame buffer of palette indices
//!
//! One byte per pixel while drawing. On transfer the grid is reoriented and
//! packed two pixels per byte: high nibble = first pixel, low nibble = second.

use crate::error::{Error, Result};
use crate::palette::Color;
use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_graphics_core::Pixel;
use embedded_graphics_core::draw_target::DrawTarget;
use embedded_graphics_core::geometry::{OriginDimensions, Size};

/// rows × cols grid of palette slot indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    slots: u8,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// Create a frame buffer with every pixel at slot 0
    pub fn new(width: usize, height: usize, slots: u8) -> Self {
        Self {
            width,
            height,
            slots,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of valid palette slots
    pub fn slots(&self) -> u8 {
        self.slots
    }

    /// Row-major indices, unpacked
    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Write a single pixel at (x, y)
    pub fn set(&mut self, x: usize, y: usize, index: u8) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::PixelOutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.check_index(index)?;
        self.pixels[y * self.width + x] = index;
        Ok(())
    }

    /// Fill the whole grid with one index
    pub fn clear(&mut self, index: u8) -> Result<()> {
        self.check_index(index)?;
        self.pixels.fill(index);
        Ok(())
    }

    fn check_index(&self, index: u8) -> Result<()> {
        if index >= self.slots {
            return Err(Error::ColorOutOfRange {
                index,
                slots: self.slots,
            });
        }
        Ok(())
    }

    /// Serialize for the panel's data-start command.
    ///
    /// `h_flip` reverses every row. Rows are emitted bottom-up unless
    /// `v_flip` is set, which suits the default mounting. A grid with an
    /// odd pixel count ends with a byte whose low nibble is zero.
    pub fn to_wire(&self, h_flip: bool, v_flip: bool) -> Vec<u8> {
        let mut flat = Vec::with_capacity(self.pixels.len());
        for y in 0..self.height {
            let src_y = if v_flip { y } else { self.height - 1 - y };
            let row = &self.pixels[src_y * self.width..(src_y + 1) * self.width];
            if h_flip {
                flat.extend(row.iter().rev());
            } else {
                flat.extend_from_slice(row);
            }
        }
        pack(&flat)
    }
}

/// Pack indices two per byte, first in the high nibble
pub fn pack(indices: &[u8]) -> Vec<u8> {
    indices
        .chunks(2)
        .map(|pair| {
            let low = pair.get(1).copied().unwrap_or(0);
            ((pair[0] << 4) & 0xF0) | (low & 0x0F)
        })
        .collect()
}

/// Split packed bytes back into indices
pub fn unpack(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().flat_map(|b| [b >> 4, b & 0x0F]).collect()
}

// embedded-graphics integration
impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Color;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            // Off-screen pixels and slots the panel lacks are clipped
            let _ = self.set(point.x as usize, point.y as usize, color.to_4bit());
        }
        Ok(())
    }
}
