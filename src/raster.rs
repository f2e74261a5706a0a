//! RGBA source rasters
//!
//! Row-major, 4 bytes per pixel. Only the RGB channels are used; alpha is
//! ignored.

use crate::error::{Error, Result};
use crate::palette::Rgb;
use alloc::vec::Vec;

/// A width×height RGBA image backed by any byte container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage<D> {
    width: usize,
    height: usize,
    data: D,
}

impl<D: AsRef<[u8]>> RgbaImage<D> {
    /// Wrap a raw RGBA buffer, checking that its length matches the dimensions
    pub fn new(width: usize, height: usize, data: D) -> Result<Self> {
        let len = data.as_ref().len();
        if width.checked_mul(height).and_then(|n| n.checked_mul(4)) != Some(len) {
            return Err(Error::RasterSize { len, width, height });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// RGB value of the pixel at (x, y). Panics if out of bounds.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let i = (y * self.width + x) * 4;
        let px = &self.data.as_ref()[i..i + 3];
        Rgb::new(px[0], px[1], px[2])
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_ref()
    }
}

/// Decode a PNG into an owned RGBA image
#[cfg(feature = "png")]
pub fn decode_png(png_data: &[u8]) -> Result<RgbaImage<Vec<u8>>> {
    let header = minipng::decode_png_header(png_data)
        .map_err(|_| Error::ImageDecode("invalid PNG header"))?;

    log::debug!(
        "PNG: {}x{} {:?}",
        header.width(),
        header.height(),
        header.color_type()
    );

    let mut decode_buf = alloc::vec![0u8; header.required_bytes_rgba8bpc()];
    let mut image = minipng::decode_png(png_data, &mut decode_buf).map_err(|e| {
        log::warn!("minipng error: {:?}", e);
        Error::ImageDecode("PNG decode failed")
    })?;
    image
        .convert_to_rgba8bpc()
        .map_err(|_| Error::ImageDecode("PNG colour conversion failed"))?;

    RgbaImage::new(
        image.width() as usize,
        image.height() as usize,
        image.pixels().to_vec(),
    )
}

/// PNG decoding needs the `png` feature
#[cfg(not(feature = "png"))]
pub fn decode_png(_png_data: &[u8]) -> Result<RgbaImage<Vec<u8>>> {
    Err(Error::MissingCapability("png"))
}
