//! Error types for the driver

use embedded_hal::{digital, spi};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Pixel is outside of dimensions of screen ({width}x{height}): x={x}, y={y}")]
    PixelOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("Colour is not a valid index: {index} (panel has {slots} slots)")]
    ColorOutOfRange { index: u8, slots: u8 },

    #[error("Raster of {len} bytes does not match a {width}x{height} RGBA image")]
    RasterSize {
        len: usize,
        width: usize,
        height: usize,
    },

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(&'static str),

    #[error("{0} support is not available in this build")]
    MissingCapability(&'static str),

    #[error("Image decode error: {0}")]
    ImageDecode(&'static str),

    #[error("Config parse error")]
    Config,

    #[error("SPI error: {0:?}")]
    Spi(spi::ErrorKind),

    #[error("GPIO error: {0:?}")]
    Pin(digital::ErrorKind),
}

impl Error {
    pub(crate) fn spi<E: spi::Error>(e: E) -> Self {
        Error::Spi(e.kind())
    }

    pub(crate) fn pin<E: digital::Error>(e: E) -> Self {
        Error::Pin(e.kind())
    }
}

pub type Result<T> = core::result::Result<T, Error>;
