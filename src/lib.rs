//! Driver for Pimoroni Inky Impression multi-colour e-paper panels.
//!
//! RGBA raster → [`dither`] (against a [`palette`]) → [`framebuffer`] →
//! [`epd`] update protocol → SPI bus. [`panel::PanelDriver`] ties the pieces
//! together for one concrete [`panel::Model`].

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod dither;
pub mod epd;
pub mod error;
pub mod framebuffer;
pub mod palette;
pub mod panel;
pub mod raster;

#[cfg(test)]
mod mock;

pub use config::{ColorMode, DriverConfig};
pub use error::{Error, Result};
pub use framebuffer::FrameBuffer;
pub use palette::{Color, Palette, PaletteProvider, Rgb};
pub use panel::{Model, PanelDriver};
