//! Floyd-Steinberg error diffusion to a device palette
//!
//! Error is diffused in plain RGB, scaled by the dither amount:
//!
//! ```text
//!         *    7/16
//!  3/16  5/16  1/16
//! ```
//!
//! Accumulated working colours are not clamped, so a channel may leave
//! [0, 255] before it is compared against the palette. Existing renders rely
//! on this.

use crate::error::{Error, Result};
use crate::framebuffer::FrameBuffer;
use crate::palette::Palette;
use crate::raster::RgbaImage;
use alloc::vec;
use alloc::vec::Vec;

/// One quantized pixel, as handed to the sink of [`dither_with`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantized {
    pub x: usize,
    pub y: usize,
    /// Chosen palette index
    pub index: u8,
    /// Source colour plus all error diffused into it
    pub working: [f32; 3],
}

/// Dither `image` against `palette` into a new frame buffer whose slot
/// count is the palette length
pub fn dither<D: AsRef<[u8]>>(
    image: &RgbaImage<D>,
    palette: &Palette,
    amount: f32,
) -> Result<FrameBuffer> {
    let mut fb = FrameBuffer::new(image.width(), image.height(), palette.len() as u8);
    dither_with(image, palette, amount, |q| {
        // Indices come from the palette itself, so they are always in range
        let _ = fb.set(q.x, q.y, q.index);
    })?;
    Ok(fb)
}

/// Run the ditherer, calling `sink` for every pixel in scan order
pub fn dither_with<D, F>(
    image: &RgbaImage<D>,
    palette: &Palette,
    amount: f32,
    mut sink: F,
) -> Result<()>
where
    D: AsRef<[u8]>,
    F: FnMut(Quantized),
{
    if palette.is_empty() {
        return Err(Error::UnsupportedConfiguration("cannot dither to an empty palette"));
    }

    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Ok(());
    }

    // Only the current and the next row of accumulated colour are kept
    let mut current: Vec<[f32; 3]> = (0..width).map(|x| image.pixel(x, 0).to_f32()).collect();
    let mut next: Vec<[f32; 3]> = vec![[0.0; 3]; width];

    for y in 0..height {
        let has_next = y + 1 < height;
        if has_next {
            for (x, slot) in next.iter_mut().enumerate() {
                *slot = image.pixel(x, y + 1).to_f32();
            }
        }

        for x in 0..width {
            let working = current[x];
            let Some((index, chosen)) = palette.nearest(working) else {
                unreachable!("palette checked non-empty");
            };
            sink(Quantized {
                x,
                y,
                index,
                working,
            });

            let target = chosen.to_f32();
            let err = [
                (working[0] - target[0]) * amount,
                (working[1] - target[1]) * amount,
                (working[2] - target[2]) * amount,
            ];

            if x + 1 < width {
                diffuse(&mut current[x + 1], err, 7.0 / 16.0);
            }
            if has_next {
                if x > 0 {
                    diffuse(&mut next[x - 1], err, 3.0 / 16.0);
                }
                diffuse(&mut next[x], err, 5.0 / 16.0);
                if x + 1 < width {
                    diffuse(&mut next[x + 1], err, 1.0 / 16.0);
                }
            }
        }

        core::mem::swap(&mut current, &mut next);
    }

    Ok(())
}

#[inline]
fn diffuse(pixel: &mut [f32; 3], err: [f32; 3], weight: f32) {
    pixel[0] += err[0] * weight;
    pixel[1] += err[1] * weight;
    pixel[2] += err[2] * weight;
}
