//! Colour palettes for the Inky Impression panels
//!
//! The panels address eight colour slots. Quantization runs against an RGB
//! palette that is either a fixed table or a blend between a measured
//! "saturated" table and the ideal "desaturated" one.

use crate::error::Error;
use embedded_graphics_core::pixelcolor::{PixelColor, raw::RawU4};
use embedded_graphics_core::prelude::RawData;

/// Maximum number of colours any panel exposes
pub const MAX_COLORS: usize = 8;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as floats, the representation error diffusion works in
    #[inline]
    pub fn to_f32(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }

    /// Squared Euclidean distance in RGB space to a (possibly out of range) working colour
    #[inline]
    pub fn distance_squared(&self, other: [f32; 3]) -> f32 {
        let dr = self.r as f32 - other[0];
        let dg = self.g as f32 - other[1];
        let db = self.b as f32 - other[2];
        dr * dr + dg * dg + db * db
    }
}

/// Device colour slots shared by the UC8159 and AC073TC1 controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Color {
    #[default]
    Black = 0,
    White = 1,
    Green = 2,
    Blue = 3,
    Red = 4,
    Yellow = 5,
    Orange = 6,
    /// Reserved slot used by the controller to clear artifacts
    Clean = 7,
}

impl Color {
    /// Number of addressable slots
    pub const SLOTS: u8 = 8;

    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::White,
        Color::Green,
        Color::Blue,
        Color::Red,
        Color::Yellow,
        Color::Orange,
        Color::Clean,
    ];

    /// Get the 4-bit color value
    #[inline]
    pub const fn to_4bit(self) -> u8 {
        self as u8
    }

    /// Create from 4-bit value, out of range values map to `Clean`
    pub const fn from_4bit(value: u8) -> Self {
        match value & 0x0F {
            0 => Color::Black,
            1 => Color::White,
            2 => Color::Green,
            3 => Color::Blue,
            4 => Color::Red,
            5 => Color::Yellow,
            6 => Color::Orange,
            _ => Color::Clean,
        }
    }
}

impl TryFrom<u8> for Color {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Color::ALL
            .get(index as usize)
            .copied()
            .ok_or(Error::ColorOutOfRange {
                index,
                slots: Color::SLOTS,
            })
    }
}

// embedded-graphics integration
impl PixelColor for Color {
    type Raw = RawU4;
}

impl From<RawU4> for Color {
    fn from(raw: RawU4) -> Self {
        Color::from_4bit(raw.into_inner())
    }
}

impl From<Color> for RawU4 {
    fn from(color: Color) -> Self {
        RawU4::new(color.to_4bit())
    }
}

/// Ideal colours, shared by every Impression panel
pub const DESATURATED_PALETTE: [Rgb; 8] = [
    Rgb::new(0, 0, 0),       // Black
    Rgb::new(255, 255, 255), // White
    Rgb::new(0, 255, 0),     // Green
    Rgb::new(0, 0, 255),     // Blue
    Rgb::new(255, 0, 0),     // Red
    Rgb::new(255, 255, 0),   // Yellow
    Rgb::new(255, 140, 0),   // Orange
    Rgb::new(255, 255, 255), // Clean
];

/// Measured colours of the UC8159 panels (5.7" and 4")
pub const UC8159_SATURATED_PALETTE: [Rgb; 8] = [
    Rgb::new(57, 47, 57),    // Black
    Rgb::new(255, 255, 255), // White
    Rgb::new(58, 91, 70),    // Green
    Rgb::new(61, 59, 94),    // Blue
    Rgb::new(156, 72, 75),   // Red
    Rgb::new(208, 190, 71),  // Yellow
    Rgb::new(177, 106, 73),  // Orange
    Rgb::new(255, 255, 255), // Clean
];

/// Measured colours of the AC073TC1 panel (7.3")
pub const AC073TC1_SATURATED_PALETTE: [Rgb; 8] = [
    Rgb::new(0, 0, 0),       // Black
    Rgb::new(217, 242, 255), // White
    Rgb::new(3, 124, 76),    // Green
    Rgb::new(27, 46, 198),   // Blue
    Rgb::new(245, 80, 34),   // Red
    Rgb::new(255, 255, 68),  // Yellow
    Rgb::new(239, 121, 44),  // Orange
    Rgb::new(255, 255, 255), // Clean
];

/// Two-colour palette, maps onto slots 0 (black) and 1 (white)
pub const MONO_PALETTE: [Rgb; 2] = [Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)];

/// Ordered colour table to quantize against; position is the device slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: heapless::Vec<Rgb, MAX_COLORS>,
}

impl Palette {
    /// Build a palette from the first [`MAX_COLORS`] entries of `colors`.
    /// Entries past that have no device slot and are dropped.
    pub fn new(colors: &[Rgb]) -> Self {
        if colors.len() > MAX_COLORS {
            log::warn!(
                "Palette: {} colours given, keeping the first {}",
                colors.len(),
                MAX_COLORS
            );
        }
        Self {
            colors: colors.iter().copied().take(MAX_COLORS).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.colors.get(index as usize).copied()
    }

    pub fn as_slice(&self) -> &[Rgb] {
        &self.colors
    }

    /// Find the nearest palette entry by squared RGB distance.
    ///
    /// Ties go to the lowest index. Returns `None` for an empty palette.
    #[inline]
    pub fn nearest(&self, color: [f32; 3]) -> Option<(u8, Rgb)> {
        let mut best: Option<(u8, Rgb)> = None;
        let mut best_dist = f32::INFINITY;

        for (i, p) in self.colors.iter().enumerate() {
            let dist = p.distance_squared(color);
            if best.is_none() || dist < best_dist {
                best_dist = dist;
                best = Some((i as u8, *p));
            }
        }

        best
    }
}

/// Source of the palette a panel quantizes against
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaletteProvider {
    /// Constant table, saturation is ignored
    Fixed(&'static [Rgb]),
    /// Per-channel blend between a saturated and a desaturated table.
    /// The reserved `Clean` slot is not part of the blended palette.
    Blend {
        saturated: &'static [Rgb; 8],
        desaturated: &'static [Rgb; 8],
    },
}

impl PaletteProvider {
    /// Produce the palette for the given saturation.
    ///
    /// Saturation is expected in [0, 1] and is not clamped here; blended
    /// channels that fall outside a byte saturate at 0 or 255.
    pub fn palette(&self, saturation: f32) -> Palette {
        match self {
            PaletteProvider::Fixed(colors) => Palette::new(colors),
            PaletteProvider::Blend {
                saturated,
                desaturated,
            } => {
                if !(0.0..=1.0).contains(&saturation) {
                    log::warn!("Palette blend: saturation {} outside [0, 1]", saturation);
                }
                let colors = saturated
                    .iter()
                    .zip(desaturated.iter())
                    .take(Color::Clean as usize)
                    .map(|(s, d)| {
                        Rgb::new(
                            blend(s.r, d.r, saturation),
                            blend(s.g, d.g, saturation),
                            blend(s.b, d.b, saturation),
                        )
                    })
                    .collect();
                Palette { colors }
            }
        }
    }
}

#[inline]
fn blend(saturated: u8, desaturated: u8, saturation: f32) -> u8 {
    libm::roundf(saturated as f32 * saturation + desaturated as f32 * (1.0 - saturation)) as u8
}
