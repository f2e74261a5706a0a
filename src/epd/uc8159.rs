//! UltraChip UC8159 register map and initialisation
//!
//! Used by the 5.7" (600x448) and 4" (640x400) Impression panels.

use super::controller::{InitSequence, reg};
use crate::error::{Error, Result};
use crate::palette::Color;

/// Display commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
pub enum Command {
    /// Panel Setting
    PSR = 0x00,
    /// Power Setting
    PWR = 0x01,
    /// Power Off
    POF = 0x02,
    /// Power Off Sequence Setting
    PFS = 0x03,
    /// Power On
    PON = 0x04,
    /// Booster Soft Start
    BTST = 0x06,
    /// Deep Sleep
    DSLP = 0x07,
    /// Data Start Transmission 1
    DTM1 = 0x10,
    /// Data Stop
    DSP = 0x11,
    /// Display Refresh
    DRF = 0x12,
    /// Image Process
    IPC = 0x13,
    /// PLL Control
    PLL = 0x30,
    /// Temperature Sensor Calibration
    TSC = 0x40,
    /// Temperature Sensor Enable
    TSE = 0x41,
    /// Temperature Sensor Write
    TSW = 0x42,
    /// Temperature Sensor Read
    TSR = 0x43,
    /// VCOM and Data Interval Setting
    CDI = 0x50,
    /// Low Power Detection
    LPD = 0x51,
    /// TCON Setting
    TCON = 0x60,
    /// Resolution Setting
    TRES = 0x61,
    /// SPI Flash Control
    DAM = 0x65,
    /// Revision
    REV = 0x70,
    /// Get Status
    FLG = 0x71,
    /// Auto Measure VCOM
    AMV = 0x80,
    /// VCOM Value
    VV = 0x81,
    /// VCOM DC Setting
    VDCS = 0x82,
    /// Power Saving
    PWS = 0xE3,
    /// Temperature Sensor Setting
    TSSET = 0xE5,
}

impl Command {
    /// Get the command address byte
    #[inline]
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// PSR resolution select bits for the supported geometries
fn resolution_select(width: u16, height: u16) -> Result<u8> {
    match (width, height) {
        (600, 448) => Ok(0b11),
        (640, 400) => Ok(0b10),
        _ => Err(Error::UnsupportedConfiguration(
            "UC8159 supports 600x448 and 640x400 only",
        )),
    }
}

/// Register configuration sent after every reset
pub fn init_sequence(width: u16, height: u16, border: Color) -> Result<InitSequence> {
    let res = resolution_select(width, height)?;
    let [w_hi, w_lo] = width.to_be_bytes();
    let [h_hi, h_lo] = height.to_be_bytes();

    Ok([
        // Resolution: 10 bit horizontal then 10 bit vertical, sent as u16s
        reg(Command::TRES.addr(), &[w_hi, w_lo, h_hi, h_lo]),
        // Panel setting
        // 0b11000000 = resolution select
        // 0b00100000 = LUT from external flash
        // 0b00001000 = gate scan up
        // 0b00000100 = source shift right
        // 0b00000010 = DC-DC converter on
        // 0b00000001 = normal operation (no soft reset)
        // second byte 0x08 selects 7 colour mode
        reg(Command::PSR.addr(), &[(res << 6) | 0b10_1111, 0x08]),
        // Power settings: internal DC-DC for source, gate and LV source,
        // VGx 20V, 7 colour VDH/VDL
        reg(
            Command::PWR.addr(),
            &[(0x06 << 3) | (0x01 << 2) | (0x01 << 1) | 0x01, 0x00, 0x23, 0x23],
        ),
        // PLL = 2MHz * (M / N), 0b00111100
        reg(Command::PLL.addr(), &[0x3C]),
        // Internal temperature sensor
        reg(Command::TSE.addr(), &[0x00]),
        // VCOM and data interval
        // 0b11100000 = border colour
        // 0b00010000 = data polarity
        // 0b00001111 = VCOM and data interval (10, default)
        reg(Command::CDI.addr(), &[(border.to_4bit() << 5) | 0x17]),
        // Gate/source non-overlap period, 12nS each
        reg(Command::TCON.addr(), &[0x22]),
        // Disable external flash
        reg(Command::DAM.addr(), &[0x00]),
        reg(Command::PWS.addr(), &[0xAA]),
        // Power off sequence: 1 frame
        reg(Command::PFS.addr(), &[0x00]),
    ]
    .into_iter()
    .collect())
}
