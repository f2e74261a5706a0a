//! AC073TC1 register map and initialisation for the 7.3" (800x480) panel

use super::controller::{InitSequence, reg};
use crate::error::{Error, Result};

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
    POFS = 0x03,
    /// Power On
    PON = 0x04,
    /// Booster Soft Start 1
    BTST1 = 0x05,
    /// Booster Soft Start 2
    BTST2 = 0x06,
    /// Deep Sleep
    DSLP = 0x07,
    /// Booster Soft Start 3
    BTST3 = 0x08,
    /// Data Start Transmission
    DTM = 0x10,
    /// Data Stop
    DSP = 0x11,
    /// Display Refresh
    DRF = 0x12,
    /// Image Process Command
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
    /// Temperature VCOM DC Setting
    #[allow(non_camel_case_types)]
    T_VDCS = 0x84,
    /// AGID
    AGID = 0x86,
    /// Command Header
    CMDH = 0xAA,
    /// Cascade Setting
    CCSET = 0xE0,
    /// Power Saving Setting
    PWS = 0xE3,
    /// Temperature Sensor Setting
    TSSET = 0xE6,
}

impl Command {
    /// Get the command address byte
    #[inline]
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// Register configuration sent after every reset.
///
/// The resolution and border are fixed in the panel's sequence; the border
/// colour does not reach this controller.
pub fn init_sequence(width: u16, height: u16) -> Result<InitSequence> {
    if (width, height) != (800, 480) {
        return Err(Error::UnsupportedConfiguration("AC073TC1 supports 800x480 only"));
    }

    Ok([
        reg(Command::CMDH.addr(), &[0x49, 0x55, 0x20, 0x08, 0x09, 0x18]),
        reg(Command::PWR.addr(), &[0x3F, 0x00, 0x32, 0x2A, 0x0E, 0x2A]),
        reg(Command::PSR.addr(), &[0x5F, 0x69]),
        reg(Command::POFS.addr(), &[0x00, 0x54, 0x00, 0x44]),
        reg(Command::BTST1.addr(), &[0x40, 0x1F, 0x1F, 0x2C]),
        reg(Command::BTST2.addr(), &[0x6F, 0x1F, 0x16, 0x25]),
        reg(Command::BTST3.addr(), &[0x6F, 0x1F, 0x1F, 0x22]),
        reg(Command::IPC.addr(), &[0x00, 0x04]),
        reg(Command::PLL.addr(), &[0x02]),
        reg(Command::TSE.addr(), &[0x00]),
        reg(Command::CDI.addr(), &[0x3F]),
        reg(Command::TCON.addr(), &[0x02, 0x00]),
        // 800x480 (0x0320 x 0x01E0)
        reg(Command::TRES.addr(), &[0x03, 0x20, 0x01, 0xE0]),
        reg(Command::VDCS.addr(), &[0x1E]),
        reg(Command::T_VDCS.addr(), &[0x00]),
        reg(Command::AGID.addr(), &[0x00]),
        reg(Command::PWS.addr(), &[0x2F]),
        reg(Command::CCSET.addr(), &[0x00]),
        reg(Command::TSSET.addr(), &[0x00]),
    ]
    .into_iter()
    .collect())
}
