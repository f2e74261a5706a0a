//! Per-controller command tables and timings
//!
//! A panel's protocol is data: which registers to program after reset, which
//! opcodes start, power and refresh a frame, and how long each busy wait may
//! take.

use super::{ac073tc1, uc8159};
use crate::error::Result;
use crate::palette::Color;

/// Largest parameter block of any init register
pub const MAX_PARAMS: usize = 8;
/// Longest init sequence
pub const MAX_REGISTERS: usize = 24;

/// One command byte and its parameter bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub command: u8,
    pub data: heapless::Vec<u8, MAX_PARAMS>,
}

pub type InitSequence = heapless::Vec<Register, MAX_REGISTERS>;

const NO_DATA: &[u8] = &[];
const ZERO: &[u8] = &[0x00];

pub(crate) fn reg(command: u8, data: &[u8]) -> Register {
    Register {
        command,
        data: data.iter().copied().take(MAX_PARAMS).collect(),
    }
}

/// Reset pulse count and busy-wait ceilings, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Number of low→high pulses on the reset line
    pub reset_pulses: u8,
    pub reset_ms: u32,
    pub power_on_ms: u32,
    pub refresh_ms: u32,
    pub power_off_ms: u32,
}

/// Panel controller chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Uc8159,
    Ac073tc1,
}

impl Controller {
    pub const fn name(self) -> &'static str {
        match self {
            Controller::Uc8159 => "UC8159",
            Controller::Ac073tc1 => "AC073TC1",
        }
    }

    pub const fn timing(self) -> Timing {
        match self {
            Controller::Uc8159 => Timing {
                reset_pulses: 1,
                reset_ms: 1_000,
                power_on_ms: 200,
                refresh_ms: 32_000,
                power_off_ms: 200,
            },
            // Refresh measured at ~41s
            Controller::Ac073tc1 => Timing {
                reset_pulses: 2,
                reset_ms: 1_000,
                power_on_ms: 400,
                refresh_ms: 45_000,
                power_off_ms: 400,
            },
        }
    }

    /// Registers programmed after every reset
    pub fn init_sequence(self, width: u16, height: u16, border: Color) -> Result<InitSequence> {
        match self {
            Controller::Uc8159 => uc8159::init_sequence(width, height, border),
            Controller::Ac073tc1 => ac073tc1::init_sequence(width, height),
        }
    }

    /// Command that carries the packed pixel data
    pub fn data_start(self) -> u8 {
        match self {
            Controller::Uc8159 => uc8159::Command::DTM1.addr(),
            Controller::Ac073tc1 => ac073tc1::Command::DTM.addr(),
        }
    }

    pub fn power_on(self) -> u8 {
        match self {
            Controller::Uc8159 => uc8159::Command::PON.addr(),
            Controller::Ac073tc1 => ac073tc1::Command::PON.addr(),
        }
    }

    pub fn refresh(self) -> (u8, &'static [u8]) {
        match self {
            Controller::Uc8159 => (uc8159::Command::DRF.addr(), NO_DATA),
            Controller::Ac073tc1 => (ac073tc1::Command::DRF.addr(), ZERO),
        }
    }

    pub fn power_off(self) -> (u8, &'static [u8]) {
        match self {
            Controller::Uc8159 => (uc8159::Command::POF.addr(), NO_DATA),
            Controller::Ac073tc1 => (ac073tc1::Command::POF.addr(), ZERO),
        }
    }
}
