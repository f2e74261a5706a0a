//! Driver configuration
//!
//! JSON format (every field optional):
//! ```json
//! {"color_mode": "multi", "h_flip": false, "v_flip": true,
//!  "saturation": 0.5, "dither": 0.75, "busy_timeout_ms": 40000}
//! ```

use crate::error::{Error, Result};
use crate::panel::Model;
use serde::Deserialize;

/// Colour set the driver quantizes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Full device palette
    #[default]
    Multi,
    /// Black and white only
    Mono,
    /// Three colour (black, white, red) panels, not supported by these models
    Red,
    /// Three colour (black, white, yellow) panels, not supported by these models
    Yellow,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub color_mode: ColorMode,
    /// Mirror every row
    pub h_flip: bool,
    /// Send rows top-down; unset sends them bottom-up
    pub v_flip: bool,
    /// Blend factor between the desaturated (0) and saturated (1) palette
    pub saturation: f32,
    /// Fraction of the quantization error that is diffused
    pub dither: f32,
    /// Ceiling for the refresh busy wait, replacing the controller default
    pub busy_timeout_ms: Option<u32>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Multi,
            h_flip: false,
            v_flip: true,
            saturation: 0.5,
            dither: 0.75,
            busy_timeout_ms: None,
        }
    }
}

impl DriverConfig {
    /// Defaults for a panel in its standard mounting
    pub fn for_model(model: &Model) -> Self {
        Self {
            v_flip: model.v_flip,
            ..Self::default()
        }
    }

    /// Parse a JSON config, missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json_core::from_str(json)
            .map(|(config, _)| config)
            .map_err(|e| {
                log::warn!("Config: {:?}", e);
                Error::Config
            })
    }

    /// Reject settings the driver cannot honour
    pub fn validate(&self) -> Result<()> {
        match self.color_mode {
            ColorMode::Multi | ColorMode::Mono => {}
            ColorMode::Red => {
                return Err(Error::UnsupportedConfiguration(
                    "red colour mode is not supported by multi-colour panels",
                ));
            }
            ColorMode::Yellow => {
                return Err(Error::UnsupportedConfiguration(
                    "yellow colour mode is not supported by multi-colour panels",
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.saturation) {
            return Err(Error::UnsupportedConfiguration("saturation must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.dither) {
            return Err(Error::UnsupportedConfiguration("dither amount must be within [0, 1]"));
        }
        Ok(())
    }
}
