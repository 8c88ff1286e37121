//! Parameter definitions with units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Units (seconds, world units, radians per second, dBFS)
//! - Documented ranges and meanings
//! - Defaults matching the stock desktop preset

mod audio;
mod grid;
mod render;
mod wave;

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

// Re-export all types
pub use audio::{audio_constants, AnalyserConfig};
pub use grid::{GridLayout, Rgb};
pub use render::{CaptureConfig, PlaybackConfig};
pub use wave::WaveSettings;

/// A preset file: any section or key may be omitted and falls back to its default
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Preset {
    pub wave: WaveSettings,
    pub grid: GridLayout,
    pub analyser: AnalyserConfig,
}

impl Preset {
    /// Parse a TOML preset
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let preset: Preset = toml::from_str(source)?;
        preset.analyser.validate()?;
        Ok(Self {
            wave: preset.wave.clamped(),
            ..preset
        })
    }

    /// Load a TOML preset from disk
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let preset = Self::from_toml_str(&source)?;
        debug!(path = %path.display(), "loaded preset");
        Ok(preset)
    }
}
