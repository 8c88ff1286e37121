//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::error::Result;
use crate::params::{CaptureConfig, PlaybackConfig, Preset, WaveSettings};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "wavegrid")]
#[command(about = "Audio-reactive wave grid driven by a WAV file", long_about = None)]
pub struct Args {
    /// WAV file to play through the visualizer
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// TOML preset with [wave], [grid] and [analyser] sections
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Ticks per second of audio
    #[arg(long, value_name = "N", default_value = "60")]
    pub fps: u32,

    /// Stop after this many seconds of audio
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,

    /// Write every frame's main-grid heights (little-endian f32) to this file
    #[arg(long, value_name = "FILE")]
    pub capture: Option<PathBuf>,

    /// Skip the mirror grid
    #[arg(long)]
    pub no_mirror: bool,

    /// Wave intensity override (0.1-1.0)
    #[arg(long, value_name = "X")]
    pub intensity: Option<f32>,

    /// Time scale override (0.2-2.0)
    #[arg(long, value_name = "X")]
    pub speed: Option<f32>,

    /// Reactivity override (0.1-1.0)
    #[arg(long, value_name = "X")]
    pub reactivity: Option<f32>,

    /// Complexity override (0.0-1.0)
    #[arg(long, value_name = "X")]
    pub complexity: Option<f32>,

    /// Maximum amplitude override (0.1-3.0)
    #[arg(long, value_name = "X")]
    pub max_amplitude: Option<f32>,
}

impl Args {
    /// Load the preset (or defaults) and apply command-line overrides
    pub fn load_preset(&self) -> Result<Preset> {
        let mut preset = match &self.config {
            Some(path) => {
                info!("Preset: {}", path.display());
                Preset::load(path)?
            }
            None => Preset::default(),
        };
        preset.wave = self.apply_overrides(preset.wave);
        Ok(preset)
    }

    /// Overlay any wave-setting flags onto `base`, clamping the result
    pub fn apply_overrides(&self, base: WaveSettings) -> WaveSettings {
        WaveSettings {
            intensity: self.intensity.unwrap_or(base.intensity),
            speed: self.speed.unwrap_or(base.speed),
            reactivity: self.reactivity.unwrap_or(base.reactivity),
            complexity: self.complexity.unwrap_or(base.complexity),
            max_amplitude: self.max_amplitude.unwrap_or(base.max_amplitude),
        }
        .clamped()
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            fps: self.fps.max(1),
            max_duration_secs: self.duration,
        }
    }

    pub fn capture_config(&self) -> Option<CaptureConfig> {
        self.capture
            .as_ref()
            .map(|path| CaptureConfig::new(path.clone()))
    }
}
