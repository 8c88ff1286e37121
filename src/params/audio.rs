//! Audio analysis configuration and constants.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Spectrum analyser configuration (mirrors a browser analyser node)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// FFT window size in samples (must be power of 2, 32..=32768)
    pub fft_size: usize,

    /// Smoothing time constant applied to bin magnitudes between frames (0..1)
    pub smoothing: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing: 0.6,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins produced per frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Centre frequency of a bin (Hz) at the given sample rate
    pub fn bin_to_hz(&self, bin: usize, sample_rate_hz: u32) -> f32 {
        bin as f32 * sample_rate_hz as f32 / self.fft_size as f32
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(Error::InvalidAnalyser(format!(
                "FFT size must be a power of 2 in 32..=32768, got {}",
                self.fft_size
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(Error::InvalidAnalyser(format!(
                "smoothing must be in [0, 1], got {}",
                self.smoothing
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(Error::InvalidAnalyser(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Pipeline constants
pub mod audio_constants {
    /// Perceptual waveform length produced by the spectrum sampler
    pub const WAVEFORM_LEN: usize = 100;

    /// Waveform value above which a tick counts as audible (starts a wave)
    pub const ACTIVE_THRESHOLD: f32 = 0.1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 1024);
    }

    #[test]
    fn test_bin_to_hz() {
        let config = AnalyserConfig::default();

        // 44100 / 2048 ≈ 21.53 Hz per bin
        assert_eq!(config.bin_to_hz(0, 44100), 0.0);
        assert!((config.bin_to_hz(1, 44100) - 21.533).abs() < 0.01);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_size = AnalyserConfig {
            fft_size: 1000,
            ..Default::default()
        };
        assert!(bad_size.validate().is_err());

        let bad_smoothing = AnalyserConfig {
            smoothing: 1.5,
            ..Default::default()
        };
        assert!(bad_smoothing.validate().is_err());

        let bad_range = AnalyserConfig {
            min_decibels: -30.0,
            max_decibels: -100.0,
            ..Default::default()
        };
        assert!(bad_range.validate().is_err());
    }
}
