//! Spectrum sampler: byte frequency buffer → 100-sample perceptual waveform.

use super::Waveform;
use crate::params::{audio_constants::WAVEFORM_LEN, WaveSettings};

/// Buffer fraction where the low sub-band ends
const LOW_BAND_END: f64 = 0.3;

/// Buffer fraction where the high sub-band starts
const HIGH_BAND_START: f64 = 0.7;

/// Byte magnitudes are normalised by this divisor
const BYTE_SCALE: f32 = 256.0;

/// Reduces an analyser buffer to a fixed-length waveform.
///
/// The centre of the waveform leans on the low sub-band and the edges lean
/// on the high sub-band; every sample also carries its own range average.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumSampler {
    reactivity: f32,
    max_amplitude: f32,
}

impl SpectrumSampler {
    pub fn new(settings: &WaveSettings) -> Self {
        let settings = settings.clamped();
        Self {
            reactivity: settings.reactivity,
            max_amplitude: settings.max_amplitude,
        }
    }

    pub fn update_settings(&mut self, settings: &WaveSettings) {
        *self = Self::new(settings);
    }

    /// Sample a byte frequency buffer into a waveform
    pub fn sample(&self, data: &[u8]) -> Waveform {
        let len = data.len();
        let mut out = [0.0f32; WAVEFORM_LEN];
        if len == 0 {
            return Waveform::from_values(out);
        }

        let low_end = (len as f64 * LOW_BAND_END).floor() as usize;
        let high_start = (len as f64 * HIGH_BAND_START).floor() as usize;
        let low_avg = mean_bytes(&data[..low_end]) / BYTE_SCALE;
        let high_avg = mean_bytes(&data[high_start..]) / BYTE_SCALE;

        let exponent = 2.0 - self.reactivity;

        for (i, value) in out.iter_mut().enumerate() {
            let start = i * len / WAVEFORM_LEN;
            let end = (i + 1) * len / WAVEFORM_LEN;
            let normalized = mean_bytes(&data[start..end]) / BYTE_SCALE;

            let position = i as f32 / WAVEFORM_LEN as f32;
            let treble_weight = (0.5 - position).abs() * 2.0;
            let bass_weight = 1.0 - treble_weight;

            let combined = (low_avg * bass_weight + high_avg * treble_weight + normalized) / 3.0;
            let curved = combined.powf(exponent);

            *value = (curved * self.max_amplitude).min(1.0);
        }

        Waveform::from_values(out)
    }
}

impl Default for SpectrumSampler {
    fn default() -> Self {
        Self::new(&WaveSettings::default())
    }
}

/// Mean of a byte slice (empty → 0)
fn mean_bytes(bytes: &[u8]) -> f32 {
    if bytes.is_empty() {
        return 0.0;
    }
    let sum: u32 = bytes.iter().map(|&b| b as u32).sum();
    sum as f32 / bytes.len() as f32
}
