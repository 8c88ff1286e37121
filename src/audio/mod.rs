//! Audio decoding, spectrum analysis and the per-tick signal chain.
//!
//! `AudioSession` owns decoded audio and a `FrequencyAnalyser`; the sampler,
//! band analyzer and beat detector turn its byte spectrum into the waveform
//! and analysis state the grid engines consume.

mod analyser;
mod bands;
mod beat;
mod sampler;
mod session;

// Re-export public types
pub use analyser::{blackman_window, FrequencyAnalyser};
pub use bands::{band_ranges, BandAnalysis};
pub use beat::{BeatDetector, BeatState, DecayMode, PatternEntry};
pub use sampler::SpectrumSampler;
pub use session::AudioSession;

use crate::params::audio_constants::{ACTIVE_THRESHOLD, WAVEFORM_LEN};

/// Per-tick audio input seen by the visualizer
pub trait FrequencySource {
    /// Whether audio is currently playing
    fn is_playing(&self) -> bool;

    /// Byte frequency data for the current playhead (None if unavailable)
    fn frequency_data(&mut self) -> Option<&[u8]>;
}

/// Fixed-length perceptual waveform (one value per frequency-position bucket)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waveform([f32; WAVEFORM_LEN]);

impl Waveform {
    /// All-zero waveform (not playing)
    pub fn silent() -> Self {
        Self([0.0; WAVEFORM_LEN])
    }

    pub fn from_values(values: [f32; WAVEFORM_LEN]) -> Self {
        Self(values)
    }

    /// Build from an arbitrary slice, truncating or zero-padding to length
    pub fn from_slice(values: &[f32]) -> Self {
        let mut out = [0.0; WAVEFORM_LEN];
        for (slot, &v) in out.iter_mut().zip(values) {
            *slot = v;
        }
        Self(out)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        WAVEFORM_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value at `index` (out of range → 0)
    pub fn get(&self, index: usize) -> f32 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    /// True when any bucket exceeds the wave-start threshold
    pub fn is_audible(&self) -> bool {
        self.0.iter().any(|&v| v > ACTIVE_THRESHOLD)
    }
}

impl Default for Waveform {
    fn default() -> Self {
        Self::silent()
    }
}
