//! Byte frequency analysis of PCM windows.
//!
//! Produces the same 0–255 magnitude buffer a browser analyser node hands to
//! `getByteFrequencyData`: Blackman window, forward FFT, temporal smoothing,
//! decibel mapping.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::Result;
use crate::params::AnalyserConfig;

/// Stateful spectrum analyser (smoothing carries across frames)
pub struct FrequencyAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl FrequencyAnalyser {
    /// Create an analyser, validating the configuration first
    pub fn new(config: AnalyserConfig) -> Result<Self> {
        config.validate()?;

        let fft_size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window = (0..fft_size)
            .map(|i| blackman_window(i, fft_size))
            .collect();

        Ok(Self {
            fft,
            window,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; config.bin_count()],
            bytes: vec![0; config.bin_count()],
            config,
        })
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    /// Number of bytes returned by [`FrequencyAnalyser::analyse`]
    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    /// Forget smoothing history (e.g. after a seek)
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
        self.bytes.fill(0);
    }

    /// Analyse the most recent `fft_size` samples of `samples`.
    ///
    /// Shorter inputs are zero padded on the left, so the newest sample always
    /// lands at the end of the window.
    pub fn analyse(&mut self, samples: &[f32]) -> &[u8] {
        let fft_size = self.config.fft_size;
        let tail = &samples[samples.len().saturating_sub(fft_size)..];
        let pad = fft_size - tail.len();

        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        let tau = self.config.smoothing;
        let db_range = self.config.max_decibels - self.config.min_decibels;
        let scale = 1.0 / fft_size as f32;

        for ((smoothed, byte), bin) in self
            .smoothed
            .iter_mut()
            .zip(self.bytes.iter_mut())
            .zip(self.fft_buffer.iter())
        {
            let magnitude = bin.norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;

            *byte = if *smoothed > 0.0 {
                let db = 20.0 * smoothed.log10();
                let scaled = 255.0 * (db - self.config.min_decibels) / db_range;
                scaled.floor().clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }

        &self.bytes
    }
}

/// Blackman window function for FFT analysis
pub fn blackman_window(index: usize, size: usize) -> f32 {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;

    let phase = 2.0 * PI * index as f32 / size as f32;
    A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos()
}
