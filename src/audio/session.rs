//! Audio session: decoded audio, playhead and analyser behind one owner.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec};
use tracing::{debug, info};

use super::{FrequencyAnalyser, FrequencySource};
use crate::error::{Error, Result};
use crate::params::AnalyserConfig;

/// Single owned audio resource.
///
/// Created on load, released on drop. Everything the session allocates lives
/// inside it, so an error part-way through `open` leaves nothing behind.
pub struct AudioSession {
    /// Mono samples in [-1, 1]
    samples: Vec<f32>,
    sample_rate: u32,

    /// Playhead in samples
    position: usize,
    playing: bool,

    analyser: FrequencyAnalyser,
    label: String,
}

impl AudioSession {
    /// Decode a WAV file and prepare it for playback
    pub fn open(path: &Path, config: AnalyserConfig) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        debug!(
            path = %path.display(),
            channels = spec.channels,
            sample_rate = spec.sample_rate,
            bits = spec.bits_per_sample,
            "decoding audio"
        );

        let interleaved = read_samples(reader)?;
        let samples = mix_to_mono(&interleaved, spec.channels);

        let session = Self::build(
            samples,
            spec.sample_rate,
            config,
            path.display().to_string(),
        )?;
        info!(
            "Audio: {} ({:.1}s @ {}Hz)",
            session.label,
            session.duration(),
            session.sample_rate
        );
        Ok(session)
    }

    /// Wrap in-memory mono samples
    pub fn from_samples(
        samples: Vec<f32>,
        sample_rate: u32,
        config: AnalyserConfig,
    ) -> Result<Self> {
        Self::build(samples, sample_rate, config, "<memory>".to_string())
    }

    fn build(
        samples: Vec<f32>,
        sample_rate: u32,
        config: AnalyserConfig,
        label: String,
    ) -> Result<Self> {
        if samples.is_empty() || sample_rate == 0 {
            return Err(Error::EmptyAudio);
        }

        Ok(Self {
            samples,
            sample_rate,
            position: 0,
            playing: false,
            analyser: FrequencyAnalyser::new(config)?,
            label,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Track length in seconds
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Playhead in seconds
    pub fn current_time(&self) -> f32 {
        self.position as f32 / self.sample_rate as f32
    }

    pub fn play(&mut self) {
        if !self.playing {
            debug!(at = self.current_time(), "play");
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        if self.playing {
            debug!(at = self.current_time(), "pause");
        }
        self.playing = false;
    }

    /// Pause and rewind to the start
    pub fn stop(&mut self) {
        self.playing = false;
        self.position = 0;
        self.analyser.reset();
    }

    /// Move the playhead (clamped to the track)
    pub fn seek(&mut self, seconds: f32) {
        let target = (seconds.max(0.0) * self.sample_rate as f32) as usize;
        self.position = target.min(self.samples.len());
        self.analyser.reset();
    }

    /// Advance the playhead by `delta_s` while playing.
    ///
    /// Reaching the end stops playback and rewinds, like an ended media element.
    pub fn advance(&mut self, delta_s: f32) {
        if !self.playing {
            return;
        }

        let step = (delta_s.max(0.0) * self.sample_rate as f32).round() as usize;
        self.position = self.position.saturating_add(step);
        if self.position >= self.samples.len() {
            info!("Audio: {} ended", self.label);
            self.stop();
        }
    }
}

impl FrequencySource for AudioSession {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn frequency_data(&mut self) -> Option<&[u8]> {
        let end = self.position.min(self.samples.len());
        Some(self.analyser.analyse(&self.samples[..end]))
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        debug!(label = %self.label, "audio session released");
    }
}

/// How stored samples map onto f32
#[derive(Debug, Clone, Copy, PartialEq)]
enum SampleDecoding {
    Float,
    /// Integer samples multiplied by `scale`
    Int { scale: f32 },
}

/// Pick the decoding for a WAV layout, rejecting anything but 32-bit float
/// and 8/16/24/32-bit integer
fn sample_decoding(spec: &WavSpec) -> Result<SampleDecoding> {
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => Ok(SampleDecoding::Float),
        (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => Ok(SampleDecoding::Int {
            scale: 1.0 / (1u64 << (bits - 1)) as f32,
        }),
        (SampleFormat::Float, bits) => Err(Error::UnsupportedFormat {
            bits,
            format: "float",
        }),
        (SampleFormat::Int, bits) => Err(Error::UnsupportedFormat {
            bits,
            format: "integer",
        }),
    }
}

/// Read every sample as f32 in [-1, 1]
fn read_samples<R: std::io::Read>(reader: WavReader<R>) -> Result<Vec<f32>> {
    match sample_decoding(&reader.spec())? {
        SampleDecoding::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from),
        SampleDecoding::Int { scale } => reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 * scale))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from),
    }
}

/// Average interleaved channels into one
fn mix_to_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
