//! Playback and capture configuration for the headless driver.

use std::path::PathBuf;

/// Fixed-step playback configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Ticks per second of audio
    pub fps: u32,

    /// Stop after this many seconds (None = play to the end)
    pub max_duration_secs: Option<f32>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            max_duration_secs: None,
        }
    }
}

impl PlaybackConfig {
    /// Seconds between ticks
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// Total number of ticks for a track of the given length
    pub fn total_frames(&self, track_secs: f32) -> usize {
        let secs = match self.max_duration_secs {
            Some(limit) => track_secs.min(limit),
            None => track_secs,
        };
        (secs.max(0.0) * self.fps.max(1) as f32).ceil() as usize
    }
}

/// Height capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Raw little-endian f32 output, one main-grid height array per frame
    pub output_path: PathBuf,
}

impl CaptureConfig {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_frames() {
        let config = PlaybackConfig::default();
        assert_eq!(config.total_frames(2.0), 120);

        let limited = PlaybackConfig {
            fps: 30,
            max_duration_secs: Some(1.0),
        };
        assert_eq!(limited.total_frames(10.0), 30);
    }

    #[test]
    fn test_frame_delta_guards_zero_fps() {
        let config = PlaybackConfig {
            fps: 0,
            max_duration_secs: None,
        };
        assert_eq!(config.frame_delta(), 1.0);
    }
}
