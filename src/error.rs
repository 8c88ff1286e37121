//! Error types for the audio and configuration boundary.
//!
//! The signal pipeline itself never fails: every numeric edge degrades to a
//! neutral value. Only decoding audio and loading presets can go wrong.

/// Result type alias for wavegrid operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV container or sample decoding failed
    #[error("failed to decode audio: {0}")]
    Wav(#[from] hound::Error),

    /// Sample layout we do not know how to convert
    #[error("unsupported sample format: {bits}-bit {format}")]
    UnsupportedFormat { bits: u16, format: &'static str },

    /// File decoded but contained no frames
    #[error("audio file contains no samples")]
    EmptyAudio,

    /// Analyser configuration rejected by validation
    #[error("invalid analyser config: {0}")]
    InvalidAnalyser(String),

    /// Preset file could not be parsed
    #[error("invalid preset: {0}")]
    Config(#[from] toml::de::Error),

    /// Color string is not `#rrggbb`
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
}
