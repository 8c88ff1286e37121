//! Wavegrid library - Audio-reactive line grid driven by a live spectrum

pub mod audio;
pub mod cli;
pub mod error;
pub mod grid;
pub mod params;
pub mod visualizer;

pub use error::{Error, Result};
