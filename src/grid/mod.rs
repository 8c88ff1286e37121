//! Audio-reactive line grid: geometry, waveform history and wave propagation.

mod engine;
mod history;
mod mesh;
pub mod shading;

// Re-export public types
pub use engine::{
    wave_arrival_time, BandStrengths, GridEngine, GridKind, PropagationState, TickInput, Zone,
};
pub use history::{HistoryEntry, WaveHistory, HISTORY_SPAN_S};
pub use mesh::{LineGrid, Vertex};
