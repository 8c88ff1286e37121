//! Per-vertex color response and the glow layer.

use glam::Vec2;

use super::Zone;
use crate::audio::{BandAnalysis, BeatState};
use crate::params::{GridLayout, Rgb, WaveSettings};

/// Combined band energy used for brightness and glow (0..1)
pub fn energy_level(analysis: &BandAnalysis) -> f32 {
    (analysis.band_average() * 1.5).min(1.0)
}

/// Brightness of a main-grid vertex while audio plays
pub fn main_brightness(
    position: Vec2,
    normalized_distance: f32,
    time: f32,
    analysis: &BandAnalysis,
    beat: &BeatState,
) -> f32 {
    let nd = normalized_distance;
    let mut brightness = 0.7 + 0.3 * (1.0 - nd);

    brightness *= 1.0 + energy_level(analysis) * 0.3;

    brightness *= match Zone::of(nd) {
        Zone::Bass => 1.0 + analysis.bass_intensity * 0.4,
        Zone::Mid => 1.0 + analysis.mid_intensity * 0.2,
        Zone::Treble => 1.0 + analysis.treble_intensity * 0.1,
    };

    brightness *= 1.0 + beat.strength * 0.5;
    brightness *= 1.0 + (analysis.peak_amplitude * 2.0).min(1.0) * 0.2;

    let noise_x = (position.x * 3.0 + time * 1.2).sin() * 0.1;
    let noise_z = (position.y * 3.0 + time * 0.8).cos() * 0.1;
    brightness * (0.9 + (noise_x + noise_z) * 0.1)
}

/// Main-grid vertex color while audio plays
pub fn main_color(base: Rgb, brightness: f32, settings: &WaveSettings) -> [f32; 3] {
    let saturation = 1.0 + settings.complexity * 0.3;
    base.scaled(saturation * brightness)
}

/// Mirror-grid vertex color: dim gray, shimmering slightly while playing
pub fn mirror_color(
    position: Vec2,
    normalized_distance: f32,
    time: f32,
    playing: bool,
) -> [f32; 3] {
    let brightness = 0.4 + 0.2 * (1.0 - normalized_distance);
    let variation = if playing {
        0.95 + 0.05 * (time * 0.3 + position.x * 0.5 + position.y * 0.5).sin()
    } else {
        0.95
    };
    Rgb::GRAY.scaled(brightness * variation)
}

/// Height multiplier applied to the glow copy of the grid
pub fn glow_height_boost(settings: &WaveSettings) -> f32 {
    1.1 + settings.intensity * 0.3 + settings.max_amplitude * 0.2
}

/// Opacity of the additive glow pass for lines drawn at `line_opacity`
pub fn glow_opacity(line_opacity: f32, layout: &GridLayout) -> f32 {
    (line_opacity * layout.glow_intensity).clamp(0.0, 1.0)
}

/// Glow color for a line color
pub fn glow_color(color: [f32; 3], analysis: &BandAnalysis) -> [f32; 3] {
    let boost = 1.2 + energy_level(analysis) * 0.3;
    color.map(|c| (c * boost).min(1.0))
}
