//! Distance-delayed wave propagation over the line grid.
//!
//! Each tick the engine records the current waveform, then rebuilds every
//! vertex height from the history entry that "arrived" at that vertex: the
//! centre follows the live audio, the edges replay it a few seconds late.

use std::f32::consts::PI;

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use tracing::debug;

use super::history::{HistoryEntry, WaveHistory};
use super::mesh::{LineGrid, Vertex};
use super::shading;
use crate::audio::{BandAnalysis, BeatDetector, BeatState, DecayMode, Waveform};
use crate::params::{audio_constants::WAVEFORM_LEN, GridLayout, Rgb, WaveSettings};

/// Perlin seed for mirror jitter
const JITTER_SEED: u32 = 42;

/// Frequency zone a vertex falls into by normalized distance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// nd < 0.3
    Bass,
    /// 0.3 <= nd < 0.7
    Mid,
    /// nd >= 0.7
    Treble,
}

impl Zone {
    pub fn of(normalized_distance: f32) -> Self {
        if normalized_distance < 0.3 {
            Zone::Bass
        } else if normalized_distance < 0.7 {
            Zone::Mid
        } else {
            Zone::Treble
        }
    }
}

/// Which grid an engine drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKind {
    /// Upright gold grid
    Main,
    /// Inverted, attenuated reflection below the main grid
    Mirror,
}

/// Propagation state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropagationState {
    /// Gentle idle oscillation; no wave has started
    Idle,
    /// A wave is spreading outward from `wave_start` (engine clock, seconds)
    Active { wave_start: f32 },
}

/// Band intensities scaled by reactivity and capped at 1
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandStrengths {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

impl BandStrengths {
    pub fn new(analysis: &BandAnalysis, reactivity: f32) -> Self {
        Self {
            bass: (analysis.bass_intensity * (2.0 + reactivity)).min(1.0),
            mid: (analysis.mid_intensity * (1.5 + reactivity * 0.5)).min(1.0),
            treble: (analysis.treble_intensity * (1.2 + reactivity * 0.3)).min(1.0),
        }
    }
}

/// Seconds after wave start at which the wavefront reaches a vertex
pub fn wave_arrival_time(
    layout: &GridLayout,
    normalized_distance: f32,
    strengths: &BandStrengths,
    complexity: f32,
) -> f32 {
    let zone_speed = match Zone::of(normalized_distance) {
        Zone::Bass => 0.7 + strengths.bass * 0.6,
        Zone::Mid => 0.9 + strengths.mid * 0.4,
        Zone::Treble => 1.1 + strengths.treble * 0.5,
    };
    let speed = layout.wave_propagation_speed * (1.0 + complexity * 0.5) * zone_speed;
    normalized_distance * speed
}

/// Per-tick inputs shared by the main and mirror engines
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    /// Wall-clock seconds since the previous tick
    pub delta_s: f32,
    pub is_playing: bool,
    pub waveform: &'a Waveform,
    pub analysis: &'a BandAnalysis,
    pub settings: &'a WaveSettings,
}

/// Quantities that are constant across all vertices within one tick
struct WaveFrame<'a> {
    layout: &'a GridLayout,
    settings: WaveSettings,
    analysis: BandAnalysis,
    strengths: BandStrengths,
    beat_detected: bool,
    beat_strength: f32,
    time: f32,
    elapsed: f32,
    height_scale: f32,
    beat_multiplier: f32,
    peak_boost: f32,
    ripple_count: usize,
    organic_layers: usize,
}

impl<'a> WaveFrame<'a> {
    fn new(
        layout: &'a GridLayout,
        settings: WaveSettings,
        analysis: BandAnalysis,
        beat: &BeatState,
        time: f32,
        wave_start: f32,
    ) -> Self {
        let amp = settings.max_amplitude;
        Self {
            layout,
            strengths: BandStrengths::new(&analysis, settings.reactivity),
            beat_detected: beat.detected,
            beat_strength: beat.strength,
            time,
            elapsed: time - wave_start,
            height_scale: layout.base_height_scale * settings.intensity * amp * 2.0,
            beat_multiplier: 1.0 + beat.strength * (0.8 + amp * 0.7),
            peak_boost: 1.0 + (analysis.peak_amplitude * 3.0).min(2.0) * amp * 0.3,
            ripple_count: (2.0 + settings.complexity * 3.0).floor() as usize,
            organic_layers: (1.0 + settings.complexity * 2.0).floor() as usize,
            settings,
            analysis,
        }
    }

    /// Height of one vertex before any mirror transform (0 until the wave arrives)
    fn height_at(&self, position: Vec2, nd: f32, history: &WaveHistory) -> f32 {
        let s = &self.settings;
        let arrival = wave_arrival_time(self.layout, nd, &self.strengths, s.complexity);
        if self.elapsed < arrival {
            return 0.0;
        }

        let target = (self.time - arrival).max(0.0);
        let Some(entry) = history.nearest(target) else {
            return 0.0;
        };

        let amp = s.max_amplitude;
        let edge = 1.0 - nd;
        let delayed = self.elapsed - arrival;

        let mut height = self.base_height(entry, nd);
        height += self.ripples(position.length(), delayed, edge) * amp;
        height += self.organic(position, delayed, edge) * s.intensity * amp;
        height += self.noise(position, edge) * amp;

        if self.beat_detected {
            let frequency = 25.0 + self.beat_strength * 15.0;
            height += (self.time * frequency).sin()
                * 0.15
                * self.beat_strength
                * edge
                * amp
                * s.intensity;
        }

        let falloff_curve = edge.powf(1.5 + s.reactivity * 0.5);
        height *= 1.0 - nd * self.layout.center_falloff * falloff_curve;

        let limit = 5.0 * amp;
        height.clamp(-limit, limit)
    }

    fn base_height(&self, entry: &HistoryEntry, nd: f32) -> f32 {
        let s = &self.settings;
        let st = &self.strengths;

        let stretch = 1.0 + st.bass * 0.3;
        let index = ((nd * WAVEFORM_LEN as f32 * stretch).floor() as usize).min(WAVEFORM_LEN - 1);
        let value = entry.waveform.get(index).powf(2.0 - s.reactivity);

        let zone = match Zone::of(nd) {
            Zone::Bass => {
                st.bass
                    * self.layout.bass_center_factor
                    * (2.5 - nd * 2.0)
                    * (1.0 + s.intensity * 0.5)
            }
            Zone::Mid => st.mid * (1.0 + s.complexity * 0.3),
            Zone::Treble => {
                st.treble * self.layout.high_edge_factor * nd * (1.0 + s.max_amplitude * 0.2)
            }
        };

        value * self.height_scale * zone * self.beat_multiplier * self.peak_boost
    }

    fn ripples(&self, distance: f32, delayed: f32, edge: f32) -> f32 {
        let count = self.ripple_count;
        if count == 0 {
            return 0.0;
        }
        let k = (0.2 + self.settings.intensity * 0.3) / count as f32;
        let spatial = 1.0 + self.strengths.mid * 0.3;
        let temporal = 1.0 + self.analysis.overall_intensity * 0.4;

        (0..count)
            .map(|r| {
                let r_f = r as f32;
                let frequency = self.layout.ripple_frequency * (1.0 + r_f * 0.4);
                let speed = self.layout.ripple_speed * (1.0 + r_f * 0.25);
                let phase = r_f * PI * 2.0 / count as f32;
                let angle = distance * frequency * spatial + delayed * speed * temporal + phase;
                angle.sin() * k * edge
            })
            .sum()
    }

    fn organic(&self, position: Vec2, delayed: f32, edge: f32) -> f32 {
        let layers = self.organic_layers;
        if layers == 0 {
            return 0.0;
        }
        let layout = self.layout;
        let k = (0.08 + self.settings.complexity * 0.04) / layers as f32;

        (0..layers)
            .map(|o| {
                let o_f = o as f32;
                let x_freq = layout.organic_x_frequency * (1.0 + o_f * 0.5);
                let z_freq = layout.organic_z_frequency * (1.0 + o_f * 0.4);
                let x_speed = layout.organic_x_speed * (1.0 + o_f * 0.3);
                let z_speed = layout.organic_z_speed * (1.0 + o_f * 0.2);

                let x_wave = (position.x * x_freq
                    + delayed * x_speed * (1.0 + self.strengths.bass * 0.2))
                    .sin()
                    * k;
                let z_wave = (position.y * z_freq
                    + delayed * z_speed * (1.0 + self.strengths.treble * 0.1))
                    .cos()
                    * k
                    * 0.7;
                (x_wave + z_wave) * edge
            })
            .sum()
    }

    fn noise(&self, position: Vec2, edge: f32) -> f32 {
        let s = &self.settings;
        let t = self.time;
        let (x, z) = (position.x, position.y);
        let frequency = 1.5 + s.complexity * 1.5;

        (x * frequency + t * (1.2 + self.strengths.bass * 0.3)).sin()
            * (z * frequency + t * (0.9 + self.strengths.treble * 0.2)).cos()
            * (t * 0.7 + x * 0.3 + z * 0.3).sin()
            * (0.15 + s.reactivity * 0.1)
            * s.complexity
            * edge
    }
}

/// Audio-reactive height field for one line grid.
///
/// The main and mirror grids each own an engine; both are fed the same
/// `TickInput` so their beat detectors and histories stay in lockstep.
pub struct GridEngine {
    kind: GridKind,
    layout: GridLayout,
    grid: LineGrid,

    heights: Vec<f32>,
    /// XZ jitter per vertex (mirror only, recomputed each tick)
    offsets: Vec<Vec2>,
    colors: Vec<[f32; 3]>,

    history: WaveHistory,
    beat: BeatDetector,
    analysis: BandAnalysis,
    settings: WaveSettings,
    state: PropagationState,

    /// Engine clock: advances by `delta * speed` while playing
    time: f32,
    /// Idle clock: advances by `delta` every tick
    idle_time: f32,
    playing: bool,

    jitter: Perlin,
}

impl GridEngine {
    pub fn new(layout: GridLayout, kind: GridKind) -> Self {
        Self::with_decay(layout, kind, DecayMode::default())
    }

    /// Engine with an explicit beat-strength decay mode
    pub fn with_decay(layout: GridLayout, kind: GridKind, decay: DecayMode) -> Self {
        let grid = LineGrid::new(&layout);
        let n = grid.vertex_count();
        let mut engine = Self {
            kind,
            layout,
            grid,
            heights: vec![0.0; n],
            offsets: vec![Vec2::ZERO; n],
            colors: Vec::new(),
            history: WaveHistory::new(),
            beat: BeatDetector::new(decay),
            analysis: BandAnalysis::default(),
            settings: WaveSettings::default(),
            state: PropagationState::Idle,
            time: 0.0,
            idle_time: 0.0,
            playing: false,
            jitter: Perlin::new(JITTER_SEED),
        };
        engine.reset_colors();
        engine
    }

    /// Advance the engine by one frame; returns true when a new beat registered
    pub fn tick(&mut self, input: &TickInput) -> bool {
        if self.grid.is_empty() {
            return false;
        }

        let settings = input.settings.clamped();
        let delta = input.delta_s.max(0.0);
        self.settings = settings;
        self.playing = input.is_playing;

        self.idle_time += delta;
        if input.is_playing {
            self.time += delta * settings.speed;
        }

        match self.state {
            PropagationState::Idle if input.is_playing && input.waveform.is_audible() => {
                self.state = PropagationState::Active {
                    wave_start: self.time,
                };
                debug!(kind = ?self.kind, at = self.time, "wave started");
            }
            PropagationState::Active { .. } if !input.is_playing => {
                self.state = PropagationState::Idle;
                self.beat.reset();
                self.analysis = BandAnalysis::default();
                debug!(kind = ?self.kind, at = self.time, "wave stopped");
            }
            _ => {}
        }

        if !input.is_playing {
            self.history.clear();
        }

        let beat = match self.state {
            PropagationState::Active { wave_start } => {
                self.analysis = *input.analysis;
                let beat = self.beat.update(self.time, &self.analysis);
                self.history.push(self.time, *input.waveform, self.analysis);
                self.propagate(wave_start);
                beat
            }
            PropagationState::Idle => {
                self.relax_to_idle();
                false
            }
        };

        self.shade();
        beat
    }

    fn propagate(&mut self, wave_start: f32) {
        let frame = WaveFrame::new(
            &self.layout,
            self.settings,
            self.analysis,
            self.beat.state(),
            self.time,
            wave_start,
        );

        for (i, (&position, &nd)) in self
            .grid
            .positions
            .iter()
            .zip(&self.grid.normalized_distances)
            .enumerate()
        {
            self.heights[i] = frame.height_at(position, nd, &self.history);
        }

        if self.kind == GridKind::Mirror {
            let reflection = self.reflection();
            for h in &mut self.heights {
                *h = -*h * reflection;
            }
            self.update_jitter();
        }
    }

    fn relax_to_idle(&mut self) {
        let blend = self.layout.idle_return_speed.clamp(0.0, 1.0);
        let wave = self.layout.idle_amplitude * (self.idle_time * self.layout.idle_rate).sin();
        let reflection = match self.kind {
            GridKind::Main => 1.0,
            GridKind::Mirror => -self.reflection(),
        };

        for (h, &nd) in self.heights.iter_mut().zip(&self.grid.normalized_distances) {
            let target = wave * (1.0 - nd) * reflection;
            *h += (target - *h) * blend;
        }
        self.offsets.fill(Vec2::ZERO);
    }

    /// Mirror attenuation factor
    fn reflection(&self) -> f32 {
        0.6 + self.settings.intensity * 0.4
    }

    /// Sub-pixel XZ jitter drawn from Perlin noise so it never accumulates
    fn update_jitter(&mut self) {
        if self.layout.mirror_blur <= 0.0 {
            self.offsets.fill(Vec2::ZERO);
            return;
        }

        let blur = self.layout.mirror_blur
            * (1.0 + self.analysis.overall_intensity * 0.5)
            * self.settings.intensity;
        let scale = 0.005 * blur;
        let t = self.time as f64 * 2.0;

        for (offset, p) in self.offsets.iter_mut().zip(&self.grid.positions) {
            let (x, z) = (p.x as f64 * 7.0, p.y as f64 * 7.0);
            let jx = self.jitter.get([x, z, t]) as f32;
            let jz = self.jitter.get([x + 31.4, z - 17.3, t]) as f32;
            *offset = Vec2::new(jx, jz).clamp(Vec2::splat(-1.0), Vec2::splat(1.0)) * scale;
        }
    }

    fn shade(&mut self) {
        let beat = self.beat.state();
        match self.kind {
            GridKind::Main => {
                if !self.playing {
                    return;
                }
                for ((color, &p), &nd) in self
                    .colors
                    .iter_mut()
                    .zip(&self.grid.positions)
                    .zip(&self.grid.normalized_distances)
                {
                    let brightness =
                        shading::main_brightness(p, nd, self.time, &self.analysis, beat);
                    *color =
                        shading::main_color(self.layout.main_color, brightness, &self.settings);
                }
            }
            GridKind::Mirror => {
                for ((color, &p), &nd) in self
                    .colors
                    .iter_mut()
                    .zip(&self.grid.positions)
                    .zip(&self.grid.normalized_distances)
                {
                    *color = shading::mirror_color(p, nd, self.time, self.playing);
                }
            }
        }
    }

    fn reset_colors(&mut self) {
        let base = match self.kind {
            GridKind::Main => self.layout.main_color,
            GridKind::Mirror => Rgb::GRAY,
        };
        self.colors = vec![base.0; self.grid.vertex_count()];
    }

    /// Replace the layout, rebuilding geometry when the line layout changed
    pub fn set_layout(&mut self, layout: GridLayout) {
        let rebuild = layout.geometry_differs(&self.layout);
        let recolor = layout.main_color != self.layout.main_color;
        self.layout = layout;

        if rebuild {
            self.grid = LineGrid::new(&self.layout);
            let n = self.grid.vertex_count();
            self.heights = vec![0.0; n];
            self.offsets = vec![Vec2::ZERO; n];
            debug!(kind = ?self.kind, vertices = n, "grid rebuilt");
        }
        if rebuild || recolor {
            self.reset_colors();
        }
    }

    /// Vertices with current heights, jitter and colors
    pub fn vertices(&self) -> Vec<Vertex> {
        self.build_vertices(1.0, |c| c)
    }

    /// Boosted copy of the grid for the glow pass (None when glow is off)
    pub fn glow_vertices(&self) -> Option<Vec<Vertex>> {
        if !self.layout.glow_enabled {
            return None;
        }
        let boost = shading::glow_height_boost(&self.settings);
        let analysis = self.analysis;
        Some(self.build_vertices(boost, |c| shading::glow_color(c, &analysis)))
    }

    /// Glow pass opacity for lines drawn at `line_opacity` (None when glow is off)
    pub fn glow_opacity(&self, line_opacity: f32) -> Option<f32> {
        self.layout
            .glow_enabled
            .then(|| shading::glow_opacity(line_opacity, &self.layout))
    }

    fn build_vertices(
        &self,
        height_gain: f32,
        color: impl Fn([f32; 3]) -> [f32; 3],
    ) -> Vec<Vertex> {
        self.grid
            .positions
            .iter()
            .zip(&self.offsets)
            .zip(&self.heights)
            .zip(&self.colors)
            .map(|(((p, offset), &h), &c)| Vertex {
                position: [p.x + offset.x, h * height_gain, p.y + offset.y],
                color: color(c),
            })
            .collect()
    }

    /// Arrival time of the wavefront at `vertex` under the current analysis
    pub fn arrival_time(&self, vertex: usize) -> Option<f32> {
        let nd = *self.grid.normalized_distances.get(vertex)?;
        let strengths = BandStrengths::new(&self.analysis, self.settings.reactivity);
        Some(wave_arrival_time(
            &self.layout,
            nd,
            &strengths,
            self.settings.complexity,
        ))
    }

    /// Seconds since the active wave started (None while idle)
    pub fn elapsed_since_wave_start(&self) -> Option<f32> {
        match self.state {
            PropagationState::Active { wave_start } => Some(self.time - wave_start),
            PropagationState::Idle => None,
        }
    }

    pub fn kind(&self) -> GridKind {
        self.kind
    }

    pub fn state(&self) -> PropagationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PropagationState::Active { .. })
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn grid(&self) -> &LineGrid {
        &self.grid
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn offsets(&self) -> &[Vec2] {
        &self.offsets
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn beat(&self) -> &BeatState {
        self.beat.state()
    }

    pub fn analysis(&self) -> &BandAnalysis {
        &self.analysis
    }

    pub fn history(&self) -> &WaveHistory {
        &self.history
    }

    /// Engine clock in seconds
    pub fn time(&self) -> f32 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_layout() -> GridLayout {
        GridLayout {
            horizontal_lines: 8,
            vertical_lines: 10,
            spacing: 0.5,
            ..GridLayout::default()
        }
    }

    fn steady_analysis(level: f32) -> BandAnalysis {
        BandAnalysis {
            bass_intensity: level,
            mid_intensity: level,
            treble_intensity: level,
            overall_intensity: level,
            peak_amplitude: level,
        }
    }

    fn tick(
        engine: &mut GridEngine,
        delta_s: f32,
        is_playing: bool,
        waveform: &Waveform,
        analysis: &BandAnalysis,
    ) -> bool {
        let settings = WaveSettings::default();
        engine.tick(&TickInput {
            delta_s,
            is_playing,
            waveform,
            analysis,
            settings: &settings,
        })
    }

    fn centre_vertex(engine: &GridEngine) -> usize {
        engine
            .grid()
            .positions
            .iter()
            .position(|p| *p == Vec2::ZERO)
            .unwrap()
    }

    #[test]
    fn test_zone_boundaries() {
        assert_eq!(Zone::of(0.0), Zone::Bass);
        assert_eq!(Zone::of(0.299), Zone::Bass);
        assert_eq!(Zone::of(0.3), Zone::Mid);
        assert_eq!(Zone::of(0.699), Zone::Mid);
        assert_eq!(Zone::of(0.7), Zone::Treble);
        assert_eq!(Zone::of(1.0), Zone::Treble);
    }

    #[test]
    fn test_arrival_time_grows_with_distance() {
        let layout = GridLayout::default();
        let strengths = BandStrengths::default();

        assert_eq!(wave_arrival_time(&layout, 0.0, &strengths, 0.5), 0.0);
        // 1.0 * 4.0 * 1.25 * 1.1
        assert!((wave_arrival_time(&layout, 1.0, &strengths, 0.5) - 5.5).abs() < 1e-5);
        assert!(
            wave_arrival_time(&layout, 0.5, &strengths, 0.5)
                < wave_arrival_time(&layout, 0.9, &strengths, 0.5)
        );
    }

    #[test]
    fn test_silence_stays_idle_and_converges() {
        let mut engine = GridEngine::new(small_layout(), GridKind::Main);
        let silent = Waveform::silent();
        let quiet = BandAnalysis::default();

        for _ in 0..300 {
            tick(&mut engine, 1.0 / 60.0, true, &silent, &quiet);
        }
        assert!(!engine.is_active());

        let layout = engine.layout().clone();
        let wave = layout.idle_amplitude * (300.0 / 60.0 * layout.idle_rate).sin();
        for (&h, &nd) in engine.heights().iter().zip(&engine.grid().normalized_distances) {
            assert!((h - wave * (1.0 - nd)).abs() < 0.01);
            assert!(h.abs() <= layout.idle_amplitude + 1e-6);
        }
    }

    #[test]
    fn test_centre_responds_on_first_active_tick() {
        let mut engine = GridEngine::new(small_layout(), GridKind::Main);
        let loud = Waveform::from_slice(&[0.5; 100]);
        let analysis = steady_analysis(0.5);

        tick(&mut engine, 1.0 / 60.0, true, &loud, &analysis);

        assert!(engine.is_active());
        assert_eq!(engine.elapsed_since_wave_start(), Some(0.0));
        let centre = centre_vertex(&engine);
        assert!(engine.heights()[centre] > 0.0);
    }

    #[test]
    fn test_corner_waits_for_wavefront() {
        let mut engine = GridEngine::new(small_layout(), GridKind::Main);
        let loud = Waveform::from_slice(&[0.5; 100]);
        let analysis = steady_analysis(0.5);

        // Vertex 0 is the grid corner (normalized distance 1)
        tick(&mut engine, 0.1, true, &loud, &analysis);
        let arrival = engine.arrival_time(0).unwrap();
        assert!(arrival > 1.0);

        let mut arrived = false;
        for _ in 0..200 {
            let elapsed = engine.elapsed_since_wave_start().unwrap();
            let h = engine.heights()[0];
            if elapsed < arrival {
                assert_eq!(h, 0.0, "corner moved at {elapsed}s, before {arrival}s");
            } else if elapsed > arrival + 0.2 {
                assert!(h.abs() > 0.0);
                arrived = true;
                break;
            }
            tick(&mut engine, 0.1, true, &loud, &analysis);
        }
        assert!(arrived);
    }

    #[test]
    fn test_heights_are_clamped() {
        let mut engine = GridEngine::new(small_layout(), GridKind::Main);
        let loud = Waveform::from_slice(&[1.0; 100]);
        let analysis = steady_analysis(1.0);
        let settings = WaveSettings {
            intensity: 1.0,
            max_amplitude: 0.5,
            ..WaveSettings::default()
        };

        for _ in 0..120 {
            engine.tick(&TickInput {
                delta_s: 1.0 / 60.0,
                is_playing: true,
                waveform: &loud,
                analysis: &analysis,
                settings: &settings,
            });
            assert!(engine.heights().iter().all(|h| h.abs() <= 2.5 + 1e-5));
        }
    }

    #[test]
    fn test_mirror_is_inverted_and_attenuated() {
        let mut main = GridEngine::new(small_layout(), GridKind::Main);
        let mut mirror = GridEngine::new(small_layout(), GridKind::Mirror);
        let loud = Waveform::from_slice(&[0.6; 100]);
        let analysis = steady_analysis(0.4);

        for _ in 0..30 {
            tick(&mut main, 1.0 / 60.0, true, &loud, &analysis);
            tick(&mut mirror, 1.0 / 60.0, true, &loud, &analysis);
        }

        // Default intensity 0.5 → reflection 0.8
        for (&m, &r) in main.heights().iter().zip(mirror.heights()) {
            assert!((r + m * 0.8).abs() < 1e-4);
        }

        let jitter_limit = 0.005 * 1.0 * (1.0 + 0.4 * 0.5) * 0.5 + 1e-6;
        assert!(mirror
            .offsets()
            .iter()
            .all(|o| o.x.abs() <= jitter_limit && o.y.abs() <= jitter_limit));
        assert!(main.offsets().iter().all(|o| *o == Vec2::ZERO));
    }

    #[test]
    fn test_stopping_returns_to_idle() {
        let mut engine = GridEngine::new(small_layout(), GridKind::Main);
        let loud = Waveform::from_slice(&[0.5; 100]);
        let analysis = steady_analysis(0.5);

        for _ in 0..10 {
            tick(&mut engine, 1.0 / 60.0, true, &loud, &analysis);
        }
        assert!(!engine.history().is_empty());
        let clock = engine.time();

        tick(&mut engine, 1.0 / 60.0, false, &loud, &analysis);
        assert_eq!(engine.state(), PropagationState::Idle);
        assert!(engine.history().is_empty());
        assert_eq!(*engine.beat(), BeatState::default());
        // Clock only runs while playing
        assert_eq!(engine.time(), clock);
    }

    #[test]
    fn test_stopped_grids_settle_on_idle_target() {
        let loud = Waveform::from_slice(&[1.0; 100]);
        let analysis = steady_analysis(0.9);
        let delta = 1.0 / 60.0;
        let max_abs = |heights: &[f32]| heights.iter().fold(0.0f32, |m, h| m.max(h.abs()));

        for kind in [GridKind::Main, GridKind::Mirror] {
            let mut engine = GridEngine::new(small_layout(), kind);
            let mut idle_time = 0.0f32;

            for _ in 0..120 {
                tick(&mut engine, delta, true, &loud, &analysis);
                idle_time += delta;
            }
            let start = max_abs(engine.heights());
            assert!(start > 0.1, "{kind:?} never moved");

            for _ in 0..400 {
                tick(&mut engine, delta, false, &loud, &analysis);
                idle_time += delta;
                assert!(max_abs(engine.heights()) <= start + 1e-6);
            }
            assert!(!engine.is_active());

            // Default intensity 0.5: the mirror reflects by -(0.6 + 0.4 * 0.5)
            let reflection = match kind {
                GridKind::Main => 1.0,
                GridKind::Mirror => -0.8,
            };
            let layout = engine.layout();
            let wave = layout.idle_amplitude * (idle_time * layout.idle_rate).sin();
            for (&h, &nd) in engine.heights().iter().zip(&engine.grid().normalized_distances) {
                let target = wave * (1.0 - nd) * reflection;
                assert!((h - target).abs() < 0.01, "{kind:?}: {h} vs {target}");
            }
            assert!(engine.offsets().iter().all(|o| *o == Vec2::ZERO));
        }
    }

    #[test]
    fn test_tick_reports_new_beats() {
        let mut engine = GridEngine::new(small_layout(), GridKind::Main);
        let wave = Waveform::from_slice(&[0.5; 100]);

        for _ in 0..10 {
            assert!(!tick(&mut engine, 1.0 / 60.0, true, &wave, &steady_analysis(0.1)));
        }
        assert!(tick(&mut engine, 1.0 / 60.0, true, &wave, &steady_analysis(1.0)));
        assert!(engine.beat().detected);

        // Debounced on the very next tick
        assert!(!tick(&mut engine, 1.0 / 60.0, true, &wave, &steady_analysis(1.0)));

        // Stopping never reports a beat
        assert!(!tick(&mut engine, 1.0 / 60.0, false, &wave, &steady_analysis(1.0)));
    }

    #[test]
    fn test_silent_ticks_keep_wave_active() {
        let mut engine = GridEngine::new(small_layout(), GridKind::Main);
        let loud = Waveform::from_slice(&[0.5; 100]);
        let silent = Waveform::silent();

        tick(&mut engine, 1.0 / 60.0, true, &loud, &steady_analysis(0.5));
        for _ in 0..30 {
            tick(&mut engine, 1.0 / 60.0, true, &silent, &BandAnalysis::default());
        }
        assert!(engine.is_active());
        assert_eq!(engine.history().len(), 31);
    }

    #[test]
    fn test_main_colors_hold_when_not_playing() {
        let mut engine = GridEngine::new(small_layout(), GridKind::Main);
        let gold = Rgb::GOLD.0;
        tick(&mut engine, 1.0 / 60.0, false, &Waveform::silent(), &BandAnalysis::default());
        assert!(engine.colors().iter().all(|c| *c == gold));

        let loud = Waveform::from_slice(&[0.5; 100]);
        tick(&mut engine, 1.0 / 60.0, true, &loud, &steady_analysis(0.5));
        assert!(engine.colors().iter().any(|c| *c != gold));
    }

    #[test]
    fn test_glow_follows_layout_flag() {
        let mut engine = GridEngine::new(small_layout(), GridKind::Main);
        let glow = engine.glow_vertices().unwrap();
        assert_eq!(glow.len(), engine.vertices().len());
        assert_eq!(engine.glow_opacity(1.0), Some(0.5));

        engine.set_layout(GridLayout {
            glow_enabled: false,
            ..small_layout()
        });
        assert!(engine.glow_vertices().is_none());
        assert_eq!(engine.glow_opacity(1.0), None);
    }

    #[test]
    fn test_set_layout_rebuilds_geometry() {
        let mut engine = GridEngine::new(small_layout(), GridKind::Main);
        let loud = Waveform::from_slice(&[0.5; 100]);
        for _ in 0..10 {
            tick(&mut engine, 1.0 / 60.0, true, &loud, &steady_analysis(0.5));
        }

        let bigger = GridLayout {
            horizontal_lines: 12,
            ..small_layout()
        };
        engine.set_layout(bigger);

        let n = engine.grid().vertex_count();
        assert_eq!(engine.heights().len(), n);
        assert_eq!(engine.colors().len(), n);
        assert!(engine.heights().iter().all(|&h| h == 0.0));
        assert_eq!(engine.vertices().len(), n);
    }

    #[test]
    fn test_empty_grid_tick_is_noop() {
        let layout = GridLayout {
            horizontal_lines: 0,
            vertical_lines: 0,
            ..GridLayout::default()
        };
        let mut engine = GridEngine::new(layout, GridKind::Mirror);
        let loud = Waveform::from_slice(&[0.5; 100]);

        tick(&mut engine, 1.0 / 60.0, true, &loud, &steady_analysis(0.5));
        assert!(!engine.is_active());
        assert!(engine.vertices().is_empty());
        assert_eq!(engine.arrival_time(0), None);
    }
}
