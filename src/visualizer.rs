//! Frame loop tying the audio signal chain to the main and mirror grids.

use tracing::{debug, trace};

use crate::audio::{BandAnalysis, BeatState, FrequencySource, SpectrumSampler, Waveform};
use crate::grid::{GridEngine, GridKind, TickInput};
use crate::params::{GridLayout, Preset, WaveSettings};

/// Explicit animation-loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Owns the sampler, both grid engines and the per-tick audio state.
///
/// Each tick runs sampler → band analysis → main engine → mirror engine.
/// Both engines see the same waveform and analysis.
pub struct Visualizer {
    settings: WaveSettings,
    sampler: SpectrumSampler,

    main: GridEngine,
    mirror: Option<GridEngine>,

    waveform: Waveform,
    analysis: BandAnalysis,

    state: LoopState,
    frames: u64,
    beats: u64,
}

impl Visualizer {
    pub fn new(settings: WaveSettings, layout: GridLayout, with_mirror: bool) -> Self {
        let settings = settings.clamped();
        let mirror = with_mirror.then(|| GridEngine::new(layout.clone(), GridKind::Mirror));

        Self {
            sampler: SpectrumSampler::new(&settings),
            settings,
            main: GridEngine::new(layout, GridKind::Main),
            mirror,
            waveform: Waveform::silent(),
            analysis: BandAnalysis::default(),
            state: LoopState::Stopped,
            frames: 0,
            beats: 0,
        }
    }

    pub fn from_preset(preset: &Preset, with_mirror: bool) -> Self {
        Self::new(preset.wave, preset.grid.clone(), with_mirror)
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Stopped {
            debug!("visualizer started");
        }
        self.state = LoopState::Running;
    }

    /// Halt the loop. One final non-playing tick clears history and beat state
    /// before further ticks are ignored.
    pub fn stop(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.step(0.0, false, None);
        self.state = LoopState::Stopped;
        debug!(frames = self.frames, beats = self.beats, "visualizer stopped");
    }

    /// Process one frame. Returns false (and does nothing) while stopped.
    pub fn tick<S: FrequencySource + ?Sized>(&mut self, delta_s: f32, source: &mut S) -> bool {
        if self.state == LoopState::Stopped {
            return false;
        }

        let playing = source.is_playing();
        let data = if playing { source.frequency_data() } else { None };
        self.step(delta_s, playing, data);
        true
    }

    fn step(&mut self, delta_s: f32, playing: bool, data: Option<&[u8]>) {
        self.waveform = match data {
            Some(bytes) if playing => self.sampler.sample(bytes),
            _ => Waveform::silent(),
        };
        self.analysis = BandAnalysis::from_samples(self.waveform.as_slice());

        let input = TickInput {
            delta_s,
            is_playing: playing,
            waveform: &self.waveform,
            analysis: &self.analysis,
            settings: &self.settings,
        };
        let beat = self.main.tick(&input);
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.tick(&input);
        }

        if beat {
            self.beats += 1;
            trace!(
                strength = self.main.beat().strength,
                total = self.beats,
                "beat registered"
            );
        }
        self.frames += 1;
    }

    /// Apply new user settings (clamped to their ranges)
    pub fn update_settings(&mut self, settings: WaveSettings) {
        self.settings = settings.clamped();
        self.sampler.update_settings(&self.settings);
    }

    /// Apply a new grid layout to both engines
    pub fn set_layout(&mut self, layout: GridLayout) {
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.set_layout(layout.clone());
        }
        self.main.set_layout(layout);
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn settings(&self) -> &WaveSettings {
        &self.settings
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    pub fn analysis(&self) -> &BandAnalysis {
        &self.analysis
    }

    pub fn beat(&self) -> &BeatState {
        self.main.beat()
    }

    pub fn main(&self) -> &GridEngine {
        &self.main
    }

    pub fn mirror(&self) -> Option<&GridEngine> {
        self.mirror.as_ref()
    }

    /// Frames processed since creation
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Beats registered by the main engine since creation
    pub fn beats(&self) -> u64 {
        self.beats
    }
}
