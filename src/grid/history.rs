//! Time-indexed waveform history for distance-delayed playback.

use std::collections::VecDeque;

use crate::audio::{BandAnalysis, Waveform};

/// Seconds of history retained
pub const HISTORY_SPAN_S: f32 = 3.0;

/// One recorded tick
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub time: f32,
    pub waveform: Waveform,
    pub analysis: BandAnalysis,
}

/// Sliding 3-second window of recorded ticks, oldest first
#[derive(Clone, Debug, Default)]
pub struct WaveHistory {
    entries: VecDeque<HistoryEntry>,
}

impl WaveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tick and drop everything older than the span
    pub fn push(&mut self, time: f32, waveform: Waveform, analysis: BandAnalysis) {
        self.entries.push_back(HistoryEntry {
            time,
            waveform,
            analysis,
        });
        self.prune(time);
    }

    /// Drop entries with `now - time > span`
    pub fn prune(&mut self, now: f32) {
        self.entries.retain(|entry| now - entry.time <= HISTORY_SPAN_S);
    }

    /// Entry closest in time to `target` (earliest wins ties)
    pub fn nearest(&self, target: f32) -> Option<&HistoryEntry> {
        let mut best: Option<(&HistoryEntry, f32)> = None;
        for entry in &self.entries {
            let diff = (target - entry.time).abs();
            match best {
                Some((_, best_diff)) if diff >= best_diff => {}
                _ => best = Some((entry, diff)),
            }
        }
        best.map(|(entry, _)| entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Time covered between the oldest and newest entry
    pub fn span(&self) -> f32 {
        match (self.entries.front(), self.entries.back()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }
}
