//! Heuristic beat detection over a rolling window of band analyses.

use std::collections::VecDeque;

use tracing::trace;

use super::BandAnalysis;

/// Seconds of analysis kept for the rolling averages
const PATTERN_WINDOW_S: f32 = 2.0;

/// Minimum spacing between registered beats (caps tempo at 600 BPM)
const MIN_BEAT_INTERVAL_S: f32 = 0.1;

/// Quiet time after a beat before strength starts to decay
const DECAY_HOLD_S: f32 = 0.2;

/// Multiplicative strength decay per step
const DECAY_FACTOR: f32 = 0.8;

const INTENSITY_RATIO: f32 = 1.5;
const INTENSITY_FLOOR: f32 = 0.3;
const PEAK_RATIO: f32 = 1.3;
const PEAK_FLOOR: f32 = 0.4;

/// One entry of the rolling analysis window
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternEntry {
    pub time: f32,
    pub intensity: f32,
    pub bass: f32,
    pub peak: f32,
}

/// How beat strength fades once the hold time has passed
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DecayMode {
    /// ×0.8 on every detector invocation (rate depends on tick rate)
    #[default]
    PerTick,

    /// ×0.8 per `reference_interval_s` of elapsed clock time
    FrameRateIndependent { reference_interval_s: f32 },
}

/// Observable beat state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BeatState {
    pub detected: bool,
    pub last_beat_time: f32,
    /// Decaying score in [0, 1]
    pub strength: f32,
    pub rhythmic_pattern: VecDeque<PatternEntry>,
}

/// Beat detector: flags energy spikes above the rolling average
#[derive(Clone, Debug, Default)]
pub struct BeatDetector {
    state: BeatState,
    decay: DecayMode,
    last_update: Option<f32>,
}

impl BeatDetector {
    pub fn new(decay: DecayMode) -> Self {
        Self {
            decay,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &BeatState {
        &self.state
    }

    /// Forget all history and strength (playback stopped)
    pub fn reset(&mut self) {
        self.state = BeatState::default();
        self.last_update = None;
    }

    /// Feed one analysis at clock time `now`; returns true when a new beat registers
    pub fn update(&mut self, now: f32, analysis: &BandAnalysis) -> bool {
        let overall = analysis.overall_intensity;
        let peak = analysis.peak_amplitude;

        let pattern = &mut self.state.rhythmic_pattern;
        pattern.push_back(PatternEntry {
            time: now,
            intensity: overall,
            bass: analysis.bass_intensity,
            peak,
        });
        while pattern
            .front()
            .is_some_and(|entry| now - entry.time > PATTERN_WINDOW_S)
        {
            pattern.pop_front();
        }

        let count = pattern.len().max(1) as f32;
        let avg_intensity = pattern.iter().map(|e| e.intensity).sum::<f32>() / count;
        let avg_peak = pattern.iter().map(|e| e.peak).sum::<f32>() / count;

        let is_spike = (overall > avg_intensity * INTENSITY_RATIO && overall > INTENSITY_FLOOR)
            || (peak > avg_peak * PEAK_RATIO && peak > PEAK_FLOOR);

        let since_beat = now - self.state.last_beat_time;
        let elapsed = self.last_update.map_or(0.0, |last| (now - last).max(0.0));
        self.last_update = Some(now);

        if is_spike && since_beat > MIN_BEAT_INTERVAL_S {
            let strength = (overall - avg_intensity) * 2.0 + (peak - avg_peak) * 1.5;
            self.state.detected = true;
            self.state.last_beat_time = now;
            self.state.strength = strength.clamp(0.0, 1.0);
            trace!(now, strength = self.state.strength, "beat");
            return true;
        }

        if since_beat > DECAY_HOLD_S {
            self.state.detected = false;
            self.state.strength *= self.decay_factor(elapsed);
        }
        false
    }

    fn decay_factor(&self, elapsed: f32) -> f32 {
        match self.decay {
            DecayMode::PerTick => DECAY_FACTOR,
            DecayMode::FrameRateIndependent {
                reference_interval_s,
            } if reference_interval_s > 0.0 => {
                DECAY_FACTOR.powf(elapsed / reference_interval_s)
            }
            DecayMode::FrameRateIndependent { .. } => DECAY_FACTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(level: f32) -> BandAnalysis {
        BandAnalysis {
            bass_intensity: level,
            mid_intensity: level,
            treble_intensity: level,
            overall_intensity: level,
            peak_amplitude: level,
        }
    }

    #[test]
    fn test_constant_signal_never_beats() {
        let mut detector = BeatDetector::default();

        for tick in 0..600 {
            let now = 1.0 + tick as f32 / 60.0;
            assert!(!detector.update(now, &flat(0.6)));
            assert!(!detector.state().detected);
        }
    }

    #[test]
    fn test_spike_after_quiet_beats() {
        let mut detector = BeatDetector::default();
        let mut now = 1.0;

        for _ in 0..10 {
            detector.update(now, &flat(0.1));
            now += 1.0 / 60.0;
        }

        assert!(detector.update(now, &flat(1.0)));
        assert!(detector.state().detected);
        assert_eq!(detector.state().last_beat_time, now);
        assert!(detector.state().strength > 0.9);
    }

    #[test]
    fn test_debounce() {
        let mut detector = BeatDetector::default();
        for i in 0..10 {
            detector.update(1.0 + i as f32 * 0.01, &flat(0.05));
        }

        assert!(detector.update(1.1, &flat(1.0)));

        // 50 ms later: still a spike against the average, but too soon
        assert!(!detector.update(1.15, &flat(1.0)));
        assert_eq!(detector.state().last_beat_time, 1.1);
        assert!(detector.state().detected);
    }

    #[test]
    fn test_strength_decays_within_31_ticks() {
        let mut detector = BeatDetector::default();
        let mut now = 1.0;
        for _ in 0..10 {
            detector.update(now, &flat(0.1));
            now += 0.01;
        }
        assert!(detector.update(now, &flat(1.0)));

        // Quiet ticks 0.25 s apart, each past the hold time
        for _ in 0..31 {
            now += 0.25;
            assert!(!detector.update(now, &flat(0.0)));
        }

        assert!(!detector.state().detected);
        assert!(detector.state().strength < 0.001);
    }

    #[test]
    fn test_pattern_window_is_two_seconds() {
        let mut detector = BeatDetector::default();
        for tick in 0..300 {
            detector.update(tick as f32 / 60.0, &flat(0.2));
        }

        let now = 299.0 / 60.0;
        let pattern = &detector.state().rhythmic_pattern;
        assert!(pattern.iter().all(|e| now - e.time <= PATTERN_WINDOW_S));
        assert!(pattern.len() >= 120);
    }

    #[test]
    fn test_frame_rate_independent_decay() {
        let mut fast = BeatDetector::new(DecayMode::FrameRateIndependent {
            reference_interval_s: 1.0 / 60.0,
        });
        let mut slow = fast.clone();

        for detector in [&mut fast, &mut slow] {
            for i in 0..10 {
                detector.update(1.0 + i as f32 * 0.01, &flat(0.1));
            }
            assert!(detector.update(1.1, &flat(1.0)));
            // Past the hold window
            detector.update(1.4, &flat(0.0));
        }
        let start = fast.state().strength;
        assert!((start - slow.state().strength).abs() < 1e-6);

        // Half a second of quiet at 120 Hz vs 30 Hz decays by the same factor
        for i in 1..=60 {
            fast.update(1.4 + i as f32 / 120.0, &flat(0.0));
        }
        for i in 1..=15 {
            slow.update(1.4 + i as f32 / 30.0, &flat(0.0));
        }

        let expected = DECAY_FACTOR.powf(30.0);
        let fast_ratio = fast.state().strength / start;
        let slow_ratio = slow.state().strength / start;
        assert!((fast_ratio - expected).abs() / expected < 0.01);
        assert!((slow_ratio - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_reset() {
        let mut detector = BeatDetector::default();
        for i in 0..10 {
            detector.update(1.0 + i as f32 * 0.01, &flat(0.1));
        }
        detector.update(1.2, &flat(1.0));

        detector.reset();
        assert_eq!(detector.state(), &BeatState::default());
    }
}
