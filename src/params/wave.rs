//! User-facing wave settings (the five sliders).

use serde::Deserialize;

/// Performance-time controls for the terrain response.
///
/// Every field is bounded; [`WaveSettings::clamped`] pulls stray values back
/// into range instead of rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WaveSettings {
    /// Overall height and motion gain (0.1..=1.0)
    pub intensity: f32,

    /// Animation clock multiplier (0.2..=2.0)
    pub speed: f32,

    /// Dynamics curve: low flattens, high sharpens peaks (0.1..=1.0)
    pub reactivity: f32,

    /// Number and strength of ripple/organic layers (0.0..=1.0)
    pub complexity: f32,

    /// Output gain and height limit (0.1..=3.0)
    pub max_amplitude: f32,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            intensity: 0.5,
            speed: 1.0,
            reactivity: 0.7,
            complexity: 0.5,
            max_amplitude: 1.0,
        }
    }
}

impl WaveSettings {
    pub const INTENSITY_RANGE: (f32, f32) = (0.1, 1.0);
    pub const SPEED_RANGE: (f32, f32) = (0.2, 2.0);
    pub const REACTIVITY_RANGE: (f32, f32) = (0.1, 1.0);
    pub const COMPLEXITY_RANGE: (f32, f32) = (0.0, 1.0);
    pub const MAX_AMPLITUDE_RANGE: (f32, f32) = (0.1, 3.0);

    /// Copy with every field clamped to its slider range (NaN falls back to default)
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let fit = |value: f32, (lo, hi): (f32, f32), fallback: f32| {
            if value.is_nan() {
                fallback
            } else {
                value.clamp(lo, hi)
            }
        };

        Self {
            intensity: fit(self.intensity, Self::INTENSITY_RANGE, defaults.intensity),
            speed: fit(self.speed, Self::SPEED_RANGE, defaults.speed),
            reactivity: fit(self.reactivity, Self::REACTIVITY_RANGE, defaults.reactivity),
            complexity: fit(self.complexity, Self::COMPLEXITY_RANGE, defaults.complexity),
            max_amplitude: fit(
                self.max_amplitude,
                Self::MAX_AMPLITUDE_RANGE,
                defaults.max_amplitude,
            ),
        }
    }
}
