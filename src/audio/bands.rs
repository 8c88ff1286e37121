//! Band analysis of a waveform: bass / mid / treble means plus overall and peak.

const BASS_FRACTION: f32 = 0.3;
const MID_FRACTION: f32 = 0.5;

/// Energy summary of one waveform (all fields in [0, 1])
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BandAnalysis {
    pub bass_intensity: f32,
    pub mid_intensity: f32,
    pub treble_intensity: f32,
    pub overall_intensity: f32,
    pub peak_amplitude: f32,
}

impl BandAnalysis {
    /// Analyse a waveform of any length
    pub fn from_samples(samples: &[f32]) -> Self {
        let (bass, mid, treble) = band_ranges(samples.len());

        Self {
            bass_intensity: mean(&samples[bass]),
            mid_intensity: mean(&samples[mid]),
            treble_intensity: mean(&samples[treble]),
            overall_intensity: mean(samples),
            peak_amplitude: samples.iter().copied().fold(0.0, f32::max),
        }
    }

    /// Mean of the three band intensities
    pub fn band_average(&self) -> f32 {
        (self.bass_intensity + self.mid_intensity + self.treble_intensity) / 3.0
    }
}

/// Index ranges of the bass, mid and treble bands for a waveform of `len`
/// samples. The three ranges are contiguous and cover `0..len`.
pub fn band_ranges(
    len: usize,
) -> (
    std::ops::Range<usize>,
    std::ops::Range<usize>,
    std::ops::Range<usize>,
) {
    let bass_end = (len as f32 * BASS_FRACTION).floor() as usize;
    let mid_end = bass_end + (len as f32 * MID_FRACTION).floor() as usize;
    (0..bass_end, bass_end..mid_end, mid_end..len)
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}
