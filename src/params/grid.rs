//! Grid layout, propagation constants and idle/glow parameters.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::Error;

/// Linear RGB color parsed from `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const GOLD: Rgb = Rgb([1.0, 215.0 / 255.0, 0.0]);
    pub const GRAY: Rgb = Rgb([0.4, 0.4, 0.4]);

    pub fn scaled(self, factor: f32) -> [f32; 3] {
        self.0.map(|c| c * factor)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6)
            .ok_or_else(|| Error::InvalidColor(s.to_string()))?;
        let value =
            u32::from_str_radix(hex, 16).map_err(|_| Error::InvalidColor(s.to_string()))?;

        Ok(Rgb([
            ((value >> 16) & 0xff) as f32 / 255.0,
            ((value >> 8) & 0xff) as f32 / 255.0,
            (value & 0xff) as f32 / 255.0,
        ]))
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Grid geometry and wave-propagation parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// Rows of horizontal lines (along X)
    pub horizontal_lines: usize,

    /// Columns of vertical lines (along Z)
    pub vertical_lines: usize,

    /// Distance between neighbouring lines (world units)
    pub spacing: f32,

    /// Height gain before intensity/max-amplitude scaling
    pub base_height_scale: f32,

    /// Seconds for the wavefront to reach the grid corner (before band modulation)
    pub wave_propagation_speed: f32,

    /// Spatial frequency of the first ripple layer (radians per unit)
    pub ripple_frequency: f32,

    /// Temporal speed of the first ripple layer (radians per second)
    pub ripple_speed: f32,

    /// Organic motion, X axis: spatial frequency and speed of the first layer
    pub organic_x_frequency: f32,
    pub organic_x_speed: f32,

    /// Organic motion, Z axis: spatial frequency and speed of the first layer
    pub organic_z_frequency: f32,
    pub organic_z_speed: f32,

    /// Strength of the mid-radius height dip (0 = none)
    pub center_falloff: f32,

    /// Bass response gain in the centre zone
    pub bass_center_factor: f32,

    /// Treble response gain in the outer zone
    pub high_edge_factor: f32,

    /// Fraction of the gap to the idle target closed per tick (0.08..=0.15)
    pub idle_return_speed: f32,

    /// Peak height of the idle oscillation at the centre
    pub idle_amplitude: f32,

    /// Idle oscillation angular rate (radians per second)
    pub idle_rate: f32,

    /// Emit the glow layer
    pub glow_enabled: bool,

    /// Glow layer opacity relative to the main lines
    pub glow_intensity: f32,

    /// Main grid line color
    pub main_color: Rgb,

    /// Mirror positional jitter gain (0 disables)
    pub mirror_blur: f32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            horizontal_lines: 40,
            vertical_lines: 60,
            spacing: 0.15,
            base_height_scale: 2.5,
            wave_propagation_speed: 4.0,
            ripple_frequency: 8.0,
            ripple_speed: 4.0,
            organic_x_frequency: 4.0,
            organic_x_speed: 2.5,
            organic_z_frequency: 3.0,
            organic_z_speed: 1.2,
            center_falloff: 0.25,
            bass_center_factor: 1.2,
            high_edge_factor: 1.2,
            idle_return_speed: 0.15,
            idle_amplitude: 0.05,
            idle_rate: 0.8,
            glow_enabled: true,
            glow_intensity: 0.5,
            main_color: Rgb::GOLD,
            mirror_blur: 1.0,
        }
    }
}

impl GridLayout {
    /// True when the line layout (not just the response constants) differs
    pub fn geometry_differs(&self, other: &GridLayout) -> bool {
        self.horizontal_lines != other.horizontal_lines
            || self.vertical_lines != other.vertical_lines
            || self.spacing != other.spacing
    }

    /// Distance from the grid centre to its corner
    pub fn max_distance(&self) -> f32 {
        let half_x = self.vertical_lines as f32 / 2.0 * self.spacing;
        let half_z = self.horizontal_lines as f32 / 2.0 * self.spacing;
        (half_x * half_x + half_z * half_z).sqrt()
    }
}
