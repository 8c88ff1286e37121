//! Line-segment grid geometry with cached initial positions.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::params::GridLayout;

/// Vertex data for the line grid (position + color)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Static grid layout: rest positions on the XZ plane and line index pairs.
///
/// Horizontal segments come first (row by row), then vertical segments
/// (column by column); every segment owns its two endpoint vertices.
#[derive(Clone, Debug)]
pub struct LineGrid {
    /// Rest XZ position of each vertex (read-only after construction)
    pub positions: Vec<Vec2>,
    /// `positions[i] / max_distance`, clamped to [0, 1]
    pub normalized_distances: Vec<f32>,
    /// Pairs of vertex indices, one pair per segment
    pub indices: Vec<u32>,
    max_distance: f32,
}

impl LineGrid {
    /// Build the grid for a layout
    pub fn new(layout: &GridLayout) -> Self {
        let rows = layout.horizontal_lines;
        let cols = layout.vertical_lines;
        let spacing = layout.spacing;
        let half_rows = rows as f32 / 2.0;
        let half_cols = cols as f32 / 2.0;

        let mut positions = Vec::new();

        // Horizontal lines: one segment between each pair of neighbouring columns
        for z in 0..rows {
            let z_pos = (z as f32 - half_rows) * spacing;
            for x in 0..cols.saturating_sub(1) {
                let x1 = (x as f32 - half_cols) * spacing;
                let x2 = (x as f32 + 1.0 - half_cols) * spacing;
                positions.push(Vec2::new(x1, z_pos));
                positions.push(Vec2::new(x2, z_pos));
            }
        }

        // Vertical lines
        for x in 0..cols {
            let x_pos = (x as f32 - half_cols) * spacing;
            for z in 0..rows.saturating_sub(1) {
                let z1 = (z as f32 - half_rows) * spacing;
                let z2 = (z as f32 + 1.0 - half_rows) * spacing;
                positions.push(Vec2::new(x_pos, z1));
                positions.push(Vec2::new(x_pos, z2));
            }
        }

        let indices = (0..positions.len() as u32).collect();

        let max_distance = layout.max_distance();
        let normalized_distances = positions
            .iter()
            .map(|p| {
                if max_distance > 0.0 {
                    (p.length() / max_distance).min(1.0)
                } else {
                    0.0
                }
            })
            .collect();

        Self {
            positions,
            normalized_distances,
            indices,
            max_distance,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }
}
