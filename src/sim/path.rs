//! Piecewise-linear formation paths
//!
//! Points along a path are sampled by arc length, so a member advancing its
//! progress at a constant rate moves at constant speed.

use glam::Vec2;
use rand::Rng;

use crate::Bounds;
use crate::tuning::FormationTuning;

/// Polyline with precomputed cumulative segment lengths
#[derive(Debug, Clone)]
pub struct Path {
    points: Vec<Vec2>,
    /// cumulative[i] = length from the start to points[i]
    cumulative: Vec<f32>,
}

impl Path {
    pub fn new(start: Vec2) -> Self {
        Self {
            points: vec![start],
            cumulative: vec![0.0],
        }
    }

    /// Append a straight segment ending at `to`
    pub fn line_to(&mut self, to: Vec2) -> &mut Self {
        let (last, len) = match (self.points.last(), self.cumulative.last()) {
            (Some(&last), Some(&len)) => (last, len),
            _ => (to, 0.0),
        };
        self.points.push(to);
        self.cumulative.push(len + last.distance(to));
        self
    }

    pub fn total_length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Point at normalized progress `t` (clamped to [0, 1])
    pub fn point_at(&self, t: f32) -> Vec2 {
        let total = self.total_length();
        let first = self.points.first().copied().unwrap_or(Vec2::ZERO);
        if total <= 0.0 {
            return first;
        }
        let target = t.clamp(0.0, 1.0) * total;

        // First vertex whose cumulative length reaches the target
        let i = self
            .cumulative
            .partition_point(|&len| len < target)
            .clamp(1, self.points.len() - 1);
        let (a, b) = (self.points[i - 1], self.points[i]);
        let seg_len = self.cumulative[i] - self.cumulative[i - 1];
        if seg_len <= 0.0 {
            return b;
        }
        a.lerp(b, (target - self.cumulative[i - 1]) / seg_len)
    }
}

/// Build a wave path: vertical entry, alternating zig-zag down the play
/// height, then a vertical exit below the visible area.
pub fn build_wave_path(rng: &mut impl Rng, tuning: &FormationTuning, bounds: &Bounds) -> Path {
    let x_max = tuning
        .entry_x_max
        .min(bounds.width - tuning.zigzag_width)
        .max(tuning.entry_x_min);
    let start = rng.random_range(tuning.entry_x_min..=x_max);
    let entry_depth = rng.random_range(tuning.entry_depth_min..=tuning.entry_depth_max.max(tuning.entry_depth_min));

    let segments = tuning.zigzag_segments.max(1);
    let h = tuning.zigzag_span / segments as f32;

    let mut path = Path::new(Vec2::new(start, 0.0));
    path.line_to(Vec2::new(start, entry_depth));
    for i in 0..segments {
        let step = h * (i + 1) as f32;
        if i % 2 == 0 {
            path.line_to(Vec2::new(start, 24.0 + step));
        } else {
            path.line_to(Vec2::new(start + tuning.zigzag_width, 48.0 + step));
        }
    }
    path.line_to(Vec2::new(start, bounds.height + tuning.exit_margin));
    path
}
