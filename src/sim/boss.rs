//! Boss firing pattern
//!
//! The boss walks a precomputed staircase of horizontal offsets, descending
//! across the whole range and climbing back, one step per shot.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Build the offset staircase covering `[-extent, extent]` in `step` increments.
///
/// Descends from `extent` (exclusive of `-extent`), then ascends from
/// `-extent` (exclusive of `extent`), so the cycle wraps without repeating
/// either end. Empty patterns are a fatal configuration error.
pub fn build_staircase(extent: f32, step: f32) -> Result<Vec<f32>, ConfigError> {
    if !(step > 0.0) || !(extent >= step) {
        return Err(ConfigError::EmptyBossPattern { extent, step });
    }
    let steps = (2.0 * extent / step).floor() as usize;
    let descending = (0..steps).map(|i| extent - i as f32 * step);
    let ascending = (0..steps).map(|i| -extent + i as f32 * step);
    Ok(descending.chain(ascending).collect())
}

/// Position of one boss within the shared staircase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCursor {
    pub index: usize,
}

impl PatternCursor {
    /// Current offset; advances the cursor, wrapping to the start
    pub fn advance(&mut self, pattern: &[f32]) -> Option<f32> {
        let offset = *pattern.get(self.index)?;
        self.index = if self.index + 1 >= pattern.len() {
            0
        } else {
            self.index + 1
        };
        Some(offset)
    }
}

/// Velocity of a boss projectile for the given staircase offset
#[inline]
pub fn boss_shot_velocity(offset: f32, speed: f32) -> Vec2 {
    Vec2::new(offset, speed)
}
