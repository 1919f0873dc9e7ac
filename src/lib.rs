//! Sky Raid - simulation core of a vertically scrolling arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, formations, collisions, player state)
//! - `tuning`: Data-driven game balance
//! - `settings`: Key-value settings store (score, power-up index)
//! - `audio`: Sound cue identifiers handed to the audio collaborator

pub mod audio;
pub mod error;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::ConfigError;
pub use settings::{JsonFileStore, MemoryStore, SettingsStore};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Physics body radii
    pub const FOE_RADIUS: f32 = 24.0;
    pub const PLAYER_RADIUS: f32 = 24.0;
    pub const SHOT_RADIUS: f32 = 8.0;
    pub const POWER_UP_RADIUS: f32 = 14.0;

    /// Shadow offsets (shadows are drawn down-right of their owner)
    pub const FOE_SHADOW_OFFSET: Vec2 = Vec2::new(20.0, 20.0);
    pub const PLAYER_SHADOW_OFFSET: Vec2 = Vec2::new(10.0, 10.0);
    pub const SHOT_SHADOW_OFFSET: Vec2 = Vec2::new(10.0, 10.0);
    pub const POWER_UP_SHADOW_OFFSET: Vec2 = Vec2::new(20.0, 20.0);

    /// Foes below this distance past the bottom edge are discarded
    pub const FOE_EXIT_MARGIN_Y: f32 = 64.0;
    /// Foes further than this outside the side edges are discarded
    pub const FOE_EXIT_MARGIN_X: f32 = 150.0;

    /// Settings store keys
    pub const SCORE_KEY: &str = "score";
    pub const TOTAL_SCORE_KEY: &str = "total_score";
    pub const POWER_UP_INDEX_KEY: &str = "power_up_index";
}

/// Axis-aligned playfield rectangle anchored at the origin (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Clamp a point into the playfield
    #[inline]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}

/// Velocity of magnitude `speed` pointing from `from` toward `to`
///
/// Returns zero when the points coincide.
#[inline]
pub fn aim(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    (to - from).normalize_or_zero() * speed
}

/// Reflect velocity off the playfield edges, keeping `pos` inside.
///
/// Standard reflection: the component normal to the crossed edge flips sign.
pub fn bounce_in_bounds(pos: &mut Vec2, vel: &mut Vec2, bounds: &Bounds) {
    if pos.x < 0.0 {
        pos.x = -pos.x;
        vel.x = vel.x.abs();
    } else if pos.x > bounds.width {
        pos.x = 2.0 * bounds.width - pos.x;
        vel.x = -vel.x.abs();
    }
    if pos.y < 0.0 {
        pos.y = -pos.y;
        vel.y = vel.y.abs();
    } else if pos.y > bounds.height {
        pos.y = 2.0 * bounds.height - pos.y;
        vel.y = -vel.y.abs();
    }
}
