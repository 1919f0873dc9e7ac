//! Power-Up Cycle
//!
//! One shared index into an ordered list of power identifiers. Each pickup
//! hands out the entry at the index, then advances it, saturating at the
//! last entry. The index lives in the settings store so it survives respawns.

use glam::Vec2;

use crate::consts::POWER_UP_INDEX_KEY;
use crate::error::ConfigError;
use crate::settings::SettingsStore;

/// Cooldown for identifiers missing from the table (seconds)
pub const DEFAULT_SHOT_COOLDOWN: f32 = 0.3;

/// Powers with a known shooting behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerKind {
    Water,
    Fruit,
    Vanilla,
    Chocolate,
    SpreadShot,
    RapidFire,
}

impl PowerKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "water" => Some(PowerKind::Water),
            "fruit" => Some(PowerKind::Fruit),
            "vanilla" => Some(PowerKind::Vanilla),
            "chocolate" => Some(PowerKind::Chocolate),
            "spreadShot" => Some(PowerKind::SpreadShot),
            "rapidFire" => Some(PowerKind::RapidFire),
            _ => None,
        }
    }

    /// Seconds between shots
    pub fn cooldown(&self) -> f32 {
        match self {
            PowerKind::Water => 0.2,
            PowerKind::Chocolate => 0.2,
            PowerKind::Vanilla => 0.4,
            PowerKind::Fruit => 0.25,
            PowerKind::SpreadShot => 0.1,
            PowerKind::RapidFire => 0.15,
        }
    }
}

/// Shot cadence for any power identifier
pub fn shot_cooldown(power: &str) -> f32 {
    PowerKind::from_str(power)
        .map(|k| k.cooldown())
        .unwrap_or(DEFAULT_SHOT_COOLDOWN)
}

/// Velocities of one volley fired upward at `speed`
pub fn shot_pattern(power: &str, speed: f32) -> Vec<(Vec2, Vec2)> {
    let up = Vec2::new(0.0, -speed);
    match PowerKind::from_str(power) {
        Some(PowerKind::SpreadShot) => [-15.0_f32, 0.0, 15.0]
            .iter()
            .map(|deg| (Vec2::ZERO, Vec2::from_angle(deg.to_radians()).rotate(up)))
            .collect(),
        Some(PowerKind::Fruit) => vec![(Vec2::new(-8.0, 0.0), up), (Vec2::new(8.0, 0.0), up)],
        _ => vec![(Vec2::ZERO, up)],
    }
}

/// Saturating index into the power list
#[derive(Debug, Clone)]
pub struct PowerCycle {
    powers: Vec<String>,
    index: usize,
}

impl PowerCycle {
    /// Resume from the index held in the store (clamped to the list)
    pub fn load(powers: Vec<String>, store: &dyn SettingsStore) -> Result<Self, ConfigError> {
        if powers.is_empty() {
            return Err(ConfigError::EmptyPowerList);
        }
        let stored = store.get_u64(POWER_UP_INDEX_KEY, 0) as usize;
        let index = stored.min(powers.len() - 1);
        Ok(Self { powers, index })
    }

    /// Reset the stored index at session start
    pub fn reset_session(store: &mut dyn SettingsStore) {
        store.set_u64(POWER_UP_INDEX_KEY, 0);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Power the next pickup will grant
    pub fn current(&self) -> &str {
        &self.powers[self.index]
    }

    /// Take the power at the index, advance (saturating) and persist
    pub fn step(&mut self, store: &mut dyn SettingsStore) -> String {
        let granted = self.powers[self.index].clone();
        if self.index + 1 < self.powers.len() {
            self.index += 1;
        }
        store.set_u64(POWER_UP_INDEX_KEY, self.index as u64);
        granted
    }
}
