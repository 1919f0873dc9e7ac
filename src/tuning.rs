//! Data-driven game balance
//!
//! Every number here is a default, not a contract. Tuning files are JSON and
//! may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::boss::build_staircase;

/// Playfield dimensions in pixels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldTuning {
    pub width: f32,
    pub height: f32,
}

impl Default for PlayfieldTuning {
    fn default() -> Self {
        Self {
            width: 360.0,
            height: 640.0,
        }
    }
}

/// Base interval and ramp floor of one spawn generator (seconds)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeneratorTuning {
    pub interval: f32,
    pub floor: f32,
}

impl GeneratorTuning {
    pub const fn new(interval: f32, floor: f32) -> Self {
        Self { interval, floor }
    }
}

/// Spawn Director timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub ordered: GeneratorTuning,
    pub path_wave: GeneratorTuning,
    pub tank: GeneratorTuning,
    pub slider: GeneratorTuning,
    pub teleporter: GeneratorTuning,
    /// Seconds between difficulty level increments
    pub difficulty_interval: f32,
    /// Generator delays start shrinking once the level exceeds this
    pub ramp_after_level: u32,
    /// Seconds removed from each active generator per ramp step
    pub ramp_step: f32,
    /// Foes in an ordered formation line
    pub ordered_count: u32,
    pub ordered_spacing: f32,
    pub ordered_jitter: f32,
    pub ordered_speed: f32,
    pub slider_speed: f32,
    pub tank_speed: f32,
    pub teleporter_drift: f32,
    pub teleport_interval: f32,
    pub teleport_max_hops: u32,
    /// Stage that spawns the boss instead of running generators
    pub boss_stage: u32,
    pub boss_release_delay: f32,
    pub boss_cue_interval: f32,
    /// Completed waves that finish a stage
    pub waves_per_stage: u32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            ordered: GeneratorTuning::new(7.0, 3.0),
            path_wave: GeneratorTuning::new(15.0, 8.0),
            tank: GeneratorTuning::new(3.0, 1.5),
            slider: GeneratorTuning::new(5.0, 2.5),
            teleporter: GeneratorTuning::new(6.0, 4.0),
            difficulty_interval: 20.0,
            ramp_after_level: 5,
            ramp_step: 0.5,
            ordered_count: 5,
            ordered_spacing: 40.0,
            ordered_jitter: 10.0,
            ordered_speed: 400.0,
            slider_speed: 200.0,
            tank_speed: 620.0,
            teleporter_drift: 40.0,
            teleport_interval: 1.5,
            teleport_max_hops: 5,
            boss_stage: 4,
            boss_release_delay: 2.0,
            boss_cue_interval: 10.0,
            waves_per_stage: 10,
        }
    }
}

/// Path Formation Engine geometry and timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationTuning {
    pub cohort_size: u32,
    pub zigzag_segments: u32,
    /// Seconds for one member to traverse the whole path
    pub duration: f32,
    /// Start offset per member index (seconds)
    pub stagger: f32,
    /// Horizontal swing of the zig-zag
    pub zigzag_width: f32,
    /// Vertical span covered by the zig-zag
    pub zigzag_span: f32,
    pub entry_x_min: f32,
    pub entry_x_max: f32,
    pub entry_depth_min: f32,
    pub entry_depth_max: f32,
    /// How far below the playfield the exit segment ends
    pub exit_margin: f32,
}

impl Default for FormationTuning {
    fn default() -> Self {
        Self {
            cohort_size: 5,
            zigzag_segments: 8,
            duration: 12.0,
            stagger: 0.3,
            zigzag_width: 120.0,
            zigzag_span: 360.0,
            entry_x_min: 24.0,
            entry_x_max: 200.0,
            entry_depth_min: 10.0,
            entry_depth_max: 30.0,
            exit_margin: 50.0,
        }
    }
}

/// Player survivability and handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_lives: u32,
    pub speed: f32,
    /// Player hovers this far above the pointer
    pub pointer_offset: f32,
    pub shot_speed: f32,
    pub respawn_delay: f32,
    pub blink_duration: f32,
    pub game_over_delay: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_lives: 5,
            speed: 800.0,
            pointer_offset: 24.0,
            shot_speed: 600.0,
            respawn_delay: 1.0,
            blink_duration: 1.0,
            game_over_delay: 2.0,
        }
    }
}

/// Foe and boss firing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    /// Staircase spans [-extent, extent]
    pub pattern_extent: f32,
    pub pattern_step: f32,
    /// Per-tick chance the boss fires
    pub fire_chance: f64,
    /// Per-tick chance a regular foe fires an aimed shot
    pub foe_fire_chance: f64,
    pub shot_speed: f32,
    pub lives: u32,
    pub points: u64,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            pattern_extent: 200.0,
            pattern_step: 50.0,
            fire_chance: 1.0 / 6.0,
            foe_fire_chance: 0.01,
            shot_speed: 300.0,
            lives: 20,
            points: 10_000,
        }
    }
}

/// Power-up cycle and spawning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    /// Ordered power identifiers handed out by successive pickups
    pub powers: Vec<String>,
    /// Power the player starts each life with
    pub starting_power: String,
    pub reward_ttl: f32,
    pub reward_speed: f32,
    pub drift_min_delay: f32,
    pub drift_max_delay: f32,
    pub drift_min_duration: f32,
    pub drift_max_duration: f32,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            powers: ["fruit", "vanilla", "chocolate", "spreadShot", "rapidFire"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            starting_power: "water".to_string(),
            reward_ttl: 5.0,
            reward_speed: 200.0,
            drift_min_delay: 12.0,
            drift_max_delay: 20.0,
            drift_min_duration: 4.0,
            drift_max_duration: 6.0,
        }
    }
}

/// Score awards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    pub hit: u64,
    pub shot_clash: u64,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            hit: 50,
            shot_clash: 50,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub playfield: PlayfieldTuning,
    pub spawn: SpawnTuning,
    pub formation: FormationTuning,
    pub player: PlayerTuning,
    pub boss: BossTuning,
    pub power_ups: PowerUpTuning,
    pub score: ScoreTuning,
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn chance(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::NotAChance { field, value })
    }
}

fn nonzero(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroCount(field))
    } else {
        Ok(())
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject configurations the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("playfield.width", self.playfield.width)?;
        positive("playfield.height", self.playfield.height)?;

        let s = &self.spawn;
        for (kind, g) in [
            ("ordered", s.ordered),
            ("path_wave", s.path_wave),
            ("tank", s.tank),
            ("slider", s.slider),
            ("teleporter", s.teleporter),
        ] {
            positive("spawn generator floor", g.floor)?;
            if g.floor > g.interval {
                return Err(ConfigError::FloorAboveDelay {
                    kind,
                    floor: g.floor,
                    delay: g.interval,
                });
            }
        }
        positive("spawn.difficulty_interval", s.difficulty_interval)?;
        positive("spawn.teleport_interval", s.teleport_interval)?;
        positive("spawn.boss_cue_interval", s.boss_cue_interval)?;
        non_negative("spawn.ramp_step", s.ramp_step)?;
        nonzero("spawn.ordered_count", s.ordered_count)?;
        non_negative("spawn.ordered_spacing", s.ordered_spacing)?;
        non_negative("spawn.ordered_jitter", s.ordered_jitter)?;
        nonzero("spawn.waves_per_stage", s.waves_per_stage)?;

        let f = &self.formation;
        nonzero("formation.cohort_size", f.cohort_size)?;
        nonzero("formation.zigzag_segments", f.zigzag_segments)?;
        positive("formation.duration", f.duration)?;
        non_negative("formation.stagger", f.stagger)?;

        let p = &self.player;
        nonzero("player.max_lives", p.max_lives)?;
        positive("player.respawn_delay", p.respawn_delay)?;
        positive("player.game_over_delay", p.game_over_delay)?;
        positive("player.blink_duration", p.blink_duration)?;

        let b = &self.boss;
        build_staircase(b.pattern_extent, b.pattern_step)?;
        nonzero("boss.lives", b.lives)?;
        chance("boss.fire_chance", b.fire_chance)?;
        chance("boss.foe_fire_chance", b.foe_fire_chance)?;

        let u = &self.power_ups;
        if u.powers.is_empty() {
            return Err(ConfigError::EmptyPowerList);
        }
        positive("power_ups.reward_ttl", u.reward_ttl)?;
        non_negative("power_ups.reward_speed", u.reward_speed)?;
        positive("power_ups.drift_min_delay", u.drift_min_delay)?;
        positive("power_ups.drift_min_duration", u.drift_min_duration)?;
        Ok(())
    }
}
