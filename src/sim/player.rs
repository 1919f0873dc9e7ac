//! Player entity and survivability state machine
//!
//! `Survival` is the single source of truth for lives: remaining lives are
//! always `max_lives - collision_count`, the count never decreases, and
//! game over happens exactly once, on the hit that reaches `max_lives`.

use glam::Vec2;

use super::entity::{EntityId, ShadowId};
use super::power::shot_cooldown;
use crate::Bounds;
use crate::consts::PLAYER_RADIUS;

/// The player's ship
#[derive(Debug, Clone)]
pub struct Player {
    pub id: EntityId,
    pub pos: Vec2,
    pub shadow: Option<ShadowId>,
    /// Blinking after a respawn; takes no damage
    pub invulnerable: bool,
    /// Active power identifier (drives shot cadence and pattern)
    pub power: String,
    /// Seconds until the next shot is allowed
    reload: f32,
}

impl Player {
    pub fn new(id: EntityId, pos: Vec2, power: String) -> Self {
        Self {
            id,
            pos,
            shadow: None,
            invulnerable: false,
            power,
            reload: 0.0,
        }
    }

    /// Move toward the point under the pointer (offset upward, clamped to
    /// the playfield) at no more than `speed`.
    pub fn steer(&mut self, pointer: Vec2, pointer_offset: f32, speed: f32, dt: f32, bounds: &Bounds) {
        let target = Vec2::new(
            pointer.x.clamp(PLAYER_RADIUS, bounds.width - PLAYER_RADIUS),
            (pointer.y - pointer_offset).clamp(PLAYER_RADIUS, bounds.height - PLAYER_RADIUS),
        );
        let to_target = target - self.pos;
        let max_step = speed * dt;
        self.pos = if to_target.length() <= max_step {
            target
        } else {
            self.pos + to_target.normalize() * max_step
        };
    }

    /// Count down the reload timer and report whether a volley goes out now
    pub fn try_fire(&mut self, firing: bool, dt: f32) -> bool {
        self.reload = (self.reload - dt).max(0.0);
        if firing && self.reload <= 0.0 {
            self.reload = shot_cooldown(&self.power);
            true
        } else {
            false
        }
    }

    pub fn set_power(&mut self, power: String) {
        self.power = power;
    }
}

/// What a damaging contact did to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Invulnerable, or the game is already over
    Ignored,
    /// A life was lost; a respawn follows
    LifeLost { lives_remaining: u32 },
    /// The last life was lost
    GameOver,
}

/// Lives bookkeeping
#[derive(Debug, Clone)]
pub struct Survival {
    max_lives: u32,
    collision_count: u32,
    game_over: bool,
}

impl Survival {
    pub fn new(max_lives: u32) -> Self {
        Self {
            max_lives,
            collision_count: 0,
            game_over: false,
        }
    }

    /// Register a damaging contact
    pub fn register_hit(&mut self, invulnerable: bool) -> HitOutcome {
        if invulnerable || self.game_over {
            return HitOutcome::Ignored;
        }
        self.collision_count += 1;
        if self.collision_count >= self.max_lives {
            self.game_over = true;
            HitOutcome::GameOver
        } else {
            HitOutcome::LifeLost {
                lives_remaining: self.lives_remaining(),
            }
        }
    }

    pub fn lives_remaining(&self) -> u32 {
        self.max_lives.saturating_sub(self.collision_count)
    }

    pub fn collision_count(&self) -> u32 {
        self.collision_count
    }

    pub fn max_lives(&self) -> u32 {
        self.max_lives
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survival_counts_down_to_game_over() {
        let mut s = Survival::new(3);
        assert_eq!(s.register_hit(false), HitOutcome::LifeLost { lives_remaining: 2 });
        assert_eq!(s.register_hit(true), HitOutcome::Ignored);
        assert_eq!(s.register_hit(false), HitOutcome::LifeLost { lives_remaining: 1 });
        assert_eq!(s.register_hit(false), HitOutcome::GameOver);
        assert_eq!(s.register_hit(false), HitOutcome::Ignored);
        assert_eq!(s.collision_count(), 3);
        assert_eq!(s.lives_remaining(), 0);
    }

    #[test]
    fn test_steer_is_speed_limited_and_clamped() {
        let bounds = Bounds::new(360.0, 640.0);
        let mut p = Player::new(EntityId(1), Vec2::new(180.0, 540.0), "water".into());
        p.steer(Vec2::new(180.0, 100.0), 24.0, 800.0, 0.1, &bounds);
        assert!((p.pos.y - 460.0).abs() < 0.01);

        p.steer(Vec2::new(-50.0, -50.0), 24.0, 800.0, 10.0, &bounds);
        assert_eq!(p.pos, Vec2::new(PLAYER_RADIUS, PLAYER_RADIUS));
    }

    #[test]
    fn test_fire_cadence_follows_power() {
        let mut p = Player::new(EntityId(1), Vec2::ZERO, "vanilla".into());
        assert!(p.try_fire(true, 0.1));
        assert!(!p.try_fire(true, 0.2));
        assert!(p.try_fire(true, 0.2));
        assert!(!p.try_fire(false, 1.0));
    }
}
