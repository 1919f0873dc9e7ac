//! Entity lifecycle: foes, shots, power-ups and their shadow companions
//!
//! Shadows are sibling entities, not children. Every primary entity owns at
//! most one shadow through `shadow: Option<ShadowId>`, and its `release`
//! routine is the only way it goes inactive, so the pair always dies together.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boss::PatternCursor;
use super::formation::CohortId;
use super::scheduler::TimerHandle;

/// Stable entity identifier (allocated by [`GameState`](super::GameState))
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Shadow identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShadowId(u32);

/// A purely visual companion drawn offset from its owner
#[derive(Debug, Clone)]
pub struct Shadow {
    pub id: ShadowId,
    pub owner: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub offset: Vec2,
}

/// All live shadows
#[derive(Debug, Clone)]
pub struct Shadows {
    items: Vec<Shadow>,
    next_id: u32,
}

impl Default for Shadows {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }
}

impl Shadows {
    /// Spawn a shadow for `owner` at `owner_pos + offset`
    pub fn spawn(&mut self, owner: EntityId, owner_pos: Vec2, offset: Vec2) -> ShadowId {
        let id = ShadowId(self.next_id);
        self.next_id += 1;
        self.items.push(Shadow {
            id,
            owner,
            pos: owner_pos + offset,
            vel: Vec2::ZERO,
            offset,
        });
        id
    }

    /// Release a shadow. Releasing an absent shadow is a no-op.
    pub fn release(&mut self, id: ShadowId) -> bool {
        let before = self.items.len();
        self.items.retain(|s| s.id != id);
        self.items.len() != before
    }

    /// Snap a shadow to its owner's position
    pub fn follow(&mut self, id: Option<ShadowId>, owner_pos: Vec2) {
        if let Some(shadow) = id.and_then(|id| self.get_mut(id)) {
            shadow.pos = owner_pos + shadow.offset;
        }
    }

    /// Copy the owner's velocity onto its shadow and snap its position
    pub fn sync(&mut self, id: Option<ShadowId>, owner_pos: Vec2, owner_vel: Vec2) {
        if let Some(shadow) = id.and_then(|id| self.get_mut(id)) {
            shadow.vel = owner_vel;
            shadow.pos = owner_pos + shadow.offset;
        }
    }

    pub fn get(&self, id: ShadowId) -> Option<&Shadow> {
        self.items.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: ShadowId) -> Option<&mut Shadow> {
        self.items.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shadow> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Foe types, with per-variant state resolved at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FoeKind {
    /// Basic foe used by formations and path waves
    Scout,
    /// Enters from a side and crosses horizontally
    Slider,
    /// Heavy foe: no shadow, fast dive
    Tank,
    /// Jumps to a random position on a fixed interval
    Teleporter { hops_left: u32 },
    /// Stage boss with its firing staircase
    Boss { pattern: PatternCursor },
}

impl FoeKind {
    /// (lives, points) for the regular catalogue. The boss takes its stats
    /// from tuning instead.
    pub fn base_stats(&self) -> (u32, u64) {
        match self {
            FoeKind::Scout => (1, 400),
            FoeKind::Slider => (3, 500),
            FoeKind::Tank => (2, 800),
            FoeKind::Teleporter { .. } => (2, 600),
            FoeKind::Boss { .. } => (20, 10_000),
        }
    }

    /// The heavy type never carries a shadow
    pub fn has_shadow(&self) -> bool {
        !matches!(self, FoeKind::Tank)
    }

    pub fn is_boss(&self) -> bool {
        matches!(self, FoeKind::Boss { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            FoeKind::Scout => "scout",
            FoeKind::Slider => "slider",
            FoeKind::Tank => "tank",
            FoeKind::Teleporter { .. } => "teleporter",
            FoeKind::Boss { .. } => "boss",
        }
    }
}

/// Outcome of one damaging hit on a foe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    /// Foe was already inactive or drained
    Ignored,
    Damaged,
    /// This hit took the last life
    Killed,
}

/// A hostile entity
#[derive(Debug, Clone)]
pub struct Foe {
    pub id: EntityId,
    pub kind: FoeKind,
    pub max_lives: u32,
    pub lives: u32,
    pub points: u64,
    pub pos: Vec2,
    pub vel: Vec2,
    pub shadow: Option<ShadowId>,
    /// Render depth; lower on screen draws on top
    pub depth: f32,
    pub active: bool,
    /// Wave cohort this foe belongs to, if it follows a path
    pub cohort: Option<CohortId>,
    /// Timer owned solely by this foe (teleport hops)
    pub timer: Option<TimerHandle>,
}

impl Foe {
    pub fn new(id: EntityId, kind: FoeKind, lives: u32, points: u64, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            kind,
            max_lives: lives,
            lives,
            points,
            pos,
            vel,
            shadow: None,
            depth: pos.y,
            active: true,
            cohort: None,
            timer: None,
        }
    }

    /// Remove one life. Returns `Killed` exactly once, on the hit that
    /// takes the foe to zero.
    pub fn take_hit(&mut self) -> HitResult {
        if !self.active || self.lives == 0 {
            return HitResult::Ignored;
        }
        self.lives -= 1;
        if self.lives == 0 {
            HitResult::Killed
        } else {
            HitResult::Damaged
        }
    }

    /// Mark inactive and release the shadow. Returns false if already gone.
    pub fn release(&mut self, shadows: &mut Shadows) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        if let Some(shadow) = self.shadow.take() {
            shadows.release(shadow);
        }
        true
    }

    pub fn in_wave(&self) -> bool {
        self.cohort.is_some()
    }
}

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Player,
    Foe,
}

/// A projectile, always paired with a shadow
#[derive(Debug, Clone)]
pub struct Shot {
    pub id: EntityId,
    pub owner: Side,
    pub pos: Vec2,
    pub vel: Vec2,
    pub shadow: Option<ShadowId>,
    pub active: bool,
}

impl Shot {
    pub fn new(id: EntityId, owner: Side, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            owner,
            pos,
            vel,
            shadow: None,
            active: true,
        }
    }

    pub fn release(&mut self, shadows: &mut Shadows) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        if let Some(shadow) = self.shadow.take() {
            shadows.release(shadow);
        }
        true
    }
}

/// How a power-up moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpMotion {
    /// Wave-clear reward bouncing inside the playfield until its TTL runs out
    Bounce,
    /// Drifting power-up crossing the playfield once
    Sweep,
}

/// A collectible power-up
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub id: EntityId,
    /// Power this pickup is advertised as (cosmetic; the cycle decides)
    pub tag: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub motion: PowerUpMotion,
    pub shadow: Option<ShadowId>,
    /// TTL timer, cancelled on pickup
    pub expiry: Option<TimerHandle>,
    /// Absolute scheduler time the TTL runs out (if any)
    pub deadline: Option<f64>,
    pub active: bool,
}

impl PowerUp {
    pub fn new(id: EntityId, tag: String, pos: Vec2, vel: Vec2, motion: PowerUpMotion) -> Self {
        Self {
            id,
            tag,
            pos,
            vel,
            motion,
            shadow: None,
            expiry: None,
            deadline: None,
            active: true,
        }
    }

    /// Release the shadow first, then the power-up itself
    pub fn release(&mut self, shadows: &mut Shadows) -> Option<TimerHandle> {
        if !self.active {
            return None;
        }
        if let Some(shadow) = self.shadow.take() {
            shadows.release(shadow);
        }
        self.active = false;
        self.expiry.take()
    }
}
