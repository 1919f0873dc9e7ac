//! Contact detection
//!
//! Overlap testing is a collaborator: anything implementing
//! [`ContactSource`] reports which registered pairs touch this tick. The
//! built-in [`CircleContacts`] treats every body as a circle; tests drive the
//! resolver with [`ScriptedContacts`] instead.

use std::collections::VecDeque;

use glam::Vec2;

use super::entity::{EntityId, Side};
use super::state::GameState;
use crate::consts::*;

/// Registered collision pairs, in resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollisionPair {
    ShotVsFoe,
    ShotVsWaveFoe,
    PlayerVsFoe,
    PlayerVsWaveFoe,
    PlayerVsFoeShot,
    PlayerVsPowerUp,
    ShotVsFoeShot,
}

/// One overlap reported for this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Player shot touching a free-moving foe
    ShotFoe { shot: EntityId, foe: EntityId },
    /// Player shot touching a foe that follows a wave path
    ShotWaveFoe { shot: EntityId, foe: EntityId },
    PlayerFoe { foe: EntityId },
    PlayerWaveFoe { foe: EntityId },
    PlayerFoeShot { shot: EntityId },
    PlayerPowerUp { power_up: EntityId },
    /// Player shot meeting a foe shot
    ShotFoeShot { shot: EntityId, foe_shot: EntityId },
}

impl Contact {
    pub fn pair(&self) -> CollisionPair {
        match self {
            Contact::ShotFoe { .. } => CollisionPair::ShotVsFoe,
            Contact::ShotWaveFoe { .. } => CollisionPair::ShotVsWaveFoe,
            Contact::PlayerFoe { .. } => CollisionPair::PlayerVsFoe,
            Contact::PlayerWaveFoe { .. } => CollisionPair::PlayerVsWaveFoe,
            Contact::PlayerFoeShot { .. } => CollisionPair::PlayerVsFoeShot,
            Contact::PlayerPowerUp { .. } => CollisionPair::PlayerVsPowerUp,
            Contact::ShotFoeShot { .. } => CollisionPair::ShotVsFoeShot,
        }
    }
}

/// Reports overlaps between registered pairs
pub trait ContactSource {
    fn contacts(&mut self, state: &GameState) -> Vec<Contact>;
}

/// Circle-vs-circle overlap test
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}

/// Default detector: every active body is a circle of its kind's radius
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleContacts;

impl ContactSource for CircleContacts {
    fn contacts(&mut self, state: &GameState) -> Vec<Contact> {
        let mut found = Vec::new();
        let player_shots: Vec<_> = state.active_shots().filter(|s| s.owner == Side::Player).collect();
        let foe_shots: Vec<_> = state.active_shots().filter(|s| s.owner == Side::Foe).collect();

        for shot in &player_shots {
            for foe in state.active_foes() {
                if circles_overlap(shot.pos, SHOT_RADIUS, foe.pos, FOE_RADIUS) {
                    found.push(if foe.in_wave() {
                        Contact::ShotWaveFoe { shot: shot.id, foe: foe.id }
                    } else {
                        Contact::ShotFoe { shot: shot.id, foe: foe.id }
                    });
                }
            }
            for foe_shot in &foe_shots {
                if circles_overlap(shot.pos, SHOT_RADIUS, foe_shot.pos, SHOT_RADIUS) {
                    found.push(Contact::ShotFoeShot {
                        shot: shot.id,
                        foe_shot: foe_shot.id,
                    });
                }
            }
        }

        if let Some(player) = &state.player {
            for foe in state.active_foes() {
                if circles_overlap(player.pos, PLAYER_RADIUS, foe.pos, FOE_RADIUS) {
                    found.push(if foe.in_wave() {
                        Contact::PlayerWaveFoe { foe: foe.id }
                    } else {
                        Contact::PlayerFoe { foe: foe.id }
                    });
                }
            }
            for shot in &foe_shots {
                if circles_overlap(player.pos, PLAYER_RADIUS, shot.pos, SHOT_RADIUS) {
                    found.push(Contact::PlayerFoeShot { shot: shot.id });
                }
            }
            for power_up in state.active_power_ups() {
                if circles_overlap(player.pos, PLAYER_RADIUS, power_up.pos, POWER_UP_RADIUS) {
                    found.push(Contact::PlayerPowerUp { power_up: power_up.id });
                }
            }
        }

        found
    }
}

/// Contacts fed in by hand, one batch per tick
#[derive(Debug, Clone, Default)]
pub struct ScriptedContacts {
    batches: VecDeque<Vec<Contact>>,
}

impl ScriptedContacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the contacts for the next tick that has none queued yet
    pub fn push(&mut self, batch: Vec<Contact>) {
        self.batches.push_back(batch);
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

impl ContactSource for ScriptedContacts {
    fn contacts(&mut self, _state: &GameState) -> Vec<Contact> {
        self.batches.pop_front().unwrap_or_default()
    }
}
