//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order, timers by fire time then registration)
//! - No rendering, audio or platform dependencies (those get events)

pub mod boss;
pub mod collision;
pub mod entity;
pub mod events;
pub mod formation;
pub mod path;
pub mod player;
pub mod power;
pub mod resolver;
pub mod scheduler;
pub mod spawn;
pub mod state;
pub mod tick;

pub use boss::{PatternCursor, build_staircase};
pub use collision::{CircleContacts, CollisionPair, Contact, ContactSource, ScriptedContacts};
pub use entity::{EntityId, Foe, FoeKind, HitResult, PowerUp, PowerUpMotion, Shadows, Shot, Side};
pub use events::{EventSink, GameEvent, VisualCue, dispatch};
pub use formation::{CohortId, FormationEngine};
pub use path::{Path, build_wave_path};
pub use player::{HitOutcome, Player, Survival};
pub use power::{PowerCycle, shot_cooldown};
pub use scheduler::{Repeat, Scheduler, TimerHandle};
pub use spawn::{GeneratorKind, SpawnDirector};
pub use state::{GamePhase, GameState, TimerEvent, reset_session};
pub use tick::{TickInput, tick, tick_with};
