//! Outbound events for the host's collaborators
//!
//! The simulation never talks to rendering, audio or the scene host
//! directly. It queues `GameEvent`s which the host drains after each tick
//! and routes through an [`EventSink`]. Events serialize to JSON for hosts
//! that sit across a process boundary.

use glam::Vec2;
use serde::Serialize;

use super::entity::EntityId;
use crate::audio::SoundCue;

/// Target values for the rendering/animation collaborator, which owns all easing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum VisualCue {
    /// Foe tinted red and knocked back after a non-fatal or fatal hit
    HitFlash { foe: EntityId },
    /// Short point light where a shot struck
    LightBurst { at: Vec2 },
    /// Expanding ring on death
    Explosion { at: Vec2, radius: f32 },
    CameraShake { seconds: f32 },
    /// Floating "+points" label
    Points { at: Vec2, points: u64 },
    /// Alpha ramp while an entity fades in; does not block gameplay
    Materialize {
        entity: EntityId,
        from: f32,
        to: f32,
        seconds: f32,
        repeats: u32,
    },
    /// Continuous rotation (sliders)
    Spin { entity: EntityId },
    /// Player blinking while invulnerable
    Blink { entity: EntityId, seconds: f32 },
    /// Power-up flashing out as its TTL ends
    Fade { entity: EntityId },
}

/// Everything the host needs to hear about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    Sound(SoundCue),
    Visual(VisualCue),
    ScoreChanged { score: u64 },
    LivesChanged { lives: u32 },
    /// Stage finished (enough waves completed, or the boss died)
    EndOfStage,
    /// Terminal screen should be shown
    GameOver,
}

/// Host-side receiver for outbound events. Every method defaults to a no-op.
pub trait EventSink {
    fn play(&mut self, _cue: SoundCue) {}
    fn visual(&mut self, _cue: VisualCue) {}
    fn score(&mut self, _score: u64) {}
    fn lives(&mut self, _lives: u32) {}
    fn end_of_stage(&mut self) {}
    fn game_over(&mut self) {}
}

/// Route drained events to their collaborators, in order
pub fn dispatch(events: impl IntoIterator<Item = GameEvent>, sink: &mut dyn EventSink) {
    for event in events {
        match event {
            GameEvent::Sound(cue) => sink.play(cue),
            GameEvent::Visual(cue) => sink.visual(cue),
            GameEvent::ScoreChanged { score } => sink.score(score),
            GameEvent::LivesChanged { lives } => sink.lives(lives),
            GameEvent::EndOfStage => sink.end_of_stage(),
            GameEvent::GameOver => sink.game_over(),
        }
    }
}
