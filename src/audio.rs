//! Audio cues
//!
//! The simulation never plays sound itself. It names the cue and the audio
//! collaborator plays it, fire-and-forget.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Player fires
    Shot,
    /// Foe fires
    FoeShot,
    /// Player destroyed
    Explosion,
    /// Shot hits a foe or another shot
    FoeExplosion,
    /// Foe destroyed
    FoeDestroy,
    /// Power-up collected
    PowerUp,
    /// Boss laughter (on release and periodically)
    Boss,
}

impl SoundCue {
    /// Asset key understood by the audio collaborator
    pub fn key(&self) -> &'static str {
        match self {
            SoundCue::Shot => "shot",
            SoundCue::FoeShot => "foeshot",
            SoundCue::Explosion => "explosion",
            SoundCue::FoeExplosion => "foexplosion",
            SoundCue::FoeDestroy => "foedestroy",
            SoundCue::PowerUp => "stageclear1",
            SoundCue::Boss => "boss",
        }
    }
}
