//! Collision resolution
//!
//! Contacts are resolved pair by pair in table order, and within a pair in
//! the order they were reported. Every handler re-checks that the entities it
//! touches are still active: an earlier contact this tick may already have
//! consumed them.

use glam::Vec2;

use super::collision::{CollisionPair, Contact};
use super::entity::{EntityId, HitResult, Side};
use super::events::{GameEvent, VisualCue};
use super::player::HitOutcome;
use super::state::{GameState, TimerEvent};
use super::scheduler::Repeat;
use crate::audio::SoundCue;

type Handler = fn(&mut GameState, Contact);

/// Collision table: one outcome handler per registered pair
pub const COLLISION_TABLE: [(CollisionPair, Handler); 7] = [
    (CollisionPair::ShotVsFoe, shot_hits_foe),
    (CollisionPair::ShotVsWaveFoe, shot_hits_foe),
    (CollisionPair::PlayerVsFoe, player_crashes),
    (CollisionPair::PlayerVsWaveFoe, player_crashes),
    (CollisionPair::PlayerVsFoeShot, player_shot_down),
    (CollisionPair::PlayerVsPowerUp, player_picks_up),
    (CollisionPair::ShotVsFoeShot, shots_clash),
];

/// Resolve one tick's contacts in table order
pub fn resolve(state: &mut GameState, contacts: &[Contact]) {
    for (pair, handler) in COLLISION_TABLE {
        for contact in contacts.iter().filter(|c| c.pair() == pair) {
            handler(state, *contact);
        }
    }
}

fn shot_hits_foe(state: &mut GameState, contact: Contact) {
    let (shot_id, foe_id) = match contact {
        Contact::ShotFoe { shot, foe } | Contact::ShotWaveFoe { shot, foe } => (shot, foe),
        _ => return,
    };
    let Some(shot_pos) = state
        .shot(shot_id)
        .filter(|s| s.owner == Side::Player)
        .map(|s| s.pos)
    else {
        return;
    };
    let Some(foe) = state.foe_mut(foe_id) else {
        return;
    };
    let result = foe.take_hit();
    if result == HitResult::Ignored {
        return;
    }

    state.sound(SoundCue::FoeExplosion);
    state.visual(VisualCue::HitFlash { foe: foe_id });
    state.visual(VisualCue::LightBurst { at: shot_pos });
    state.award(state.tuning.score.hit);
    state.destroy_shot(shot_id);

    if result == HitResult::Killed {
        state.sound(SoundCue::FoeDestroy);
        kill_foe(state, foe_id, true);
    }
}

/// Death effects, optional points, then destruction. A boss death ends the stage.
fn kill_foe(state: &mut GameState, id: EntityId, award: bool) {
    let Some(foe) = state.foe(id) else {
        return;
    };
    let (points, is_boss) = (foe.points, foe.kind.is_boss());
    let Some(at) = state.destroy_foe(id) else {
        return;
    };
    let radius = if is_boss { 220.0 } else { 60.0 };
    state.visual(VisualCue::Explosion { at, radius });
    if award {
        state.award(points);
        state.visual(VisualCue::Points { at, points });
    }
    if is_boss {
        state.sound(SoundCue::Explosion);
        state.visual(VisualCue::CameraShake { seconds: 0.5 });
        log::info!("Boss destroyed");
        state.finish_stage();
    }
}

/// Apply a damaging contact to the player. Returns the outcome so callers
/// can decide what happens to the other body.
fn hurt_player(state: &mut GameState) -> HitOutcome {
    let Some(player) = state.player.as_ref() else {
        return HitOutcome::Ignored;
    };
    let outcome = state.survival.register_hit(player.invulnerable);
    if outcome == HitOutcome::Ignored {
        return outcome;
    }

    let lives = state.survival.lives_remaining();
    state.emit(GameEvent::LivesChanged { lives });
    state.sound(SoundCue::Explosion);
    if let Some(at) = state.destroy_player() {
        state.visual(VisualCue::Explosion { at, radius: 40.0 });
        state.visual(VisualCue::CameraShake { seconds: 0.5 });
    }

    match outcome {
        HitOutcome::GameOver => {
            log::info!("Last life lost");
            state.director.stop(&mut state.scheduler);
            let delay = state.tuning.player.game_over_delay;
            state
                .scheduler
                .schedule(delay, Repeat::Once, TimerEvent::GameOverScreen);
        }
        HitOutcome::LifeLost { lives_remaining } => {
            log::debug!("Life lost, {} remaining", lives_remaining);
            let delay = state.tuning.player.respawn_delay;
            state.scheduler.schedule(delay, Repeat::Once, TimerEvent::Respawn);
        }
        HitOutcome::Ignored => {}
    }
    outcome
}

fn player_crashes(state: &mut GameState, contact: Contact) {
    let foe_id = match contact {
        Contact::PlayerFoe { foe } | Contact::PlayerWaveFoe { foe } => foe,
        _ => return,
    };
    if state.foe(foe_id).is_none() {
        return;
    }
    if let HitOutcome::LifeLost { .. } = hurt_player(state) {
        kill_foe(state, foe_id, false);
    }
}

fn player_shot_down(state: &mut GameState, contact: Contact) {
    let Contact::PlayerFoeShot { shot } = contact else {
        return;
    };
    if state.shot(shot).is_none_or(|s| s.owner != Side::Foe) {
        return;
    }
    if let HitOutcome::LifeLost { .. } = hurt_player(state) {
        state.destroy_shot(shot);
    }
}

fn player_picks_up(state: &mut GameState, contact: Contact) {
    let Contact::PlayerPowerUp { power_up } = contact else {
        return;
    };
    if state.player.is_none() || state.power_up(power_up).is_none() {
        return;
    }
    let granted = state.power_cycle.step(state.store.as_mut());
    log::debug!("Power-up collected: {}", granted);
    if let Some(player) = state.player.as_mut() {
        player.set_power(granted);
    }
    state.sound(SoundCue::PowerUp);
    state.destroy_power_up(power_up);
}

fn shots_clash(state: &mut GameState, contact: Contact) {
    let Contact::ShotFoeShot { shot, foe_shot } = contact else {
        return;
    };
    let (Some(a), Some(_)) = (state.shot(shot), state.shot(foe_shot)) else {
        return;
    };
    let at: Vec2 = a.pos;
    state.destroy_shot(shot);
    state.destroy_shot(foe_shot);
    state.sound(SoundCue::FoeExplosion);
    state.visual(VisualCue::LightBurst { at });
    state.award(state.tuning.score.shot_clash);
}
