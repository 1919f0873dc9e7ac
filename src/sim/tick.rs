//! Fixed timestep simulation tick
//!
//! One tick runs, in order: due timers, player control, free motion and foe
//! fire, the formation engine, collision resolution, then cleanup of
//! entities that left the playfield.

use glam::Vec2;
use rand::Rng;

use super::boss::boss_shot_velocity;
use super::collision::{CircleContacts, ContactSource};
use super::entity::{FoeKind, PowerUpMotion, Side};
use super::events::VisualCue;
use super::power::shot_pattern;
use super::resolver::resolve;
use super::scheduler::Repeat;
use super::spawn;
use super::state::{GamePhase, GameState, TimerEvent};
use crate::audio::SoundCue;
use crate::consts::*;
use crate::{aim, bounce_in_bounds};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer position in playfield coordinates, if the pointer is down
    pub pointer: Option<Vec2>,
    /// Fire button held
    pub firing: bool,
}

/// Advance the game state by one fixed timestep using circle contacts
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    tick_with(state, input, dt, &mut CircleContacts);
}

/// Advance the game state by one fixed timestep with a custom contact source
pub fn tick_with(state: &mut GameState, input: &TickInput, dt: f32, contacts: &mut dyn ContactSource) {
    if state.phase != GamePhase::Playing {
        return;
    }
    state.time_ticks += 1;

    run_timers(state, dt);
    if !state.is_playing() {
        return;
    }

    update_player(state, input, dt);
    move_entities(state, dt);
    foes_fire(state);

    advance_formations(state, dt);
    if !state.is_playing() {
        return;
    }

    let found = contacts.contacts(state);
    resolve(state, &found);

    cleanup(state);
}

/// Dispatch due timers one at a time, so a cancellation made by one
/// handler takes effect before the next timer is considered.
fn run_timers(state: &mut GameState, dt: f32) {
    let until = state.scheduler.now() + dt as f64;
    while let Some((_, event)) = state.scheduler.pop_due(until) {
        if !state.is_playing() {
            break;
        }
        on_timer(state, event);
    }
    state.scheduler.settle(until);
}

fn on_timer(state: &mut GameState, event: TimerEvent) {
    match event {
        TimerEvent::Generate(kind) => spawn::run_generator(state, kind),
        TimerEvent::DifficultyUp => {
            state
                .director
                .raise_difficulty(&state.tuning.spawn, &mut state.scheduler);
        }
        TimerEvent::ReleaseBoss => {
            spawn::release_boss(state);
        }
        TimerEvent::BossCue => state.sound(SoundCue::Boss),
        TimerEvent::Teleport(id) => spawn::teleport(state, id),
        TimerEvent::PowerUpExpire(id) => {
            if state.power_up(id).is_some() {
                state.visual(VisualCue::Fade { entity: id });
                state.destroy_power_up(id);
            }
        }
        TimerEvent::DriftPowerUp => state.spawn_drift_power_up(),
        TimerEvent::Respawn => {
            if state.survival.is_game_over() || state.player.is_some() {
                return;
            }
            let id = state.spawn_player(true);
            let seconds = state.tuning.player.blink_duration;
            state
                .scheduler
                .schedule(seconds, Repeat::Once, TimerEvent::BlinkEnd(id));
            state.visual(VisualCue::Blink { entity: id, seconds });
            log::debug!("Player respawned");
        }
        TimerEvent::BlinkEnd(id) => {
            if let Some(player) = state.player.as_mut().filter(|p| p.id == id) {
                player.invulnerable = false;
            }
        }
        TimerEvent::GameOverScreen => state.enter_game_over(),
    }
}

fn update_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let tuning = &state.tuning.player;
    let Some(player) = state.player.as_mut() else {
        return;
    };
    if let Some(pointer) = input.pointer {
        player.steer(pointer, tuning.pointer_offset, tuning.speed, dt, &state.bounds);
    }
    state.shadows.follow(player.shadow, player.pos);

    if !player.try_fire(input.firing, dt) {
        return;
    }
    let origin = player.pos;
    let volley = shot_pattern(&player.power, tuning.shot_speed);
    for (offset, vel) in volley {
        state.spawn_shot(Side::Player, origin + offset, vel);
    }
    state.sound(SoundCue::Shot);
}

fn move_entities(state: &mut GameState, dt: f32) {
    for foe in state.foes.iter_mut().filter(|f| f.active && !f.in_wave()) {
        foe.pos += foe.vel * dt;
        foe.depth = foe.pos.y;
        state.shadows.follow(foe.shadow, foe.pos);
    }

    for shot in state.shots.iter_mut().filter(|s| s.active) {
        shot.pos += shot.vel * dt;
        state.shadows.sync(shot.shadow, shot.pos, shot.vel);
    }

    for power_up in state.power_ups.iter_mut().filter(|p| p.active) {
        power_up.pos += power_up.vel * dt;
        if power_up.motion == PowerUpMotion::Bounce {
            bounce_in_bounds(&mut power_up.pos, &mut power_up.vel, &state.bounds);
        }
        state.shadows.sync(power_up.shadow, power_up.pos, power_up.vel);
    }
}

/// Per-tick fire rolls. The boss walks its staircase; other foes aim at the
/// player. Nobody fires while there is no player.
fn foes_fire(state: &mut GameState) {
    let Some(target) = state.player.as_ref().map(|p| p.pos) else {
        return;
    };
    let boss = &state.tuning.boss;
    let mut volley = Vec::new();

    for foe in state.foes.iter_mut().filter(|f| f.active) {
        if let FoeKind::Boss { pattern } = &mut foe.kind {
            if state.rng.random_bool(boss.fire_chance.clamp(0.0, 1.0)) {
                if let Some(offset) = pattern.advance(&state.boss_pattern) {
                    volley.push((foe.pos, boss_shot_velocity(offset, boss.shot_speed)));
                }
            }
        } else if state.rng.random_bool(boss.foe_fire_chance.clamp(0.0, 1.0)) {
            volley.push((foe.pos, aim(foe.pos, target, boss.shot_speed)));
        }
    }

    for (pos, vel) in volley {
        state.spawn_shot(Side::Foe, pos, vel);
        state.sound(SoundCue::FoeShot);
    }
}

fn advance_formations(state: &mut GameState, dt: f32) {
    let cleared = state
        .formations
        .advance(dt, &mut state.foes, &mut state.shadows);
    for wave in cleared {
        if let Some(at) = wave.reward_at {
            state.spawn_reward(at);
        }
    }
    if state.formations.waves_completed() >= state.tuning.spawn.waves_per_stage {
        state.finish_stage();
    }
}

/// Destroy whatever left the playfield, then drop inactive entities
fn cleanup(state: &mut GameState) {
    let bounds = state.bounds;

    let gone_shots: Vec<_> = state
        .active_shots()
        .filter(|s| !bounds.contains(s.pos))
        .map(|s| s.id)
        .collect();
    for id in gone_shots {
        state.destroy_shot(id);
    }

    let gone_foes: Vec<_> = state
        .active_foes()
        .filter(|f| {
            f.pos.y > bounds.height + FOE_EXIT_MARGIN_Y
                || f.pos.x < -FOE_EXIT_MARGIN_X
                || f.pos.x > bounds.width + FOE_EXIT_MARGIN_X
        })
        .map(|f| f.id)
        .collect();
    for id in gone_foes {
        state.destroy_foe(id);
    }

    let gone_power_ups: Vec<_> = state
        .active_power_ups()
        .filter(|p| {
            p.motion == PowerUpMotion::Sweep
                && ((p.vel.x > 0.0 && p.pos.x > bounds.width + 60.0)
                    || (p.vel.x < 0.0 && p.pos.x < -60.0))
        })
        .map(|p| p.id)
        .collect();
    for id in gone_power_ups {
        state.destroy_power_up(id);
    }

    state.normalize();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryStore;
    use crate::sim::collision::{Contact, ScriptedContacts};
    use crate::sim::entity::EntityId;
    use crate::sim::events::GameEvent;
    use crate::tuning::Tuning;

    fn quiet_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.boss.foe_fire_chance = 0.0;
        tuning
    }

    fn state_with(tuning: Tuning, stage: u32, seed: u64) -> GameState {
        GameState::new(tuning, stage, seed, Box::new(MemoryStore::new())).unwrap()
    }

    fn run(state: &mut GameState, input: &TickInput, seconds: f32) {
        let ticks = (seconds / SIM_DT).round() as u32;
        for _ in 0..ticks {
            tick(state, input, SIM_DT);
        }
    }

    #[test]
    fn test_player_fires_on_cadence() {
        let mut state = state_with(quiet_tuning(), 1, 1);
        let input = TickInput {
            pointer: None,
            firing: true,
        };
        // water fires every 0.2s
        run(&mut state, &input, 0.5);
        let shots = state.active_shots().filter(|s| s.owner == Side::Player).count();
        assert_eq!(shots, 3);
    }

    #[test]
    fn test_shots_leaving_the_playfield_are_released() {
        let mut state = state_with(quiet_tuning(), 1, 1);
        let shadows = state.shadows.len();
        state.spawn_shot(Side::Player, Vec2::new(100.0, 5.0), Vec2::new(0.0, -600.0));
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.shots.len(), 0);
        assert_eq!(state.shadows.len(), shadows);
    }

    #[test]
    fn test_respawn_blinks_then_vulnerable() {
        let mut state = state_with(quiet_tuning(), 1, 1);
        let mut contacts = ScriptedContacts::new();
        let foe = state.spawn_foe(FoeKind::Slider, Vec2::new(50.0, 50.0), Vec2::ZERO);
        contacts.push(vec![Contact::PlayerFoe { foe }]);
        tick_with(&mut state, &TickInput::default(), SIM_DT, &mut contacts);
        assert!(state.player.is_none());

        run(&mut state, &TickInput::default(), 1.1);
        assert!(state.player.as_ref().unwrap().invulnerable);
        run(&mut state, &TickInput::default(), 1.0);
        assert!(!state.player.as_ref().unwrap().invulnerable);
    }

    #[test]
    fn test_game_over_after_delay() {
        let mut tuning = quiet_tuning();
        tuning.player.max_lives = 1;
        let mut state = state_with(tuning, 1, 1);
        let mut contacts = ScriptedContacts::new();
        let foe = state.spawn_foe(FoeKind::Slider, Vec2::new(50.0, 50.0), Vec2::ZERO);
        contacts.push(vec![Contact::PlayerFoe { foe }]);
        tick_with(&mut state, &TickInput::default(), SIM_DT, &mut contacts);
        assert_eq!(state.phase, GamePhase::Playing);

        run(&mut state, &TickInput::default(), 2.1);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.player.is_none());

        // a halted state no longer advances
        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_fatal_hit_wins_over_stage_end() {
        let mut tuning = quiet_tuning();
        tuning.player.max_lives = 1;
        tuning.boss.lives = 1;
        let mut state = state_with(tuning, 4, 1);
        let mut contacts = ScriptedContacts::new();
        let boss = spawn::release_boss(&mut state).unwrap();
        let crasher = state.spawn_foe(FoeKind::Slider, Vec2::new(50.0, 50.0), Vec2::ZERO);

        contacts.push(vec![Contact::PlayerFoe { foe: crasher }]);
        tick_with(&mut state, &TickInput::default(), SIM_DT, &mut contacts);
        assert!(state.survival.is_game_over());
        assert!(state.director.is_stopped());

        // a shot already in flight still kills the boss
        let at = state.foe(boss).unwrap().pos;
        let shot = state.spawn_shot(Side::Player, at, Vec2::ZERO);
        contacts.push(vec![Contact::ShotFoe { shot, foe: boss }]);
        tick_with(&mut state, &TickInput::default(), SIM_DT, &mut contacts);
        assert!(state.foe(boss).is_none());
        assert_eq!(state.phase, GamePhase::Playing);

        let mut events = state.drain_events();
        for _ in 0..(3.0 / SIM_DT) as u32 {
            tick_with(&mut state, &TickInput::default(), SIM_DT, &mut contacts);
            events.extend(state.drain_events());
        }
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::GameOver).count(), 1);
        assert!(!events.contains(&GameEvent::EndOfStage));
        assert_eq!(state.store().get_u64(TOTAL_SCORE_KEY, 0), state.score);
    }

    #[test]
    fn test_boss_holds_fire_without_player() {
        let mut tuning = quiet_tuning();
        tuning.boss.fire_chance = 1.0;
        let mut state = state_with(tuning, 4, 1);
        spawn::release_boss(&mut state).unwrap();
        state.destroy_player();

        run(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.active_shots().filter(|s| s.owner == Side::Foe).count(), 0);

        state.spawn_player(false);
        tick(&mut state, &TickInput::default(), SIM_DT);
        let first = state.active_shots().find(|s| s.owner == Side::Foe).map(|s| s.vel.x);
        // the staircase starts from its first step once someone is there
        assert_eq!(first, Some(state.boss_pattern[0]));
    }

    #[test]
    fn test_foes_past_the_exit_margins_are_released() {
        let mut state = state_with(quiet_tuning(), 1, 1);
        let (w, h) = (state.bounds.width, state.bounds.height);
        let shadows = state.shadows.len();

        let place = |state: &mut GameState, pos: Vec2| {
            let id = state.spawn_foe(FoeKind::Slider, Vec2::new(100.0, 100.0), Vec2::ZERO);
            state.foe_mut(id).unwrap().pos = pos;
            id
        };
        let below = place(&mut state, Vec2::new(100.0, h + FOE_EXIT_MARGIN_Y + 1.0));
        let left = place(&mut state, Vec2::new(-FOE_EXIT_MARGIN_X - 1.0, 100.0));
        let right = place(&mut state, Vec2::new(w + FOE_EXIT_MARGIN_X + 1.0, 100.0));
        let lingering = place(
            &mut state,
            Vec2::new(-FOE_EXIT_MARGIN_X + 10.0, h + FOE_EXIT_MARGIN_Y - 10.0),
        );

        tick(&mut state, &TickInput::default(), SIM_DT);

        for id in [below, left, right] {
            assert!(state.foe(id).is_none());
            assert!(state.shadows.iter().all(|s| s.owner != id));
        }
        assert!(state.foe(lingering).is_some());
        assert_eq!(state.shadows.len(), shadows + 1);
    }

    #[test]
    fn test_sweep_power_up_leaves_and_the_next_one_follows() {
        let mut tuning = quiet_tuning();
        tuning.power_ups.drift_min_delay = 1.0;
        tuning.power_ups.drift_max_delay = 1.0;
        tuning.power_ups.drift_min_duration = 1.0;
        tuning.power_ups.drift_max_duration = 1.0;
        let mut state = state_with(tuning, 1, 1);
        // nobody around to collect it
        state.destroy_player();

        let sweeps = |state: &GameState| -> Vec<EntityId> {
            state
                .active_power_ups()
                .filter(|p| p.motion == PowerUpMotion::Sweep)
                .map(|p| p.id)
                .collect()
        };

        run(&mut state, &TickInput::default(), 1.5);
        let first = sweeps(&state);
        assert_eq!(first.len(), 1);

        run(&mut state, &TickInput::default(), 1.0);
        assert!(sweeps(&state).is_empty());
        assert!(!state.drift_active);
        assert!(state.shadows.iter().all(|s| s.owner != first[0]));

        run(&mut state, &TickInput::default(), 1.0);
        let second = sweeps(&state);
        assert_eq!(second.len(), 1);
        assert_ne!(second, first);
    }

    #[test]
    fn test_reward_expires_after_ttl() {
        let mut state = state_with(quiet_tuning(), 1, 1);
        // nobody around to collect it
        state.destroy_player();
        let id = state.spawn_reward(Vec2::new(180.0, 200.0));
        run(&mut state, &TickInput::default(), 4.9);
        assert!(state.power_up(id).is_some());
        run(&mut state, &TickInput::default(), 0.2);
        assert!(state.power_up(id).is_none());
        assert!(state.shadows.iter().all(|s| s.owner != id));
    }

    #[test]
    fn test_boss_stage_releases_boss() {
        let mut state = state_with(quiet_tuning(), 4, 1);
        run(&mut state, &TickInput::default(), 1.9);
        assert!(state.active_foes().next().is_none());
        run(&mut state, &TickInput::default(), 0.2);
        let bosses = state.active_foes().filter(|f| f.kind.is_boss()).count();
        assert_eq!(bosses, 1);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = state_with(Tuning::default(), 1, 99999);
        let mut state2 = state_with(Tuning::default(), 1, 99999);

        let inputs = [
            TickInput {
                pointer: Some(Vec2::new(100.0, 400.0)),
                firing: true,
            },
            TickInput::default(),
            TickInput {
                pointer: Some(Vec2::new(300.0, 500.0)),
                firing: false,
            },
        ];

        for i in 0..1800 {
            let input = &inputs[(i / 200) % inputs.len()];
            tick(&mut state1, input, SIM_DT);
            tick(&mut state2, input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.foes.len(), state2.foes.len());
        assert_eq!(state1.shots.len(), state2.shots.len());
        assert_eq!(state1.lives_remaining(), state2.lives_remaining());
    }
}
