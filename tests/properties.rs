//! Property tests for the simulation invariants
//!
//! Random action scripts hammer a stage with contacts against whatever is
//! alive at the time, including stale and duplicate ones.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use proptest::prelude::*;

use sky_raid::consts::SIM_DT;
use sky_raid::sim::spawn::spawn_path_wave;
use sky_raid::sim::{
    Contact, EntityId, GameEvent, GameState, PowerCycle, ScriptedContacts, Side, TickInput,
    tick_with,
};
use sky_raid::{MemoryStore, SettingsStore, Tuning};

#[derive(Debug, Clone)]
enum Action {
    Idle,
    ShootFoe(usize),
    Crash(usize),
    ShotDown,
    PickUp,
    Clash,
    /// Replay the previous contact batch (stale ids)
    Repeat,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => Just(Action::Idle),
        4 => (0..16usize).prop_map(Action::ShootFoe),
        2 => (0..16usize).prop_map(Action::Crash),
        1 => Just(Action::ShotDown),
        2 => Just(Action::PickUp),
        1 => Just(Action::Clash),
        1 => Just(Action::Repeat),
    ]
}

fn nth_foe(state: &GameState, n: usize) -> Option<(EntityId, Vec2, bool)> {
    let foes: Vec<_> = state.active_foes().collect();
    if foes.is_empty() {
        return None;
    }
    let foe = foes[n % foes.len()];
    Some((foe.id, foe.pos, foe.in_wave()))
}

fn contacts_for(state: &mut GameState, action: &Action, previous: &[Contact]) -> Vec<Contact> {
    let player_pos = state.player.as_ref().map(|p| p.pos).unwrap_or(Vec2::new(180.0, 540.0));
    match *action {
        Action::Idle => Vec::new(),
        Action::ShootFoe(n) => match nth_foe(state, n) {
            Some((foe, pos, in_wave)) => {
                let shot = state.spawn_shot(Side::Player, pos, Vec2::ZERO);
                vec![if in_wave {
                    Contact::ShotWaveFoe { shot, foe }
                } else {
                    Contact::ShotFoe { shot, foe }
                }]
            }
            None => Vec::new(),
        },
        Action::Crash(n) => match nth_foe(state, n) {
            Some((foe, _, true)) => vec![Contact::PlayerWaveFoe { foe }],
            Some((foe, _, false)) => vec![Contact::PlayerFoe { foe }],
            None => Vec::new(),
        },
        Action::ShotDown => {
            let shot = state.spawn_shot(Side::Foe, player_pos, Vec2::new(0.0, 300.0));
            vec![Contact::PlayerFoeShot { shot }]
        }
        Action::PickUp => {
            let power_up = state.spawn_reward(player_pos);
            vec![Contact::PlayerPowerUp { power_up }]
        }
        Action::Clash => {
            let shot = state.spawn_shot(Side::Player, Vec2::new(90.0, 300.0), Vec2::ZERO);
            let foe_shot = state.spawn_shot(Side::Foe, Vec2::new(90.0, 302.0), Vec2::ZERO);
            vec![Contact::ShotFoeShot { shot, foe_shot }]
        }
        Action::Repeat => previous.to_vec(),
    }
}

/// Every shadow belongs to a live owner, and every live owner's shadow exists
fn shadows_consistent(state: &GameState) -> bool {
    let mut owners: HashSet<EntityId> = HashSet::new();
    owners.extend(state.active_foes().map(|f| f.id));
    owners.extend(state.active_shots().map(|s| s.id));
    owners.extend(state.active_power_ups().map(|p| p.id));
    owners.extend(state.player.as_ref().map(|p| p.id));

    let orphan = state.shadows.iter().any(|s| !owners.contains(&s.owner));
    let dangling = state
        .active_foes()
        .filter_map(|f| f.shadow)
        .chain(state.active_shots().filter_map(|s| s.shadow))
        .chain(state.active_power_ups().filter_map(|p| p.shadow))
        .any(|id| state.shadows.get(id).is_none());
    !orphan && !dangling
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_invariants_hold_under_random_contacts(
        seed in any::<u64>(),
        actions in prop::collection::vec(action(), 1..200),
    ) {
        let mut state = GameState::new(Tuning::default(), 1, seed, Box::new(MemoryStore::new())).unwrap();
        spawn_path_wave(&mut state);
        let mut contacts = ScriptedContacts::new();
        let mut previous = Vec::new();

        let mut lives: HashMap<EntityId, u32> = HashMap::new();
        let mut destroyed: HashSet<EntityId> = HashSet::new();
        let mut power_index = state.power_cycle.index();
        let mut collisions = state.survival.collision_count();
        let mut game_overs = 0;

        for action in &actions {
            let batch = contacts_for(&mut state, action, &previous);
            contacts.push(batch.clone());
            previous = batch;
            for _ in 0..4 {
                tick_with(&mut state, &TickInput::default(), SIM_DT, &mut contacts);
            }
            game_overs += state
                .drain_events()
                .iter()
                .filter(|e| **e == GameEvent::GameOver)
                .count();

            let alive: HashSet<EntityId> = state.active_foes().map(|f| f.id).collect();
            for foe in state.active_foes() {
                prop_assert!(!destroyed.contains(&foe.id), "foe came back");
                if let Some(&before) = lives.get(&foe.id) {
                    prop_assert!(foe.lives <= before, "foe lives increased");
                }
                prop_assert!(foe.lives > 0);
                lives.insert(foe.id, foe.lives);
            }
            for id in lives.keys() {
                if !alive.contains(id) {
                    destroyed.insert(*id);
                }
            }

            prop_assert!(shadows_consistent(&state), "orphaned shadow");

            let index = state.power_cycle.index();
            prop_assert!(index >= power_index);
            prop_assert!(index < state.tuning.power_ups.powers.len());
            power_index = index;

            let count = state.survival.collision_count();
            prop_assert!(count >= collisions);
            prop_assert!(count <= state.survival.max_lives());
            prop_assert_eq!(state.lives_remaining(), state.survival.max_lives() - count);
            collisions = count;

            prop_assert!(game_overs <= 1);
            if state.survival.is_game_over() {
                prop_assert!(state.player.is_none(), "respawned after game over");
            }
        }
    }

    #[test]
    fn prop_wave_clears_once_when_all_members_gone(
        order in Just((0..5usize).collect::<Vec<_>>()).prop_shuffle(),
        kills in 1..=5usize,
    ) {
        let mut state = GameState::new(Tuning::default(), 1, 77, Box::new(MemoryStore::new())).unwrap();
        let mut contacts = ScriptedContacts::new();
        let ids = spawn_path_wave(&mut state);

        for &i in order.iter().take(kills) {
            let foe = ids[i];
            let at = state.foe(foe).unwrap().pos;
            let shot = state.spawn_shot(Side::Player, at, Vec2::ZERO);
            contacts.push(vec![Contact::ShotWaveFoe { shot, foe }]);
            tick_with(&mut state, &TickInput::default(), SIM_DT, &mut contacts);
        }
        for _ in 0..10 {
            tick_with(&mut state, &TickInput::default(), SIM_DT, &mut contacts);
        }

        let expected = u32::from(kills == 5);
        prop_assert_eq!(state.formations.waves_completed(), expected);
    }

    #[test]
    fn prop_power_cycle_saturates(len in 1..8usize, pickups in 0..20usize) {
        let powers: Vec<String> = (0..len).map(|i| format!("power{}", i)).collect();
        let mut store = MemoryStore::new();
        let mut cycle = PowerCycle::load(powers, &store).unwrap();
        let mut last = cycle.index();
        for _ in 0..pickups {
            cycle.step(&mut store);
            prop_assert!(cycle.index() >= last);
            last = cycle.index();
        }
        prop_assert_eq!(cycle.index(), pickups.min(len - 1));
        prop_assert_eq!(store.get_u64("power_up_index", 0), if pickups == 0 { 0 } else { cycle.index() as u64 });
    }
}
