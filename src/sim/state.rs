//! Game state and entity bookkeeping
//!
//! Every destroy routine lives here so the primary entity, its shadow and
//! any timer it solely owns are always released in the same call.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::boss::build_staircase;
use super::entity::{EntityId, Foe, FoeKind, PowerUp, PowerUpMotion, Shadows, Shot, Side};
use super::events::{GameEvent, VisualCue};
use super::formation::FormationEngine;
use super::player::{Player, Survival};
use super::power::PowerCycle;
use super::scheduler::{Repeat, Scheduler};
use super::spawn::{GeneratorKind, SpawnDirector};
use crate::Bounds;
use crate::audio::SoundCue;
use crate::consts::*;
use crate::error::ConfigError;
use crate::settings::SettingsStore;
use crate::tuning::Tuning;

/// Current phase of the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    /// Stage finished; host moves on
    StageComplete,
    /// Run ended
    GameOver,
}

/// Deferred work owned by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Generate(GeneratorKind),
    DifficultyUp,
    ReleaseBoss,
    /// Periodic boss audio cue
    BossCue,
    Teleport(EntityId),
    PowerUpExpire(EntityId),
    DriftPowerUp,
    Respawn,
    BlinkEnd(EntityId),
    GameOverScreen,
}

/// Complete simulation state of one stage
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    pub bounds: Bounds,
    /// Stage number (1-based)
    pub stage: u32,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Session score (mirrored into the settings store)
    pub score: u64,
    pub player: Option<Player>,
    pub survival: Survival,
    pub foes: Vec<Foe>,
    pub shots: Vec<Shot>,
    pub power_ups: Vec<PowerUp>,
    pub shadows: Shadows,
    pub scheduler: Scheduler<TimerEvent>,
    pub formations: FormationEngine,
    pub director: SpawnDirector,
    pub power_cycle: PowerCycle,
    /// Boss firing staircase, shared by every boss cursor
    pub(crate) boss_pattern: Vec<f32>,
    pub(crate) store: Box<dyn SettingsStore>,
    pub(crate) drift_active: bool,
    events: Vec<GameEvent>,
    next_id: u32,
}

/// Reset per-session values in the store (score, power-up index)
pub fn reset_session(store: &mut dyn SettingsStore) {
    store.set_u64(SCORE_KEY, 0);
    PowerCycle::reset_session(store);
}

impl GameState {
    /// Create a stage. Invalid tuning is fatal here, never during ticks.
    pub fn new(
        tuning: Tuning,
        stage: u32,
        seed: u64,
        store: Box<dyn SettingsStore>,
    ) -> Result<Self, ConfigError> {
        tuning.validate()?;
        let boss_pattern = build_staircase(tuning.boss.pattern_extent, tuning.boss.pattern_step)?;
        let power_cycle = PowerCycle::load(tuning.power_ups.powers.clone(), store.as_ref())?;
        let score = store.get_u64(SCORE_KEY, 0);

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            bounds: Bounds::new(tuning.playfield.width, tuning.playfield.height),
            survival: Survival::new(tuning.player.max_lives),
            formations: FormationEngine::new(&tuning.formation),
            tuning,
            stage,
            phase: GamePhase::Playing,
            time_ticks: 0,
            score,
            player: None,
            foes: Vec::new(),
            shots: Vec::new(),
            power_ups: Vec::new(),
            shadows: Shadows::default(),
            scheduler: Scheduler::new(),
            director: SpawnDirector::new(),
            power_cycle,
            boss_pattern,
            store,
            drift_active: false,
            events: Vec::new(),
            next_id: 1,
        };

        log::info!("Stage {} starting (seed {})", stage, seed);
        state.spawn_player(false);
        state
            .director
            .start(stage, &state.tuning.spawn, &mut state.scheduler);
        state.schedule_drift_power_up();
        Ok(state)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn sound(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    pub fn visual(&mut self, cue: VisualCue) {
        self.events.push(GameEvent::Visual(cue));
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn store(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn SettingsStore {
        self.store.as_mut()
    }

    /// Hand the store back (to carry it into the next stage)
    pub fn into_store(self) -> Box<dyn SettingsStore> {
        self.store
    }

    pub fn boss_pattern(&self) -> &[f32] {
        &self.boss_pattern
    }

    /// Add points to the session score and persist it
    pub fn award(&mut self, points: u64) {
        self.score += points;
        self.store.set_u64(SCORE_KEY, self.score);
        self.emit(GameEvent::ScoreChanged { score: self.score });
    }

    pub fn lives_remaining(&self) -> u32 {
        self.survival.lives_remaining()
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    // --- lookups (active entities only) ---

    pub fn foe(&self, id: EntityId) -> Option<&Foe> {
        self.foes.iter().find(|f| f.id == id && f.active)
    }

    pub fn foe_mut(&mut self, id: EntityId) -> Option<&mut Foe> {
        self.foes.iter_mut().find(|f| f.id == id && f.active)
    }

    pub fn shot(&self, id: EntityId) -> Option<&Shot> {
        self.shots.iter().find(|s| s.id == id && s.active)
    }

    pub fn power_up(&self, id: EntityId) -> Option<&PowerUp> {
        self.power_ups.iter().find(|p| p.id == id && p.active)
    }

    pub fn active_foes(&self) -> impl Iterator<Item = &Foe> {
        self.foes.iter().filter(|f| f.active)
    }

    pub fn active_shots(&self) -> impl Iterator<Item = &Shot> {
        self.shots.iter().filter(|s| s.active)
    }

    pub fn active_power_ups(&self) -> impl Iterator<Item = &PowerUp> {
        self.power_ups.iter().filter(|p| p.active)
    }

    // --- spawning ---

    /// Spawn a foe, clamped into the playfield, with its shadow
    pub fn spawn_foe(&mut self, kind: FoeKind, pos: Vec2, vel: Vec2) -> EntityId {
        let (lives, points) = match kind {
            FoeKind::Boss { .. } => (self.tuning.boss.lives, self.tuning.boss.points),
            ref other => other.base_stats(),
        };
        let id = self.next_entity_id();
        let pos = self.bounds.clamp(pos);
        let mut foe = Foe::new(id, kind, lives, points, pos, vel);
        if foe.kind.has_shadow() {
            foe.shadow = Some(self.shadows.spawn(id, pos, FOE_SHADOW_OFFSET));
        }
        log::debug!("Spawned {} {} at ({:.0}, {:.0})", foe.kind.name(), id.0, pos.x, pos.y);
        self.foes.push(foe);
        id
    }

    /// Spawn a projectile paired with its shadow
    pub fn spawn_shot(&mut self, owner: Side, pos: Vec2, vel: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let mut shot = Shot::new(id, owner, pos, vel);
        shot.shadow = Some(self.shadows.spawn(id, pos, SHOT_SHADOW_OFFSET));
        self.shadows.sync(shot.shadow, pos, vel);
        self.shots.push(shot);
        id
    }

    /// Spawn a power-up. Bouncing rewards get a TTL timer.
    pub fn spawn_power_up(&mut self, pos: Vec2, vel: Vec2, motion: PowerUpMotion) -> EntityId {
        let id = self.next_entity_id();
        let tag = self.power_cycle.current().to_string();
        let mut power_up = PowerUp::new(id, tag, pos, vel, motion);
        power_up.shadow = Some(self.shadows.spawn(id, pos, POWER_UP_SHADOW_OFFSET));
        self.shadows.sync(power_up.shadow, pos, vel);
        if motion == PowerUpMotion::Bounce {
            let ttl = self.tuning.power_ups.reward_ttl;
            power_up.expiry = Some(self.scheduler.schedule(
                ttl,
                Repeat::Once,
                TimerEvent::PowerUpExpire(id),
            ));
            power_up.deadline = Some(self.scheduler.now() + ttl as f64);
        }
        self.power_ups.push(power_up);
        id
    }

    /// Spawn a reward power-up bouncing away from `at`
    pub fn spawn_reward(&mut self, at: Vec2) -> EntityId {
        let speed = self.tuning.power_ups.reward_speed;
        let vel = Vec2::new(
            self.rng.random_range(-speed..=speed),
            self.rng.random_range(-speed..=speed),
        );
        log::info!("Reward power-up at ({:.0}, {:.0})", at.x, at.y);
        self.spawn_power_up(at, vel, PowerUpMotion::Bounce)
    }

    /// Place a new player ship at the spawn point
    pub fn spawn_player(&mut self, invulnerable: bool) -> EntityId {
        let id = self.next_entity_id();
        let pos = Vec2::new(self.bounds.width / 2.0, self.bounds.height - 100.0);
        let mut player = Player::new(id, pos, self.tuning.power_ups.starting_power.clone());
        player.shadow = Some(self.shadows.spawn(id, pos, PLAYER_SHADOW_OFFSET));
        player.invulnerable = invulnerable;
        self.player = Some(player);
        id
    }

    /// Queue the next drifting power-up (12-20 s by default)
    pub(crate) fn schedule_drift_power_up(&mut self) {
        if !self.is_playing() || self.survival.is_game_over() {
            return;
        }
        let t = &self.tuning.power_ups;
        let (min, max) = (t.drift_min_delay, t.drift_max_delay.max(t.drift_min_delay));
        let delay = self.rng.random_range(min..=max);
        self.scheduler
            .schedule(delay, Repeat::Once, TimerEvent::DriftPowerUp);
    }

    /// Send a power-up across the playfield, one at a time
    pub(crate) fn spawn_drift_power_up(&mut self) {
        if !self.is_playing() || self.survival.is_game_over() || self.drift_active {
            return;
        }
        let t = &self.tuning.power_ups;
        let (min, max) = (t.drift_min_duration, t.drift_max_duration.max(t.drift_min_duration));
        let duration = self.rng.random_range(min..=max);
        let y = self.rng.random_range(50.0..=(self.bounds.height - 50.0).max(50.0));
        let distance = self.bounds.width + 100.0;
        let (x, vx) = if self.rng.random_bool(0.5) {
            (-50.0, distance / duration)
        } else {
            (self.bounds.width + 50.0, -distance / duration)
        };
        self.drift_active = true;
        self.spawn_power_up(Vec2::new(x, y), Vec2::new(vx, 0.0), PowerUpMotion::Sweep);
    }

    // --- destruction ---

    /// Destroy a foe, its shadow and its owned timer. Returns its last
    /// position, or `None` if it was already gone.
    pub fn destroy_foe(&mut self, id: EntityId) -> Option<Vec2> {
        let foe = self.foes.iter_mut().find(|f| f.id == id && f.active)?;
        foe.release(&mut self.shadows);
        let (pos, cohort, timer) = (foe.pos, foe.cohort, foe.timer.take());
        if let Some(timer) = timer {
            self.scheduler.cancel(timer);
        }
        if let Some(cohort) = cohort {
            self.formations.record_destroyed(cohort, pos);
        }
        Some(pos)
    }

    /// Destroy a shot and its shadow
    pub fn destroy_shot(&mut self, id: EntityId) -> bool {
        match self.shots.iter_mut().find(|s| s.id == id && s.active) {
            Some(shot) => shot.release(&mut self.shadows),
            None => false,
        }
    }

    /// Destroy a power-up: shadow first, then the power-up, then its TTL timer
    pub fn destroy_power_up(&mut self, id: EntityId) -> bool {
        let Some(power_up) = self.power_ups.iter_mut().find(|p| p.id == id && p.active) else {
            return false;
        };
        let motion = power_up.motion;
        if let Some(timer) = power_up.release(&mut self.shadows) {
            self.scheduler.cancel(timer);
        }
        if motion == PowerUpMotion::Sweep {
            self.drift_active = false;
            self.schedule_drift_power_up();
        }
        true
    }

    /// Remove the player ship and its shadow
    pub fn destroy_player(&mut self) -> Option<Vec2> {
        let player = self.player.take()?;
        if let Some(shadow) = player.shadow {
            self.shadows.release(shadow);
        }
        Some(player.pos)
    }

    /// Drop inactive entities
    pub fn normalize(&mut self) {
        self.foes.retain(|f| f.active);
        self.shots.retain(|s| s.active);
        self.power_ups.retain(|p| p.active);
    }

    // --- stage transitions ---

    /// Finish the stage once: stop generation and tell the host.
    /// Ignored after the last life is gone; that run ends in game over.
    pub fn finish_stage(&mut self) {
        if !self.is_playing() || self.survival.is_game_over() {
            return;
        }
        self.director.stop(&mut self.scheduler);
        self.phase = GamePhase::StageComplete;
        log::info!(
            "Stage {} complete (score {}, {} waves)",
            self.stage,
            self.score,
            self.formations.waves_completed()
        );
        self.emit(GameEvent::EndOfStage);
    }

    /// Enter the terminal game-over phase once
    pub fn enter_game_over(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.director.stop(&mut self.scheduler);
        self.phase = GamePhase::GameOver;
        let total = self.store.get_u64(TOTAL_SCORE_KEY, 0) + self.score;
        self.store.set_u64(TOTAL_SCORE_KEY, total);
        log::info!("Game over on stage {} (score {}, total {})", self.stage, self.score, total);
        self.emit(GameEvent::GameOver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryStore;
    use crate::sim::player::HitOutcome;

    fn state() -> GameState {
        GameState::new(Tuning::default(), 1, 42, Box::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_new_spawns_player_with_shadow() {
        let s = state();
        let player = s.player.as_ref().unwrap();
        assert_eq!(player.pos, Vec2::new(180.0, 540.0));
        assert!(!player.invulnerable);
        assert_eq!(s.shadows.len(), 1);
        assert_eq!(s.lives_remaining(), 5);
    }

    #[test]
    fn test_invalid_tuning_is_fatal() {
        let mut tuning = Tuning::default();
        tuning.boss.pattern_step = -1.0;
        assert!(GameState::new(tuning, 1, 1, Box::new(MemoryStore::new())).is_err());
    }

    #[test]
    fn test_negative_reward_speed_is_fatal() {
        let mut tuning = Tuning::default();
        tuning.power_ups.reward_speed = -10.0;
        assert!(matches!(
            GameState::new(tuning, 1, 1, Box::new(MemoryStore::new())),
            Err(ConfigError::Negative { .. })
        ));
    }

    #[test]
    fn test_one_drifting_power_up_at_a_time() {
        let mut s = state();
        let sweeps = |s: &GameState| {
            s.active_power_ups()
                .filter(|p| p.motion == PowerUpMotion::Sweep)
                .count()
        };
        s.spawn_drift_power_up();
        s.spawn_drift_power_up();
        assert_eq!(sweeps(&s), 1);

        let id = s.active_power_ups().find(|p| p.motion == PowerUpMotion::Sweep).unwrap().id;
        assert!(s.destroy_power_up(id));
        s.normalize();
        assert_eq!(sweeps(&s), 0);
        s.spawn_drift_power_up();
        assert_eq!(sweeps(&s), 1);
    }

    #[test]
    fn test_stage_does_not_finish_after_last_life() {
        let mut tuning = Tuning::default();
        tuning.player.max_lives = 1;
        let mut s = GameState::new(tuning, 1, 3, Box::new(MemoryStore::new())).unwrap();
        assert_eq!(s.survival.register_hit(false), HitOutcome::GameOver);
        s.finish_stage();
        assert_eq!(s.phase, GamePhase::Playing);
        assert!(!s.drain_events().contains(&GameEvent::EndOfStage));
        s.enter_game_over();
        assert_eq!(s.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_spawned_foes_are_clamped() {
        let mut s = state();
        let id = s.spawn_foe(FoeKind::Slider, Vec2::new(-100.0, 300.0), Vec2::new(200.0, 0.0));
        assert_eq!(s.foe(id).unwrap().pos, Vec2::new(0.0, 300.0));
        let tank = s.spawn_foe(FoeKind::Tank, Vec2::new(500.0, -100.0), Vec2::ZERO);
        assert_eq!(s.foe(tank).unwrap().pos, Vec2::new(360.0, 0.0));
        assert!(s.foe(tank).unwrap().shadow.is_none());
    }

    #[test]
    fn test_destroy_foe_releases_shadow_and_timer_once() {
        let mut s = state();
        let shadows_before = s.shadows.len();
        let id = s.spawn_foe(FoeKind::Teleporter { hops_left: 3 }, Vec2::new(50.0, 50.0), Vec2::ZERO);
        let timer = s.scheduler.schedule(1.5, Repeat::Times(3), TimerEvent::Teleport(id));
        s.foe_mut(id).unwrap().timer = Some(timer);

        assert_eq!(s.destroy_foe(id), Some(Vec2::new(50.0, 50.0)));
        assert_eq!(s.shadows.len(), shadows_before);
        assert!(!s.scheduler.is_pending(timer));
        assert_eq!(s.destroy_foe(id), None);
    }

    #[test]
    fn test_destroy_power_up_cancels_ttl() {
        let mut s = state();
        let id = s.spawn_power_up(Vec2::new(100.0, 100.0), Vec2::ZERO, PowerUpMotion::Bounce);
        let timer = s.power_up(id).unwrap().expiry.unwrap();
        assert!(s.destroy_power_up(id));
        assert!(!s.scheduler.is_pending(timer));
        assert!(s.shadows.iter().all(|sh| sh.owner != id));
        assert!(!s.destroy_power_up(id));
    }

    #[test]
    fn test_award_persists_score() {
        let mut s = state();
        s.award(50);
        s.award(400);
        assert_eq!(s.score, 450);
        assert_eq!(s.store().get_u64(SCORE_KEY, 0), 450);
        assert!(s.drain_events().contains(&GameEvent::ScoreChanged { score: 450 }));
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_game_over_accumulates_total_once() {
        let mut store = MemoryStore::new();
        store.set_u64(TOTAL_SCORE_KEY, 1000);
        let mut s = GameState::new(Tuning::default(), 1, 3, Box::new(store)).unwrap();
        s.award(250);
        s.enter_game_over();
        s.enter_game_over();
        assert_eq!(s.phase, GamePhase::GameOver);
        assert_eq!(s.store().get_u64(TOTAL_SCORE_KEY, 0), 1250);
        let overs = s.drain_events().into_iter().filter(|e| *e == GameEvent::GameOver).count();
        assert_eq!(overs, 1);
    }

    #[test]
    fn test_score_carries_across_stages() {
        let mut s = state();
        s.award(800);
        let store = s.into_store();
        let next = GameState::new(Tuning::default(), 2, 42, store).unwrap();
        assert_eq!(next.score, 800);
    }
}
