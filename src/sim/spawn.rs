//! Spawn Director
//!
//! Owns the periodic generators and the difficulty timer. Higher levels add
//! generators; past the ramp threshold every active generator gets faster,
//! down to its floor. The boss stage runs no generators at all: it releases
//! a single boss after a short delay.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;

use super::boss::PatternCursor;
use super::entity::{EntityId, FoeKind};
use super::events::VisualCue;
use super::path::build_wave_path;
use super::scheduler::{Repeat, Scheduler, TimerHandle};
use super::state::{GameState, TimerEvent};
use crate::audio::SoundCue;
use crate::tuning::{GeneratorTuning, SpawnTuning};

/// Periodic foe generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeneratorKind {
    /// Straight line of scouts dropping from the top
    Ordered,
    /// Cohort following a zig-zag path
    PathWave,
    Tank,
    Slider,
    Teleporter,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 5] = [
        GeneratorKind::Ordered,
        GeneratorKind::PathWave,
        GeneratorKind::Tank,
        GeneratorKind::Slider,
        GeneratorKind::Teleporter,
    ];

    /// Difficulty level at which this generator joins
    pub fn unlock_level(&self) -> u32 {
        match self {
            GeneratorKind::Ordered | GeneratorKind::PathWave => 1,
            GeneratorKind::Tank => 2,
            GeneratorKind::Slider => 3,
            GeneratorKind::Teleporter => 4,
        }
    }

    pub fn tuning(&self, spawn: &SpawnTuning) -> GeneratorTuning {
        match self {
            GeneratorKind::Ordered => spawn.ordered,
            GeneratorKind::PathWave => spawn.path_wave,
            GeneratorKind::Tank => spawn.tank,
            GeneratorKind::Slider => spawn.slider,
            GeneratorKind::Teleporter => spawn.teleporter,
        }
    }
}

/// Generator and difficulty bookkeeping for one stage
#[derive(Debug, Clone, Default)]
pub struct SpawnDirector {
    level: u32,
    generators: BTreeMap<GeneratorKind, TimerHandle>,
    difficulty: Option<TimerHandle>,
    boss_release: Option<TimerHandle>,
    boss_cue: Option<TimerHandle>,
    stopped: bool,
}

impl SpawnDirector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the stage's opening timers
    pub fn start(&mut self, stage: u32, tuning: &SpawnTuning, scheduler: &mut Scheduler<TimerEvent>) {
        self.level = 1;
        self.stopped = false;
        if stage == tuning.boss_stage {
            log::info!("Boss stage: release in {:.1}s", tuning.boss_release_delay);
            self.boss_release = Some(scheduler.schedule(
                tuning.boss_release_delay,
                Repeat::Once,
                TimerEvent::ReleaseBoss,
            ));
            return;
        }
        for kind in GeneratorKind::ALL {
            if kind.unlock_level() <= self.level {
                self.add_generator(kind, tuning, scheduler);
            }
        }
        self.difficulty = Some(scheduler.schedule(
            tuning.difficulty_interval,
            Repeat::Forever,
            TimerEvent::DifficultyUp,
        ));
    }

    fn add_generator(&mut self, kind: GeneratorKind, tuning: &SpawnTuning, scheduler: &mut Scheduler<TimerEvent>) {
        if self.generators.contains_key(&kind) {
            return;
        }
        let interval = kind.tuning(tuning).interval;
        let handle = scheduler.schedule(interval, Repeat::Forever, TimerEvent::Generate(kind));
        self.generators.insert(kind, handle);
        log::info!("Generator {:?} every {:.1}s", kind, interval);
    }

    /// Raise the difficulty level by one and apply its effects
    pub fn raise_difficulty(&mut self, tuning: &SpawnTuning, scheduler: &mut Scheduler<TimerEvent>) -> u32 {
        if self.stopped {
            return self.level;
        }
        self.level += 1;
        for kind in GeneratorKind::ALL {
            if kind.unlock_level() <= self.level {
                self.add_generator(kind, tuning, scheduler);
            }
        }

        if self.level > tuning.ramp_after_level {
            for (kind, &handle) in &self.generators {
                let Some(delay) = scheduler.delay(handle) else {
                    continue;
                };
                let floor = kind.tuning(tuning).floor;
                let next = (delay - tuning.ramp_step).max(floor);
                scheduler.set_delay(handle, next);
                log::debug!("Generator {:?} delay {:.1}s -> {:.1}s", kind, delay, next);
            }
        }
        log::info!("Difficulty level {}", self.level);
        self.level
    }

    /// Remember the boss audio cue timer so stopping cancels it
    pub fn set_boss_cue(&mut self, handle: TimerHandle) {
        self.boss_cue = Some(handle);
    }

    /// Cancel every timer the director owns. Idempotent.
    pub fn stop(&mut self, scheduler: &mut Scheduler<TimerEvent>) {
        for (_, handle) in std::mem::take(&mut self.generators) {
            scheduler.cancel(handle);
        }
        for handle in [
            self.difficulty.take(),
            self.boss_release.take(),
            self.boss_cue.take(),
        ]
        .into_iter()
        .flatten()
        {
            scheduler.cancel(handle);
        }
        self.stopped = true;
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Active generators in a stable order
    pub fn active_generators(&self) -> Vec<GeneratorKind> {
        self.generators.keys().copied().collect()
    }

    pub fn generator_delay(&self, kind: GeneratorKind, scheduler: &Scheduler<TimerEvent>) -> Option<f32> {
        self.generators.get(&kind).and_then(|&h| scheduler.delay(h))
    }
}

/// Run one generator firing
pub fn run_generator(state: &mut GameState, kind: GeneratorKind) {
    match kind {
        GeneratorKind::Ordered => {
            spawn_ordered_formation(state);
        }
        GeneratorKind::PathWave => {
            spawn_path_wave(state);
        }
        GeneratorKind::Tank => {
            spawn_tank(state);
        }
        GeneratorKind::Slider => {
            spawn_slider(state);
        }
        GeneratorKind::Teleporter => {
            spawn_teleporter(state);
        }
    }
}

/// A horizontal line of scouts dropping straight down, each nudged up or down
pub fn spawn_ordered_formation(state: &mut GameState) -> Vec<EntityId> {
    let t = &state.tuning.spawn;
    let (count, spacing, jitter, speed) = (t.ordered_count, t.ordered_spacing, t.ordered_jitter, t.ordered_speed);
    let span = spacing * count.saturating_sub(1) as f32;
    let x: f32 = state.rng.random_range(24.0..=(state.bounds.width - span - 24.0).max(24.0));
    let y: f32 = state.rng.random_range(-24.0..=0.0);

    let mut ids = Vec::with_capacity(count as usize);
    for i in 0..count {
        let nudge = if state.rng.random_bool(0.5) { jitter } else { -jitter };
        let pos = Vec2::new(x + i as f32 * spacing, y + nudge);
        ids.push(state.spawn_foe(FoeKind::Scout, pos, Vec2::new(0.0, speed)));
    }
    log::debug!("Ordered formation of {} at x={:.0}", count, x);
    ids
}

/// A cohort of scouts sharing one freshly built zig-zag path
pub fn spawn_path_wave(state: &mut GameState) -> Vec<EntityId> {
    let path = build_wave_path(&mut state.rng, &state.tuning.formation, &state.bounds);
    let cohort = state.formations.reserve_id();
    let size = state.tuning.formation.cohort_size;
    let max_x = (state.bounds.width - 40.0).max(40.0);

    let mut ids = Vec::with_capacity(size as usize);
    for _ in 0..size {
        let pos = Vec2::new(
            state.rng.random_range(40.0..=max_x),
            state.rng.random_range(-50.0..=-10.0),
        );
        let id = state.spawn_foe(FoeKind::Scout, pos, Vec2::ZERO);
        if let Some(foe) = state.foe_mut(id) {
            foe.cohort = Some(cohort);
        }
        ids.push(id);
    }
    state.formations.launch(cohort, path, &ids);
    ids
}

/// A heavy foe diving fast from the top
pub fn spawn_tank(state: &mut GameState) -> EntityId {
    let x: f32 = state.rng.random_range(100.0..=600.0);
    let speed = state.tuning.spawn.tank_speed;
    state.spawn_foe(FoeKind::Tank, Vec2::new(x, -100.0), Vec2::new(0.0, speed))
}

/// A spinning foe crossing horizontally from a random side
pub fn spawn_slider(state: &mut GameState) -> EntityId {
    let speed = state.tuning.spawn.slider_speed;
    let (x, vx) = if state.rng.random_bool(0.5) {
        (-100.0, speed)
    } else {
        (state.bounds.width + 100.0, -speed)
    };
    let y: f32 = state.rng.random_range(100.0..=600.0);
    let id = state.spawn_foe(FoeKind::Slider, Vec2::new(x, y), Vec2::new(vx, 0.0));
    state.visual(VisualCue::Spin { entity: id });
    id
}

/// A slow foe that jumps to a random spot on a fixed interval
pub fn spawn_teleporter(state: &mut GameState) -> EntityId {
    let t = &state.tuning.spawn;
    let (hops, interval, drift) = (t.teleport_max_hops, t.teleport_interval, t.teleporter_drift);
    let pos = random_point(state);
    let id = state.spawn_foe(FoeKind::Teleporter { hops_left: hops }, pos, Vec2::new(0.0, drift));
    if hops > 0 {
        let handle = state
            .scheduler
            .schedule(interval, Repeat::Times(hops), TimerEvent::Teleport(id));
        if let Some(foe) = state.foe_mut(id) {
            foe.timer = Some(handle);
        }
    }
    id
}

/// One teleport hop. Stale hops (foe already gone) do nothing.
pub fn teleport(state: &mut GameState, id: EntityId) {
    if state.foe(id).is_none() {
        return;
    }
    let to = random_point(state);
    let Some(foe) = state.foe_mut(id) else {
        return;
    };
    let FoeKind::Teleporter { hops_left } = &mut foe.kind else {
        return;
    };
    *hops_left = hops_left.saturating_sub(1);
    if *hops_left == 0 {
        // repeat count ran out with this hop
        foe.timer = None;
    }
    foe.pos = to;
    foe.depth = to.y;
    let shadow = foe.shadow;
    state.shadows.follow(shadow, to);
    state.visual(VisualCue::Materialize {
        entity: id,
        from: 0.3,
        to: 1.0,
        seconds: 0.2,
        repeats: 1,
    });
}

/// Release the stage boss and start its audio cue
pub fn release_boss(state: &mut GameState) -> Option<EntityId> {
    if !state.is_playing() {
        return None;
    }
    let x: f32 = state.rng.random_range(200.0..=600.0);
    let id = state.spawn_foe(
        FoeKind::Boss {
            pattern: PatternCursor::default(),
        },
        Vec2::new(x, 200.0),
        Vec2::ZERO,
    );
    let cue = state.scheduler.schedule(
        state.tuning.spawn.boss_cue_interval,
        Repeat::Forever,
        TimerEvent::BossCue,
    );
    state.director.set_boss_cue(cue);
    state.sound(SoundCue::Boss);
    state.visual(VisualCue::Materialize {
        entity: id,
        from: 0.3,
        to: 1.0,
        seconds: 0.2,
        repeats: 10,
    });
    log::info!("Boss released with {} lives", state.tuning.boss.lives);
    Some(id)
}

fn random_point(state: &mut GameState) -> Vec2 {
    let (w, h) = (state.bounds.width, state.bounds.height);
    Vec2::new(state.rng.random_range(0.0..=w), state.rng.random_range(0.0..=h))
}
