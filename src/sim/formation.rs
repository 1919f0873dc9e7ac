//! Path Formation Engine
//!
//! A cohort of foes shares one path. Each member owns its own progress
//! scalar, started with a stagger proportional to its index and looped for
//! as long as the member stays active. The cohort only reads the path; it is
//! released when the cohort clears.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, Foe, Shadows};
use super::path::Path;
use crate::tuning::FormationTuning;

/// Cohort identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CohortId(pub u32);

/// One foe's place in a cohort
#[derive(Debug, Clone)]
pub struct WaveMember {
    pub foe: EntityId,
    /// Normalized position along the path, in [0, 1]
    pub progress: f32,
    start_delay: f32,
    elapsed: f32,
}

impl WaveMember {
    fn advance(&mut self, dt: f32, duration: f32) {
        self.elapsed += dt;
        let running = self.elapsed - self.start_delay;
        self.progress = if running <= 0.0 {
            0.0
        } else {
            (running / duration).fract()
        };
    }
}

/// A wave of foes following one path
#[derive(Debug, Clone)]
pub struct Cohort {
    pub id: CohortId,
    path: Option<Path>,
    pub members: Vec<WaveMember>,
    /// Where the most recently destroyed member died
    pub last_destroyed: Option<Vec2>,
    cleared: bool,
}

impl Cohort {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }
}

/// A cohort that cleared this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearedWave {
    pub cohort: CohortId,
    /// Position for the reward power-up
    pub reward_at: Option<Vec2>,
}

/// Drives every live cohort
#[derive(Debug, Clone)]
pub struct FormationEngine {
    cohorts: Vec<Cohort>,
    next_id: u32,
    duration: f32,
    stagger: f32,
    waves_completed: u32,
}

impl FormationEngine {
    pub fn new(tuning: &FormationTuning) -> Self {
        Self {
            cohorts: Vec::new(),
            next_id: 1,
            duration: tuning.duration,
            stagger: tuning.stagger,
            waves_completed: 0,
        }
    }

    /// Allocate the id for the next cohort, so members can be tagged before launch
    pub fn reserve_id(&mut self) -> CohortId {
        let id = CohortId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Start a cohort. Member `i` starts `i * stagger` seconds after launch.
    pub fn launch(&mut self, id: CohortId, path: Path, foes: &[EntityId]) {
        let members = foes
            .iter()
            .enumerate()
            .map(|(i, &foe)| WaveMember {
                foe,
                progress: 0.0,
                start_delay: i as f32 * self.stagger,
                elapsed: 0.0,
            })
            .collect();
        log::info!("Wave {} launched with {} members", id.0, foes.len());
        self.cohorts.push(Cohort {
            id,
            path: Some(path),
            members,
            last_destroyed: None,
            cleared: false,
        });
    }

    /// Note where a cohort member died (reward spawn point)
    pub fn record_destroyed(&mut self, cohort: CohortId, pos: Vec2) {
        if let Some(c) = self.cohorts.iter_mut().find(|c| c.id == cohort) {
            c.last_destroyed = Some(pos);
        }
    }

    /// Move every active member along its path and detect cleared cohorts.
    ///
    /// A cohort clears exactly once, when every member is inactive; its
    /// path is released and it stops being tracked.
    pub fn advance(&mut self, dt: f32, foes: &mut [Foe], shadows: &mut Shadows) -> Vec<ClearedWave> {
        let mut cleared = Vec::new();

        for cohort in &mut self.cohorts {
            if cohort.cleared {
                continue;
            }
            let Some(path) = cohort.path.as_ref() else {
                continue;
            };

            let mut any_active = false;
            for member in &mut cohort.members {
                let Some(foe) = foes.iter_mut().find(|f| f.id == member.foe && f.active) else {
                    continue;
                };
                any_active = true;
                member.advance(dt, self.duration);
                let point = path.point_at(member.progress);
                foe.pos = point;
                foe.depth = point.y;
                shadows.follow(foe.shadow, point);
            }

            if !any_active {
                cohort.cleared = true;
                cohort.path = None;
                self.waves_completed += 1;
                log::info!(
                    "Wave {} cleared ({} completed)",
                    cohort.id.0,
                    self.waves_completed
                );
                cleared.push(ClearedWave {
                    cohort: cohort.id,
                    reward_at: cohort.last_destroyed,
                });
            }
        }

        self.cohorts.retain(|c| !c.cleared);
        cleared
    }

    pub fn waves_completed(&self) -> u32 {
        self.waves_completed
    }

    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    pub fn cohort(&self, id: CohortId) -> Option<&Cohort> {
        self.cohorts.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::FoeKind;

    fn straight_path() -> Path {
        let mut path = Path::new(Vec2::ZERO);
        path.line_to(Vec2::new(0.0, 120.0));
        path
    }

    fn setup(n: u32) -> (FormationEngine, Vec<Foe>, Shadows, CohortId) {
        let tuning = FormationTuning {
            duration: 12.0,
            stagger: 0.3,
            ..Default::default()
        };
        let mut engine = FormationEngine::new(&tuning);
        let id = engine.reserve_id();
        let foes: Vec<Foe> = (0..n)
            .map(|i| {
                let mut f = Foe::new(EntityId(i + 1), FoeKind::Scout, 1, 400, Vec2::ZERO, Vec2::ZERO);
                f.cohort = Some(id);
                f
            })
            .collect();
        let ids: Vec<EntityId> = foes.iter().map(|f| f.id).collect();
        engine.launch(id, straight_path(), &ids);
        (engine, foes, Shadows::default(), id)
    }

    #[test]
    fn test_members_are_staggered() {
        let (mut engine, mut foes, mut shadows, _) = setup(3);
        engine.advance(0.6, &mut foes, &mut shadows);
        // member 0 ran 0.6s, member 1 ran 0.3s, member 2 just starting
        assert!((foes[0].pos.y - 6.0).abs() < 0.01);
        assert!((foes[1].pos.y - 3.0).abs() < 0.01);
        assert!(foes[2].pos.y.abs() < 0.01);
        assert_eq!(foes[0].depth, foes[0].pos.y);
    }

    #[test]
    fn test_progress_loops() {
        let (mut engine, mut foes, mut shadows, _) = setup(1);
        engine.advance(13.0, &mut foes, &mut shadows);
        let progress = engine.cohorts()[0].members[0].progress;
        assert!((progress - 1.0 / 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_cleared_exactly_once_when_all_inactive() {
        let (mut engine, mut foes, mut shadows, id) = setup(2);
        foes[0].active = false;
        assert!(engine.advance(0.1, &mut foes, &mut shadows).is_empty());

        engine.record_destroyed(id, Vec2::new(7.0, 8.0));
        foes[1].active = false;
        let cleared = engine.advance(0.1, &mut foes, &mut shadows);
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].reward_at, Some(Vec2::new(7.0, 8.0)));
        assert_eq!(engine.waves_completed(), 1);

        assert!(engine.advance(0.1, &mut foes, &mut shadows).is_empty());
        assert_eq!(engine.waves_completed(), 1);
        assert!(engine.cohort(id).is_none());
    }

    #[test]
    fn test_shadow_follows_member() {
        let (mut engine, mut foes, mut shadows, _) = setup(1);
        foes[0].shadow = Some(shadows.spawn(foes[0].id, foes[0].pos, Vec2::new(20.0, 20.0)));
        engine.advance(1.2, &mut foes, &mut shadows);
        let shadow = shadows.iter().next().unwrap();
        assert_eq!(shadow.pos, foes[0].pos + Vec2::new(20.0, 20.0));
    }
}
