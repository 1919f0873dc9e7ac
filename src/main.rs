//! Sky Raid headless runner
//!
//! Plays stages with a simple autopilot and logs every outbound event.
//!
//! Usage: `sky-raid [stage] [seconds] [tuning.json]`
//! Settings persist to `$SKY_RAID_SETTINGS` (default `sky_raid_settings.json`).

use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;

use sky_raid::audio::SoundCue;
use sky_raid::consts::*;
use sky_raid::sim::{
    EventSink, GamePhase, GameState, TickInput, VisualCue, dispatch, reset_session, tick,
};
use sky_raid::{ConfigError, JsonFileStore, SettingsStore, Tuning};

/// Routes outbound events to the log
struct LogSink;

impl EventSink for LogSink {
    fn play(&mut self, cue: SoundCue) {
        log::trace!("sound: {}", cue.key());
    }

    fn visual(&mut self, cue: VisualCue) {
        match serde_json::to_string(&cue) {
            Ok(json) => log::trace!("visual: {}", json),
            Err(e) => log::warn!("visual cue not serializable: {}", e),
        }
    }

    fn score(&mut self, score: u64) {
        log::debug!("score: {}", score);
    }

    fn lives(&mut self, lives: u32) {
        log::info!("lives: {}", lives);
    }

    fn end_of_stage(&mut self) {
        log::info!("end of stage");
    }

    fn game_over(&mut self) {
        log::info!("game over");
    }
}

/// Hover under the lowest foe and keep firing
fn autopilot(state: &GameState) -> TickInput {
    let target_x = state
        .active_foes()
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .map(|f| f.pos.x);
    let pointer = state.player.as_ref().map(|p| {
        Vec2::new(target_x.unwrap_or(p.pos.x), state.bounds.height - 40.0)
    });
    TickInput {
        pointer,
        firing: true,
    }
}

fn run() -> Result<(), ConfigError> {
    let mut args = std::env::args().skip(1);
    let mut stage: u32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(1);
    let seconds: f32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(120.0);
    let tuning = match args.next() {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };

    let settings_path =
        std::env::var("SKY_RAID_SETTINGS").unwrap_or_else(|_| "sky_raid_settings.json".to_string());
    let mut store: Box<dyn SettingsStore> = Box::new(JsonFileStore::open(&settings_path)?);
    reset_session(store.as_mut());

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let max_ticks = (seconds / SIM_DT) as u64;
    let mut elapsed = 0u64;
    let mut sink = LogSink;

    loop {
        let mut state = GameState::new(tuning.clone(), stage, seed.wrapping_add(stage as u64), store)?;
        while state.is_playing() && elapsed < max_ticks {
            let input = autopilot(&state);
            tick(&mut state, &input, SIM_DT);
            dispatch(state.drain_events(), &mut sink);
            elapsed += 1;
        }
        log::info!(
            "Stage {} ended in {:?} with score {} ({} lives left)",
            stage,
            state.phase,
            state.score,
            state.lives_remaining()
        );

        let phase = state.phase;
        store = state.into_store();
        match phase {
            GamePhase::StageComplete if elapsed < max_ticks => stage += 1,
            _ => break,
        }
    }

    store.flush()?;
    log::info!("Total score: {}", store.get_u64(TOTAL_SCORE_KEY, 0));
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Sky Raid (headless) starting...");
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
