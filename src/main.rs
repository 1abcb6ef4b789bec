//! Kiki Kaikai headless entry point
//!
//! Loads settings and high scores, lets an autopilot play one game at the
//! fixed timestep, then records the result.
//!
//! Usage: `kiki-kaikai [seed]`. Save files live in `$KIKI_KAIKAI_DATA`
//! (default: current directory).

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use kiki_kaikai::consts::*;
use kiki_kaikai::platform::{Key, KeyboardState};
use kiki_kaikai::sim::score::{format_accuracy, format_score, format_time};
use kiki_kaikai::sim::{EntityKind, GameEvent, GamePhase, GameState, Snapshot, tick};
use kiki_kaikai::{HighScores, Settings};

/// Host frame length; the sim catches up in fixed substeps
const FRAME_DT: f32 = 1.0 / 30.0;
/// Give up after ten minutes of simulated time
const MAX_FRAMES: u32 = 30 * 60 * 10;

fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

fn data_dir() -> PathBuf {
    std::env::var_os("KIKI_KAIKAI_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Pick keys for this frame from what a player would see on screen
fn autopilot(snap: &Snapshot, keys: &mut KeyboardState) {
    for key in [Key::Up, Key::Down, Key::Left, Key::Right] {
        keys.release(key);
    }

    match snap.phase {
        GamePhase::Menu | GamePhase::StageClear => {
            // Tap confirm: down one frame, up the next
            let tap = !keys.is_held(Key::Enter);
            keys.set(Key::Enter, tap);
            keys.release(Key::Space);
            return;
        }
        GamePhase::Paused | GamePhase::GameOver => {
            for key in [Key::Escape, Key::Enter, Key::Space, Key::Z, Key::X] {
                keys.release(key);
            }
            return;
        }
        GamePhase::Playing => keys.release(Key::Enter),
    }

    let me = snap.player.pos;
    let nearest = snap
        .enemies
        .iter()
        .min_by(|a, b| me.distance(a.pos).total_cmp(&me.distance(b.pos)));

    // Line up under the nearest enemy and keep shooting upward
    keys.press(Key::Space);
    if let Some(enemy) = nearest {
        if enemy.pos.x < me.x - 8.0 {
            keys.press(Key::Left);
        } else if enemy.pos.x > me.x + 8.0 {
            keys.press(Key::Right);
        }
        let close = me.distance(enemy.pos) < OHARAI_RANGE;
        keys.set(Key::Z, close && !keys.is_held(Key::Z));
    }

    // Back away from incoming bullets
    let threatened = snap.projectiles.iter().any(|p| {
        matches!(p.kind, EntityKind::EnemyBullet(_))
            && p.pos.distance(me) < 80.0
    });
    if threatened && me.y > PLAYER_RADIUS * 2.0 {
        keys.press(Key::Down);
    }

    let crowded = snap.enemies.len() >= MAX_ENEMIES_ON_SCREEN / 2;
    let freeze = crowded && snap.freeze_remaining <= 0.0 && snap.crystal_balls > 0;
    keys.set(Key::X, freeze && !keys.is_held(Key::X));
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::WaveStarted { wave, enemies } => {
            log::info!("Wave {} ({} enemies)", wave, enemies)
        }
        GameEvent::StageCleared { stage } => log::info!("Stage {} clear!", stage),
        GameEvent::MilestoneReached { milestone } => {
            log::info!("Milestone {}", format_score(*milestone))
        }
        GameEvent::PlayerDamaged { health, .. } => log::info!("Hit! {} health left", health),
        GameEvent::BonusScoreAdded { amount, reason, .. } => {
            log::info!("{} +{}", reason.label(), amount)
        }
        other => log::debug!("{other:?}"),
    }
}

fn main() {
    env_logger::init();
    log::info!("Kiki Kaikai (headless) starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(|| now_millis() as u64);

    let dir = data_dir();
    let settings_path = dir.join("settings.json");
    let scores_path = dir.join("highscores.json");

    let settings = Settings::load(&settings_path);
    if !settings_path.exists() {
        if let Err(e) = settings.save(&settings_path) {
            log::warn!("Could not write default settings: {e}");
        }
    }
    let high_scores = HighScores::load(&scores_path);
    log::info!(
        "Seed {}, difficulty {}, best {}",
        seed,
        settings.difficulty.as_str(),
        high_scores.top_score().unwrap_or(0)
    );

    let mut state = GameState::new(seed, settings, high_scores);
    let mut keys = KeyboardState::new();
    let mut accumulator = 0.0f32;
    let mut started = false;

    for _ in 0..MAX_FRAMES {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let snap = state.snapshot();
            autopilot(&snap, &mut keys);
            let input = keys.to_tick_input();
            tick(&mut state, &input, SIM_DT);
            keys.end_frame();
            accumulator -= SIM_DT;
            substeps += 1;
        }

        for event in state.events.drain() {
            log_event(&event);
        }

        match state.session.phase {
            GamePhase::Playing => started = true,
            GamePhase::GameOver if started => break,
            _ => {}
        }
    }

    if state.session.phase != GamePhase::GameOver {
        log::info!("Time limit reached, ending the run");
        state.session.game_over();
    }

    if let Some(rank) = state.finish_game(now_millis()) {
        log::info!("New high score! Rank {}", rank);
        if let Err(e) = state.high_scores().save(&scores_path) {
            log::warn!("Failed to save high scores: {e}");
        }
    }

    let stats = state.score.stats();
    log::info!(
        "{} - score {} ({}), stage {}, time {}",
        state.score.rank_title(),
        format_score(state.score.score()),
        state.score.score(),
        state.session.stage,
        format_time(stats.playtime)
    );
    log::info!(
        "Kills {}, items {}, max combo {}, accuracy {}, survivability {}",
        stats.enemies_killed,
        stats.items_collected,
        stats.max_combo,
        format_accuracy(stats.accuracy()),
        format_accuracy(stats.survivability())
    );
    for achievement in state.score.achievements() {
        log::info!("Achievement: {}", achievement.title());
    }
}
