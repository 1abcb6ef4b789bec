//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;

use super::collision;
use super::combat;
use super::effects::EffectChange;
use super::entity::{EnemyAction, ProjectileKind};
use super::events::{EntityKind, GameEvent, RemovalReason, SoundCue};
use super::session::GamePhase;
use super::spawn::SpawnEvent;
use super::state::{GameState, projectile_entity_kind};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired movement, magnitude 0 or 1
    pub movement: Vec2,
    /// Fire ofuda (held; cooldown limits the rate)
    pub fire_ofuda: bool,
    /// Oharai swing (just pressed)
    pub use_oharai: bool,
    /// Crystal ball (just pressed)
    pub use_crystal_ball: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start / continue from menu, stage clear or game over
    pub confirm: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause && state.session.toggle_pause() {
        log::info!("Pause toggled: {:?}", state.session.phase);
    }

    if input.confirm {
        match state.session.phase {
            GamePhase::Menu | GamePhase::GameOver => state.start_new_game(),
            GamePhase::StageClear => advance_stage(state),
            _ => {}
        }
    }

    // Nothing moves outside of play
    if state.session.phase != GamePhase::Playing {
        emit_phase_change(state);
        return;
    }

    state.time += dt as f64;

    apply_input(state, input);
    state.player.update(dt);
    update_enemies(state, dt);
    combat::update_attachments(state, dt);
    update_projectiles(state, dt);
    update_items(state, dt);
    run_director(state, dt);

    collision::resolve_contacts(state);

    update_effects(state, dt);
    state.prune_dead();
    state.score.advance(dt);

    emit_phase_change(state);
    state.normalize_order();
}

fn apply_input(state: &mut GameState, input: &TickInput) {
    state.player.set_movement(input.movement);
    if input.fire_ofuda {
        fire_ofuda(state);
    }
    if input.use_oharai {
        use_oharai(state);
    }
    if input.use_crystal_ball {
        activate_crystal_ball(state);
    }
}

/// Throw an ofuda in the shot direction
///
/// Returns None while on cooldown or with the screen cap reached.
pub fn fire_ofuda(state: &mut GameState) -> Option<u32> {
    let now = state.time;
    if !state.player.ofuda_ready(now) || state.live_ofuda_count() >= OFUDA_MAX_COUNT {
        return None;
    }
    let dir = state.player.shot_direction();
    let pos = state.player.pos + dir * state.player.radius;
    let vel = dir * state.session.ofuda_speed();
    let kind = ProjectileKind::Ofuda {
        damage: state.session.ofuda_damage(),
        can_pierce: state.session.ofuda_pierce(),
        pierce_count: 0,
        hits: Vec::new(),
    };
    let id = state.spawn_projectile(kind, pos, vel, OFUDA_LIFETIME);
    state.player.last_ofuda_at = Some(now);
    state.score.record_ofuda_fired();
    state.events.sound(SoundCue::OfudaShoot);
    Some(id)
}

/// Swing the oharai stick around the player
pub fn use_oharai(state: &mut GameState) -> Option<u32> {
    let now = state.time;
    if !state.player.oharai_ready(now) {
        return None;
    }
    let kind = ProjectileKind::Oharai {
        damage: OHARAI_DAMAGE,
        hits: Vec::new(),
    };
    let id = state.spawn_projectile(kind, state.player.pos, Vec2::ZERO, OHARAI_DURATION);
    state.player.last_oharai_at = Some(now);
    state.score.record_oharai_used();
    state.events.sound(SoundCue::OharaiSwing);

    let struck = combat::sweep_oharai(state, id);
    log::debug!("Oharai #{} struck {} enemies", id, struck.len());
    Some(id)
}

/// Spend a crystal ball and freeze every enemy on the field
pub fn activate_crystal_ball(state: &mut GameState) -> bool {
    if !state.effects.activate_crystal_ball(&mut state.session) {
        return false;
    }
    for enemy in &mut state.enemies {
        enemy.stopped = true;
    }
    state.score.record_crystal_ball_used();
    state.events.push(GameEvent::CrystalBallActivated {
        remaining_balls: state.session.crystal_balls,
    });
    state.events.sound(SoundCue::CrystalBall);
    log::info!(
        "Crystal ball activated ({} left)",
        state.session.crystal_balls
    );
    true
}

/// End an active crystal-ball freeze now
///
/// Returns false when no freeze was running.
pub fn deactivate_crystal_ball(state: &mut GameState) -> bool {
    if !state.effects.deactivate_crystal_ball() {
        return false;
    }
    release_frozen_enemies(state);
    true
}

fn release_frozen_enemies(state: &mut GameState) {
    for enemy in &mut state.enemies {
        enemy.stopped = false;
    }
    state.events.push(GameEvent::CrystalBallEnded);
    log::debug!("Crystal ball ended");
}

fn update_enemies(state: &mut GameState, dt: f32) {
    if state.effects.enemies_stopped() {
        return;
    }
    let player_pos = state.player.pos;
    let mut actions = Vec::new();
    for enemy in &mut state.enemies {
        if let Some(action) = enemy.update(dt, player_pos, &mut state.rng) {
            actions.push((enemy.id, action));
        }
    }

    for (id, action) in actions {
        match action {
            EnemyAction::Fire { dir, bullet } => {
                if let Some(pos) = state.enemy(id).map(|e| e.pos) {
                    state.spawn_enemy_bullet(bullet, pos, dir);
                }
            }
            EnemyAction::Attach => {
                combat::attach_rumuru(state, id);
            }
            EnemyAction::LeftScreen => {
                if let Some(enemy) = state.enemy(id) {
                    let (kind, pos) = (enemy.kind(), enemy.pos);
                    state.events.push(GameEvent::EntityRemoved {
                        id,
                        kind: EntityKind::Enemy(kind),
                        reason: RemovalReason::OffScreen,
                        pos,
                    });
                }
            }
        }
    }
}

fn update_projectiles(state: &mut GameState, dt: f32) {
    for projectile in &mut state.projectiles {
        if projectile.update(dt) {
            state.events.push(GameEvent::EntityRemoved {
                id: projectile.id,
                kind: projectile_entity_kind(&projectile.kind),
                reason: RemovalReason::Expired,
                pos: projectile.pos,
            });
        }
    }
}

fn update_items(state: &mut GameState, dt: f32) {
    for item in &mut state.items {
        if item.update(dt) {
            state.events.push(GameEvent::EntityRemoved {
                id: item.id,
                kind: EntityKind::Item(item.kind),
                reason: RemovalReason::Expired,
                pos: item.pos,
            });
        }
    }
}

fn run_director(state: &mut GameState, dt: f32) {
    let live = state.live_enemy_count();
    let spawns = state.director.tick(dt, live, &mut state.rng);
    for event in spawns {
        match event {
            SpawnEvent::Enemy { kind, pos } => {
                state.spawn_enemy(kind, pos);
            }
            SpawnEvent::Item { kind, pos } => {
                state.spawn_item(kind, pos);
            }
            SpawnEvent::WaveCleared { wave } => on_wave_cleared(state, wave),
            SpawnEvent::WaveStarted { .. } => state.announce(event),
        }
    }
}

/// Every third wave closes out a stage
fn on_wave_cleared(state: &mut GameState, wave: u32) {
    log::info!("Wave {} cleared", wave);
    if wave == 0 || wave % WAVES_PER_STAGE != 0 {
        return;
    }
    if !state.session.clear_stage() {
        return;
    }
    let stage = state.session.stage;
    let bonus = state
        .score
        .award_stage_clear(state.session.health, state.session.stage_damage);
    state.pump_score_events();
    state.events.push(GameEvent::StageCleared { stage });
    state.events.sound(SoundCue::StageCleared);
    log::info!("Stage {} cleared, bonus {}", stage, bonus);
}

/// Continue from StageClear into the next stage (or the ending)
fn advance_stage(state: &mut GameState) {
    match state.session.next_stage() {
        GamePhase::Playing => {
            // Stray shots don't carry over
            state.projectiles.clear();
            log::info!("Stage {} begins", state.session.stage);
        }
        GamePhase::GameOver => {
            log::info!("Final stage cleared, score {}", state.score.score());
        }
        _ => {}
    }
}

fn update_effects(state: &mut GameState, dt: f32) {
    for change in state.effects.update(dt, &mut state.player) {
        match change {
            EffectChange::CrystalBallWarning => {
                state.events.push(GameEvent::CrystalBallWarning);
            }
            EffectChange::CrystalBallEnded => release_frozen_enemies(state),
            EffectChange::InvincibilityEnded => {
                log::debug!("Invincibility ended");
            }
        }
    }
}

fn emit_phase_change(state: &mut GameState) {
    let phase = state.session.phase;
    if phase == state.last_phase {
        return;
    }
    log::info!("Phase {:?} -> {:?}", state.last_phase, phase);
    state.events.push(GameEvent::PhaseChanged {
        from: state.last_phase,
        to: phase,
    });
    state.last_phase = phase;
}
