//! Combat resolution: damage, kills, drops, piercing and knockback
//!
//! Every function here is safe to call on an entity that already died this
//! tick; it simply does nothing.

use glam::Vec2;

use super::entity::ProjectileKind;
use super::events::{EntityKind, GameEvent, RemovalReason, SoundCue};
use super::spawn::roll_drop;
use super::state::GameState;
use crate::consts::*;
use crate::direction_to;

/// Outcome of an ofuda striking an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfudaHit {
    /// Passed through; the ofuda keeps flying
    Pierced,
    /// The ofuda was used up
    Spent,
}

/// Damage an enemy; returns true if this call killed it
pub fn damage_enemy(state: &mut GameState, enemy_id: u32, amount: u32) -> bool {
    if amount == 0 {
        return false;
    }
    let Some(enemy) = state.enemy_mut(enemy_id) else {
        return false;
    };
    if !enemy.alive {
        return false;
    }
    let amount = amount.min(i32::MAX as u32) as i32;
    enemy.health = enemy.health.saturating_sub(amount);
    let (remaining, pos) = (enemy.health, enemy.pos);

    state.events.push(GameEvent::EnemyDamaged {
        id: enemy_id,
        remaining,
        pos,
    });
    state.events.sound(SoundCue::EnemyHit);

    if remaining <= 0 {
        destroy_enemy(state, enemy_id);
        return true;
    }
    false
}

/// Kill sequence: score, drop roll, removal. Runs at most once per enemy.
fn destroy_enemy(state: &mut GameState, enemy_id: u32) {
    let Some(enemy) = state.enemy_mut(enemy_id) else {
        return;
    };
    if !enemy.alive {
        return;
    }
    enemy.alive = false;
    let (kind, pos, value) = (enemy.kind(), enemy.pos, enemy.score_value());

    if state.player.attached_enemy == Some(enemy_id) {
        state.player.attached_enemy = None;
    }

    state.session.record_kill();
    state.score.register_kill(value, Some(pos));
    state.pump_score_events();
    state.events.push(GameEvent::EntityRemoved {
        id: enemy_id,
        kind: EntityKind::Enemy(kind),
        reason: RemovalReason::Destroyed,
        pos,
    });
    state.events.sound(SoundCue::EnemyDestroy);

    let drop_rate = state.settings.difficulty.item_drop_rate();
    if let Some(item) = roll_drop(&mut state.rng, drop_rate) {
        state.spawn_item(item, pos);
    }
}

/// Damage the player; returns false if refused (invincible, dead, zero)
pub fn damage_player(state: &mut GameState, amount: u32) -> bool {
    if amount == 0 || state.player.is_invincible() || !state.session.is_alive() {
        return false;
    }
    let health = state.session.take_damage(amount);
    state
        .player
        .invincibility
        .start(PLAYER_INVINCIBILITY_DURATION);
    state.score.register_damage_taken();
    state.events.push(GameEvent::PlayerDamaged {
        health,
        pos: state.player.pos,
    });
    state.events.sound(SoundCue::PlayerDamage);
    if health == 0 {
        state.events.sound(SoundCue::GameOver);
        log::info!("Player defeated, score {}", state.score.score());
    }
    true
}

/// Resolve an ofuda hit; None if either side was already gone or this
/// enemy was already struck by the same ofuda
pub fn ofuda_hit(state: &mut GameState, ofuda_id: u32, enemy_id: u32) -> Option<OfudaHit> {
    if !state.enemy(enemy_id).is_some_and(|e| e.alive) {
        return None;
    }
    let projectile = state.projectile_mut(ofuda_id).filter(|p| p.alive)?;
    let ProjectileKind::Ofuda {
        damage,
        can_pierce,
        pierce_count,
        hits,
    } = &mut projectile.kind
    else {
        return None;
    };
    if hits.contains(&enemy_id) {
        return None;
    }
    hits.push(enemy_id);

    let damage = *damage;
    let outcome = if *can_pierce && *pierce_count < OFUDA_MAX_PIERCE {
        *pierce_count += 1;
        OfudaHit::Pierced
    } else {
        OfudaHit::Spent
    };
    debug_assert!(*pierce_count <= OFUDA_MAX_PIERCE);

    damage_enemy(state, enemy_id, damage);
    if outcome == OfudaHit::Spent {
        state.remove_projectile(ofuda_id, RemovalReason::Destroyed);
    }
    Some(outcome)
}

/// Sweep an oharai swing over nearby enemies
///
/// Each enemy within reach is hit at most once per swing; attached
/// Rumuru are left alone (contact shakes them off instead).
/// Returns the ids struck by this call.
pub fn sweep_oharai(state: &mut GameState, oharai_id: u32) -> Vec<u32> {
    let Some(oharai) = state.projectile(oharai_id).filter(|p| p.alive) else {
        return Vec::new();
    };
    let ProjectileKind::Oharai { damage, hits } = &oharai.kind else {
        return Vec::new();
    };
    let (center, damage) = (oharai.pos, *damage);
    let reach = OHARAI_RANGE / 2.0;

    let targets: Vec<(u32, Vec2)> = state
        .enemies
        .iter()
        .filter(|e| e.alive && !e.is_attached() && !hits.contains(&e.id))
        .filter(|e| e.pos.distance(center) <= reach)
        .map(|e| (e.id, e.pos))
        .collect();

    if let Some(ProjectileKind::Oharai { hits, .. }) =
        state.projectile_mut(oharai_id).map(|p| &mut p.kind)
    {
        hits.extend(targets.iter().map(|(id, _)| *id));
    }

    for &(id, pos) in &targets {
        let killed = damage_enemy(state, id, damage);
        if !killed {
            let mut dir = direction_to(center, pos);
            if dir == Vec2::ZERO {
                dir = Vec2::Y;
            }
            if let Some(enemy) = state.enemy_mut(id) {
                enemy.apply_knockback(dir, OHARAI_KNOCKBACK);
            }
        }
    }
    targets.into_iter().map(|(id, _)| id).collect()
}

/// Latch a Rumuru onto the player; false if someone is already attached
pub fn attach_rumuru(state: &mut GameState, id: u32) -> bool {
    if state.player.attached_enemy.is_some() {
        return false;
    }
    let Some(enemy) = state.enemy_mut(id).filter(|e| e.alive) else {
        return false;
    };
    enemy.attach();
    if !enemy.is_attached() {
        return false;
    }
    state.player.attached_enemy = Some(id);
    state.events.push(GameEvent::RumuruAttached { id });
    true
}

/// Shake off an attached Rumuru
pub fn detach_rumuru(state: &mut GameState, id: u32) -> bool {
    let Some(enemy) = state.enemies.iter_mut().find(|e| e.id == id && e.alive) else {
        return false;
    };
    if !enemy.detach(&mut state.rng) {
        return false;
    }
    if state.player.attached_enemy == Some(id) {
        state.player.attached_enemy = None;
    }
    state.events.push(GameEvent::RumuruDetached { id });
    true
}

/// Keep attached Rumuru on the player and run their drain timers
pub fn update_attachments(state: &mut GameState, dt: f32) {
    let anchor = state.player.pos + Vec2::new(0.0, 20.0);
    let mut drained = Vec::new();
    for enemy in &mut state.enemies {
        if !enemy.alive || !enemy.is_attached() {
            continue;
        }
        enemy.pos = anchor;
        if enemy.tick_attachment(dt) {
            drained.push(enemy.id);
        }
    }
    for id in drained {
        damage_player(state, 1);
        let Some(enemy) = state.enemy_mut(id) else {
            continue;
        };
        enemy.alive = false;
        let (kind, pos) = (enemy.kind(), enemy.pos);
        if state.player.attached_enemy == Some(id) {
            state.player.attached_enemy = None;
        }
        state.events.push(GameEvent::EntityRemoved {
            id,
            kind: EntityKind::Enemy(kind),
            reason: RemovalReason::Consumed,
            pos,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::highscores::HighScores;
    use crate::sim::entity::{EnemyKind, ItemKind};
    use crate::sim::session::GamePhase;

    fn playing_state() -> GameState {
        let mut state = GameState::new(42, Settings::default(), HighScores::new());
        state.start_new_game();
        state.events.clear();
        state
    }

    fn spawn_ofuda(state: &mut GameState, can_pierce: bool) -> u32 {
        state.spawn_projectile(
            ProjectileKind::Ofuda {
                damage: 1,
                can_pierce,
                pierce_count: 0,
                hits: Vec::new(),
            },
            Vec2::new(500.0, 300.0),
            Vec2::new(0.0, 300.0),
            OFUDA_LIFETIME,
        )
    }

    #[test]
    fn test_enemy_dies_once() {
        let mut state = playing_state();
        let id = state.spawn_enemy(EnemyKind::BakeChouchin, Vec2::new(300.0, 300.0));
        assert!(!damage_enemy(&mut state, id, 1));
        assert!(damage_enemy(&mut state, id, 1));
        assert!(!damage_enemy(&mut state, id, 1));
        assert_eq!(state.score.score(), 150);
        assert_eq!(state.session.enemies_killed, 1);
        let removals = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::EntityRemoved { .. }))
            .count();
        assert_eq!(removals, 1);
    }

    #[test]
    fn test_zero_damage_is_noop() {
        let mut state = playing_state();
        let id = state.spawn_enemy(EnemyKind::Hitodama, Vec2::new(300.0, 300.0));
        assert!(!damage_enemy(&mut state, id, 0));
        assert_eq!(state.enemy(id).map(|e| e.health), Some(1));
        assert!(!damage_player(&mut state, 0));
        assert_eq!(state.session.health, 3);
    }

    #[test]
    fn test_player_invincibility_window() {
        let mut state = playing_state();
        assert!(damage_player(&mut state, 1));
        assert_eq!(state.session.health, 2);
        assert!(!damage_player(&mut state, 1));
        assert_eq!(state.session.health, 2);
        state.player.invincibility.clear();
        assert!(damage_player(&mut state, 1));
        state.player.invincibility.clear();
        assert!(damage_player(&mut state, 1));
        assert_eq!(state.session.health, 0);
        assert_eq!(state.session.phase, GamePhase::GameOver);
        state.player.invincibility.clear();
        assert!(!damage_player(&mut state, 1));
    }

    #[test]
    fn test_drop_rate_on_kill() {
        let mut state = playing_state();
        state.settings.difficulty = crate::Difficulty::Easy;
        let mut drops = 0;
        for i in 0..200 {
            let id = state.spawn_enemy(EnemyKind::Hitodama, Vec2::new(100.0 + i as f32, 300.0));
            let before = state.items.len();
            damage_enemy(&mut state, id, 1);
            drops += state.items.len() - before;
        }
        // Easy drops 40% of the time
        assert!((50..110).contains(&drops), "{drops}");
    }

    #[test]
    fn test_pierce_cap() {
        let mut state = playing_state();
        let ofuda = spawn_ofuda(&mut state, true);
        let ids: Vec<u32> = (0..4)
            .map(|i| {
                let pos = Vec2::new(100.0 * i as f32, 300.0);
                state.spawn_enemy(EnemyKind::Rokurokubi, pos)
            })
            .collect();
        for &id in &ids[..3] {
            assert_eq!(ofuda_hit(&mut state, ofuda, id), Some(OfudaHit::Pierced));
        }
        assert_eq!(ofuda_hit(&mut state, ofuda, ids[3]), Some(OfudaHit::Spent));
        assert!(!state.projectile(ofuda).is_some_and(|p| p.alive));
        match state.projectile(ofuda).map(|p| &p.kind) {
            Some(ProjectileKind::Ofuda { pierce_count, .. }) => assert_eq!(*pierce_count, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_plain_ofuda_spent_on_first_hit() {
        let mut state = playing_state();
        let ofuda = spawn_ofuda(&mut state, false);
        let a = state.spawn_enemy(EnemyKind::Rokurokubi, Vec2::new(100.0, 300.0));
        let b = state.spawn_enemy(EnemyKind::Rokurokubi, Vec2::new(200.0, 300.0));
        assert_eq!(ofuda_hit(&mut state, ofuda, a), Some(OfudaHit::Spent));
        assert_eq!(ofuda_hit(&mut state, ofuda, b), None);
        assert_eq!(state.enemy(b).map(|e| e.health), Some(3));
    }

    #[test]
    fn test_pierce_hits_each_enemy_once() {
        let mut state = playing_state();
        let ofuda = spawn_ofuda(&mut state, true);
        let id = state.spawn_enemy(EnemyKind::Rokurokubi, Vec2::new(100.0, 300.0));
        assert_eq!(ofuda_hit(&mut state, ofuda, id), Some(OfudaHit::Pierced));
        assert_eq!(ofuda_hit(&mut state, ofuda, id), None);
        assert_eq!(state.enemy(id).map(|e| e.health), Some(2));
    }

    #[test]
    fn test_oharai_hits_each_enemy_once_and_knocks_back() {
        let mut state = playing_state();
        let center = Vec2::new(400.0, 300.0);
        let near = state.spawn_enemy(EnemyKind::Rokurokubi, center + Vec2::new(20.0, 0.0));
        let far = state.spawn_enemy(EnemyKind::Rokurokubi, center + Vec2::new(200.0, 0.0));
        let swing = state.spawn_projectile(
            ProjectileKind::Oharai {
                damage: OHARAI_DAMAGE,
                hits: Vec::new(),
            },
            center,
            Vec2::ZERO,
            OHARAI_DURATION,
        );
        assert_eq!(sweep_oharai(&mut state, swing), vec![near]);
        assert!(sweep_oharai(&mut state, swing).is_empty());
        let enemy = state.enemy(near).unwrap();
        assert_eq!(enemy.health, 1);
        assert!(enemy.knockback.is_some_and(|k| k.vel.x > 0.0));
        assert_eq!(state.enemy(far).map(|e| e.health), Some(3));
    }

    #[test]
    fn test_rumuru_drain() {
        let mut state = playing_state();
        let id = state.spawn_enemy(EnemyKind::Rumuru, state.player.pos);
        assert!(attach_rumuru(&mut state, id));
        let other = state.spawn_enemy(EnemyKind::Rumuru, state.player.pos);
        assert!(!attach_rumuru(&mut state, other));

        update_attachments(&mut state, 2.0);
        assert_eq!(state.session.health, 3);
        update_attachments(&mut state, 1.1);
        assert_eq!(state.session.health, 2);
        assert!(!state.enemy(id).unwrap().alive);
        assert_eq!(state.player.attached_enemy, None);
        // Consumed, not killed: no points
        assert_eq!(state.score.score(), 0);
    }

    #[test]
    fn test_detach_frees_player() {
        let mut state = playing_state();
        let id = state.spawn_enemy(EnemyKind::Rumuru, state.player.pos);
        attach_rumuru(&mut state, id);
        assert!(detach_rumuru(&mut state, id));
        assert_eq!(state.player.attached_enemy, None);
        assert!(!detach_rumuru(&mut state, id));
    }

    #[test]
    fn test_killing_attached_rumuru_frees_player() {
        let mut state = playing_state();
        let id = state.spawn_enemy(EnemyKind::Rumuru, state.player.pos);
        attach_rumuru(&mut state, id);
        assert!(damage_enemy(&mut state, id, 1));
        assert_eq!(state.player.attached_enemy, None);
        assert_eq!(state.score.score(), 300);
    }

    #[test]
    fn test_item_kinds_in_drops() {
        let mut state = playing_state();
        state.settings.difficulty = crate::Difficulty::Easy;
        for i in 0..100 {
            let id = state.spawn_enemy(EnemyKind::Hitodama, Vec2::new(10.0 * i as f32, 300.0));
            damage_enemy(&mut state, id, 1);
        }
        let has_power = state
            .items
            .iter()
            .any(|i| matches!(i.kind, ItemKind::PowerUp(_)));
        assert!(has_power);
    }
}
