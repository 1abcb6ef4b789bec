//! Category-based contact detection and dispatch
//!
//! Bodies are circles. Each frame, after movement, every overlapping pair
//! whose categories appear in [`CONTACT_TABLE`] becomes a [`CollisionEvent`],
//! and the events are then resolved in the order they were found.

use glam::Vec2;

use super::combat;
use super::entity::{Category, EnemyKind};
use super::events::{GameEvent, RemovalReason, SoundCue};
use super::state::GameState;
use crate::Rect;
use crate::consts::*;
use crate::direction_to;

/// Reference to a body in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Player,
    Enemy(u32),
    Projectile(u32),
    Item(u32),
    Boundary,
}

/// What to do when two categories touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactHandler {
    PlayerEnemy,
    PlayerEnemyBullet,
    PlayerItem,
    OfudaEnemy,
    OharaiEnemy,
    ProjectileBoundary,
    EnemyBoundary,
}

/// Unordered category pairs and their handlers
pub const CONTACT_TABLE: [(Category, Category, ContactHandler); 8] = [
    (
        Category::Player,
        Category::Enemy,
        ContactHandler::PlayerEnemy,
    ),
    (
        Category::Player,
        Category::EnemyBullet,
        ContactHandler::PlayerEnemyBullet,
    ),
    (Category::Player, Category::Item, ContactHandler::PlayerItem),
    (Category::Ofuda, Category::Enemy, ContactHandler::OfudaEnemy),
    (
        Category::Oharai,
        Category::Enemy,
        ContactHandler::OharaiEnemy,
    ),
    (
        Category::Ofuda,
        Category::Boundary,
        ContactHandler::ProjectileBoundary,
    ),
    (
        Category::EnemyBullet,
        Category::Boundary,
        ContactHandler::ProjectileBoundary,
    ),
    (
        Category::Enemy,
        Category::Boundary,
        ContactHandler::EnemyBoundary,
    ),
];

/// Find the handler for a pair in either order
///
/// The flag is true when `(a, b)` is reversed relative to the table.
pub fn lookup(a: Category, b: Category) -> Option<(ContactHandler, bool)> {
    CONTACT_TABLE.iter().find_map(|&(x, y, handler)| {
        if (x, y) == (a, b) {
            Some((handler, false))
        } else if (x, y) == (b, a) {
            Some((handler, true))
        } else {
            None
        }
    })
}

/// A detected contact, with `a` and `b` in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub handler: ContactHandler,
    pub a: EntityRef,
    pub b: EntityRef,
}

#[derive(Debug, Clone, Copy)]
struct Body {
    entity: EntityRef,
    category: Category,
    pos: Vec2,
    vel: Vec2,
    radius: f32,
    /// Boundary contacts only apply once an enemy has entered the field
    bounded: bool,
}

#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

/// Reflect velocity off a surface with the given normal
pub fn reflect_velocity(vel: Vec2, normal: Vec2) -> Vec2 {
    vel - 2.0 * vel.dot(normal) * normal
}

/// Inward normals of the screen edges a body is pressing against
fn violated_edges(pos: Vec2, vel: Vec2, radius: f32) -> Vec<Vec2> {
    let bounds = Rect::screen().inset(radius);
    let max = bounds.max();
    let mut normals = Vec::new();
    if pos.x <= bounds.min.x && vel.x < 0.0 {
        normals.push(Vec2::X);
    }
    if pos.x >= max.x && vel.x > 0.0 {
        normals.push(Vec2::NEG_X);
    }
    if pos.y <= bounds.min.y && vel.y < 0.0 {
        normals.push(Vec2::Y);
    }
    if pos.y >= max.y && vel.y > 0.0 {
        normals.push(Vec2::NEG_Y);
    }
    normals
}

fn collect_bodies(state: &GameState) -> Vec<Body> {
    let mut bodies = Vec::with_capacity(
        1 + state.enemies.len() + state.projectiles.len() + state.items.len(),
    );
    if state.session.is_alive() {
        bodies.push(Body {
            entity: EntityRef::Player,
            category: Category::Player,
            pos: state.player.pos,
            vel: state.player.vel,
            radius: state.player.radius,
            bounded: false,
        });
    }
    for e in state.enemies.iter().filter(|e| e.alive) {
        bodies.push(Body {
            entity: EntityRef::Enemy(e.id),
            category: Category::Enemy,
            pos: e.pos,
            vel: e.vel,
            radius: e.radius(),
            // Shoot-and-run lanterns are meant to leave
            bounded: e.entered_screen && e.kind() != EnemyKind::BakeChouchin && !e.is_attached(),
        });
    }
    for p in state.projectiles.iter().filter(|p| p.alive) {
        bodies.push(Body {
            entity: EntityRef::Projectile(p.id),
            category: p.category(),
            pos: p.pos,
            vel: p.vel,
            radius: p.radius(),
            bounded: p.category().is_projectile(),
        });
    }
    for i in state.items.iter().filter(|i| i.alive) {
        bodies.push(Body {
            entity: EntityRef::Item(i.id),
            category: Category::Item,
            pos: i.pos,
            vel: Vec2::ZERO,
            radius: i.kind.radius(),
            bounded: false,
        });
    }
    bodies
}

/// Find every contact this frame, in deterministic order
pub fn detect_contacts(state: &GameState) -> Vec<CollisionEvent> {
    let bodies = collect_bodies(state);
    let mut contacts = Vec::new();

    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            let Some((handler, swapped)) = lookup(a.category, b.category) else {
                continue;
            };
            if !circles_overlap(a.pos, a.radius, b.pos, b.radius) {
                continue;
            }
            let (first, second) = if swapped { (b, a) } else { (a, b) };
            contacts.push(CollisionEvent {
                handler,
                a: first.entity,
                b: second.entity,
            });
        }
    }

    let field = Rect::screen();
    for body in bodies.iter().filter(|b| b.bounded) {
        let Some((handler, _)) = lookup(body.category, Category::Boundary) else {
            continue;
        };
        let touching = match handler {
            ContactHandler::ProjectileBoundary => !field.contains(body.pos),
            ContactHandler::EnemyBoundary => {
                !violated_edges(body.pos, body.vel, body.radius).is_empty()
            }
            _ => false,
        };
        if touching {
            contacts.push(CollisionEvent {
                handler,
                a: body.entity,
                b: EntityRef::Boundary,
            });
        }
    }

    contacts
}

/// Detect and resolve all contacts for this frame
pub fn resolve_contacts(state: &mut GameState) -> Vec<CollisionEvent> {
    let contacts = detect_contacts(state);
    for contact in &contacts {
        dispatch(state, contact);
    }
    contacts
}

fn dispatch(state: &mut GameState, contact: &CollisionEvent) {
    use ContactHandler::*;

    match (contact.handler, contact.a, contact.b) {
        (PlayerEnemy, _, EntityRef::Enemy(id)) => player_touches_enemy(state, id),
        (PlayerEnemyBullet, _, EntityRef::Projectile(id)) => {
            if state.projectile(id).is_some_and(|p| p.alive) {
                combat::damage_player(state, 1);
                state.remove_projectile(id, RemovalReason::Destroyed);
            }
        }
        (PlayerItem, _, EntityRef::Item(id)) => collect_item(state, id),
        (OfudaEnemy, EntityRef::Projectile(p), EntityRef::Enemy(e)) => {
            combat::ofuda_hit(state, p, e);
        }
        (OharaiEnemy, _, EntityRef::Enemy(id)) => {
            if state.enemy(id).is_some_and(|e| e.alive && e.is_attached()) {
                combat::detach_rumuru(state, id);
            }
        }
        (ProjectileBoundary, EntityRef::Projectile(id), _) => {
            state.remove_projectile(id, RemovalReason::OffScreen);
        }
        (EnemyBoundary, EntityRef::Enemy(id), _) => {
            if let Some(enemy) = state.enemy_mut(id).filter(|e| e.alive) {
                for normal in violated_edges(enemy.pos, enemy.vel, enemy.radius()) {
                    enemy.vel = reflect_velocity(enemy.vel, normal);
                }
            }
        }
        // Anything else is not a meaningful pairing
        _ => {}
    }
}

fn player_touches_enemy(state: &mut GameState, enemy_id: u32) {
    let Some(enemy) = state.enemy(enemy_id).filter(|e| e.alive) else {
        return;
    };
    // Already clinging: the drain timer handles it
    if enemy.is_attached() {
        return;
    }
    let (kind, pos) = (enemy.kind(), enemy.pos);

    combat::damage_player(state, 1);

    if kind == EnemyKind::Rumuru && combat::attach_rumuru(state, enemy_id) {
        return;
    }
    let mut dir = direction_to(state.player.pos, pos);
    if dir == Vec2::ZERO {
        dir = Vec2::Y;
    }
    if let Some(enemy) = state.enemy_mut(enemy_id) {
        enemy.apply_knockback(dir, CONTACT_KNOCKBACK);
    }
}

fn collect_item(state: &mut GameState, item_id: u32) {
    let Some(item) = state.item_mut(item_id).filter(|i| i.alive) else {
        return;
    };
    item.alive = false;
    let (kind, pos) = (item.kind, item.pos);

    state.session.collect_item(kind);
    state.score.register_item(kind, Some(pos));
    state.pump_score_events();
    state.events.push(GameEvent::ItemCollected { kind, pos });
    state.events.push(GameEvent::EntityRemoved {
        id: item_id,
        kind: super::events::EntityKind::Item(kind),
        reason: RemovalReason::Collected,
        pos,
    });
    let cue = match kind {
        super::entity::ItemKind::PowerUp(_) => SoundCue::PowerUp,
        _ => SoundCue::ItemGet,
    };
    state.events.sound(cue);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::highscores::HighScores;
    use crate::sim::entity::{BulletKind, ItemKind, PowerType, ProjectileKind};

    fn playing_state() -> GameState {
        let mut state = GameState::new(7, Settings::default(), HighScores::new());
        state.start_new_game();
        state.events.clear();
        state
    }

    #[test]
    fn test_reflect_velocity() {
        let vel = Vec2::new(1.0, -1.0);
        let normal = Vec2::new(0.0, 1.0);
        let reflected = reflect_velocity(vel, normal);
        assert!((reflected - Vec2::new(1.0, 1.0)).length() < 0.001);
    }

    #[test]
    fn test_lookup_is_unordered() {
        assert_eq!(
            lookup(Category::Player, Category::Enemy),
            Some((ContactHandler::PlayerEnemy, false))
        );
        assert_eq!(
            lookup(Category::Enemy, Category::Player),
            Some((ContactHandler::PlayerEnemy, true))
        );
        assert_eq!(lookup(Category::Enemy, Category::Enemy), None);
        assert_eq!(lookup(Category::Item, Category::Ofuda), None);
    }

    #[test]
    fn test_enemy_bullet_hurts_once_and_vanishes() {
        let mut state = playing_state();
        let pos = state.player.pos;
        let a = state.spawn_enemy_bullet(BulletKind::Fireball, pos, Vec2::NEG_Y);
        let b = state.spawn_enemy_bullet(BulletKind::Shard, pos, Vec2::NEG_Y);
        let contacts = resolve_contacts(&mut state);
        assert_eq!(contacts.len(), 2);
        assert_eq!(state.session.health, 2);
        // Second bullet is destroyed even though the player is invincible
        assert!(!state.projectile(a).unwrap().alive);
        assert!(!state.projectile(b).unwrap().alive);
    }

    #[test]
    fn test_player_enemy_contact_knocks_back() {
        let mut state = playing_state();
        let pos = state.player.pos + Vec2::new(10.0, 0.0);
        let id = state.spawn_enemy(EnemyKind::Hitodama, pos);
        resolve_contacts(&mut state);
        assert_eq!(state.session.health, 2);
        let enemy = state.enemy(id).unwrap();
        assert!(enemy.knockback.is_some_and(|k| k.vel.x > 0.0));
    }

    #[test]
    fn test_rumuru_contact_attaches() {
        let mut state = playing_state();
        let id = state.spawn_enemy(EnemyKind::Rumuru, state.player.pos);
        resolve_contacts(&mut state);
        assert_eq!(state.player.attached_enemy, Some(id));
        // Attached: no further contact damage
        state.player.invincibility.clear();
        resolve_contacts(&mut state);
        assert_eq!(state.session.health, 2);
    }

    #[test]
    fn test_item_pickup() {
        let mut state = playing_state();
        let id = state.spawn_item(ItemKind::PowerUp(PowerType::Pierce), state.player.pos);
        resolve_contacts(&mut state);
        assert!(!state.items.iter().any(|i| i.id == id && i.alive));
        assert_eq!(state.session.power.pierce, 1);
        assert_eq!(state.score.score(), 300);
        assert!(
            state
                .events
                .iter()
                .any(|e| *e == GameEvent::PlaySound(SoundCue::PowerUp))
        );
        resolve_contacts(&mut state);
        assert_eq!(state.score.score(), 300);
    }

    #[test]
    fn test_ofuda_contact_damages() {
        let mut state = playing_state();
        let enemy = state.spawn_enemy(EnemyKind::Hitodama, Vec2::new(500.0, 600.0));
        state.spawn_projectile(
            ProjectileKind::Ofuda {
                damage: 1,
                can_pierce: false,
                pierce_count: 0,
                hits: Vec::new(),
            },
            Vec2::new(505.0, 600.0),
            Vec2::new(0.0, 300.0),
            OFUDA_LIFETIME,
        );
        resolve_contacts(&mut state);
        assert!(!state.enemy(enemy).unwrap().alive);
        assert_eq!(state.score.score(), 100);
    }

    #[test]
    fn test_oharai_shakes_off_rumuru() {
        let mut state = playing_state();
        let id = state.spawn_enemy(EnemyKind::Rumuru, state.player.pos);
        combat::attach_rumuru(&mut state, id);
        combat::update_attachments(&mut state, 0.0);
        state.spawn_projectile(
            ProjectileKind::Oharai {
                damage: OHARAI_DAMAGE,
                hits: Vec::new(),
            },
            state.player.pos,
            Vec2::ZERO,
            OHARAI_DURATION,
        );
        resolve_contacts(&mut state);
        assert_eq!(state.player.attached_enemy, None);
        assert!(state.enemy(id).is_some_and(|e| e.alive && !e.is_attached()));
    }

    #[test]
    fn test_projectiles_leaving_field_are_removed() {
        let mut state = playing_state();
        let id = state.spawn_enemy_bullet(BulletKind::Energy, Vec2::new(500.0, -5.0), Vec2::NEG_Y);
        resolve_contacts(&mut state);
        assert!(!state.projectile(id).unwrap().alive);
    }

    #[test]
    fn test_enemy_bounces_off_edge() {
        let mut state = playing_state();
        let id = state.spawn_enemy(EnemyKind::Rokurokubi, Vec2::new(10.0, 400.0));
        if let Some(enemy) = state.enemy_mut(id) {
            enemy.entered_screen = true;
            enemy.vel = Vec2::new(-160.0, 20.0);
        }
        resolve_contacts(&mut state);
        assert_eq!(state.enemy(id).unwrap().vel, Vec2::new(160.0, 20.0));
    }

    #[test]
    fn test_fresh_spawns_ignore_edges() {
        let mut state = playing_state();
        let id = state.spawn_enemy(EnemyKind::Hitodama, Vec2::new(-50.0, 400.0));
        if let Some(enemy) = state.enemy_mut(id) {
            enemy.vel = Vec2::new(-10.0, 0.0);
        }
        assert!(detect_contacts(&state).is_empty());
    }
}
