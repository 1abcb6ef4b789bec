//! Read-only view of the simulation for presentation
//!
//! A renderer or HUD copies what it needs out of the state once per frame
//! and never touches the live registry.

use glam::Vec2;
use serde::Serialize;

use super::entity::{Direction, ProjectileKind};
use super::events::EntityKind;
use super::session::{GamePhase, PowerLevels};
use super::state::{GameState, projectile_entity_kind};

/// One drawable entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Frozen by a crystal ball, or attached to the player
    pub stopped: bool,
    /// Remaining health for enemies
    pub health: Option<i32>,
    /// Bullet tint
    pub color: Option<[f32; 4]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub facing: Direction,
    pub moving: bool,
    pub invincible: bool,
    pub attached_enemy: Option<u32>,
}

/// Everything a frame needs to draw the game and its HUD
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub time: f64,
    pub stage: u32,
    pub wave: u32,
    pub score: u64,
    pub high_score: u64,
    pub combo: u32,
    pub multiplier: u64,
    pub health: u8,
    pub max_health: u8,
    pub crystal_balls: u8,
    pub power: PowerLevels,
    /// Seconds of freeze left (0 when inactive)
    pub freeze_remaining: f32,
    pub player: PlayerView,
    pub enemies: Vec<EntityView>,
    pub projectiles: Vec<EntityView>,
    pub items: Vec<EntityView>,
}

impl Snapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl GameState {
    /// Copy out the presentation view of the current frame
    pub fn snapshot(&self) -> Snapshot {
        let enemies = self
            .enemies
            .iter()
            .filter(|e| e.alive)
            .map(|e| EntityView {
                id: e.id,
                kind: EntityKind::Enemy(e.kind()),
                pos: e.pos,
                radius: e.radius(),
                stopped: e.stopped || e.is_attached(),
                health: Some(e.health),
                color: None,
            })
            .collect();

        let projectiles = self
            .projectiles
            .iter()
            .filter(|p| p.alive)
            .map(|p| EntityView {
                id: p.id,
                kind: projectile_entity_kind(&p.kind),
                pos: p.pos,
                radius: p.radius(),
                stopped: false,
                health: None,
                color: match p.kind {
                    ProjectileKind::EnemyBullet(bullet) => Some(bullet.color()),
                    _ => None,
                },
            })
            .collect();

        let items = self
            .items
            .iter()
            .filter(|i| i.alive)
            .map(|i| EntityView {
                id: i.id,
                kind: EntityKind::Item(i.kind),
                pos: i.pos,
                radius: i.kind.radius(),
                stopped: false,
                health: None,
                color: None,
            })
            .collect();

        Snapshot {
            phase: self.session.phase,
            time: self.time,
            stage: self.session.stage,
            wave: self.director.wave(),
            score: self.score.score(),
            high_score: self
                .high_scores()
                .top_score()
                .unwrap_or(0)
                .max(self.score.score()),
            combo: self.score.combo(),
            multiplier: self.score.multiplier(),
            health: self.session.health,
            max_health: self.session.max_health,
            crystal_balls: self.session.crystal_balls,
            power: self.session.power,
            freeze_remaining: self.effects.crystal_ball_remaining(),
            player: PlayerView {
                pos: self.player.pos,
                facing: self.player.facing,
                moving: self.player.moving,
                invincible: self.player.is_invincible(),
                attached_enemy: self.player.attached_enemy,
            },
            enemies,
            projectiles,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::highscores::HighScores;
    use crate::sim::entity::{BulletKind, EnemyKind, ItemKind};

    #[test]
    fn test_snapshot_lists_live_entities() {
        let mut state = GameState::new(3, Settings::default(), HighScores::new());
        state.start_new_game();
        let enemy = state.spawn_enemy(EnemyKind::BakeChouchin, Vec2::new(300.0, 500.0));
        state.spawn_enemy_bullet(BulletKind::Energy, Vec2::new(300.0, 480.0), Vec2::NEG_Y);
        let coin = state.spawn_item(ItemKind::Coin, Vec2::new(700.0, 300.0));
        if let Some(i) = state.item_mut(coin) {
            i.alive = false;
        }

        let snap = state.snapshot();
        assert_eq!(snap.phase, GamePhase::Playing);
        assert_eq!(snap.wave, 1);
        assert_eq!(snap.health, 3);
        assert_eq!(snap.enemies.len(), 1);
        assert_eq!(snap.enemies[0].id, enemy);
        assert_eq!(snap.enemies[0].health, Some(2));
        assert_eq!(snap.projectiles[0].color, Some(BulletKind::Energy.color()));
        assert!(snap.items.is_empty());
    }

    #[test]
    fn test_stopped_marks_frozen_enemies_only() {
        let mut state = GameState::new(3, Settings::default(), HighScores::new());
        state.start_new_game();
        state.spawn_enemy(EnemyKind::Hitodama, Vec2::new(300.0, 500.0));
        state.spawn_item(ItemKind::Coin, Vec2::new(700.0, 300.0));

        let snap = state.snapshot();
        assert!(!snap.enemies[0].stopped);
        assert!(!snap.items[0].stopped);

        assert!(crate::sim::activate_crystal_ball(&mut state));
        let snap = state.snapshot();
        assert!(snap.enemies[0].stopped);
        assert!(!snap.items[0].stopped);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = GameState::new(3, Settings::default(), HighScores::new());
        state.start_new_game();
        let json = state.snapshot().to_json().unwrap();
        assert!(json.contains("\"phase\":\"Playing\""));
        assert!(json.contains("\"crystal_balls\":2"));
    }
}
