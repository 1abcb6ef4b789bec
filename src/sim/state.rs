//! Game state and entity registry
//!
//! `GameState` owns every entity plus the services the tick drives
//! (session, spawn director, status effects, score engine). Nothing here is
//! global; a host builds one per run and passes it to [`tick`](super::tick).

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::effects::StatusEffects;
use super::entity::{
    BulletKind, Category, Enemy, EnemyKind, Item, ItemKind, Player, Projectile, ProjectileKind,
};
use super::events::{EntityKind, EventQueue, GameEvent, RemovalReason};
use super::score::ScoreEngine;
use super::session::{GamePhase, Session};
use super::spawn::{SpawnDirector, SpawnEvent};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::settings::Settings;

/// Complete game state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Seconds of simulated play (only advances while Playing)
    pub time: f64,
    pub settings: Settings,
    pub session: Session,
    pub player: Player,
    /// Active enemies (sorted by id for determinism)
    pub enemies: Vec<Enemy>,
    /// Active projectiles (sorted by id for determinism)
    pub projectiles: Vec<Projectile>,
    /// Active items (sorted by id for determinism)
    pub items: Vec<Item>,
    pub director: SpawnDirector,
    pub effects: StatusEffects,
    pub score: ScoreEngine,
    pub events: EventQueue,
    /// Phase at the end of the previous tick
    pub(crate) last_phase: GamePhase,
    game_end_recorded: bool,
    next_id: u32,
}

impl GameState {
    /// Create a game sitting at the menu
    pub fn new(seed: u64, settings: Settings, high_scores: HighScores) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            settings,
            session: Session::default(),
            player: Player::default(),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            items: Vec::new(),
            director: SpawnDirector::default(),
            effects: StatusEffects::default(),
            score: ScoreEngine::new(high_scores),
            events: EventQueue::default(),
            last_phase: GamePhase::Menu,
            game_end_recorded: false,
            next_id: 1,
        }
    }

    /// Reset everything except settings and high scores, and start playing
    pub fn start_new_game(&mut self) {
        self.time = 0.0;
        self.session.start_new_game();
        self.player = Player::default();
        self.enemies.clear();
        self.projectiles.clear();
        self.items.clear();
        self.effects.clear();
        self.score.reset_game();
        self.game_end_recorded = false;
        let wave = self.director.start();
        self.announce(wave);
        log::info!(
            "New game (seed {}, {})",
            self.seed,
            self.settings.difficulty.as_str()
        );
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Forward a director announcement to the event queue
    pub(crate) fn announce(&mut self, event: SpawnEvent) {
        if let SpawnEvent::WaveStarted { wave, enemies } = event {
            self.events.push(GameEvent::WaveStarted { wave, enemies });
        }
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let difficulty = self.settings.difficulty;
        let mut enemy = Enemy::new(
            id,
            kind,
            pos,
            difficulty.enemy_speed_multiplier(),
            difficulty.enemy_health_multiplier(),
        );
        enemy.stopped = self.effects.enemies_stopped();
        self.enemies.push(enemy);
        self.events.push(GameEvent::EntitySpawned {
            id,
            kind: EntityKind::Enemy(kind),
            pos,
        });
        log::debug!("Spawned {} #{} at {:?}", kind.as_str(), id, pos);
        id
    }

    pub fn spawn_item(&mut self, kind: ItemKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.items.push(Item::new(id, kind, pos));
        self.events.push(GameEvent::EntitySpawned {
            id,
            kind: EntityKind::Item(kind),
            pos,
        });
        id
    }

    pub fn spawn_projectile(
        &mut self,
        kind: ProjectileKind,
        pos: Vec2,
        vel: Vec2,
        lifetime: f32,
    ) -> u32 {
        let id = self.next_entity_id();
        let entity_kind = projectile_entity_kind(&kind);
        self.projectiles.push(Projectile {
            id,
            pos,
            vel,
            lifetime,
            alive: true,
            kind,
        });
        self.events.push(GameEvent::EntitySpawned {
            id,
            kind: entity_kind,
            pos,
        });
        id
    }

    pub fn spawn_enemy_bullet(&mut self, bullet: BulletKind, pos: Vec2, dir: Vec2) -> u32 {
        self.spawn_projectile(
            ProjectileKind::EnemyBullet(bullet),
            pos,
            dir.normalize_or_zero() * bullet.speed(),
            ENEMY_BULLET_LIFETIME,
        )
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_mut(&mut self, id: u32) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn projectile(&self, id: u32) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    pub fn projectile_mut(&mut self, id: u32) -> Option<&mut Projectile> {
        self.projectiles.iter_mut().find(|p| p.id == id)
    }

    pub fn item_mut(&mut self, id: u32) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }

    pub fn live_ofuda_count(&self) -> usize {
        self.projectiles
            .iter()
            .filter(|p| p.alive && p.category() == Category::Ofuda)
            .count()
    }

    /// Mark a projectile dead and report it (no-op if already dead)
    pub fn remove_projectile(&mut self, id: u32, reason: RemovalReason) -> bool {
        let Some(p) = self.projectile_mut(id) else {
            return false;
        };
        if !p.alive {
            return false;
        }
        p.alive = false;
        let (kind, pos) = (projectile_entity_kind(&p.kind), p.pos);
        self.events.push(GameEvent::EntityRemoved {
            id,
            kind,
            reason,
            pos,
        });
        true
    }

    /// Move buffered score events into the main queue, keeping order
    pub fn pump_score_events(&mut self) {
        let events = self.score.take_events();
        self.events.extend(events);
    }

    /// Drop dead entities from the registry
    pub fn prune_dead(&mut self) {
        self.enemies.retain(|e| e.alive);
        self.projectiles.retain(|p| p.alive);
        self.items.retain(|i| i.alive);
        if let Some(id) = self.player.attached_enemy {
            if !self.enemies.iter().any(|e| e.id == id) {
                self.player.attached_enemy = None;
            }
        }
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.projectiles.sort_by_key(|p| p.id);
        self.items.sort_by_key(|i| i.id);
    }

    /// Put the finished game on the leaderboard, once per game
    ///
    /// `date` is a unix timestamp in milliseconds.
    pub fn finish_game(&mut self, date: f64) -> Option<usize> {
        if self.session.phase != GamePhase::GameOver || self.game_end_recorded {
            return None;
        }
        self.game_end_recorded = true;
        let rank = self.score.register_game_end(
            &self.settings.player_name,
            self.session.stage,
            date,
        );
        self.pump_score_events();
        rank
    }

    pub fn high_scores(&self) -> &HighScores {
        self.score.high_scores()
    }
}

pub(crate) fn projectile_entity_kind(kind: &ProjectileKind) -> EntityKind {
    match kind {
        ProjectileKind::Ofuda { .. } => EntityKind::Ofuda,
        ProjectileKind::Oharai { .. } => EntityKind::Oharai,
        ProjectileKind::EnemyBullet(b) => EntityKind::EnemyBullet(*b),
    }
}
