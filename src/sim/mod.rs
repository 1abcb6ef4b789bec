//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod combat;
pub mod effects;
pub mod entity;
pub mod events;
pub mod score;
pub mod session;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{CollisionEvent, ContactHandler, EntityRef, resolve_contacts};
pub use combat::{OfudaHit, damage_enemy, damage_player};
pub use effects::{EffectTimer, StatusEffects};
pub use entity::{
    BulletKind, Category, Direction, Enemy, EnemyKind, Item, ItemKind, Player, PowerType,
    Projectile, ProjectileKind,
};
pub use events::{EntityKind, EventQueue, GameEvent, RemovalReason, SoundCue};
pub use score::{Achievement, GameStatistics, ScoreEngine, ScoreReason};
pub use session::{GamePhase, PowerLevels, Session};
pub use snapshot::{EntityView, PlayerView, Snapshot};
pub use spawn::{SpawnDirector, SpawnEvent};
pub use state::GameState;
pub use tick::{
    TickInput, activate_crystal_ball, deactivate_crystal_ball, fire_ofuda, tick, use_oharai,
};
