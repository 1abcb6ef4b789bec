//! Kiki Kaikai - A top-down shrine maiden arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, combat, collisions, spawning, scoring)
//! - `platform`: Keyboard state to tick input mapping
//! - `persistence`: Versioned JSON save files with backup rotation
//! - `settings`: Difficulty and preferences
//! - `highscores`: Top 10 leaderboard

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use highscores::{HighScoreRecord, HighScores};
pub use settings::{Difficulty, Settings};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Screen dimensions (y-up, origin bottom-left)
    pub const SCREEN_WIDTH: f32 = 1024.0;
    pub const SCREEN_HEIGHT: f32 = 768.0;

    /// Player defaults
    pub const PLAYER_SPEED: f32 = 200.0;
    pub const PLAYER_RADIUS: f32 = 16.0;
    pub const PLAYER_MAX_HEALTH: u8 = 3;
    pub const PLAYER_ACCELERATION: f32 = 800.0;
    pub const PLAYER_DECELERATION: f32 = 600.0;
    pub const PLAYER_INVINCIBILITY_DURATION: f32 = 2.0;
    /// Spawn point, a quarter of the way up the screen
    pub const PLAYER_START_X: f32 = SCREEN_WIDTH / 2.0;
    pub const PLAYER_START_Y: f32 = SCREEN_HEIGHT / 4.0;

    /// Player resources
    pub const STARTING_CRYSTAL_BALLS: u8 = 2;
    pub const MAX_CRYSTAL_BALLS: u8 = 3;
    pub const MAX_POWER_LEVEL: u8 = 3;

    /// Ofuda (ranged talisman)
    pub const OFUDA_BASE_SPEED: f32 = 300.0;
    pub const OFUDA_SPEED_PER_LEVEL: f32 = 100.0;
    pub const OFUDA_MAX_COUNT: usize = 4;
    pub const OFUDA_COOLDOWN: f32 = 0.15;
    pub const OFUDA_LIFETIME: f32 = 2.0;
    pub const OFUDA_RADIUS: f32 = 10.0;
    pub const OFUDA_MAX_PIERCE: u8 = 3;
    /// Pierce power level at which ofuda start piercing
    pub const OFUDA_PIERCE_THRESHOLD: u8 = 2;

    /// Oharai (melee purification swing)
    pub const OHARAI_RANGE: f32 = 48.0;
    pub const OHARAI_DURATION: f32 = 0.3;
    pub const OHARAI_COOLDOWN: f32 = 0.5;
    pub const OHARAI_DAMAGE: u32 = 2;
    pub const OHARAI_KNOCKBACK: f32 = 30.0;

    /// Knockback applied to an enemy touching the player
    pub const CONTACT_KNOCKBACK: f32 = 20.0;
    pub const KNOCKBACK_DURATION: f32 = 0.2;

    /// Crystal ball freeze
    pub const CRYSTAL_BALL_DURATION: f32 = 6.0;
    pub const CRYSTAL_BALL_WARNING: f32 = 3.0;

    /// Enemies
    pub const ENEMY_BASE_SPEED: f32 = 80.0;
    pub const ENEMY_SPAWN_INTERVAL: f32 = 2.0;
    pub const MIN_SPAWN_INTERVAL: f32 = 0.5;
    pub const MAX_ENEMIES_ON_SCREEN: usize = 15;
    pub const OFFSCREEN_MARGIN: f32 = 50.0;
    pub const ENEMY_BULLET_LIFETIME: f32 = 5.0;
    pub const RUMURU_ATTACH_DISTANCE: f32 = 30.0;
    pub const RUMURU_ATTACH_DURATION: f32 = 3.0;
    /// Rumuru stays detached this long after being shaken off
    pub const RUMURU_REATTACH_DELAY: f32 = 1.0;

    /// Items
    pub const ITEM_LIFETIME: f32 = 10.0;
    pub const ITEM_SPAWN_INTERVAL: f32 = 5.0;
    pub const ITEM_SPAWN_MARGIN: f32 = 50.0;
    pub const ITEM_RADIUS: f32 = 12.0;

    /// Scoring
    pub const COMBO_WINDOW: f64 = 3.0;

    /// Stage progression
    pub const MAX_STAGES: u32 = 5;
    pub const WAVES_PER_STAGE: u32 = 3;
}

/// Axis-aligned rectangle (origin at bottom-left corner)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// The full playfield
    pub const fn screen() -> Self {
        Self::new(0.0, 0.0, consts::SCREEN_WIDTH, consts::SCREEN_HEIGHT)
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Shrink (positive margin) or grow (negative margin) on every side
    pub fn inset(&self, margin: f32) -> Self {
        Self {
            min: self.min + Vec2::splat(margin),
            size: (self.size - Vec2::splat(margin * 2.0)).max(Vec2::ZERO),
        }
    }

    /// Inclusive containment test
    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.min.x && p.x <= max.x && p.y >= self.min.y && p.y <= max.y
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max())
    }
}

/// Normalized angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU { 0.0 } else { a }
}

/// Angle of a vector, normalized to [0, 2π)
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    normalize_angle(v.y.atan2(v.x))
}

/// Unit vector pointing from `from` toward `to` (zero if they coincide)
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Whether a point is inside the screen grown by `margin` on every side
#[inline]
pub fn is_within_screen(pos: Vec2, margin: f32) -> bool {
    Rect::screen().inset(-margin).contains(pos)
}

/// Uniformly random point inside a rectangle
pub fn random_point_in_rect<R: Rng + ?Sized>(rng: &mut R, rect: &Rect) -> Vec2 {
    let max = rect.max();
    let x = if rect.size.x > 0.0 {
        rng.random_range(rect.min.x..max.x)
    } else {
        rect.min.x
    };
    let y = if rect.size.y > 0.0 {
        rng.random_range(rect.min.y..max.y)
    } else {
        rect.min.y
    };
    Vec2::new(x, y)
}
