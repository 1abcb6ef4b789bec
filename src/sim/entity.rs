//! Entity records: player, enemies, projectiles and items
//!
//! Every entity carries an id, a position, an optional velocity and an
//! `alive` flag. The registry in [`GameState`](super::GameState) owns them all.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::effects::EffectTimer;
use crate::consts::*;
use crate::{Rect, angle_of, direction_to, is_within_screen};

/// Contact category used to route collisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Player,
    Enemy,
    Ofuda,
    EnemyBullet,
    Item,
    Oharai,
    Boundary,
}

impl Category {
    /// Contact mask bit
    pub const fn bits(self) -> u32 {
        match self {
            Category::Player => 1 << 0,
            Category::Enemy => 1 << 1,
            Category::Ofuda => 1 << 2,
            Category::EnemyBullet => 1 << 3,
            Category::Item => 1 << 4,
            Category::Oharai => 1 << 5,
            Category::Boundary => 1 << 6,
        }
    }

    pub fn is_projectile(self) -> bool {
        matches!(
            self,
            Category::Ofuda | Category::Oharai | Category::EnemyBullet
        )
    }
}

/// Eight-way facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Right,
    UpRight,
    #[default]
    Up,
    UpLeft,
    Left,
    DownLeft,
    Down,
    DownRight,
}

impl Direction {
    /// Counter-clockwise from +x
    pub const ALL: [Direction; 8] = [
        Direction::Right,
        Direction::UpRight,
        Direction::Up,
        Direction::UpLeft,
        Direction::Left,
        Direction::DownLeft,
        Direction::Down,
        Direction::DownRight,
    ];

    /// Unit vector for this direction
    pub fn vector(self) -> Vec2 {
        const D: f32 = std::f32::consts::FRAC_1_SQRT_2;
        match self {
            Direction::Right => Vec2::new(1.0, 0.0),
            Direction::UpRight => Vec2::new(D, D),
            Direction::Up => Vec2::new(0.0, 1.0),
            Direction::UpLeft => Vec2::new(-D, D),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::DownLeft => Vec2::new(-D, -D),
            Direction::Down => Vec2::new(0.0, -1.0),
            Direction::DownRight => Vec2::new(D, -D),
        }
    }

    /// Snap a vector to the nearest of the eight directions
    pub fn from_vector(v: Vec2) -> Option<Direction> {
        if v.length_squared() < f32::EPSILON {
            return None;
        }
        let sector = std::f32::consts::FRAC_PI_4;
        let index = ((angle_of(v) + sector / 2.0) / sector).floor() as usize % 8;
        Some(Self::ALL[index])
    }
}

/// The shrine maiden
///
/// Resources (health, crystal balls, power) live on the
/// [`Session`](super::Session); this is the kinematic side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub target_vel: Vec2,
    pub facing: Direction,
    pub moving: bool,
    pub radius: f32,
    pub invincibility: EffectTimer,
    /// Sim time of the last shot / swing
    pub last_ofuda_at: Option<f64>,
    pub last_oharai_at: Option<f64>,
    /// Rumuru currently clinging to the player
    pub attached_enemy: Option<u32>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_START_X, PLAYER_START_Y),
            vel: Vec2::ZERO,
            target_vel: Vec2::ZERO,
            facing: Direction::Up,
            moving: false,
            radius: PLAYER_RADIUS,
            invincibility: EffectTimer::default(),
            last_ofuda_at: None,
            last_oharai_at: None,
            attached_enemy: None,
        }
    }
}

impl Player {
    /// Set desired movement from input (magnitude 0 or 1)
    pub fn set_movement(&mut self, dir: Vec2) {
        let dir = dir.normalize_or_zero();
        self.moving = dir != Vec2::ZERO;
        self.target_vel = dir * PLAYER_SPEED;
        if let Some(facing) = Direction::from_vector(dir) {
            self.facing = facing;
        }
    }

    /// Ease velocity toward the target and integrate position
    pub fn update(&mut self, dt: f32) {
        let rate = if self.moving {
            PLAYER_ACCELERATION / PLAYER_SPEED
        } else {
            PLAYER_DECELERATION / PLAYER_SPEED
        };
        let blend = 1.0 - (-rate * dt).exp();
        self.vel += (self.target_vel - self.vel) * blend;
        if !self.moving && self.vel.length_squared() < 1.0 {
            self.vel = Vec2::ZERO;
        }

        let bounds = Rect::screen().inset(self.radius);
        let next = self.pos + self.vel * dt;
        self.pos = bounds.clamp(next);
        // Stop pushing into a wall
        if self.pos.x != next.x {
            self.vel.x = 0.0;
        }
        if self.pos.y != next.y {
            self.vel.y = 0.0;
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility.is_active()
    }

    /// Facing while moving, straight up while standing
    pub fn shot_direction(&self) -> Vec2 {
        if self.moving {
            self.facing.vector()
        } else {
            Vec2::Y
        }
    }

    pub fn ofuda_ready(&self, now: f64) -> bool {
        self.last_ofuda_at
            .is_none_or(|t| now - t >= OFUDA_COOLDOWN as f64)
    }

    pub fn oharai_ready(&self, now: f64) -> bool {
        self.last_oharai_at
            .is_none_or(|t| now - t >= OHARAI_COOLDOWN as f64)
    }
}

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Will-o'-wisp: chases and fires aimed fireballs
    Hitodama,
    /// Paper lantern: one shot downward, then flees
    BakeChouchin,
    /// Long neck: winds up and charges
    Rokurokubi,
    /// Clinger: attaches to the player and drains health
    Rumuru,
}

impl EnemyKind {
    pub fn max_health(self) -> i32 {
        match self {
            EnemyKind::Hitodama => 1,
            EnemyKind::BakeChouchin => 2,
            EnemyKind::Rokurokubi => 3,
            EnemyKind::Rumuru => 1,
        }
    }

    pub fn score_value(self) -> u64 {
        match self {
            EnemyKind::Hitodama => 100,
            EnemyKind::BakeChouchin => 150,
            EnemyKind::Rokurokubi => 200,
            EnemyKind::Rumuru => 300,
        }
    }

    /// Seconds between attacks
    pub fn attack_cooldown(self) -> f32 {
        match self {
            EnemyKind::Hitodama => 3.0,
            EnemyKind::BakeChouchin => 2.5,
            EnemyKind::Rokurokubi => 4.0,
            EnemyKind::Rumuru => 1.5,
        }
    }

    pub fn radius(self) -> f32 {
        match self {
            EnemyKind::Hitodama => 12.0,
            EnemyKind::BakeChouchin => 16.0,
            EnemyKind::Rokurokubi => 16.0,
            EnemyKind::Rumuru => 10.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnemyKind::Hitodama => "hitodama",
            EnemyKind::BakeChouchin => "bake_chouchin",
            EnemyKind::Rokurokubi => "rokurokubi",
            EnemyKind::Rumuru => "rumuru",
        }
    }
}

/// Rokurokubi charge cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChargePhase {
    /// Pick a target on the next update
    Ready,
    /// Locked on, about to lunge
    Windup { dir: Vec2, remaining: f32 },
    Charging { remaining: f32 },
}

pub const ROKUROKUBI_WINDUP: f32 = 0.4;
pub const ROKUROKUBI_CHARGE_TIME: f32 = 2.0;

/// Per-type behavior state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyVariant {
    Hitodama,
    BakeChouchin {
        has_shot: bool,
    },
    Rokurokubi {
        charge: ChargePhase,
    },
    Rumuru {
        /// Seconds left before draining the player, while attached
        attached: Option<f32>,
        /// Seconds left of post-detach flight
        flee: f32,
    },
}

impl EnemyVariant {
    pub fn new(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Hitodama => EnemyVariant::Hitodama,
            EnemyKind::BakeChouchin => EnemyVariant::BakeChouchin { has_shot: false },
            EnemyKind::Rokurokubi => EnemyVariant::Rokurokubi {
                charge: ChargePhase::Ready,
            },
            EnemyKind::Rumuru => EnemyVariant::Rumuru {
                attached: None,
                flee: 0.0,
            },
        }
    }

    pub fn kind(&self) -> EnemyKind {
        match self {
            EnemyVariant::Hitodama => EnemyKind::Hitodama,
            EnemyVariant::BakeChouchin { .. } => EnemyKind::BakeChouchin,
            EnemyVariant::Rokurokubi { .. } => EnemyKind::Rokurokubi,
            EnemyVariant::Rumuru { .. } => EnemyKind::Rumuru,
        }
    }
}

/// Kinematic push consumed over a short duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    pub vel: Vec2,
    pub remaining: f32,
}

impl Knockback {
    /// Displace `distance` units along `dir` over `duration` seconds
    pub fn new(dir: Vec2, distance: f32, duration: f32) -> Self {
        Self {
            vel: dir.normalize_or_zero() * (distance / duration),
            remaining: duration,
        }
    }
}

/// Something an enemy wants done after its update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyAction {
    Fire { dir: Vec2, bullet: BulletKind },
    /// Rumuru reached the player
    Attach,
    /// Drifted past the off-screen margin
    LeftScreen,
}

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: i32,
    /// Difficulty speed multiplier
    pub speed_scale: f32,
    /// Seconds until the next attack is allowed
    pub attack_timer: f32,
    /// Frozen by a crystal ball
    pub stopped: bool,
    pub alive: bool,
    /// Set once the enemy has been fully on screen
    pub entered_screen: bool,
    pub knockback: Option<Knockback>,
    pub variant: EnemyVariant,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, pos: Vec2, speed_scale: f32, health_scale: i32) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            health: kind.max_health() * health_scale.max(1),
            speed_scale,
            attack_timer: 0.0,
            stopped: false,
            alive: true,
            entered_screen: false,
            knockback: None,
            variant: EnemyVariant::new(kind),
        }
    }

    pub fn kind(&self) -> EnemyKind {
        self.variant.kind()
    }

    pub fn radius(&self) -> f32 {
        self.kind().radius()
    }

    pub fn score_value(&self) -> u64 {
        self.kind().score_value()
    }

    fn speed(&self) -> f32 {
        ENEMY_BASE_SPEED * self.speed_scale
    }

    pub fn is_attached(&self) -> bool {
        matches!(
            self.variant,
            EnemyVariant::Rumuru {
                attached: Some(_),
                ..
            }
        )
    }

    pub fn apply_knockback(&mut self, dir: Vec2, distance: f32) {
        self.knockback = Some(Knockback::new(dir, distance, KNOCKBACK_DURATION));
    }

    /// Advance movement and behavior by one step
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        player_pos: Vec2,
        rng: &mut R,
    ) -> Option<EnemyAction> {
        if !self.alive || self.stopped {
            return None;
        }
        // Attached Rumuru rides along with the player
        if self.is_attached() {
            return None;
        }

        self.pos += self.vel * dt;
        if let Some(kb) = self.knockback.as_mut() {
            let step = kb.remaining.min(dt);
            self.pos += kb.vel * step;
            kb.remaining -= step;
            if kb.remaining <= 0.0 {
                self.knockback = None;
            }
        }

        if Rect::screen().inset(self.radius()).contains(self.pos) {
            self.entered_screen = true;
        }
        if !is_within_screen(self.pos, OFFSCREEN_MARGIN) {
            self.alive = false;
            return Some(EnemyAction::LeftScreen);
        }

        self.attack_timer = (self.attack_timer - dt).max(0.0);
        let speed = self.speed();
        let cooldown = self.kind().attack_cooldown();
        let to_player = direction_to(self.pos, player_pos);
        let ready = self.attack_timer <= 0.0;

        match &mut self.variant {
            EnemyVariant::Hitodama => {
                self.vel = to_player * speed * 0.8;
                if ready {
                    self.attack_timer = cooldown;
                    return Some(EnemyAction::Fire {
                        dir: to_player,
                        bullet: BulletKind::Fireball,
                    });
                }
            }
            EnemyVariant::BakeChouchin { has_shot } => {
                if !*has_shot && ready {
                    *has_shot = true;
                    self.attack_timer = cooldown;
                    self.vel = Vec2::new(rng.random_range(-100.0..100.0), -speed * 1.5);
                    return Some(EnemyAction::Fire {
                        dir: Vec2::NEG_Y,
                        bullet: BulletKind::Fireball,
                    });
                }
            }
            EnemyVariant::Rokurokubi { charge } => match *charge {
                ChargePhase::Ready => {
                    self.vel = Vec2::ZERO;
                    *charge = ChargePhase::Windup {
                        dir: to_player,
                        remaining: ROKUROKUBI_WINDUP,
                    };
                }
                ChargePhase::Windup { dir, remaining } => {
                    let remaining = remaining - dt;
                    if remaining <= 0.0 {
                        self.vel = dir * speed * 2.0;
                        *charge = ChargePhase::Charging {
                            remaining: ROKUROKUBI_CHARGE_TIME,
                        };
                    } else {
                        *charge = ChargePhase::Windup { dir, remaining };
                    }
                }
                ChargePhase::Charging { remaining } => {
                    let remaining = remaining - dt;
                    if remaining <= 0.0 {
                        self.vel = Vec2::ZERO;
                        *charge = ChargePhase::Ready;
                    } else {
                        *charge = ChargePhase::Charging { remaining };
                    }
                }
            },
            EnemyVariant::Rumuru { flee, .. } => {
                if *flee > 0.0 {
                    *flee = (*flee - dt).max(0.0);
                } else {
                    self.vel = to_player * speed * 1.5;
                    if self.pos.distance(player_pos) < RUMURU_ATTACH_DISTANCE {
                        return Some(EnemyAction::Attach);
                    }
                }
            }
        }
        None
    }

    /// Cling to the player for the drain duration
    pub fn attach(&mut self) {
        if let EnemyVariant::Rumuru { attached, flee } = &mut self.variant {
            // Still fleeing from the last shake-off
            if *flee > 0.0 {
                return;
            }
            *attached = Some(RUMURU_ATTACH_DURATION);
            self.vel = Vec2::ZERO;
            self.knockback = None;
        }
    }

    /// Shake off and fly away; returns false if it wasn't attached
    pub fn detach<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if let EnemyVariant::Rumuru { attached, flee } = &mut self.variant {
            if attached.take().is_some() {
                *flee = RUMURU_REATTACH_DELAY;
                self.vel = Vec2::new(rng.random_range(-200.0..200.0), 200.0);
                return true;
            }
        }
        false
    }

    /// Count down the drain while attached; true when it fires
    pub fn tick_attachment(&mut self, dt: f32) -> bool {
        if let EnemyVariant::Rumuru {
            attached: Some(remaining),
            ..
        } = &mut self.variant
        {
            *remaining -= dt;
            return *remaining <= 0.0;
        }
        false
    }
}

/// Enemy bullet types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletKind {
    Fireball,
    Energy,
    Shard,
}

impl BulletKind {
    pub fn speed(self) -> f32 {
        match self {
            BulletKind::Fireball => 150.0,
            BulletKind::Energy => 200.0,
            BulletKind::Shard => 100.0,
        }
    }

    pub fn radius(self) -> f32 {
        match self {
            BulletKind::Fireball => 6.0,
            BulletKind::Energy => 8.0,
            BulletKind::Shard => 3.0,
        }
    }

    /// RGBA tint for the presentation layer
    pub fn color(self) -> [f32; 4] {
        match self {
            BulletKind::Fireball => [1.0, 0.5, 0.0, 1.0],
            BulletKind::Energy => [0.0, 1.0, 1.0, 1.0],
            BulletKind::Shard => [0.5, 0.5, 0.5, 1.0],
        }
    }
}

/// Projectile payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectileKind {
    Ofuda {
        damage: u32,
        can_pierce: bool,
        pierce_count: u8,
        /// Enemies already struck (one hit per enemy)
        hits: Vec<u32>,
    },
    Oharai {
        damage: u32,
        hits: Vec<u32>,
    },
    EnemyBullet(BulletKind),
}

/// A projectile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds until expiry
    pub lifetime: f32,
    pub alive: bool,
    pub kind: ProjectileKind,
}

impl Projectile {
    pub fn category(&self) -> Category {
        match self.kind {
            ProjectileKind::Ofuda { .. } => Category::Ofuda,
            ProjectileKind::Oharai { .. } => Category::Oharai,
            ProjectileKind::EnemyBullet(_) => Category::EnemyBullet,
        }
    }

    pub fn radius(&self) -> f32 {
        match &self.kind {
            ProjectileKind::Ofuda { .. } => OFUDA_RADIUS,
            ProjectileKind::Oharai { .. } => OHARAI_RANGE / 2.0,
            ProjectileKind::EnemyBullet(b) => b.radius(),
        }
    }

    /// Integrate; true when the lifetime ran out this step
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.pos += self.vel * dt;
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }
}

/// Power-up tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerType {
    Damage,
    Speed,
    Pierce,
}

/// Item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Health,
    CrystalBall,
    PowerUp(PowerType),
    Coin,
}

impl ItemKind {
    /// Points for picking it up
    pub fn score_value(self) -> u64 {
        match self {
            ItemKind::Health => 100,
            ItemKind::CrystalBall => 200,
            ItemKind::PowerUp(_) => 300,
            ItemKind::Coin => 50,
        }
    }

    pub fn radius(self) -> f32 {
        match self {
            ItemKind::Coin => 8.0,
            _ => ITEM_RADIUS,
        }
    }
}

/// An item lying on the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub pos: Vec2,
    pub kind: ItemKind,
    pub lifetime: f32,
    pub alive: bool,
}

impl Item {
    pub fn new(id: u32, kind: ItemKind, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            kind,
            lifetime: ITEM_LIFETIME,
            alive: true,
        }
    }

    /// Count down; true when it expired this step
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }
}
