//! Game session state machine and player resources
//!
//! Phase transitions plus the bookkeeping the phases depend on: health,
//! crystal balls, stage and power levels.

use serde::{Deserialize, Serialize};

use super::entity::{ItemKind, PowerType};
use crate::consts::*;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting to start
    #[default]
    Menu,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended (out of health or final stage cleared)
    GameOver,
    /// Between stages, waiting to continue
    StageClear,
}

/// Permanent power levels, each 0..=MAX_POWER_LEVEL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerLevels {
    pub damage: u8,
    pub speed: u8,
    pub pierce: u8,
}

impl PowerLevels {
    /// Raise one track; false if already at the cap
    pub fn upgrade(&mut self, power: PowerType) -> bool {
        let level = match power {
            PowerType::Damage => &mut self.damage,
            PowerType::Speed => &mut self.speed,
            PowerType::Pierce => &mut self.pierce,
        };
        if *level >= MAX_POWER_LEVEL {
            return false;
        }
        *level += 1;
        true
    }
}

/// One play-through, from start to game over
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub phase: GamePhase,
    /// 1-based
    pub stage: u32,
    pub max_stages: u32,
    pub health: u8,
    pub max_health: u8,
    pub crystal_balls: u8,
    pub power: PowerLevels,
    pub enemies_killed: u32,
    pub items_collected: u32,
    /// Damage taken since the current stage began
    pub stage_damage: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            phase: GamePhase::Menu,
            stage: 1,
            max_stages: MAX_STAGES,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            crystal_balls: STARTING_CRYSTAL_BALLS,
            power: PowerLevels::default(),
            enemies_killed: 0,
            items_collected: 0,
            stage_damage: 0,
        }
    }
}

impl Session {
    /// Reset resources and enter Playing
    pub fn start_new_game(&mut self) {
        *self = Self {
            phase: GamePhase::Playing,
            ..Self::default()
        };
    }

    /// Playing → Paused; no-op otherwise
    pub fn pause(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.phase = GamePhase::Paused;
        true
    }

    /// Paused → Playing; no-op otherwise
    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = GamePhase::Playing;
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            GamePhase::Playing => self.pause(),
            GamePhase::Paused => self.resume(),
            _ => false,
        }
    }

    pub fn game_over(&mut self) {
        self.phase = GamePhase::GameOver;
    }

    /// Playing → StageClear
    pub fn clear_stage(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.phase = GamePhase::StageClear;
        true
    }

    /// StageClear → Playing on the next stage, or GameOver after the last one
    pub fn next_stage(&mut self) -> GamePhase {
        if self.phase != GamePhase::StageClear {
            return self.phase;
        }
        if self.stage < self.max_stages {
            self.stage += 1;
            self.add_crystal_ball();
            self.stage_damage = 0;
            self.phase = GamePhase::Playing;
        } else {
            self.phase = GamePhase::GameOver;
        }
        self.phase
    }

    /// Lose health (floored at 0); entering GameOver at zero
    pub fn take_damage(&mut self, amount: u32) -> u8 {
        if amount == 0 {
            return self.health;
        }
        let amount = amount.min(self.health as u32) as u8;
        self.health -= amount;
        self.stage_damage += amount as u32;
        if self.health == 0 {
            self.game_over();
        }
        self.health
    }

    /// Restore health up to the maximum
    pub fn heal(&mut self, amount: u32) -> u8 {
        let missing = (self.max_health - self.health) as u32;
        self.health += amount.min(missing) as u8;
        debug_assert!(self.health <= self.max_health);
        self.health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Spend a crystal ball; false (and unchanged) when none are left
    pub fn use_crystal_ball(&mut self) -> bool {
        if self.crystal_balls == 0 {
            return false;
        }
        self.crystal_balls -= 1;
        true
    }

    pub fn add_crystal_ball(&mut self) {
        self.crystal_balls = (self.crystal_balls + 1).min(MAX_CRYSTAL_BALLS);
    }

    /// Apply an item's effect
    pub fn collect_item(&mut self, kind: ItemKind) {
        match kind {
            ItemKind::Health => {
                self.heal(1);
            }
            ItemKind::CrystalBall => self.add_crystal_ball(),
            ItemKind::PowerUp(power) => {
                self.power.upgrade(power);
            }
            ItemKind::Coin => {}
        }
        self.items_collected += 1;
    }

    pub fn record_kill(&mut self) {
        self.enemies_killed += 1;
    }

    pub fn ofuda_damage(&self) -> u32 {
        1 + self.power.damage as u32
    }

    pub fn ofuda_speed(&self) -> f32 {
        OFUDA_BASE_SPEED + OFUDA_SPEED_PER_LEVEL * self.power.speed as f32
    }

    pub fn ofuda_pierce(&self) -> bool {
        self.power.pierce >= OFUDA_PIERCE_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn playing() -> Session {
        let mut session = Session::default();
        session.start_new_game();
        session
    }

    #[test]
    fn test_new_game_defaults() {
        let session = playing();
        assert_eq!(session.phase, GamePhase::Playing);
        assert_eq!(session.health, 3);
        assert_eq!(session.crystal_balls, 2);
        assert_eq!(session.stage, 1);
        assert_eq!(session.power, PowerLevels::default());
    }

    #[test]
    fn test_three_hits_end_the_game() {
        let mut session = playing();
        session.take_damage(1);
        session.take_damage(1);
        assert_eq!(session.phase, GamePhase::Playing);
        session.take_damage(1);
        assert_eq!(session.phase, GamePhase::GameOver);
        assert_eq!(session.health, 0);
    }

    #[test]
    fn test_pause_only_from_matching_phase() {
        let mut session = Session::default();
        assert!(!session.pause());
        assert_eq!(session.phase, GamePhase::Menu);

        session.start_new_game();
        assert!(!session.resume());
        assert!(session.pause());
        assert_eq!(session.phase, GamePhase::Paused);
        assert!(!session.pause());
        assert!(session.toggle_pause());
        assert_eq!(session.phase, GamePhase::Playing);
    }

    #[test]
    fn test_stage_progression() {
        let mut session = playing();
        session.use_crystal_ball();
        assert_eq!(session.next_stage(), GamePhase::Playing);
        assert_eq!(session.stage, 1);

        assert!(session.clear_stage());
        assert_eq!(session.next_stage(), GamePhase::Playing);
        assert_eq!(session.stage, 2);
        assert_eq!(session.crystal_balls, 2);

        session.stage = session.max_stages;
        session.clear_stage();
        assert_eq!(session.next_stage(), GamePhase::GameOver);
    }

    #[test]
    fn test_crystal_ball_cap() {
        let mut session = playing();
        for _ in 0..5 {
            session.add_crystal_ball();
        }
        assert_eq!(session.crystal_balls, MAX_CRYSTAL_BALLS);
    }

    #[test]
    fn test_power_ups() {
        let mut session = playing();
        session.collect_item(ItemKind::PowerUp(PowerType::Pierce));
        assert!(!session.ofuda_pierce());
        session.collect_item(ItemKind::PowerUp(PowerType::Pierce));
        assert!(session.ofuda_pierce());

        session.collect_item(ItemKind::PowerUp(PowerType::Damage));
        assert_eq!(session.ofuda_damage(), 2);

        for _ in 0..5 {
            session.collect_item(ItemKind::PowerUp(PowerType::Speed));
        }
        assert_eq!(session.power.speed, MAX_POWER_LEVEL);
        assert_eq!(session.ofuda_speed(), 600.0);
        assert_eq!(session.items_collected, 8);
    }

    #[derive(Debug, Clone)]
    enum HealthOp {
        Damage(u32),
        Heal(u32),
    }

    fn health_op() -> impl Strategy<Value = HealthOp> {
        prop_oneof![
            (0u32..6).prop_map(HealthOp::Damage),
            (0u32..6).prop_map(HealthOp::Heal),
        ]
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_bounds(ops in prop::collection::vec(health_op(), 0..64)) {
            let mut session = playing();
            for op in ops {
                match op {
                    HealthOp::Damage(n) => { session.take_damage(n); }
                    HealthOp::Heal(n) => { session.heal(n); }
                }
                prop_assert!(session.health <= session.max_health);
            }
        }

        #[test]
        fn prop_crystal_ball_conservation(adds in prop::collection::vec(any::<bool>(), 0..32)) {
            let mut session = playing();
            for add in adds {
                let before = session.crystal_balls;
                if add {
                    session.add_crystal_ball();
                    prop_assert!(session.crystal_balls <= MAX_CRYSTAL_BALLS);
                } else {
                    let used = session.use_crystal_ball();
                    if before == 0 {
                        prop_assert!(!used);
                        prop_assert_eq!(session.crystal_balls, 0);
                    } else {
                        prop_assert!(used);
                        prop_assert_eq!(session.crystal_balls, before - 1);
                    }
                }
            }
        }
    }
}
