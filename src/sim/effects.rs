//! Time-boxed status effects
//!
//! Every timer here is advanced by the tick's `dt`; nothing is scheduled
//! against a wall clock.

use serde::{Deserialize, Serialize};

use super::entity::Player;
use super::session::Session;
use crate::consts::*;

/// Countdown shared by every timed effect
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectTimer {
    remaining: f32,
}

impl EffectTimer {
    pub fn start(&mut self, duration: f32) {
        self.remaining = duration.max(0.0);
    }

    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Count down; true on the step the effect runs out
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            return true;
        }
        false
    }
}

/// Effect transitions reported by [`StatusEffects::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectChange {
    CrystalBallWarning,
    CrystalBallEnded,
    InvincibilityEnded,
}

/// Global effects that gate other systems
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    crystal_ball: EffectTimer,
    warned: bool,
}

impl StatusEffects {
    /// Spend a crystal ball and freeze enemies
    ///
    /// Fails without side effects when the session has none left.
    /// Using another while one is running refreshes the duration.
    pub fn activate_crystal_ball(&mut self, session: &mut Session) -> bool {
        if !session.use_crystal_ball() {
            return false;
        }
        self.crystal_ball.start(CRYSTAL_BALL_DURATION);
        self.warned = false;
        true
    }

    /// Whether enemy updates are skipped this tick
    pub fn enemies_stopped(&self) -> bool {
        self.crystal_ball.is_active()
    }

    pub fn crystal_ball_remaining(&self) -> f32 {
        self.crystal_ball.remaining()
    }

    /// End the freeze immediately
    pub(crate) fn deactivate_crystal_ball(&mut self) -> bool {
        let was_active = self.crystal_ball.is_active();
        self.crystal_ball.clear();
        was_active
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Advance all timers, returning what changed
    pub fn update(&mut self, dt: f32, player: &mut Player) -> Vec<EffectChange> {
        let mut changes = Vec::new();

        if self.crystal_ball.tick(dt) {
            changes.push(EffectChange::CrystalBallEnded);
        } else if self.crystal_ball.is_active()
            && !self.warned
            && self.crystal_ball.remaining() <= CRYSTAL_BALL_WARNING
        {
            self.warned = true;
            changes.push(EffectChange::CrystalBallWarning);
        }

        if player.invincibility.tick(dt) {
            changes.push(EffectChange::InvincibilityEnded);
        }

        changes
    }
}
