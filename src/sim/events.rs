//! Events emitted by the simulation for presentation and audio
//!
//! The simulation never calls into rendering or audio code. It appends
//! events here in the order they happen, and the host drains the queue once
//! per frame.

use glam::Vec2;
use serde::Serialize;

use super::entity::{BulletKind, EnemyKind, ItemKind};
use super::score::ScoreReason;
use super::session::GamePhase;

/// Named sound intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SoundCue {
    OfudaShoot,
    OharaiSwing,
    EnemyHit,
    EnemyDestroy,
    PlayerDamage,
    ItemGet,
    PowerUp,
    CrystalBall,
    StageCleared,
    GameOver,
}

impl SoundCue {
    /// Asset name of the sound
    pub fn name(self) -> &'static str {
        match self {
            SoundCue::OfudaShoot => "ofuda_shoot",
            SoundCue::OharaiSwing => "oharai_swing",
            SoundCue::EnemyHit => "enemy_hit",
            SoundCue::EnemyDestroy => "enemy_destroy",
            SoundCue::PlayerDamage => "player_damage",
            SoundCue::ItemGet => "item_get",
            SoundCue::PowerUp => "power_up",
            SoundCue::CrystalBall => "crystal_ball",
            SoundCue::StageCleared => "stage_cleared",
            SoundCue::GameOver => "game_over",
        }
    }
}

/// What kind of entity an event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    Enemy(EnemyKind),
    Ofuda,
    Oharai,
    EnemyBullet(BulletKind),
    Item(ItemKind),
}

/// Why an entity left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemovalReason {
    /// Killed or spent on a hit
    Destroyed,
    /// Picked up by the player
    Collected,
    /// Lifetime ran out
    Expired,
    /// Left the playfield
    OffScreen,
    /// Rumuru finished draining the player
    Consumed,
}

/// Discrete notification for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    EntitySpawned {
        id: u32,
        kind: EntityKind,
        pos: Vec2,
    },
    EntityRemoved {
        id: u32,
        kind: EntityKind,
        reason: RemovalReason,
        pos: Vec2,
    },
    EnemyDamaged {
        id: u32,
        remaining: i32,
        pos: Vec2,
    },
    PlayerDamaged {
        health: u8,
        pos: Vec2,
    },
    ItemCollected {
        kind: ItemKind,
        pos: Vec2,
    },
    RumuruAttached {
        id: u32,
    },
    RumuruDetached {
        id: u32,
    },
    ScoreAdded {
        amount: u64,
        reason: ScoreReason,
        pos: Option<Vec2>,
    },
    BonusScoreAdded {
        amount: u64,
        reason: ScoreReason,
        pos: Option<Vec2>,
    },
    ComboUpdated {
        combo: u32,
        pos: Option<Vec2>,
    },
    MilestoneReached {
        milestone: u64,
    },
    HighScoreAchieved {
        rank: usize,
        score: u64,
    },
    CrystalBallActivated {
        remaining_balls: u8,
    },
    CrystalBallWarning,
    CrystalBallEnded,
    WaveStarted {
        wave: u32,
        enemies: u32,
    },
    StageCleared {
        stage: u32,
    },
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },
    PlaySound(SoundCue),
}

/// Ordered event buffer, drained by the host each frame
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: GameEvent) {
        log::trace!("{event:?}");
        self.events.push(event);
    }

    pub fn sound(&mut self, cue: SoundCue) {
        self.push(GameEvent::PlaySound(cue));
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.push(event);
        }
    }

    /// Take every pending event, oldest first
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let mut queue = EventQueue::default();
        queue.sound(SoundCue::OfudaShoot);
        queue.push(GameEvent::CrystalBallEnded);
        queue.sound(SoundCue::GameOver);
        let events = queue.drain();
        assert_eq!(
            events,
            vec![
                GameEvent::PlaySound(SoundCue::OfudaShoot),
                GameEvent::CrystalBallEnded,
                GameEvent::PlaySound(SoundCue::GameOver),
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_sound_names() {
        assert_eq!(SoundCue::OharaiSwing.name(), "oharai_swing");
        assert_eq!(SoundCue::StageCleared.name(), "stage_cleared");
    }
}
