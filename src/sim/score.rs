//! Score, combo and statistics engine
//!
//! Owns its own playtime clock, advanced by the tick, which also drives
//! the combo window. Events are buffered and handed to the game state's
//! queue by the caller.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::ItemKind;
use super::events::GameEvent;
use crate::consts::COMBO_WINDOW;
use crate::highscores::{HighScoreRecord, HighScores};

/// Score thresholds that award a one-time bonus of a tenth of their value
pub const MILESTONES: [u64; 6] = [10_000, 50_000, 100_000, 250_000, 500_000, 1_000_000];

/// Rank titles by minimum score, ascending
const RANK_TITLES: [(u64, &str); 7] = [
    (0, "Novice"),
    (10_000, "Apprentice Miko"),
    (50_000, "Miko"),
    (100_000, "Veteran Miko"),
    (250_000, "Miko Instructor"),
    (500_000, "Miko Master"),
    (1_000_000, "Divine Miko"),
];

/// Entries kept in the score history
const HISTORY_LIMIT: usize = 100;

pub const LIFE_BONUS_PER_HEALTH: u64 = 10_000;
pub const NO_DAMAGE_BONUS: u64 = 50_000;

/// Why points were awarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreReason {
    EnemyKill,
    ItemCollect,
    Milestone,
    StageClear,
    NoDamage,
}

impl ScoreReason {
    pub fn label(self) -> &'static str {
        match self {
            ScoreReason::EnemyKill => "Enemy Defeated",
            ScoreReason::ItemCollect => "Item Collected",
            ScoreReason::Milestone => "Milestone",
            ScoreReason::StageClear => "Stage Clear",
            ScoreReason::NoDamage => "No Damage",
        }
    }
}

/// One award in the score history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub points: u64,
    pub reason: ScoreReason,
    pub combo: u32,
    pub pos: Option<Vec2>,
    /// Playtime when awarded
    pub at: f64,
}

/// Cumulative counters for one game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Seconds of active play
    pub playtime: f64,
    pub enemies_killed: u32,
    pub items_collected: u32,
    pub max_combo: u32,
    pub damages_taken: u32,
    pub ofuda_fired: u32,
    pub oharai_used: u32,
    pub crystal_balls_used: u32,
}

impl GameStatistics {
    /// Kills per ofuda fired (0 if nothing was fired)
    pub fn accuracy(&self) -> f64 {
        if self.ofuda_fired == 0 {
            return 0.0;
        }
        self.enemies_killed as f64 / self.ofuda_fired as f64
    }

    /// 1.0 for no damage, falling with damage per minute
    pub fn survivability(&self) -> f64 {
        let minutes = self.playtime / 60.0;
        if minutes <= 0.0 {
            return 1.0;
        }
        (1.0 - self.damages_taken as f64 / minutes).max(0.0)
    }
}

/// End-of-game badges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Achievement {
    ComboMaster,
    Sharpshooter,
    Flawless,
    ScoreMaster,
    YokaiHunter,
}

impl Achievement {
    pub fn title(self) -> &'static str {
        match self {
            Achievement::ComboMaster => "Combo Master",
            Achievement::Sharpshooter => "Sharpshooter",
            Achievement::Flawless => "Flawless",
            Achievement::ScoreMaster => "Score Master",
            Achievement::YokaiHunter => "Yokai Hunter",
        }
    }
}

/// Score multiplier for a combo count
pub fn combo_multiplier(combo: u32) -> u64 {
    match combo {
        0..=2 => 1,
        3..=5 => 2,
        6..=10 => 3,
        11..=20 => 4,
        _ => 5,
    }
}

/// Title for a score
pub fn rank_title(score: u64) -> &'static str {
    RANK_TITLES
        .iter()
        .rev()
        .find(|(min, _)| score >= *min)
        .map(|(_, title)| *title)
        .unwrap_or(RANK_TITLES[0].1)
}

/// Compact score for HUDs: 950, 1.5K, 2.3M
pub fn format_score(score: u64) -> String {
    if score >= 1_000_000 {
        format!("{:.1}M", score as f64 / 1_000_000.0)
    } else if score >= 1_000 {
        format!("{:.1}K", score as f64 / 1_000.0)
    } else {
        score.to_string()
    }
}

/// MM:SS
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub fn format_accuracy(accuracy: f64) -> String {
    format!("{:.1}%", accuracy * 100.0)
}

/// Score accumulation with combo multiplier and milestones
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    score: u64,
    combo: u32,
    last_kill_at: Option<f64>,
    milestones_reached: Vec<u64>,
    history: Vec<ScoreEntry>,
    stats: GameStatistics,
    high_scores: HighScores,
    events: Vec<GameEvent>,
}

impl ScoreEngine {
    pub fn new(high_scores: HighScores) -> Self {
        Self {
            high_scores,
            ..Self::default()
        }
    }

    /// Clear everything except the high score table
    pub fn reset_game(&mut self) {
        let high_scores = std::mem::take(&mut self.high_scores);
        *self = Self::new(high_scores);
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.stats.max_combo
    }

    pub fn multiplier(&self) -> u64 {
        combo_multiplier(self.combo)
    }

    pub fn stats(&self) -> &GameStatistics {
        &self.stats
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn milestones_reached(&self) -> &[u64] {
        &self.milestones_reached
    }

    /// Most recent awards, newest last
    pub fn recent_entries(&self, count: usize) -> &[ScoreEntry] {
        let start = self.history.len().saturating_sub(count);
        &self.history[start..]
    }

    pub fn now(&self) -> f64 {
        self.stats.playtime
    }

    /// Advance the playtime clock
    pub fn advance(&mut self, dt: f32) {
        self.stats.playtime += dt as f64;
    }

    /// Hand over buffered events, oldest first
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, points: u64, reason: ScoreReason, pos: Option<Vec2>) {
        self.history.push(ScoreEntry {
            points,
            reason,
            combo: self.combo,
            pos,
            at: self.stats.playtime,
        });
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
    }

    /// Award points scaled by the combo multiplier; returns points applied
    pub fn add_score(&mut self, points: u64, reason: ScoreReason, pos: Option<Vec2>) -> u64 {
        if points == 0 {
            return 0;
        }
        let applied = points.saturating_mul(self.multiplier());
        self.score = self.score.saturating_add(applied);
        self.record(applied, reason, pos);
        self.events.push(GameEvent::ScoreAdded {
            amount: applied,
            reason,
            pos,
        });
        self.check_milestones();
        applied
    }

    /// Award points without the multiplier
    pub fn add_bonus(&mut self, points: u64, reason: ScoreReason, pos: Option<Vec2>) -> u64 {
        if points == 0 {
            return 0;
        }
        self.score = self.score.saturating_add(points);
        self.record(points, reason, pos);
        self.events.push(GameEvent::BonusScoreAdded {
            amount: points,
            reason,
            pos,
        });
        self.check_milestones();
        points
    }

    fn check_milestones(&mut self) {
        // Ascending, so a bonus that crosses the next threshold is caught too
        for milestone in MILESTONES {
            if self.score < milestone || self.milestones_reached.contains(&milestone) {
                continue;
            }
            self.milestones_reached.push(milestone);
            let bonus = milestone / 10;
            self.score = self.score.saturating_add(bonus);
            self.record(bonus, ScoreReason::Milestone, None);
            self.events.push(GameEvent::BonusScoreAdded {
                amount: bonus,
                reason: ScoreReason::Milestone,
                pos: None,
            });
            self.events.push(GameEvent::MilestoneReached { milestone });
            log::info!("Milestone {} reached", milestone);
        }
    }

    /// Count a kill, extend or restart the combo, and award its points
    pub fn register_kill(&mut self, base: u64, pos: Option<Vec2>) -> u64 {
        let now = self.stats.playtime;
        self.combo = match self.last_kill_at {
            Some(last) if now - last <= COMBO_WINDOW => self.combo + 1,
            _ => 1,
        };
        self.last_kill_at = Some(now);
        self.stats.max_combo = self.stats.max_combo.max(self.combo);
        self.stats.enemies_killed += 1;

        let combo_bonus = base * (self.combo / 5).min(10) as u64 / 10;
        if self.combo > 1 {
            self.events.push(GameEvent::ComboUpdated {
                combo: self.combo,
                pos,
            });
        }
        self.add_score(base + combo_bonus, ScoreReason::EnemyKill, pos)
    }

    /// Count a pickup and award its points
    pub fn register_item(&mut self, kind: ItemKind, pos: Option<Vec2>) -> u64 {
        self.stats.items_collected += 1;
        self.add_score(kind.score_value(), ScoreReason::ItemCollect, pos)
    }

    /// Taking damage breaks the streak
    pub fn register_damage_taken(&mut self) {
        self.stats.damages_taken += 1;
        self.reset_combo();
    }

    pub fn reset_combo(&mut self) {
        self.combo = 0;
    }

    pub fn record_ofuda_fired(&mut self) {
        self.stats.ofuda_fired += 1;
    }

    pub fn record_oharai_used(&mut self) {
        self.stats.oharai_used += 1;
    }

    pub fn record_crystal_ball_used(&mut self) {
        self.stats.crystal_balls_used += 1;
    }

    pub fn life_bonus(remaining_health: u8) -> u64 {
        remaining_health as u64 * LIFE_BONUS_PER_HEALTH
    }

    pub fn no_damage_bonus(damage_this_stage: u32) -> u64 {
        if damage_this_stage == 0 {
            NO_DAMAGE_BONUS
        } else {
            0
        }
    }

    /// Award the stage-clear bonuses; returns the total added
    pub fn award_stage_clear(&mut self, remaining_health: u8, damage_this_stage: u32) -> u64 {
        let life = self.add_bonus(
            Self::life_bonus(remaining_health),
            ScoreReason::StageClear,
            None,
        );
        let flawless = self.add_bonus(
            Self::no_damage_bonus(damage_this_stage),
            ScoreReason::NoDamage,
            None,
        );
        life + flawless
    }

    /// Title for the current score
    pub fn rank_title(&self) -> &'static str {
        rank_title(self.score)
    }

    pub fn achievements(&self) -> Vec<Achievement> {
        let mut earned = Vec::new();
        if self.stats.max_combo >= 50 {
            earned.push(Achievement::ComboMaster);
        }
        if self.stats.accuracy() >= 0.9 {
            earned.push(Achievement::Sharpshooter);
        }
        if self.stats.damages_taken == 0 {
            earned.push(Achievement::Flawless);
        }
        if self.score >= 1_000_000 {
            earned.push(Achievement::ScoreMaster);
        }
        if self.stats.enemies_killed >= 1000 {
            earned.push(Achievement::YokaiHunter);
        }
        earned
    }

    /// Record the finished game on the leaderboard
    ///
    /// `date` is a unix timestamp in milliseconds supplied by the host.
    pub fn register_game_end(&mut self, player_name: &str, stage: u32, date: f64) -> Option<usize> {
        let record = HighScoreRecord {
            score: self.score,
            player_name: player_name.to_string(),
            date,
            stage,
            playtime: self.stats.playtime,
            enemies_killed: self.stats.enemies_killed,
            items_collected: self.stats.items_collected,
            max_combo: self.stats.max_combo,
        };
        let rank = self.high_scores.insert(record)?;
        log::info!("New high score {} (rank {})", self.score, rank);
        self.events.push(GameEvent::HighScoreAchieved {
            rank,
            score: self.score,
        });
        Some(rank)
    }
}
