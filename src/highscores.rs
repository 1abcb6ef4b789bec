//! High score leaderboard system
//!
//! Persisted as a JSON file, tracks the top 10 games.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::persistence::{self, PersistenceError};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single finished game on the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreRecord {
    pub score: u64,
    pub player_name: String,
    /// Unix timestamp (ms) when achieved
    pub date: f64,
    /// Stage reached
    pub stage: u32,
    /// Seconds of active play
    pub playtime: f64,
    pub enemies_killed: u32,
    pub items_collected: u32,
    pub max_combo: u32,
}

/// High score leaderboard, sorted descending by score
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreRecord>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score would stay on the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| e.score <= score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a finished game to the leaderboard
    ///
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    /// Ties share the better rank.
    pub fn insert(&mut self, record: HighScoreRecord) -> Option<usize> {
        let rank = self.potential_rank(record.score)?;
        self.entries.push(record);
        // Stable sort keeps earlier entries ahead of equal newcomers
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load high scores, starting fresh if the file is missing or corrupt
    pub fn load(path: &Path) -> Self {
        let mut scores: HighScores = persistence::load_or_default(path);
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_HIGH_SCORES);
        if !scores.is_empty() {
            log::info!("Loaded {} high scores", scores.entries.len());
        }
        scores
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::save(path, self)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: u64) -> HighScoreRecord {
        HighScoreRecord {
            score,
            player_name: "Test".to_string(),
            date: 0.0,
            stage: 1,
            playtime: 60.0,
            enemies_killed: 10,
            items_collected: 2,
            max_combo: 3,
        }
    }

    #[test]
    fn test_insert_keeps_descending_order() {
        let mut scores = HighScores::new();
        assert_eq!(scores.insert(record(500)), Some(1));
        assert_eq!(scores.insert(record(1000)), Some(1));
        assert_eq!(scores.insert(record(700)), Some(2));
        let values: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(values, vec![1000, 700, 500]);
        assert_eq!(scores.top_score(), Some(1000));
    }

    #[test]
    fn test_table_truncates_to_ten() {
        let mut scores = HighScores::new();
        for i in 1..=12 {
            scores.insert(record(i * 100));
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(300));
        // Below the lowest kept entry on a full table
        assert!(!scores.qualifies(250));
        assert_eq!(scores.insert(record(250)), None);
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
    }

    #[test]
    fn test_ties_share_better_rank() {
        let mut scores = HighScores::new();
        scores.insert(record(800));
        scores.insert(record(400));
        assert_eq!(scores.potential_rank(400), Some(2));
        assert_eq!(scores.insert(record(400)), Some(2));
        assert_eq!(scores.entries.len(), 3);
    }

    #[test]
    fn test_zero_score_on_empty_table() {
        let mut scores = HighScores::new();
        assert_eq!(scores.insert(record(0)), Some(1));
    }
}
