//! Game settings and preferences
//!
//! Persisted as JSON next to the high score table.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::persistence::{self, PersistenceError};

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Multiplier on every enemy's movement speed
    pub fn enemy_speed_multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.3,
        }
    }

    /// Multiplier on every enemy's starting health
    pub fn enemy_health_multiplier(&self) -> i32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
        }
    }

    /// Chance that a killed enemy drops an item
    pub fn item_drop_rate(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.4,
            Difficulty::Normal => 0.25,
            Difficulty::Hard => 0.15,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    /// Name recorded with high scores
    pub player_name: String,

    // === Audio ===
    pub sound_enabled: bool,
    pub music_enabled: bool,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === HUD ===
    pub show_debug_info: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            player_name: "Sayo".to_string(),
            sound_enabled: true,
            music_enabled: true,
            sfx_volume: 0.7,
            show_debug_info: false,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        let mut settings: Settings = persistence::load_or_default(path);
        settings.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        settings
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        persistence::save(path, self)?;
        log::info!("Settings saved ({})", self.difficulty.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_str("nightmare"), None);
        for d in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert_eq!(Difficulty::from_str(d.as_str()), Some(d));
        }
    }

    #[test]
    fn test_drop_rate_falls_with_difficulty() {
        let (easy, normal, hard) = (Difficulty::Easy, Difficulty::Normal, Difficulty::Hard);
        assert!(easy.item_drop_rate() > normal.item_drop_rate());
        assert!(normal.item_drop_rate() > hard.item_drop_rate());
        assert_eq!(Difficulty::Hard.enemy_health_multiplier(), 2);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"difficulty":"Hard"}"#).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert!(settings.sound_enabled);
        assert_eq!(settings.player_name, Settings::default().player_name);
    }
}
