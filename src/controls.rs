//! Controls panel model: score readout, name entry + submission lock, game
//! mode and difficulty selection. The DOM side in `web` only mirrors this.

use crate::scoreboard::ScoreSubmission;

/// Selectable game modes, in the order they appear in the mode dropdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    #[default]
    Demo,
    Flappy,
    Karaoke,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::Demo, GameMode::Flappy, GameMode::Karaoke];

    /// Scoreboard / dropdown value.
    pub fn key(self) -> &'static str {
        match self {
            GameMode::Demo => "demo",
            GameMode::Flappy => "flappy",
            GameMode::Karaoke => "karaoke",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameMode::Demo => "Demo",
            GameMode::Flappy => "Flappy ABR",
            GameMode::Karaoke => "Bit Rate Optimizer",
        }
    }

    pub fn from_key(key: &str) -> Option<GameMode> {
        GameMode::ALL.into_iter().find(|m| m.key() == key)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            GameMode::Demo => 0,
            GameMode::Flappy => 1,
            GameMode::Karaoke => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Unknown labels count as Easy.
    pub fn from_label(label: &str) -> Difficulty {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.label() == label)
            .unwrap_or_default()
    }

    /// Multiplier applied to obstacle speed and score rate.
    pub fn modifier(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 2.0,
            Difficulty::Hard => 3.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct Controls {
    score: f64,
    name: String,
    submit_enabled: bool, // name input + submit button unlocked
    mode: GameMode,
    difficulty: Difficulty,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn set_score(&mut self, v: f64) {
        self.score = v;
    }

    pub fn add_score(&mut self, delta: f64) {
        self.score += delta;
    }

    pub fn score_text(&self) -> String {
        format!("Score: {}", self.score.round() as i64)
    }

    pub fn reset(&mut self) {
        self.score = 0.0;
        self.submit_enabled = false;
    }

    pub fn enable_score_submit(&mut self) {
        self.submit_enabled = true;
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Build the payload for the scoreboard and lock the form again.
    /// A no-op while locked or while no name has been typed.
    pub fn submit(&mut self) -> Option<ScoreSubmission> {
        if !self.submit_enabled || self.name.is_empty() {
            return None;
        }
        let sub = ScoreSubmission {
            game: self.mode.key().to_string(),
            name: std::mem::take(&mut self.name),
            score: self.score.round() as i64,
        };
        self.submit_enabled = false;
        Some(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_text_rounds() {
        let mut c = Controls::new();
        c.add_score(41.6);
        assert_eq!(c.score_text(), "Score: 42");
        c.set_score(-0.4);
        assert_eq!(c.score_text(), "Score: 0");
    }

    #[test]
    fn test_submit_requires_unlock_and_name() {
        let mut c = Controls::new();
        c.set_mode(GameMode::Flappy);
        c.set_score(42.2);
        c.set_name("A");
        assert!(c.submit().is_none(), "locked form must not submit");

        c.enable_score_submit();
        c.set_name("");
        assert!(c.submit().is_none());

        c.set_name("A");
        let sub = c.submit().unwrap();
        assert_eq!(sub.game, "flappy");
        assert_eq!(sub.name, "A");
        assert_eq!(sub.score, 42);
        assert!(c.name().is_empty());
        assert!(!c.submit_enabled());
    }

    #[test]
    fn test_reset_locks_and_zeroes() {
        let mut c = Controls::new();
        c.add_score(10.0);
        c.enable_score_submit();
        c.reset();
        assert_eq!(c.score(), 0.0);
        assert!(!c.submit_enabled());
    }

    #[test]
    fn test_difficulty_modifiers() {
        assert_eq!(Difficulty::from_label("Easy").modifier(), 1.0);
        assert_eq!(Difficulty::from_label("Medium").modifier(), 2.0);
        assert_eq!(Difficulty::from_label("Hard").modifier(), 3.0);
        assert_eq!(Difficulty::from_label("Nightmare"), Difficulty::Easy);
    }

    #[test]
    fn test_mode_keys_round_trip() {
        for m in GameMode::ALL {
            assert_eq!(GameMode::from_key(m.key()), Some(m));
        }
        assert_eq!(GameMode::from_key("pong"), None);
    }
}
