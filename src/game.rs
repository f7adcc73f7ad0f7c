use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{LineupError, LineupResult, RosterIssue};
use crate::selector::LINEUP_SIZE;

const GAME_FILE_VERSION: u32 = 1;

/// A stretch of play by one fixed lineup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stint {
    pub number: u32,
    pub lineup: Vec<String>,
    pub home_goals: u32,
    pub away_goals: u32,
    pub duration_minutes: f64,
}

/// Score and minutes for one game. Owned by the caller and passed into each
/// recommendation; nothing in this crate keeps it between calls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub stints: Vec<Stint>,
    #[serde(default)]
    pub player_minutes: HashMap<String, f64>,
}

impl GameState {
    pub fn new(home_team: impl Into<String>, away_team: impl Into<String>) -> Self {
        Self {
            version: GAME_FILE_VERSION,
            home_team: Some(home_team.into()),
            away_team: Some(away_team.into()),
            ..Self::default()
        }
    }

    /// Appends a stint and credits its duration to every player in it.
    pub fn add_stint(
        &mut self,
        lineup: &[String],
        home_goals: u32,
        away_goals: u32,
        duration_minutes: f64,
    ) -> LineupResult<&Stint> {
        if !duration_minutes.is_finite() || duration_minutes <= 0.0 {
            return Err(LineupError::invalid_input(
                "stint.duration_minutes",
                duration_minutes,
            ));
        }
        if lineup.len() != LINEUP_SIZE {
            return Err(LineupError::invalid_input("stint.lineup_size", lineup.len()));
        }
        let mut seen = HashSet::with_capacity(LINEUP_SIZE);
        for id in lineup {
            if !seen.insert(id.as_str()) {
                return Err(LineupError::InvalidRoster(RosterIssue::DuplicateId {
                    team: self.home_team.clone().unwrap_or_default(),
                    id: id.clone(),
                }));
            }
        }

        if self.started_at.is_none() {
            self.started_at = Some(chrono::Utc::now().to_rfc3339());
        }
        for id in lineup {
            *self.player_minutes.entry(id.clone()).or_insert(0.0) += duration_minutes;
        }
        let number = self.stints.len() as u32 + 1;
        self.stints.push(Stint {
            number,
            lineup: lineup.to_vec(),
            home_goals,
            away_goals,
            duration_minutes,
        });
        tracing::debug!(number, home_goals, away_goals, duration_minutes, "stint recorded");
        Ok(&self.stints[self.stints.len() - 1])
    }

    /// (home, away) summed over all stints.
    pub fn total_score(&self) -> (u32, u32) {
        self.stints.iter().fold((0, 0), |(h, a), s| {
            (h + s.home_goals, a + s.away_goals)
        })
    }

    /// Home minus away.
    pub fn goal_diff(&self) -> i32 {
        let (home, away) = self.total_score();
        home as i32 - away as i32
    }

    /// Goal differential from `team`'s side: negated when it is the away team.
    pub fn goal_diff_for(&self, team: &str) -> i32 {
        if self.away_team.as_deref() == Some(team) && self.home_team.as_deref() != Some(team) {
            -self.goal_diff()
        } else {
            self.goal_diff()
        }
    }

    pub fn minutes_for(&self, player_id: &str) -> f64 {
        self.player_minutes.get(player_id).copied().unwrap_or(0.0)
    }

    /// `None` until someone has minutes, so a fresh game skips fatigue entirely.
    pub fn minutes_map(&self) -> Option<&HashMap<String, f64>> {
        if self.player_minutes.is_empty() {
            None
        } else {
            Some(&self.player_minutes)
        }
    }

    pub fn total_minutes(&self) -> f64 {
        self.stints.iter().map(|s| s.duration_minutes).sum()
    }

    /// Players sorted by minutes played, most first.
    pub fn minutes_leaderboard(&self) -> Vec<(&str, f64)> {
        let mut rows: Vec<(&str, f64)> = self
            .player_minutes
            .iter()
            .map(|(id, m)| (id.as_str(), *m))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(b.0)));
        rows
    }

    /// Clears score and minutes, keeping the matchup.
    pub fn reset(&mut self) {
        self.stints.clear();
        self.player_minutes.clear();
        self.started_at = None;
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read game state {}", path.display()))?;
        let state: GameState = serde_json::from_str(&raw)
            .with_context(|| format!("parse game state {}", path.display()))?;
        Ok(state)
    }

    /// Loads `path`, or starts an empty game when the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self {
                version: GAME_FILE_VERSION,
                ..Self::default()
            })
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("create game state dir")?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).context("serialize game state")?;
        fs::write(&tmp, json).context("write game state")?;
        fs::rename(&tmp, path).context("swap game state")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four(prefix: &str) -> Vec<String> {
        (1..=4).map(|i| format!("{prefix}_p{i}")).collect()
    }

    #[test]
    fn stints_accumulate_score_and_minutes() {
        let mut game = GameState::new("Canada", "Japan");
        game.add_stint(&four("Canada"), 2, 1, 2.0).unwrap();
        game.add_stint(&four("Canada"), 0, 3, 1.5).unwrap();
        assert_eq!(game.total_score(), (2, 4));
        assert_eq!(game.goal_diff(), -2);
        assert_eq!(game.goal_diff_for("Japan"), 2);
        assert_eq!(game.minutes_for("Canada_p1"), 3.5);
        assert_eq!(game.minutes_for("Canada_p9"), 0.0);
        assert_eq!(game.stints[1].number, 2);
        assert_eq!(game.total_minutes(), 3.5);
    }

    #[test]
    fn fresh_game_has_no_minutes_map() {
        let game = GameState::new("A", "B");
        assert!(game.minutes_map().is_none());
        assert_eq!(game.goal_diff(), 0);
    }

    #[test]
    fn rejects_bad_stints() {
        let mut game = GameState::new("A", "B");
        assert!(game.add_stint(&four("A"), 0, 0, 0.0).is_err());
        assert!(game.add_stint(&four("A")[..3], 0, 0, 1.0).is_err());
        let dup: Vec<String> = vec!["x".into(), "x".into(), "y".into(), "z".into()];
        assert!(game.add_stint(&dup, 0, 0, 1.0).is_err());
        assert!(game.stints.is_empty());
        assert!(game.player_minutes.is_empty());
    }

    #[test]
    fn reset_keeps_matchup() {
        let mut game = GameState::new("A", "B");
        game.add_stint(&four("A"), 1, 0, 2.0).unwrap();
        game.reset();
        assert!(game.stints.is_empty());
        assert!(game.minutes_map().is_none());
        assert_eq!(game.home_team.as_deref(), Some("A"));
    }
}
