use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{LineupError, LineupResult, RosterIssue};

/// Static per-player ratings. Rows of `player_values.csv` deserialize into
/// this directly; any extra columns in the file are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(rename = "player")]
    pub id: String,
    pub team: String,
    pub mobility_rating: f64,
    #[serde(rename = "O_posterior")]
    pub offensive_value: f64,
    /// Points conceded while on court: higher is worse.
    #[serde(rename = "D_posterior")]
    pub defensive_value: f64,
}

impl Player {
    pub fn new(
        id: impl Into<String>,
        team: impl Into<String>,
        mobility_rating: f64,
        offensive_value: f64,
        defensive_value: f64,
    ) -> Self {
        Self {
            id: id.into(),
            team: team.into(),
            mobility_rating,
            offensive_value,
            defensive_value,
        }
    }

    pub(crate) fn validate(&self) -> LineupResult<()> {
        if !self.mobility_rating.is_finite() || self.mobility_rating < 0.0 {
            return Err(LineupError::invalid_input(
                format!("{}.mobility_rating", self.id),
                self.mobility_rating,
            ));
        }
        if !self.offensive_value.is_finite() {
            return Err(LineupError::invalid_input(
                format!("{}.offensive_value", self.id),
                self.offensive_value,
            ));
        }
        if !self.defensive_value.is_finite() {
            return Err(LineupError::invalid_input(
                format!("{}.defensive_value", self.id),
                self.defensive_value,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Ids must be unique across the whole roster, since game minutes are
    /// keyed by id alone, and every rating finite.
    pub fn from_players(players: Vec<Player>) -> LineupResult<Self> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(players.len());
        for p in &players {
            p.validate()?;
            if !seen.insert(p.id.as_str()) {
                return Err(LineupError::InvalidRoster(RosterIssue::DuplicateId {
                    team: p.team.clone(),
                    id: p.id.clone(),
                }));
            }
        }
        Ok(Self { players })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("open roster file {}", path.display()))?;
        Self::from_csv_reader(file).with_context(|| format!("load roster {}", path.display()))
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut players = Vec::new();
        for (idx, row) in rdr.deserialize::<Player>().enumerate() {
            // +2: header line and 1-based numbering.
            let player = row.with_context(|| format!("parse roster row {}", idx + 2))?;
            players.push(player);
        }
        Ok(Self::from_players(players)?)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Sorted, de-duplicated team names.
    pub fn teams(&self) -> Vec<String> {
        self.players
            .iter()
            .map(|p| p.team.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn team_players(&self, team: &str) -> Vec<Player> {
        self.players
            .iter()
            .filter(|p| p.team == team)
            .cloned()
            .collect()
    }

    pub fn get(&self, team: &str, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.team == team && p.id == id)
    }
}

/// Short form of a roster id for display: `Canada_p1` becomes `Canada_1`.
pub fn display_name(id: &str) -> String {
    if id.contains("Great Britain") || id.contains("Great_Britain") {
        let joined = id.replace("Great Britain", "Great_Britain");
        let parts: Vec<&str> = joined.split('_').collect();
        if parts.len() >= 2 {
            let num = parts.last().map(|s| s.replace('p', "")).unwrap_or_default();
            return format!("Great_Britain_{num}");
        }
    }

    let parts: Vec<&str> = id.split('_').collect();
    match (parts.first(), parts.last()) {
        (Some(team), Some(last)) if parts.len() >= 2 => {
            format!("{team}_{}", last.replace('p', ""))
        }
        _ => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_shortens_ids() {
        assert_eq!(display_name("Canada_p1"), "Canada_1");
        assert_eq!(display_name("Great Britain_p12"), "Great_Britain_12");
        assert_eq!(display_name("Great_Britain_p3"), "Great_Britain_3");
        assert_eq!(display_name("solo"), "solo");
    }

    #[test]
    fn duplicate_ids_within_team_are_rejected() {
        let err = Roster::from_players(vec![
            Player::new("A_p1", "A", 1.0, 1.0, 1.0),
            Player::new("A_p1", "A", 2.0, 1.0, 1.0),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            LineupError::InvalidRoster(RosterIssue::DuplicateId { .. })
        ));
    }

    #[test]
    fn same_id_on_two_teams_is_rejected() {
        let err = Roster::from_players(vec![
            Player::new("p1", "A", 1.0, 1.0, 1.0),
            Player::new("p1", "B", 1.0, 1.0, 1.0),
        ])
        .unwrap_err();
        match err {
            LineupError::InvalidRoster(RosterIssue::DuplicateId { team, id }) => {
                assert_eq!(team, "B");
                assert_eq!(id, "p1");
            }
            other => panic!("expected duplicate id, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_rating_is_rejected() {
        let err = Roster::from_players(vec![Player::new("p1", "A", f64::NAN, 1.0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, LineupError::InvalidInput { .. }));
    }

    #[test]
    fn csv_reader_ignores_extra_columns() {
        let raw = "player,team,mobility_rating,O_posterior,D_posterior,Net\n\
                   Canada_p1,Canada,1.5,4.2,3.1,1.1\n\
                   Canada_p2, Canada ,3.0,5.0,4.0,1.0\n";
        let roster = Roster::from_csv_reader(raw.as_bytes()).unwrap();
        assert_eq!(roster.len(), 2);
        let p2 = roster.get("Canada", "Canada_p2").unwrap();
        assert_eq!(p2.mobility_rating, 3.0);
        assert_eq!(p2.offensive_value, 5.0);
    }
}
