use std::fmt;

use thiserror::Error;

/// Why a roster cannot produce a lineup regardless of ratings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterIssue {
    TooFewPlayers { team: String, available: usize },
    DuplicateId { team: String, id: String },
    MixedTeams { first: String, other: String },
}

impl fmt::Display for RosterIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterIssue::TooFewPlayers { team, available } => write!(
                f,
                "team '{team}' has {available} players, a lineup needs {}",
                crate::selector::LINEUP_SIZE
            ),
            RosterIssue::DuplicateId { team, id } => {
                write!(f, "player id '{id}' appears more than once for team '{team}'")
            }
            RosterIssue::MixedTeams { first, other } => {
                write!(f, "players from '{first}' and '{other}' cannot share a lineup")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineupError {
    #[error(
        "no 4-player lineup fits the classification cap {cap:.2} (smallest possible total is {min_mobility_sum:.2})"
    )]
    Infeasible { cap: f64, min_mobility_sum: f64 },

    #[error("invalid roster: {0}")]
    InvalidRoster(RosterIssue),

    #[error("invalid input: {field} = {value}")]
    InvalidInput { field: String, value: String },

    #[error("lineup search stopped after {nodes_visited} nodes ({limit})")]
    SearchBudgetExhausted { nodes_visited: u64, limit: String },
}

impl LineupError {
    pub(crate) fn invalid_input(field: impl Into<String>, value: impl fmt::Display) -> Self {
        LineupError::InvalidInput {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

pub type LineupResult<T> = Result<T, LineupError>;
