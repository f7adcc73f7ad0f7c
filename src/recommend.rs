use serde::{Deserialize, Serialize};

use crate::adjust::adjust_values;
use crate::config::OptimizerConfig;
use crate::error::{LineupError, LineupResult, RosterIssue};
use crate::game::GameState;
use crate::roster::Roster;
use crate::selector::{Lineup, select_lineup_with};
use crate::strategy::Strategy;
use crate::weights::Weights;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub team: String,
    /// From `team`'s side: positive when it leads.
    pub goal_diff: i32,
    pub weights: Weights,
    pub strategy: Strategy,
    pub lineup: Lineup,
}

/// Best lineup for `team` given the score and minutes recorded in `game`.
pub fn recommend(
    roster: &Roster,
    team: &str,
    game: &GameState,
    config: &OptimizerConfig,
) -> LineupResult<Recommendation> {
    recommend_at(roster, team, game.goal_diff_for(team), game, config)
}

/// Like [`recommend`], with an explicit goal differential for `team`.
pub fn recommend_at(
    roster: &Roster,
    team: &str,
    goal_diff: i32,
    game: &GameState,
    config: &OptimizerConfig,
) -> LineupResult<Recommendation> {
    let team_players = roster.team_players(team);
    if team_players.is_empty() {
        return Err(LineupError::InvalidRoster(RosterIssue::TooFewPlayers {
            team: team.to_string(),
            available: 0,
        }));
    }

    let adjusted = adjust_values(&team_players, game.minutes_map(), config.fatigue)?;
    let weights = Weights::for_goal_diff(goal_diff, config.max_goal_diff);
    let strategy = Strategy::from_weight(weights.offense);
    tracing::debug!(
        team,
        goal_diff,
        offense = weights.offense,
        strategy = %strategy,
        players = adjusted.len(),
        "recommending lineup"
    );

    let lineup = select_lineup_with(&adjusted, weights.offense, &config.selector)?;
    Ok(Recommendation {
        team: team.to_string(),
        goal_diff,
        weights,
        strategy,
        lineup,
    })
}
