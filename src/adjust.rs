use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{LineupError, LineupResult};
use crate::fatigue::FatigueParams;
use crate::roster::Player;

/// A player's ratings after applying fatigue for one recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedPlayer {
    pub id: String,
    pub team: String,
    pub mobility_rating: f64,
    pub offensive_value: f64,
    pub defensive_value: f64,
    pub minutes_played: f64,
    pub fatigue_multiplier: f64,
    pub offensive_adjusted: f64,
    pub defensive_adjusted: f64,
}

impl AdjustedPlayer {
    /// Unadjusted view, used when the game has not started yet.
    pub fn fresh(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            team: player.team.clone(),
            mobility_rating: player.mobility_rating,
            offensive_value: player.offensive_value,
            defensive_value: player.defensive_value,
            minutes_played: 0.0,
            fatigue_multiplier: 1.0,
            offensive_adjusted: player.offensive_value,
            defensive_adjusted: player.defensive_value,
        }
    }

    pub fn with_minutes(player: &Player, minutes: f64, fatigue: FatigueParams) -> Self {
        let mult = fatigue.multiplier(minutes);
        Self {
            id: player.id.clone(),
            team: player.team.clone(),
            mobility_rating: player.mobility_rating,
            offensive_value: player.offensive_value,
            defensive_value: player.defensive_value,
            minutes_played: minutes,
            fatigue_multiplier: mult,
            // Tired players score less and concede more.
            offensive_adjusted: player.offensive_value * mult,
            defensive_adjusted: player.defensive_value / mult,
        }
    }

    pub fn net_adjusted(&self) -> f64 {
        self.offensive_adjusted - self.defensive_adjusted
    }

    /// Contribution to the lineup objective at a given offensive weight.
    pub fn weighted_value(&self, offensive_weight: f64) -> f64 {
        offensive_weight * self.offensive_adjusted
            - (1.0 - offensive_weight) * self.defensive_adjusted
    }
}

/// Applies fatigue to every player.
///
/// `None` means no minutes have been tracked at all and raw ratings pass
/// through untouched. With a map present, players missing from it are fresh.
pub fn adjust_values(
    players: &[Player],
    minutes_by_player: Option<&HashMap<String, f64>>,
    fatigue: FatigueParams,
) -> LineupResult<Vec<AdjustedPlayer>> {
    let Some(minutes_by_player) = minutes_by_player else {
        return Ok(players.iter().map(AdjustedPlayer::fresh).collect());
    };

    validate_fatigue(fatigue)?;

    players
        .iter()
        .map(|p| {
            let minutes = minutes_by_player.get(&p.id).copied().unwrap_or(0.0);
            if !minutes.is_finite() || minutes < 0.0 {
                tracing::warn!(player = %p.id, minutes, "rejecting minutes played");
                return Err(LineupError::invalid_input(
                    format!("minutes_played[{}]", p.id),
                    minutes,
                ));
            }
            Ok(AdjustedPlayer::with_minutes(p, minutes, fatigue))
        })
        .collect()
}

fn validate_fatigue(fatigue: FatigueParams) -> LineupResult<()> {
    if !fatigue.rate.is_finite() || fatigue.rate < 0.0 {
        return Err(LineupError::invalid_input("fatigue.rate", fatigue.rate));
    }
    // A penalty of 1.0 would zero the multiplier and divide defense by zero.
    if !(0.0..1.0).contains(&fatigue.max_penalty) {
        return Err(LineupError::invalid_input(
            "fatigue.max_penalty",
            fatigue.max_penalty,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Player> {
        vec![
            Player::new("A_p1", "A", 2.0, 10.0, 7.0),
            Player::new("A_p2", "A", 1.0, 4.0, 2.0),
        ]
    }

    #[test]
    fn no_minutes_passes_raw_values() {
        let out = adjust_values(&roster(), None, FatigueParams::default()).unwrap();
        assert_eq!(out[0].offensive_adjusted, 10.0);
        assert_eq!(out[0].defensive_adjusted, 7.0);
        assert_eq!(out[0].fatigue_multiplier, 1.0);
    }

    #[test]
    fn fatigue_lowers_offense_and_worsens_defense() {
        let minutes = HashMap::from([("A_p1".to_string(), 10.0)]);
        let out = adjust_values(&roster(), Some(&minutes), FatigueParams::default()).unwrap();
        assert!((out[0].fatigue_multiplier - 0.7).abs() < 1e-12);
        assert!((out[0].offensive_adjusted - 7.0).abs() < 1e-9);
        assert!((out[0].defensive_adjusted - 10.0).abs() < 1e-9);
        // Absent from the map: fresh.
        assert_eq!(out[1].fatigue_multiplier, 1.0);
        assert_eq!(out[1].minutes_played, 0.0);
    }

    #[test]
    fn negative_minutes_are_rejected() {
        let minutes = HashMap::from([("A_p2".to_string(), -1.0)]);
        let err = adjust_values(&roster(), Some(&minutes), FatigueParams::default()).unwrap_err();
        assert!(matches!(err, LineupError::InvalidInput { .. }));
    }

    #[test]
    fn full_penalty_is_rejected() {
        let minutes = HashMap::new();
        let fatigue = FatigueParams {
            rate: 0.03,
            max_penalty: 1.0,
        };
        assert!(adjust_values(&roster(), Some(&minutes), fatigue).is_err());
    }
}
