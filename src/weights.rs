use serde::{Deserialize, Serialize};

use crate::error::{LineupError, LineupResult};

/// Goal differential at which the weighting saturates.
pub const DEFAULT_MAX_GOAL_DIFF: i32 = 20;

/// Offensive weight in `[0, 1]` for a goal differential (home minus away).
///
/// Trailing pushes toward 1.0, leading toward 0.0, a tie gives exactly 0.5.
/// The trailing side is derived as `1 - w(lead)` so that `w(g) + w(-g) == 1.0`
/// holds bit-exactly rather than up to rounding.
pub fn offensive_weight(goal_diff: i32, max_diff: i32) -> f64 {
    let lead_weight = leading_weight(goal_diff.unsigned_abs(), max_diff);
    if goal_diff < 0 {
        1.0 - lead_weight
    } else {
        lead_weight
    }
}

fn leading_weight(lead: u32, max_diff: i32) -> f64 {
    let max_diff = f64::from(max_diff.max(1));
    let n = (-f64::from(lead) / max_diff).clamp(-1.0, 1.0);
    0.5 + 0.5 * n
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub offense: f64,
    pub defense: f64,
}

impl Weights {
    pub fn for_goal_diff(goal_diff: i32, max_diff: i32) -> Self {
        let offense = offensive_weight(goal_diff, max_diff);
        Self {
            offense,
            defense: 1.0 - offense,
        }
    }

    /// Wraps a caller-supplied weight that bypassed the scheduler.
    pub fn from_offense(offense: f64) -> LineupResult<Self> {
        validate_weight(offense)?;
        Ok(Self {
            offense,
            defense: 1.0 - offense,
        })
    }
}

pub(crate) fn validate_weight(offense: f64) -> LineupResult<()> {
    if !(0.0..=1.0).contains(&offense) {
        return Err(LineupError::invalid_input("offensive_weight", offense));
    }
    Ok(())
}
