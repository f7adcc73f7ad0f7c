use serde::{Deserialize, Serialize};

pub const DEFAULT_FATIGUE_RATE: f64 = 0.03;
pub const DEFAULT_MAX_PENALTY: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueParams {
    /// Effectiveness lost per minute on court.
    pub rate: f64,
    /// Ceiling on the total loss; the multiplier never drops below `1 - max_penalty`.
    pub max_penalty: f64,
}

impl Default for FatigueParams {
    fn default() -> Self {
        Self {
            rate: DEFAULT_FATIGUE_RATE,
            max_penalty: DEFAULT_MAX_PENALTY,
        }
    }
}

impl FatigueParams {
    pub fn with_rate(rate: f64) -> Self {
        Self {
            rate,
            ..Self::default()
        }
    }

    pub fn multiplier(&self, minutes: f64) -> f64 {
        fatigue_multiplier(minutes, self.rate, self.max_penalty)
    }

    /// Penalty as a percentage, for display next to a player's minutes.
    pub fn percent(&self, minutes: f64) -> f64 {
        (1.0 - self.multiplier(minutes)) * 100.0
    }
}

/// Maps accumulated minutes to a multiplicative effectiveness factor in
/// `[1 - max_penalty, 1.0]`.
///
/// Negative minutes are treated as a fresh player rather than a boost.
pub fn fatigue_multiplier(minutes: f64, rate: f64, max_penalty: f64) -> f64 {
    let minutes = minutes.max(0.0);
    let penalty = (rate * minutes).min(max_penalty).max(0.0);
    1.0 - penalty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_player_has_no_penalty() {
        assert_eq!(FatigueParams::default().multiplier(0.0), 1.0);
    }

    #[test]
    fn penalty_grows_linearly_then_caps() {
        let p = FatigueParams::default();
        assert!((p.multiplier(5.0) - 0.85).abs() < 1e-12);
        assert!((p.multiplier(10.0) - 0.70).abs() < 1e-12);
        assert!((p.multiplier(32.0) - 0.70).abs() < 1e-12);
    }

    #[test]
    fn negative_minutes_clamp_to_fresh() {
        assert_eq!(fatigue_multiplier(-4.0, 0.03, 0.30), 1.0);
    }

    #[test]
    fn percent_reports_penalty() {
        let p = FatigueParams::default();
        assert!((p.percent(5.0) - 15.0).abs() < 1e-9);
    }
}
