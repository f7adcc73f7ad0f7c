use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    HighlyOffensive,
    Offensive,
    Balanced,
    Defensive,
    HighlyDefensive,
}

impl Strategy {
    /// Lower bounds are inclusive: 0.55 is `Offensive`, not `Balanced`.
    pub fn from_weight(offensive_weight: f64) -> Self {
        if offensive_weight >= 0.70 {
            Strategy::HighlyOffensive
        } else if offensive_weight >= 0.55 {
            Strategy::Offensive
        } else if offensive_weight >= 0.45 {
            Strategy::Balanced
        } else if offensive_weight >= 0.30 {
            Strategy::Defensive
        } else {
            Strategy::HighlyDefensive
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::HighlyOffensive => "HIGHLY OFFENSIVE",
            Strategy::Offensive => "OFFENSIVE",
            Strategy::Balanced => "BALANCED",
            Strategy::Defensive => "DEFENSIVE",
            Strategy::HighlyDefensive => "HIGHLY DEFENSIVE",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn strategy_label(offensive_weight: f64) -> Strategy {
    Strategy::from_weight(offensive_weight)
}
