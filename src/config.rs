use std::env;
use std::time::Duration;

use crate::fatigue::FatigueParams;
use crate::selector::{SearchLimits, SearchStrategy, SelectorConfig};
use crate::weights::DEFAULT_MAX_GOAL_DIFF;

/// Tunables for a recommendation. `from_env` overrides the defaults with
/// `LINEUP_*` variables; unparsable values fall back silently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub fatigue: FatigueParams,
    pub max_goal_diff: i32,
    pub selector: SelectorConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            fatigue: FatigueParams::default(),
            max_goal_diff: DEFAULT_MAX_GOAL_DIFF,
            selector: SelectorConfig::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let parse_f64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());
        let parse_u64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let strategy = match lookup("LINEUP_SEARCH").as_deref().map(str::trim) {
            Some("exhaustive") => SearchStrategy::Exhaustive,
            Some("branch-and-bound") | Some("bnb") => SearchStrategy::BranchAndBound,
            _ => SearchStrategy::Auto,
        };

        Self {
            fatigue: FatigueParams {
                rate: parse_f64("LINEUP_FATIGUE_RATE").unwrap_or(d.fatigue.rate),
                max_penalty: parse_f64("LINEUP_MAX_FATIGUE_PENALTY")
                    .unwrap_or(d.fatigue.max_penalty),
            },
            max_goal_diff: lookup("LINEUP_MAX_GOAL_DIFF")
                .and_then(|v| v.trim().parse::<i32>().ok())
                .unwrap_or(d.max_goal_diff)
                .max(1),
            selector: SelectorConfig {
                cap: parse_f64("LINEUP_CAP").unwrap_or(d.selector.cap),
                strategy,
                limits: SearchLimits {
                    max_nodes: parse_u64("LINEUP_MAX_NODES"),
                    deadline: parse_u64("LINEUP_DEADLINE_MS").map(Duration::from_millis),
                },
            },
        }
    }
}
