pub mod adjust;
pub mod config;
pub mod error;
pub mod fatigue;
pub mod game;
pub mod recommend;
pub mod roster;
pub mod selector;
pub mod strategy;
pub mod weights;

pub use adjust::{AdjustedPlayer, adjust_values};
pub use config::OptimizerConfig;
pub use error::{LineupError, LineupResult, RosterIssue};
pub use fatigue::{FatigueParams, fatigue_multiplier};
pub use game::{GameState, Stint};
pub use recommend::{Recommendation, recommend, recommend_at};
pub use roster::{Player, Roster, display_name};
pub use selector::{
    Lineup, SearchLimits, SearchStrategy, SelectorConfig, lineup_score, select_lineup,
    select_lineup_with,
};
pub use strategy::{Strategy, strategy_label};
pub use weights::{Weights, offensive_weight};
