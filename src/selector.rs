//! Picks the best 4-player lineup under the classification cap.
//!
//! The problem is a 4-of-n selection with a linear objective and one
//! knapsack-style constraint. Two exact searches are available:
//!
//! * exhaustive enumeration of all `C(n, 4)` subsets, split across rayon
//!   workers by first player; about 91k subsets at n = 40.
//! * depth-first branch-and-bound over id-sorted players that cuts a branch
//!   when even the lightest completion breaks the cap, or when the best
//!   possible completion cannot beat the incumbent.
//!
//! Both return the same lineup. Among equal scores the lexicographically
//! smallest tuple of player ids wins.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::adjust::AdjustedPlayer;
use crate::error::{LineupError, LineupResult, RosterIssue};
use crate::weights::validate_weight;

pub const LINEUP_SIZE: usize = 4;
pub const DEFAULT_CLASSIFICATION_CAP: f64 = 8.0;
/// Largest roster `SearchStrategy::Auto` enumerates exhaustively.
pub const EXHAUSTIVE_ROSTER_LIMIT: usize = 40;

// Slack for pruning tests whose sums are formed in a different order than
// the leaf sums they stand in for. Leaf feasibility itself is exact.
const PRUNE_SLACK: f64 = 1e-9;
const DEADLINE_CHECK_EVERY: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchStrategy {
    #[default]
    Auto,
    Exhaustive,
    BranchAndBound,
}

/// Caller-imposed bound on search effort. Running out is reported as
/// `LineupError::SearchBudgetExhausted`, never answered with a partial result.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchLimits {
    pub max_nodes: Option<u64>,
    pub deadline: Option<Duration>,
}

impl SearchLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn nodes(max_nodes: u64) -> Self {
        Self {
            max_nodes: Some(max_nodes),
            deadline: None,
        }
    }
}

impl fmt::Display for SearchLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.max_nodes, self.deadline) {
            (Some(n), Some(d)) => write!(f, "node limit {n}, deadline {}ms", d.as_millis()),
            (Some(n), None) => write!(f, "node limit {n}"),
            (None, Some(d)) => write!(f, "deadline {}ms", d.as_millis()),
            (None, None) => f.write_str("unlimited"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorConfig {
    pub cap: f64,
    pub strategy: SearchStrategy,
    pub limits: SearchLimits,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            cap: DEFAULT_CLASSIFICATION_CAP,
            strategy: SearchStrategy::Auto,
            limits: SearchLimits::unlimited(),
        }
    }
}

impl SelectorConfig {
    pub fn with_cap(cap: f64) -> Self {
        Self {
            cap,
            ..Self::default()
        }
    }
}

/// Exactly four players from one team, sorted by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub players: Vec<AdjustedPlayer>,
    pub score: f64,
    pub total_mobility: f64,
    pub offensive_weight: f64,
    pub cap: f64,
}

impl Lineup {
    pub fn ids(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn team(&self) -> &str {
        self.players.first().map(|p| p.team.as_str()).unwrap_or("")
    }

    pub fn total_offense(&self) -> f64 {
        self.players.iter().map(|p| p.offensive_adjusted).sum()
    }

    pub fn total_defense(&self) -> f64 {
        self.players.iter().map(|p| p.defensive_adjusted).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchStats {
    pub strategy: SearchStrategy,
    pub nodes_visited: u64,
    pub elapsed: Duration,
}

/// Objective for any group of players:
/// `w * sum(offense) - (1 - w) * sum(defense)`, accumulated player by player.
pub fn lineup_score(players: &[AdjustedPlayer], offensive_weight: f64) -> f64 {
    players
        .iter()
        .fold(0.0, |acc, p| acc + p.weighted_value(offensive_weight))
}

pub fn select_lineup(
    players: &[AdjustedPlayer],
    offensive_weight: f64,
    cap: f64,
) -> LineupResult<Lineup> {
    select_lineup_with(players, offensive_weight, &SelectorConfig::with_cap(cap))
}

pub fn select_lineup_with(
    players: &[AdjustedPlayer],
    offensive_weight: f64,
    config: &SelectorConfig,
) -> LineupResult<Lineup> {
    select_lineup_with_stats(players, offensive_weight, config).map(|(lineup, _)| lineup)
}

pub fn select_lineup_with_stats(
    players: &[AdjustedPlayer],
    offensive_weight: f64,
    config: &SelectorConfig,
) -> LineupResult<(Lineup, SearchStats)> {
    validate_weight(offensive_weight)?;
    let cap = config.cap;
    if !cap.is_finite() || cap < 0.0 {
        return Err(LineupError::invalid_input("cap", cap));
    }

    let order = validated_order(players)?;
    let candidates = Candidates::new(players, &order, offensive_weight);

    let strategy = match config.strategy {
        SearchStrategy::Auto if candidates.len() <= EXHAUSTIVE_ROSTER_LIMIT => {
            SearchStrategy::Exhaustive
        }
        SearchStrategy::Auto => SearchStrategy::BranchAndBound,
        other => other,
    };

    let started = Instant::now();
    let budget = Budget::new(config.limits, started);
    let best = match strategy {
        SearchStrategy::Exhaustive => exhaustive(&candidates, cap, &budget),
        _ => BranchAndBound::new(&candidates, cap, &budget).run(),
    };
    let stats = SearchStats {
        strategy,
        nodes_visited: budget.visited(),
        elapsed: started.elapsed(),
    };

    if budget.is_exhausted() {
        tracing::warn!(limits = %config.limits, nodes = stats.nodes_visited, "lineup search budget exhausted");
        return Err(LineupError::SearchBudgetExhausted {
            nodes_visited: stats.nodes_visited,
            limit: config.limits.to_string(),
        });
    }
    // Feasibility is whatever the exact leaf checks found; the sorted minimum
    // only describes the failure.
    let Some(best) = best else {
        return Err(LineupError::Infeasible {
            cap,
            min_mobility_sum: candidates.min_mobility_sum(),
        });
    };

    tracing::debug!(
        strategy = ?stats.strategy,
        nodes = stats.nodes_visited,
        elapsed_us = stats.elapsed.as_micros() as u64,
        score = best.score,
        "lineup selected"
    );

    let chosen: Vec<AdjustedPlayer> = best
        .idx
        .iter()
        .map(|&i| players[order[i]].clone())
        .collect();
    let total_mobility = chosen.iter().fold(0.0, |acc, p| acc + p.mobility_rating);
    Ok((
        Lineup {
            players: chosen,
            score: best.score,
            total_mobility,
            offensive_weight,
            cap,
        },
        stats,
    ))
}

/// Checks roster shape and ratings, returning player indices sorted by id.
fn validated_order(players: &[AdjustedPlayer]) -> LineupResult<Vec<usize>> {
    let team = players.first().map(|p| p.team.clone()).unwrap_or_default();
    if players.len() < LINEUP_SIZE {
        return Err(LineupError::InvalidRoster(RosterIssue::TooFewPlayers {
            team,
            available: players.len(),
        }));
    }

    for p in players {
        if p.team != team {
            return Err(LineupError::InvalidRoster(RosterIssue::MixedTeams {
                first: team,
                other: p.team.clone(),
            }));
        }
        if !p.mobility_rating.is_finite() || p.mobility_rating < 0.0 {
            return Err(LineupError::invalid_input(
                format!("{}.mobility_rating", p.id),
                p.mobility_rating,
            ));
        }
        if !p.offensive_adjusted.is_finite() || !p.defensive_adjusted.is_finite() {
            return Err(LineupError::invalid_input(
                format!("{}.adjusted_values", p.id),
                format!("({}, {})", p.offensive_adjusted, p.defensive_adjusted),
            ));
        }
    }

    let mut order: Vec<usize> = (0..players.len()).collect();
    order.sort_by(|&a, &b| players[a].id.cmp(&players[b].id));
    for pair in order.windows(2) {
        if players[pair[0]].id == players[pair[1]].id {
            return Err(LineupError::InvalidRoster(RosterIssue::DuplicateId {
                team,
                id: players[pair[0]].id.clone(),
            }));
        }
    }
    Ok(order)
}

/// Id-sorted, flattened view of the roster for the searches.
struct Candidates {
    mobility: Vec<f64>,
    value: Vec<f64>,
}

impl Candidates {
    fn new(players: &[AdjustedPlayer], order: &[usize], offensive_weight: f64) -> Self {
        Self {
            mobility: order.iter().map(|&i| players[i].mobility_rating).collect(),
            value: order
                .iter()
                .map(|&i| players[i].weighted_value(offensive_weight))
                .collect(),
        }
    }

    fn len(&self) -> usize {
        self.mobility.len()
    }

    fn min_mobility_sum(&self) -> f64 {
        let mut sorted = self.mobility.clone();
        sorted.sort_by(f64::total_cmp);
        sorted.iter().take(LINEUP_SIZE).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Best {
    score: f64,
    idx: [usize; LINEUP_SIZE],
}

impl Best {
    fn beats(&self, other: &Best) -> bool {
        self.score > other.score || (self.score == other.score && self.idx < other.idx)
    }
}

fn pick(a: Option<Best>, b: Option<Best>) -> Option<Best> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if y.beats(&x) { y } else { x }),
        (x, None) => x,
        (None, y) => y,
    }
}

struct Budget {
    max_nodes: Option<u64>,
    deadline: Option<Instant>,
    visited: AtomicU64,
    exhausted: AtomicBool,
}

impl Budget {
    fn new(limits: SearchLimits, started: Instant) -> Self {
        Self {
            max_nodes: limits.max_nodes,
            deadline: limits.deadline.map(|d| started + d),
            visited: AtomicU64::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    /// Records `nodes` more visited nodes; false once the budget is gone.
    fn charge(&self, nodes: u64) -> bool {
        if self.exhausted.load(Ordering::Relaxed) {
            return false;
        }
        let before = self.visited.fetch_add(nodes, Ordering::Relaxed);
        let total = before + nodes;
        let over_nodes = self.max_nodes.is_some_and(|max| total > max);
        let crossed_check = before / DEADLINE_CHECK_EVERY != total / DEADLINE_CHECK_EVERY;
        let over_time =
            crossed_check && self.deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if over_nodes || over_time {
            self.exhausted.store(true, Ordering::Relaxed);
            return false;
        }
        true
    }

    fn visited(&self) -> u64 {
        self.visited.load(Ordering::Relaxed)
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Relaxed)
    }
}

fn exhaustive(c: &Candidates, cap: f64, budget: &Budget) -> Option<Best> {
    let n = c.len();
    (0..n)
        .into_par_iter()
        .map(|a| scan_from(c, cap, budget, a))
        .reduce(|| None, pick)
}

/// Every subset whose smallest index is `a`. Nodes are counted per leaf.
fn scan_from(c: &Candidates, cap: f64, budget: &Budget, a: usize) -> Option<Best> {
    let n = c.len();
    let mut best: Option<Best> = None;
    for b in (a + 1)..n {
        let mob_ab = c.mobility[a] + c.mobility[b];
        let val_ab = c.value[a] + c.value[b];
        for k in (b + 1)..n {
            let leaves = (n - k - 1) as u64;
            if leaves == 0 {
                continue;
            }
            if !budget.charge(leaves) {
                return None;
            }
            let mob_abk = mob_ab + c.mobility[k];
            let val_abk = val_ab + c.value[k];
            for d in (k + 1)..n {
                if mob_abk + c.mobility[d] > cap {
                    continue;
                }
                let candidate = Best {
                    score: val_abk + c.value[d],
                    idx: [a, b, k, d],
                };
                best = pick(best, Some(candidate));
            }
        }
    }
    best
}

struct BranchAndBound<'a> {
    c: &'a Candidates,
    cap: f64,
    budget: &'a Budget,
    // suffix_min_mobility[i][k]: sum of the k smallest mobility ratings in i..n.
    suffix_min_mobility: Vec<[f64; LINEUP_SIZE]>,
    // suffix_max_value[i][k]: sum of the k largest objective values in i..n.
    suffix_max_value: Vec<[f64; LINEUP_SIZE]>,
    best: Option<Best>,
    chosen: [usize; LINEUP_SIZE],
}

impl<'a> BranchAndBound<'a> {
    fn new(c: &'a Candidates, cap: f64, budget: &'a Budget) -> Self {
        let n = c.len();
        let mut suffix_min_mobility = vec![[0.0; LINEUP_SIZE]; n + 1];
        let mut suffix_max_value = vec![[0.0; LINEUP_SIZE]; n + 1];
        let mut lightest: Vec<f64> = Vec::with_capacity(LINEUP_SIZE);
        let mut strongest: Vec<f64> = Vec::with_capacity(LINEUP_SIZE);
        for i in (0..n).rev() {
            keep_extremes(&mut lightest, c.mobility[i], |a, b| a.total_cmp(b));
            keep_extremes(&mut strongest, c.value[i], |a, b| b.total_cmp(a));
            for k in 1..LINEUP_SIZE {
                suffix_min_mobility[i][k] = lightest.iter().take(k).sum();
                suffix_max_value[i][k] = strongest.iter().take(k).sum();
            }
        }
        Self {
            c,
            cap,
            budget,
            suffix_min_mobility,
            suffix_max_value,
            best: None,
            chosen: [0; LINEUP_SIZE],
        }
    }

    fn run(mut self) -> Option<Best> {
        self.descend(0, 0, 0.0, 0.0);
        self.best
    }

    fn descend(&mut self, start: usize, depth: usize, value: f64, mobility: f64) -> bool {
        if depth == LINEUP_SIZE {
            if mobility <= self.cap {
                self.best = pick(
                    self.best,
                    Some(Best {
                        score: value,
                        idx: self.chosen,
                    }),
                );
            }
            return true;
        }

        let n = self.c.len();
        let need_after = LINEUP_SIZE - depth - 1;
        for i in start..(n - need_after) {
            if !self.budget.charge(1) {
                return false;
            }
            let mob = mobility + self.c.mobility[i];
            if mob + self.suffix_min_mobility[i + 1][need_after] > self.cap + PRUNE_SLACK {
                continue;
            }
            let val = value + self.c.value[i];
            if let Some(best) = self.best {
                let bound = val + self.suffix_max_value[i + 1][need_after];
                if bound < best.score - PRUNE_SLACK * (1.0 + best.score.abs()) {
                    continue;
                }
            }
            self.chosen[depth] = i;
            if !self.descend(i + 1, depth + 1, val, mob) {
                return false;
            }
        }
        true
    }
}

/// Keeps the `LINEUP_SIZE - 1` most extreme values seen so far, ordered by `cmp`.
fn keep_extremes(kept: &mut Vec<f64>, x: f64, cmp: impl Fn(&f64, &f64) -> std::cmp::Ordering) {
    let pos = kept
        .iter()
        .position(|k| cmp(&x, k) == std::cmp::Ordering::Less)
        .unwrap_or(kept.len());
    if pos < LINEUP_SIZE - 1 {
        kept.insert(pos, x);
        kept.truncate(LINEUP_SIZE - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, mobility: f64, off: f64, def: f64) -> AdjustedPlayer {
        AdjustedPlayer {
            id: id.to_string(),
            team: "T".to_string(),
            mobility_rating: mobility,
            offensive_value: off,
            defensive_value: def,
            minutes_played: 0.0,
            fatigue_multiplier: 1.0,
            offensive_adjusted: off,
            defensive_adjusted: def,
        }
    }

    #[test]
    fn keep_extremes_tracks_smallest_three() {
        let mut kept = Vec::new();
        for x in [5.0, 1.0, 4.0, 2.0, 3.0] {
            keep_extremes(&mut kept, x, |a, b| a.total_cmp(b));
        }
        assert_eq!(kept, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn ties_resolve_to_smallest_ids_in_both_strategies() {
        let players: Vec<AdjustedPlayer> = ["e", "d", "c", "b", "a"]
            .iter()
            .map(|id| player(id, 2.0, 1.0, 1.0))
            .collect();
        for strategy in [SearchStrategy::Exhaustive, SearchStrategy::BranchAndBound] {
            let cfg = SelectorConfig {
                strategy,
                ..SelectorConfig::default()
            };
            let lineup = select_lineup_with(&players, 0.5, &cfg).unwrap();
            assert_eq!(lineup.ids(), vec!["a", "b", "c", "d"]);
        }
    }

    #[test]
    fn node_limit_is_reported_not_approximated() {
        let players: Vec<AdjustedPlayer> = (0..12)
            .map(|i| player(&format!("p{i:02}"), 1.0, i as f64, 0.0))
            .collect();
        let cfg = SelectorConfig {
            limits: SearchLimits::nodes(3),
            strategy: SearchStrategy::BranchAndBound,
            ..SelectorConfig::default()
        };
        let err = select_lineup_with(&players, 0.5, &cfg).unwrap_err();
        assert!(matches!(err, LineupError::SearchBudgetExhausted { .. }));
    }

    #[test]
    fn node_limit_stops_parallel_enumeration() {
        let players: Vec<AdjustedPlayer> = (0..12)
            .map(|i| player(&format!("p{i:02}"), 1.0, i as f64, 0.0))
            .collect();
        let cfg = SelectorConfig {
            limits: SearchLimits::nodes(10),
            strategy: SearchStrategy::Exhaustive,
            ..SelectorConfig::default()
        };
        match select_lineup_with(&players, 0.5, &cfg) {
            Err(LineupError::SearchBudgetExhausted {
                nodes_visited,
                limit,
            }) => {
                assert!(nodes_visited > 10);
                assert_eq!(limit, "node limit 10");
            }
            other => panic!("expected exhausted budget, got {other:?}"),
        }
    }

    #[test]
    fn elapsed_deadline_exhausts_both_strategies() {
        // Equal values leave nothing to prune, so either search runs well past
        // the first deadline check.
        let players: Vec<AdjustedPlayer> = (0..48)
            .map(|i| player(&format!("p{i:02}"), 1.0, 1.0, 1.0))
            .collect();
        for strategy in [SearchStrategy::Exhaustive, SearchStrategy::BranchAndBound] {
            let cfg = SelectorConfig {
                strategy,
                limits: SearchLimits {
                    max_nodes: None,
                    deadline: Some(Duration::ZERO),
                },
                ..SelectorConfig::default()
            };
            assert!(
                matches!(
                    select_lineup_with(&players, 0.5, &cfg),
                    Err(LineupError::SearchBudgetExhausted { .. })
                ),
                "{strategy:?} ignored the deadline"
            );
        }
    }

    #[test]
    fn feasibility_follows_the_leaf_sum_not_the_sorted_minimum() {
        // Sorted, these sum to 3.4000000000000004; in id order they make 3.4.
        let players = vec![
            player("a", 1.3, 1.0, 0.0),
            player("b", 0.7, 1.0, 0.0),
            player("c", 1.3, 1.0, 0.0),
            player("d", 0.1, 1.0, 0.0),
        ];
        for strategy in [SearchStrategy::Exhaustive, SearchStrategy::BranchAndBound] {
            let cfg = SelectorConfig {
                strategy,
                ..SelectorConfig::with_cap(3.4)
            };
            let lineup = select_lineup_with(&players, 0.5, &cfg).unwrap();
            assert_eq!(lineup.ids(), vec!["a", "b", "c", "d"]);
            assert!(lineup.total_mobility <= 3.4);
        }
    }

    #[test]
    fn stats_report_strategy_chosen_by_auto() {
        let players: Vec<AdjustedPlayer> = (0..6)
            .map(|i| player(&format!("p{i}"), 1.0, i as f64, 0.0))
            .collect();
        let (_, stats) =
            select_lineup_with_stats(&players, 0.5, &SelectorConfig::default()).unwrap();
        assert_eq!(stats.strategy, SearchStrategy::Exhaustive);
        assert_eq!(stats.nodes_visited, 15);
    }
}
