//! Headless match simulation, fanned out over rayon.
//!
//! Each match runs on its own [CombatEngine] with a virtual clock, so a batch costs only
//! CPU. Match `i` of a run with base seed `s` always rolls from `Rng::new(s + i)`, which
//! keeps reports reproducible regardless of how batches land on threads.

use rayon::prelude::*;
use serde::Serialize;

use crate::catalog::CardDefinition;
use crate::combat::{CombatEngine, MatchState, Rng, Side};
use crate::config::TimingConfig;

/// Turns after which a simulated match is abandoned as unfinished.
pub const MAX_TURNS: u32 = 500;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; earlier batches take the remainder.
///
/// # Example
/// ```
/// # use diceduel::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + usize::from(i < remainder);
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub winner: Option<Side>,
    pub turns: u32,
    pub duration_ms: u64,
}

/// Play one match to completion with random rolls.
pub fn simulate_match(
    player: &CardDefinition,
    enemy: &CardDefinition,
    timing: TimingConfig,
    seed: u64,
) -> MatchResult {
    let mut rng = Rng::new(seed);
    let mut engine = CombatEngine::new(MatchState::new(player, enemy), timing);
    let mut turns = 0;
    while !engine.state().is_over() && turns < MAX_TURNS {
        if !engine.roll(rng.roll_die()).is_accepted() {
            break;
        }
        engine.run_until_settled();
        turns += 1;
    }
    MatchResult {
        winner: engine.state().winner(),
        turns,
        duration_ms: engine.now_ms(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupReport {
    pub player: String,
    pub enemy: String,
    pub matches: usize,
    pub player_wins: usize,
    pub enemy_wins: usize,
    pub unfinished: usize,
    pub avg_turns: f64,
    pub player_win_rate: f64,
}

/// Run `matches` seeded matches of `player` vs `enemy` in parallel and aggregate them.
pub fn simulate_matchup(
    player: &CardDefinition,
    enemy: &CardDefinition,
    timing: TimingConfig,
    matches: usize,
    seed: u64,
) -> MatchupReport {
    let batches = batch_ranges(matches, rayon::current_num_threads().max(1) * 4);
    let results: Vec<MatchResult> = batches
        .par_iter()
        .flat_map_iter(|&(start, end)| {
            (start..end).map(move |index| {
                simulate_match(player, enemy, timing, seed.wrapping_add(index as u64))
            })
        })
        .collect();

    let player_wins = count_winner(&results, Some(Side::Player));
    let enemy_wins = count_winner(&results, Some(Side::Enemy));
    let unfinished = count_winner(&results, None);
    let total_turns: u64 = results.iter().map(|result| u64::from(result.turns)).sum();
    let (avg_turns, player_win_rate) = if matches == 0 {
        (0.0, 0.0)
    } else {
        (
            total_turns as f64 / matches as f64,
            player_wins as f64 / matches as f64,
        )
    };

    MatchupReport {
        player: player.name.clone(),
        enemy: enemy.name.clone(),
        matches,
        player_wins,
        enemy_wins,
        unfinished,
        avg_turns,
        player_win_rate,
    }
}

fn count_winner(results: &[MatchResult], winner: Option<Side>) -> usize {
    results.iter().filter(|result| result.winner == winner).count()
}
