pub mod batch;

pub use batch::{
    batch_ranges, simulate_match, simulate_matchup, MatchResult, MatchupReport, MAX_TURNS,
};
