//! Bracket Core - expected-value bracket optimizer for single-elimination
//! tournament pools.
//!
//! Given per-team, per-round win probabilities and a pool scoring rule, finds
//! the full bracket with the highest expected score. Optional Python bindings
//! via PyO3 live behind the `python` feature.

pub mod bracket;
pub mod config;
pub mod constants;
pub mod error;
pub mod ingest;
pub mod optimizer;
pub mod pipeline;
pub mod render;
pub mod scoring;
pub mod solver;
pub mod team;

#[cfg(feature = "python")]
mod python;

pub use crate::bracket::{feeder_games, games_in_round, team_range, Bracket, Pick};
pub use crate::config::AppConfig;
pub use crate::constants::{DEFAULT_ROUNDS, MAX_ROUNDS, OUTPUT_FILE_NAME};
pub use crate::error::{BracketError, Result};
pub use crate::ingest::{read_teams, read_teams_from_reader, write_legible, write_legible_to_writer};
pub use crate::optimizer::{best_bracket, par_best_bracket, OptimalBracket};
pub use crate::pipeline::{build_ev_bracket, run, RunOptions, RunSummary};
pub use crate::render::{make_legible, LegibleRow};
pub use crate::scoring::{ScoringRow, ScoringRule, ScoringTable};
pub use crate::solver::{CacheStats, Solution, SubproblemKey, SubtournamentSolver};
pub use crate::team::TeamEntry;
