use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building an expected-value bracket.
///
/// None of these are recoverable mid-run: the computation is deterministic,
/// so the whole run aborts and reports.
#[derive(Debug, Error)]
pub enum BracketError {
    /// Bad round/game/team index handed to the solver, or a scoring lookup
    /// for a (team, round) pair that has no row.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unrecognized scoring selector or otherwise unusable settings.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Input table that cannot describe a power-of-two tournament.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, BracketError>;
