/// Rounds in a standard 64-team tournament
pub const DEFAULT_ROUNDS: u32 = 6;

/// Largest supported tournament depth (65536 entrants)
pub const MAX_ROUNDS: u32 = 16;

/// File name the legible bracket is written to, next to the input file
pub const OUTPUT_FILE_NAME: &str = "EV_bracket.csv";

/// Prefix of the per-round probability columns in the input table
pub const ROUND_COLUMN_PREFIX: &str = "round_";

/// Required identity columns of the input table
pub const TEAM_NAME_COLUMN: &str = "team_name";
pub const TEAM_SEED_COLUMN: &str = "team_seed";
pub const TEAM_NUM_COLUMN: &str = "team_num";

/// Number of entrants in a tournament of `rounds` rounds.
pub fn team_count(rounds: u32) -> u32 {
    1 << rounds
}
