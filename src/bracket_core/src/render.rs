use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bracket::Bracket;
use crate::error::{BracketError, Result};
use crate::team::TeamEntry;

/// One line of the readable bracket: a team and the last round it is picked
/// to win.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegibleRow {
    pub team: String,

    #[serde(rename = "Last Round Won")]
    pub last_round_won: u32,
}

/// Convert a bracket of team numbers into named rows, ordered by team number.
///
/// Teams never picked to win a game (round-1 losers) are left out.
pub fn make_legible(bracket: &Bracket, teams: &[TeamEntry]) -> Result<Vec<LegibleRow>> {
    let names: HashMap<u32, &str> = teams.iter().map(|t| (t.num, t.name.as_str())).collect();

    bracket
        .last_round_won()
        .into_iter()
        .map(|(num, round)| {
            let name = names.get(&num).ok_or_else(|| {
                BracketError::InvalidArgument(format!(
                    "bracket picks team {num}, which has no name"
                ))
            })?;
            Ok(LegibleRow {
                team: name.to_string(),
                last_round_won: round,
            })
        })
        .collect()
}
