use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::constants::{team_count, MAX_ROUNDS};
use crate::error::{BracketError, Result};
use crate::team::TeamEntry;

/// Pool scoring rule: the value of correctly picking a team to win a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ScoringRule {
    /// 1 point per correct pick
    #[default]
    Flat,
    /// 1 + seed
    Seed,
    /// 2^(round - 1)
    Round,
    /// 2^(round - 1) + seed
    SeedRound,
}

impl ScoringRule {
    pub const ALL: [ScoringRule; 4] = [
        ScoringRule::Flat,
        ScoringRule::Seed,
        ScoringRule::Round,
        ScoringRule::SeedRound,
    ];

    /// Resolve an optional selector string.
    ///
    /// A missing selector falls back to flat scoring; an unrecognized one is
    /// an error so a typo never silently changes the pool's rules.
    pub fn from_selector(selector: Option<&str>) -> Result<Self> {
        match selector {
            None => {
                info!("no scoring selector given, defaulting to flat");
                Ok(ScoringRule::Flat)
            }
            Some(s) => s.parse(),
        }
    }

    pub fn selector(&self) -> &'static str {
        match self {
            ScoringRule::Flat => "flat",
            ScoringRule::Seed => "seed",
            ScoringRule::Round => "round",
            ScoringRule::SeedRound => "SR",
        }
    }

    fn counts_seed(&self) -> bool {
        matches!(self, ScoringRule::Seed | ScoringRule::SeedRound)
    }

    fn counts_round(&self) -> bool {
        matches!(self, ScoringRule::Round | ScoringRule::SeedRound)
    }

    /// Points for a team of `seed` winning `round` (1-based).
    pub fn points(&self, round: u32, seed: u32) -> f64 {
        let seed_part = if self.counts_seed() { seed as f64 } else { 0.0 };
        let round_part = if self.counts_round() {
            2f64.powi(round.saturating_sub(1) as i32)
        } else {
            1.0
        };
        seed_part + round_part
    }
}

impl FromStr for ScoringRule {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self> {
        ScoringRule::ALL
            .into_iter()
            .find(|rule| rule.selector() == s)
            .ok_or_else(|| {
                BracketError::InvalidConfig(format!(
                    "unknown scoring system {s:?}; expected one of flat, seed, round, SR"
                ))
            })
    }
}

impl fmt::Display for ScoringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Probability and point value of one team winning one round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringRow {
    pub team_num: u32,
    pub team_seed: u32,
    pub round_num: u32,
    pub prob: f64,
    pub points: f64,
}

impl ScoringRow {
    /// Expected points from picking this team to win this round
    pub fn expected_value(&self) -> f64 {
        self.points * self.prob
    }
}

/// Flat per-(team, round) table the solver reads from.
///
/// Holds exactly one row for every team `1..=2^rounds` and every round
/// `1..=rounds`.
#[derive(Clone, Debug)]
pub struct ScoringTable {
    rounds: u32,
    rows: HashMap<(u32, u32), ScoringRow>,
}

impl ScoringTable {
    /// Reshape wide team entries into per-(team, round) rows under `rule`.
    pub fn from_teams(teams: &[TeamEntry], rule: ScoringRule) -> Result<Self> {
        let rounds = teams.first().map(TeamEntry::rounds).ok_or_else(|| {
            BracketError::MalformedInput("input table has no teams".to_string())
        })?;

        let mut rows = Vec::with_capacity(teams.len() * rounds as usize);
        for team in teams {
            team.validate()?;
            if team.rounds() != rounds {
                return Err(BracketError::MalformedInput(format!(
                    "team {} has {} round columns, expected {}",
                    team,
                    team.rounds(),
                    rounds
                )));
            }
            for (idx, &prob) in team.round_probs.iter().enumerate() {
                let round_num = idx as u32 + 1;
                rows.push(ScoringRow {
                    team_num: team.num,
                    team_seed: team.seed,
                    round_num,
                    prob,
                    points: rule.points(round_num, team.seed),
                });
            }
        }

        Self::from_rows(rounds, rows)
    }

    /// Build a table from already-flattened rows, enforcing one row per
    /// (team, round).
    pub fn from_rows(rounds: u32, rows: impl IntoIterator<Item = ScoringRow>) -> Result<Self> {
        if rounds == 0 || rounds > MAX_ROUNDS {
            return Err(BracketError::MalformedInput(format!(
                "tournament depth {rounds} is outside 1..={MAX_ROUNDS}"
            )));
        }
        let teams = team_count(rounds);

        let mut map = HashMap::with_capacity((teams * rounds) as usize);
        for row in rows {
            if row.team_num < 1 || row.team_num > teams {
                return Err(BracketError::MalformedInput(format!(
                    "team_num {} outside 1..={} for a {}-round tournament",
                    row.team_num, teams, rounds
                )));
            }
            if row.round_num < 1 || row.round_num > rounds {
                return Err(BracketError::MalformedInput(format!(
                    "round {} outside 1..={} (team {})",
                    row.round_num, rounds, row.team_num
                )));
            }
            if !(0.0..=1.0).contains(&row.prob) || !row.points.is_finite() {
                return Err(BracketError::MalformedInput(format!(
                    "team {} round {} has prob {} and points {}",
                    row.team_num, row.round_num, row.prob, row.points
                )));
            }
            if map.insert((row.team_num, row.round_num), row).is_some() {
                return Err(BracketError::MalformedInput(format!(
                    "duplicate row for team {} round {}",
                    row.team_num, row.round_num
                )));
            }
        }

        let expected = (teams * rounds) as usize;
        if map.len() != expected {
            return Err(BracketError::MalformedInput(format!(
                "expected {} rows ({} teams x {} rounds), found {}",
                expected,
                teams,
                rounds,
                map.len()
            )));
        }

        Ok(ScoringTable { rounds, rows: map })
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn team_count(&self) -> u32 {
        team_count(self.rounds)
    }

    pub fn get(&self, team: u32, round: u32) -> Option<&ScoringRow> {
        self.rows.get(&(team, round))
    }

    /// Row for `(team, round)`, or an `InvalidArgument` error naming the pair.
    pub fn lookup(&self, team: u32, round: u32) -> Result<&ScoringRow> {
        self.get(team, round).ok_or_else(|| {
            BracketError::InvalidArgument(format!(
                "no scoring row for team {team} in round {round}"
            ))
        })
    }

    /// Rows ordered by (team, round)
    pub fn rows(&self) -> Vec<ScoringRow> {
        let mut rows: Vec<ScoringRow> = self.rows.values().copied().collect();
        rows.sort_by_key(|row| (row.team_num, row.round_num));
        rows
    }

    /// Create a modified copy with one team's round probability replaced.
    pub fn with_prob(&self, team: u32, round: u32, prob: f64) -> Result<Self> {
        let mut new_table = self.clone();
        let row = new_table.rows.get_mut(&(team, round)).ok_or_else(|| {
            BracketError::InvalidArgument(format!(
                "no scoring row for team {team} in round {round}"
            ))
        })?;
        if !(0.0..=1.0).contains(&prob) {
            return Err(BracketError::InvalidArgument(format!(
                "probability {prob} outside [0, 1]"
            )));
        }
        row.prob = prob;
        Ok(new_table)
    }
}
