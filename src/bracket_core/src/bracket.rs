use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

use crate::constants::MAX_ROUNDS;
use crate::error::{BracketError, Result};
use crate::scoring::ScoringTable;

/// One predicted game winner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pick {
    pub round_num: u32,
    pub game: u32,
    pub choice: u32,
}

impl Pick {
    pub fn new(round_num: u32, game: u32, choice: u32) -> Self {
        Pick {
            round_num,
            game,
            choice,
        }
    }
}

/// Number of games in `round` of a `rounds`-round tournament. Round 0 counts
/// each entrant as its own game.
pub fn games_in_round(rounds: u32, round: u32) -> u32 {
    1 << (rounds - round)
}

/// Entrants that can reach game `(round, game)`.
///
/// Callers must have checked `game >= 1` and `round <= rounds`.
pub fn team_range(round: u32, game: u32) -> RangeInclusive<u32> {
    let width = 1u32 << round;
    (width * (game - 1) + 1)..=(width * game)
}

/// The two previous-round games whose winners meet in `game`.
pub fn feeder_games(game: u32) -> (u32, u32) {
    (2 * game - 1, 2 * game)
}

/// Collection of picks, one per game of a (sub)tournament.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bracket {
    picks: Vec<Pick>,
}

impl Bracket {
    pub fn new() -> Self {
        Bracket { picks: Vec::new() }
    }

    pub fn from_picks(picks: Vec<Pick>) -> Self {
        Bracket { picks }
    }

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn push(&mut self, pick: Pick) {
        self.picks.push(pick);
    }

    pub fn extend_from(&mut self, other: &Bracket) {
        self.picks.extend_from_slice(&other.picks);
    }

    /// Picks ordered by (round, game)
    pub fn sorted(&self) -> Vec<Pick> {
        let mut picks = self.picks.clone();
        picks.sort_by_key(|p| (p.round_num, p.game));
        picks
    }

    pub fn picks_in_round(&self, round: u32) -> impl Iterator<Item = &Pick> + '_ {
        self.picks.iter().filter(move |p| p.round_num == round)
    }

    /// Winner of the highest-round pick.
    pub fn champion(&self) -> Option<u32> {
        self.picks
            .iter()
            .max_by_key(|p| p.round_num)
            .map(|p| p.choice)
    }

    /// Last round each team is picked to win; teams never picked are absent.
    pub fn last_round_won(&self) -> BTreeMap<u32, u32> {
        let mut last = BTreeMap::new();
        for pick in &self.picks {
            let entry = last.entry(pick.choice).or_insert(pick.round_num);
            if pick.round_num > *entry {
                *entry = pick.round_num;
            }
        }
        last
    }

    /// Sum of `points * prob` over every pick.
    pub fn expected_points(&self, table: &ScoringTable) -> Result<f64> {
        self.picks.iter().try_fold(0.0, |acc, pick| {
            Ok(acc + table.lookup(pick.choice, pick.round_num)?.expected_value())
        })
    }

    /// Check that this is a complete, consistent bracket for a `rounds`-round
    /// tournament: one pick per game, each winner drawn from the game's range,
    /// and every later-round winner also winning its feeder game.
    pub fn validate(&self, rounds: u32) -> Result<()> {
        if rounds == 0 || rounds > MAX_ROUNDS {
            return Err(BracketError::InvalidArgument(format!(
                "tournament depth {rounds} is outside 1..={MAX_ROUNDS}"
            )));
        }
        let mut winners: HashMap<(u32, u32), u32> = HashMap::with_capacity(self.picks.len());
        for pick in &self.picks {
            if pick.round_num < 1 || pick.round_num > rounds {
                return Err(BracketError::InvalidArgument(format!(
                    "pick {pick:?} has round outside 1..={rounds}"
                )));
            }
            if pick.game < 1 || pick.game > games_in_round(rounds, pick.round_num) {
                return Err(BracketError::InvalidArgument(format!(
                    "pick {pick:?} has game outside round {}",
                    pick.round_num
                )));
            }
            if !team_range(pick.round_num, pick.game).contains(&pick.choice) {
                return Err(BracketError::InvalidArgument(format!(
                    "pick {pick:?} chooses a team that cannot reach that game"
                )));
            }
            if winners.insert((pick.round_num, pick.game), pick.choice).is_some() {
                return Err(BracketError::InvalidArgument(format!(
                    "game ({}, {}) picked twice",
                    pick.round_num, pick.game
                )));
            }
        }

        let games = (1u32 << rounds) - 1;
        if winners.len() != games as usize {
            return Err(BracketError::InvalidArgument(format!(
                "bracket has {} picks, a {}-round tournament has {} games",
                winners.len(),
                rounds,
                games
            )));
        }

        for (&(round, game), &choice) in &winners {
            if round == 1 {
                continue;
            }
            let (left, right) = feeder_games(game);
            let advanced = winners.get(&(round - 1, left)) == Some(&choice)
                || winners.get(&(round - 1, right)) == Some(&choice);
            if !advanced {
                return Err(BracketError::InvalidArgument(format!(
                    "team {choice} wins game ({round}, {game}) without winning a feeder game"
                )));
            }
        }
        Ok(())
    }
}
