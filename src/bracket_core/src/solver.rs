use std::collections::HashMap;
use std::ops::RangeInclusive;

use tracing::debug;

use crate::bracket::{feeder_games, games_in_round, team_range, Bracket, Pick};
use crate::constants::MAX_ROUNDS;
use crate::error::{BracketError, Result};
use crate::scoring::ScoringTable;

/// Identifies one subtournament search: the game `(round, game)` of a
/// `rounds`-round tournament, won by `champion`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubproblemKey {
    pub round: u32,
    pub game: u32,
    pub rounds: u32,
    pub champion: u32,
}

impl SubproblemKey {
    pub fn new(round: u32, game: u32, rounds: u32, champion: u32) -> Self {
        SubproblemKey {
            round,
            game,
            rounds,
            champion,
        }
    }

    /// Check the key names a real game and a team that can reach it.
    pub fn validate(&self) -> Result<()> {
        if self.rounds < 1 || self.rounds > MAX_ROUNDS {
            return Err(self.invalid(format!("tournament depth outside 1..={MAX_ROUNDS}")));
        }
        if self.round > self.rounds {
            return Err(self.invalid(format!("round outside 0..={}", self.rounds)));
        }
        let games = games_in_round(self.rounds, self.round);
        if self.game < 1 || self.game > games {
            return Err(self.invalid(format!("game outside 1..={games}")));
        }
        let range = team_range(self.round, self.game);
        if !range.contains(&self.champion) {
            return Err(self.invalid(format!(
                "team outside {}..={}",
                range.start(),
                range.end()
            )));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> BracketError {
        BracketError::InvalidArgument(format!(
            "(round {}, game {}, rounds {}, team {}): {}",
            self.round, self.game, self.rounds, self.champion, reason
        ))
    }

    /// Key for a previous-round game of the same tournament.
    fn feeder(&self, game: u32, champion: u32) -> SubproblemKey {
        SubproblemKey::new(self.round - 1, game, self.rounds, champion)
    }
}

/// Best partial bracket for a subproblem and its expected points.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    pub bracket: Bracket,
    pub expected_points: f64,
}

impl Solution {
    fn empty() -> Self {
        Solution {
            bracket: Bracket::new(),
            expected_points: 0.0,
        }
    }
}

/// How a game splits around its champion.
struct Split {
    /// Feeder game the champion must win
    with_game: u32,
    /// Feeder game producing the champion's final opponent
    without_game: u32,
    /// Every team that could come out of `without_game`
    opponents: RangeInclusive<u32>,
}

/// Requires `key.round >= 1`.
fn split(key: &SubproblemKey) -> Split {
    let (left, right) = feeder_games(key.game);
    let left_range = team_range(key.round - 1, left);
    if left_range.contains(&key.champion) {
        Split {
            with_game: left,
            without_game: right,
            opponents: team_range(key.round - 1, right),
        }
    } else {
        Split {
            with_game: right,
            without_game: left,
            opponents: left_range,
        }
    }
}

/// Combine already-solved feeder subproblems into the solution for `key`.
///
/// `lookup` must return a solution for the champion's feeder game and for
/// every possible opponent in the other feeder game. The opponent with the
/// highest expected points wins; ties keep the lowest team number.
pub(crate) fn assemble<'a, F>(
    table: &ScoringTable,
    key: &SubproblemKey,
    lookup: F,
) -> Result<Solution>
where
    F: Fn(&SubproblemKey) -> Option<&'a Solution>,
{
    if key.round == 0 {
        return Ok(Solution::empty());
    }

    let missing = |k: SubproblemKey| {
        BracketError::InvalidArgument(format!("feeder subproblem {k:?} has not been solved"))
    };

    let split = split(key);
    let with_key = key.feeder(split.with_game, key.champion);
    let with_champion = lookup(&with_key).ok_or_else(|| missing(with_key))?;

    let mut best_opponent: Option<&Solution> = None;
    for opponent in split.opponents {
        let opp_key = key.feeder(split.without_game, opponent);
        let candidate = lookup(&opp_key).ok_or_else(|| missing(opp_key))?;
        if best_opponent.map_or(true, |best| candidate.expected_points > best.expected_points) {
            best_opponent = Some(candidate);
        }
    }
    let without_champion = best_opponent.ok_or_else(|| {
        BracketError::InvalidArgument(format!("no opponents for {key:?}"))
    })?;

    let final_value = table.lookup(key.champion, key.round)?.expected_value();

    let mut bracket = Bracket::new();
    bracket.extend_from(&with_champion.bracket);
    bracket.extend_from(&without_champion.bracket);
    bracket.push(Pick::new(key.round, key.game, key.champion));

    Ok(Solution {
        bracket,
        expected_points: final_value
            + with_champion.expected_points
            + without_champion.expected_points,
    })
}

/// Cache counters for one optimization run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Recursive subtournament search with a per-run memo table.
///
/// Round 0 is the terminal case: a lone entrant, no picks, no points. Round 1
/// games are ordinary games scored from the round-1 rows.
pub struct SubtournamentSolver<'a> {
    table: &'a ScoringTable,
    cache: HashMap<SubproblemKey, Solution>,
    hits: u64,
    misses: u64,
}

impl<'a> SubtournamentSolver<'a> {
    pub fn new(table: &'a ScoringTable) -> Self {
        SubtournamentSolver {
            table,
            cache: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Best bracket beneath game `(round, game)` of a `rounds`-round
    /// tournament, given that `champion` wins that game.
    pub fn solve(&mut self, round: u32, game: u32, rounds: u32, champion: u32) -> Result<Solution> {
        let key = SubproblemKey::new(round, game, rounds, champion);
        key.validate()?;
        self.fill(key)?;
        self.cache
            .get(&key)
            .cloned()
            .ok_or_else(|| BracketError::InvalidArgument(format!("{key:?} missing after solve")))
    }

    /// Like [`solve`](Self::solve) but without copying the bracket out.
    pub fn expected_points(
        &mut self,
        round: u32,
        game: u32,
        rounds: u32,
        champion: u32,
    ) -> Result<f64> {
        let key = SubproblemKey::new(round, game, rounds, champion);
        key.validate()?;
        self.fill(key)?;
        self.cache
            .get(&key)
            .map(|s| s.expected_points)
            .ok_or_else(|| BracketError::InvalidArgument(format!("{key:?} missing after solve")))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Solve `key` and everything beneath it, each key at most once.
    /// `key` must already be valid; feeder keys are valid by construction.
    fn fill(&mut self, key: SubproblemKey) -> Result<()> {
        if self.cache.contains_key(&key) {
            self.hits += 1;
            return Ok(());
        }
        self.misses += 1;

        if key.round > 0 {
            let split = split(&key);
            self.fill(key.feeder(split.with_game, key.champion))?;
            for opponent in split.opponents {
                self.fill(key.feeder(split.without_game, opponent))?;
            }
        }

        let table = self.table;
        let solution = assemble(table, &key, |k| self.cache.get(k))?;
        if key.round == key.rounds {
            debug!(
                champion = key.champion,
                expected_points = solution.expected_points,
                "solved full bracket candidate"
            );
        }
        self.cache.insert(key, solution);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ScoringRule, ScoringTable};
    use crate::team::TeamEntry;

    fn make_four_team_table() -> ScoringTable {
        let teams = vec![
            TeamEntry::new("A", 1, 1, vec![0.9, 0.8]),
            TeamEntry::new("B", 4, 2, vec![0.1, 0.2]),
            TeamEntry::new("C", 2, 3, vec![0.6, 0.3]),
            TeamEntry::new("D", 3, 4, vec![0.4, 0.7]),
        ];
        ScoringTable::from_teams(&teams, ScoringRule::Flat).unwrap()
    }

    #[test]
    fn test_round_zero_is_empty() {
        let table = make_four_team_table();
        let mut solver = SubtournamentSolver::new(&table);
        let solution = solver.solve(0, 3, 2, 3).unwrap();
        assert!(solution.bracket.is_empty());
        assert_eq!(solution.expected_points, 0.0);
    }

    #[test]
    fn test_round_one_scores_single_game() {
        let table = make_four_team_table();
        let mut solver = SubtournamentSolver::new(&table);

        let solution = solver.solve(1, 2, 2, 4).unwrap();
        assert_eq!(solution.bracket.picks(), &[Pick::new(1, 2, 4)]);
        assert!((solution.expected_points - 0.4).abs() < 1e-12);

        let solution = solver.solve(1, 1, 2, 2).unwrap();
        assert_eq!(solution.bracket.picks(), &[Pick::new(1, 1, 2)]);
        assert!((solution.expected_points - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_final_picks_best_opponent() {
        let table = make_four_team_table();
        let mut solver = SubtournamentSolver::new(&table);

        // Champion D: D's round-1 win (0.4) + final (0.7) + best left-half
        // round-1 pick, which is A (0.9).
        let solution = solver.solve(2, 1, 2, 4).unwrap();
        assert!((solution.expected_points - 2.0).abs() < 1e-12);
        assert!(solution.bracket.picks().contains(&Pick::new(1, 1, 1)));
        assert!(solution.bracket.picks().contains(&Pick::new(1, 2, 4)));
        assert!(solution.bracket.picks().contains(&Pick::new(2, 1, 4)));
        assert!(solution.bracket.validate(2).is_ok());
    }

    #[test]
    fn test_right_champion_considers_whole_left_half() {
        // The strongest left-half opponent is the last team of that half.
        let teams = vec![
            TeamEntry::new("A", 1, 1, vec![0.2, 0.1]),
            TeamEntry::new("B", 2, 2, vec![0.8, 0.1]),
            TeamEntry::new("C", 3, 3, vec![0.5, 0.4]),
            TeamEntry::new("D", 4, 4, vec![0.5, 0.4]),
        ];
        let table = ScoringTable::from_teams(&teams, ScoringRule::Flat).unwrap();
        let mut solver = SubtournamentSolver::new(&table);
        let solution = solver.solve(2, 1, 2, 3).unwrap();
        assert!(solution.bracket.picks().contains(&Pick::new(1, 1, 2)));
        assert!((solution.expected_points - (0.8 + 0.5 + 0.4)).abs() < 1e-12);
    }

    #[test]
    fn test_ties_keep_lowest_opponent() {
        let teams = vec![
            TeamEntry::new("A", 1, 1, vec![0.5, 0.5]),
            TeamEntry::new("B", 2, 2, vec![0.5, 0.5]),
            TeamEntry::new("C", 3, 3, vec![0.5, 0.5]),
            TeamEntry::new("D", 4, 4, vec![0.5, 0.5]),
        ];
        let table = ScoringTable::from_teams(&teams, ScoringRule::Flat).unwrap();
        let mut solver = SubtournamentSolver::new(&table);
        let solution = solver.solve(2, 1, 2, 4).unwrap();
        assert!(solution.bracket.picks().contains(&Pick::new(1, 1, 1)));

        let solution = solver.solve(2, 1, 2, 1).unwrap();
        assert!(solution.bracket.picks().contains(&Pick::new(1, 2, 3)));
    }

    #[test]
    fn test_invalid_arguments_leave_cache_untouched() {
        let table = make_four_team_table();
        let mut solver = SubtournamentSolver::new(&table);
        solver.solve(1, 1, 2, 1).unwrap();
        let before = solver.stats();

        let bad = [
            (3, 1, 2, 1), // round past depth
            (1, 0, 2, 1), // game 0
            (1, 3, 2, 5), // game past round size
            (2, 1, 2, 5), // team outside tournament
            (1, 2, 2, 1), // team outside game range
            (1, 1, 2, 3),
            (0, 1, 0, 1), // zero depth
        ];
        for (r, g, k, i) in bad {
            assert!(
                matches!(solver.solve(r, g, k, i), Err(BracketError::InvalidArgument(_))),
                "expected InvalidArgument for {:?}",
                (r, g, k, i)
            );
        }
        assert_eq!(solver.stats(), before);
    }

    #[test]
    fn test_each_subproblem_computed_once() {
        let table = make_four_team_table();
        let mut solver = SubtournamentSolver::new(&table);
        for champion in 1..=4 {
            solver.solve(2, 1, 2, champion).unwrap();
        }
        // 4 round-0, 4 round-1, 4 round-2 keys
        let stats = solver.stats();
        assert_eq!(stats.entries, 12);
        assert_eq!(stats.misses, 12);
        assert!(stats.hits > 0);
    }

    #[test]
    fn test_repeat_solve_is_identical() {
        let table = make_four_team_table();
        let mut solver = SubtournamentSolver::new(&table);
        let first = solver.solve(2, 1, 2, 3).unwrap();
        let second = solver.solve(2, 1, 2, 3).unwrap();
        assert_eq!(first, second);

        let mut fresh = SubtournamentSolver::new(&table);
        let third = fresh.solve(2, 1, 2, 3).unwrap();
        assert_eq!(first.bracket, third.bracket);
        assert_eq!(first.expected_points.to_bits(), third.expected_points.to_bits());
    }

    #[test]
    fn test_expected_points_matches_bracket_evaluation() {
        let table = make_four_team_table();
        let mut solver = SubtournamentSolver::new(&table);
        for champion in 1..=4 {
            let solution = solver.solve(2, 1, 2, champion).unwrap();
            let evaluated = solution.bracket.expected_points(&table).unwrap();
            assert!((evaluated - solution.expected_points).abs() < 1e-12);
            assert_eq!(
                solver.expected_points(2, 1, 2, champion).unwrap(),
                solution.expected_points
            );
        }
    }

    #[test]
    fn test_depth_beyond_table_is_invalid_argument() {
        let table = make_four_team_table();
        let mut solver = SubtournamentSolver::new(&table);
        // Key is well formed but the table has no round-3 rows.
        assert!(matches!(
            solver.solve(3, 1, 3, 1),
            Err(BracketError::InvalidArgument(_))
        ));
    }
}
