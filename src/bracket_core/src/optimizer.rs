use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::bracket::{games_in_round, team_range, Bracket};
use crate::error::{BracketError, Result};
use crate::scoring::ScoringTable;
use crate::solver::{assemble, Solution, SubproblemKey, SubtournamentSolver};

/// The expected-value-maximizing full bracket.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimalBracket {
    pub rounds: u32,
    pub champion: u32,
    pub bracket: Bracket,
    pub expected_points: f64,
}

fn check_depth(rounds: u32, table: &ScoringTable) -> Result<()> {
    if rounds != table.rounds() {
        return Err(BracketError::InvalidArgument(format!(
            "asked for a {}-round bracket but the scoring table covers {} rounds",
            rounds,
            table.rounds()
        )));
    }
    Ok(())
}

/// Pick the champion with the highest expected points. A later candidate
/// must strictly beat the running best, so ties go to the lowest team number.
// Seeded with the first candidate, not "0 points, empty bracket", so an
// all-zero table still yields a full bracket.
fn pick_champion(candidates: impl Iterator<Item = Result<(u32, f64)>>) -> Result<(u32, f64)> {
    let mut best: Option<(u32, f64)> = None;
    for candidate in candidates {
        let (team, points) = candidate?;
        if best.map_or(true, |(_, best_points)| points > best_points) {
            best = Some((team, points));
        }
    }
    best.ok_or_else(|| BracketError::InvalidArgument("tournament has no entrants".to_string()))
}

/// Find the full bracket maximizing expected points.
///
/// Every entrant is tried as overall champion; one solver (and its memo
/// table) is shared by all candidates of the run.
pub fn best_bracket(rounds: u32, table: &ScoringTable) -> Result<OptimalBracket> {
    check_depth(rounds, table)?;

    let mut solver = SubtournamentSolver::new(table);
    let (champion, _) = pick_champion(
        team_range(rounds, 1).map(|team| -> Result<(u32, f64)> {
            Ok((team, solver.expected_points(rounds, 1, rounds, team)?))
        }),
    )?;
    let solution = solver.solve(rounds, 1, rounds, champion)?;

    let stats = solver.stats();
    debug!(
        entries = stats.entries,
        hits = stats.hits,
        misses = stats.misses,
        "subtournament cache"
    );
    info!(
        champion,
        expected_points = solution.expected_points,
        "best bracket found"
    );

    Ok(OptimalBracket {
        rounds,
        champion,
        bracket: solution.bracket,
        expected_points: solution.expected_points,
    })
}

/// Parallel variant of [`best_bracket`] with identical results.
///
/// Subproblems are solved level by level from round 0 upward. Keys within a
/// round only read lower rounds, so each level is split across rayon workers
/// and merged once complete; every key is computed exactly once.
pub fn par_best_bracket(rounds: u32, table: &ScoringTable) -> Result<OptimalBracket> {
    check_depth(rounds, table)?;

    let mut solved: HashMap<SubproblemKey, Solution> = HashMap::new();
    for round in 0..=rounds {
        let keys: Vec<SubproblemKey> = (1..=games_in_round(rounds, round))
            .flat_map(|game| {
                team_range(round, game)
                    .map(move |team| SubproblemKey::new(round, game, rounds, team))
            })
            .collect();

        let level: Vec<(SubproblemKey, Solution)> = keys
            .into_par_iter()
            .map(|key| assemble(table, &key, |k| solved.get(k)).map(|solution| (key, solution)))
            .collect::<Result<Vec<_>>>()?;

        debug!(round, keys = level.len(), "solved level");
        solved.extend(level);
    }

    let candidate = |team: u32| -> Result<(u32, f64)> {
        let key = SubproblemKey::new(rounds, 1, rounds, team);
        solved
            .get(&key)
            .map(|solution| (team, solution.expected_points))
            .ok_or_else(|| BracketError::InvalidArgument(format!("{key:?} was not solved")))
    };
    let (champion, _) = pick_champion(team_range(rounds, 1).map(candidate))?;

    let key = SubproblemKey::new(rounds, 1, rounds, champion);
    let solution = solved
        .remove(&key)
        .ok_or_else(|| BracketError::InvalidArgument(format!("{key:?} was not solved")))?;

    info!(
        champion,
        expected_points = solution.expected_points,
        "best bracket found (parallel)"
    );

    Ok(OptimalBracket {
        rounds,
        champion,
        bracket: solution.bracket,
        expected_points: solution.expected_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::Pick;
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
    fn test_two_team_tournament() {
        let teams = vec![
            TeamEntry::new("A", 1, 1, vec![0.7]),
            TeamEntry::new("B", 2, 2, vec![0.3]),
        ];
        let table = ScoringTable::from_teams(&teams, ScoringRule::Flat).unwrap();
        let best = best_bracket(1, &table).unwrap();
        assert_eq!(best.champion, 1);
        assert!((best.expected_points - 0.7).abs() < 1e-12);
        assert_eq!(best.bracket.picks(), &[Pick::new(1, 1, 1)]);
    }

    #[test]
    fn test_four_team_matches_brute_force() {
        let table = make_four_team_table();
        let best = best_bracket(2, &table).unwrap();

        // Every full bracket: one winner per first-round game, then a champion
        // from those two.
        let mut brute_best: Option<(f64, Bracket)> = None;
        for left in [1, 2] {
            for right in [3, 4] {
                for champion in [left, right] {
                    let bracket = Bracket::from_picks(vec![
                        Pick::new(1, 1, left),
                        Pick::new(1, 2, right),
                        Pick::new(2, 1, champion),
                    ]);
                    let points = bracket.expected_points(&table).unwrap();
                    if brute_best.as_ref().map_or(true, |(p, _)| points > *p) {
                        brute_best = Some((points, bracket));
                    }
                }
            }
        }
        let (brute_points, brute_bracket) = brute_best.unwrap();

        // A and C win round 1, A wins the final: 0.9 + 0.6 + 0.8
        assert!((best.expected_points - 2.3).abs() < 1e-12);
        assert!((best.expected_points - brute_points).abs() < 1e-12);
        assert_eq!(best.bracket.sorted(), brute_bracket.sorted());
        assert_eq!(best.champion, 1);
    }

    #[test]
    fn test_full_bracket_shape() {
        let table = make_four_team_table();
        let best = best_bracket(2, &table).unwrap();
        assert_eq!(best.bracket.len(), 3);
        assert!(best.bracket.validate(2).is_ok());
        assert_eq!(best.bracket.champion(), Some(best.champion));
    }

    #[test]
    fn test_all_zero_table_still_returns_full_bracket() {
        let teams: Vec<TeamEntry> = (1..=4)
            .map(|num| TeamEntry::new(format!("T{num}"), num, num, vec![0.0, 0.0]))
            .collect();
        let table = ScoringTable::from_teams(&teams, ScoringRule::Flat).unwrap();
        let best = best_bracket(2, &table).unwrap();
        assert_eq!(best.champion, 1);
        assert_eq!(best.expected_points, 0.0);
        assert!(best.bracket.validate(2).is_ok());
    }

    #[test]
    fn test_depth_mismatch_rejected() {
        let table = make_four_team_table();
        assert!(matches!(best_bracket(3, &table), Err(BracketError::InvalidArgument(_))));
        assert!(matches!(par_best_bracket(1, &table), Err(BracketError::InvalidArgument(_))));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let table = make_four_team_table();
        let sequential = best_bracket(2, &table).unwrap();
        let parallel = par_best_bracket(2, &table).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_scoring_rule_changes_pick() {
        // Under seed scoring the 16 seed's upset is worth far more.
        let teams = vec![
            TeamEntry::new("Fav", 1, 1, vec![0.8]),
            TeamEntry::new("Dog", 16, 2, vec![0.2]),
        ];
        let flat = ScoringTable::from_teams(&teams, ScoringRule::Flat).unwrap();
        let seed = ScoringTable::from_teams(&teams, ScoringRule::Seed).unwrap();
        assert_eq!(best_bracket(1, &flat).unwrap().champion, 1);
        assert_eq!(best_bracket(1, &seed).unwrap().champion, 2);
    }
}
