use pyo3::exceptions::{PyFileNotFoundError, PyIOError, PyValueError};
use pyo3::prelude::*;
use std::path::Path;

use crate::constants::{DEFAULT_ROUNDS, OUTPUT_FILE_NAME};
use crate::error::BracketError;
use crate::optimizer::best_bracket;
use crate::pipeline::{build_ev_bracket, RunOptions};
use crate::scoring::{ScoringRow, ScoringRule, ScoringTable};

fn to_py_err(err: BracketError) -> PyErr {
    match err {
        BracketError::NotFound(_) => PyFileNotFoundError::new_err(err.to_string()),
        BracketError::Io(_) | BracketError::Csv(_) => PyIOError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Points for a team of `seed` winning `round` under scoring rule `rule`.
#[pyfunction]
fn points_for(rule: &str, round: u32, seed: u32) -> PyResult<f64> {
    let rule: ScoringRule = rule.parse().map_err(to_py_err)?;
    Ok(rule.points(round, seed))
}

/// Expected-value bracket from flat `(team_num, team_seed, round_num, prob, points)`
/// rows. Returns `([(round_num, game, choice), ...], expected_points)`.
#[pyfunction]
#[pyo3(name = "best_bracket")]
fn py_best_bracket(
    rows: Vec<(u32, u32, u32, f64, f64)>,
    rounds: u32,
) -> PyResult<(Vec<(u32, u32, u32)>, f64)> {
    let rows = rows
        .into_iter()
        .map(|(team_num, team_seed, round_num, prob, points)| ScoringRow {
            team_num,
            team_seed,
            round_num,
            prob,
            points,
        });
    let table = ScoringTable::from_rows(rounds, rows).map_err(to_py_err)?;
    let best = best_bracket(rounds, &table).map_err(to_py_err)?;
    let picks = best
        .bracket
        .sorted()
        .into_iter()
        .map(|p| (p.round_num, p.game, p.choice))
        .collect();
    Ok((picks, best.expected_points))
}

/// Read `folder/filename`, write `folder/EV_bracket.csv`, return the champion
/// and expected points.
#[pyfunction]
#[pyo3(
    name = "build_ev_bracket",
    signature = (folder, filename, scoring = None, rounds = DEFAULT_ROUNDS)
)]
fn py_build_ev_bracket(
    folder: &str,
    filename: &str,
    scoring: Option<&str>,
    rounds: u32,
) -> PyResult<(String, f64)> {
    let options = RunOptions {
        rounds,
        ..RunOptions::default()
    };
    let summary =
        build_ev_bracket(Path::new(folder), filename, scoring, &options).map_err(to_py_err)?;
    Ok((summary.champion, summary.expected_points))
}

/// Python module definition
#[pymodule]
fn bracket_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(points_for, m)?)?;
    m.add_function(wrap_pyfunction!(py_best_bracket, m)?)?;
    m.add_function(wrap_pyfunction!(py_build_ev_bracket, m)?)?;

    // Constants
    m.add("DEFAULT_ROUNDS", DEFAULT_ROUNDS)?;
    m.add("OUTPUT_FILE_NAME", OUTPUT_FILE_NAME)?;

    Ok(())
}
