use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::AppConfig;
use crate::error::{BracketError, Result};
use crate::ingest::{read_teams, write_legible};
use crate::optimizer::{best_bracket, par_best_bracket, OptimalBracket};
use crate::render::{make_legible, LegibleRow};
use crate::scoring::{ScoringRule, ScoringTable};

/// Knobs for [`build_ev_bracket`] beyond the input location and scoring rule.
#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    pub rounds: u32,
    pub output_file: String,
    pub parallel: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        let config = AppConfig::default();
        RunOptions {
            rounds: config.rounds,
            output_file: config.output_file,
            parallel: config.parallel,
        }
    }
}

impl From<&AppConfig> for RunOptions {
    fn from(config: &AppConfig) -> Self {
        RunOptions {
            rounds: config.rounds,
            output_file: config.output_file.clone(),
            parallel: config.parallel,
        }
    }
}

/// What a finished run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub rule: ScoringRule,
    pub champion: String,
    pub expected_points: f64,
    pub rows: Vec<LegibleRow>,
    pub output_path: PathBuf,
}

/// Read `folder/filename`, find the expected-value bracket under `scoring`,
/// and write the legible result to `folder/<output_file>`.
///
/// The scoring selector is checked before the filesystem is touched.
pub fn build_ev_bracket(
    folder: &Path,
    filename: &str,
    scoring: Option<&str>,
    options: &RunOptions,
) -> Result<RunSummary> {
    let rule = ScoringRule::from_selector(scoring)?;

    let input = folder.join(filename);
    if !input.exists() {
        return Err(BracketError::NotFound(input));
    }

    info!(input = %input.display(), %rule, "building expected-value bracket");
    let teams = read_teams(&input)?;
    let table = ScoringTable::from_teams(&teams, rule)?;
    if table.rounds() != options.rounds {
        return Err(BracketError::MalformedInput(format!(
            "{} describes a {}-round tournament, expected {} rounds",
            input.display(),
            table.rounds(),
            options.rounds
        )));
    }

    let OptimalBracket {
        champion,
        bracket,
        expected_points,
        ..
    } = if options.parallel {
        par_best_bracket(options.rounds, &table)?
    } else {
        best_bracket(options.rounds, &table)?
    };

    let rows = make_legible(&bracket, &teams)?;
    let output_path = folder.join(&options.output_file);
    write_legible(&output_path, &rows)?;
    info!(output = %output_path.display(), teams = rows.len(), "wrote bracket");

    let champion = teams
        .iter()
        .find(|t| t.num == champion)
        .map(|t| t.name.clone())
        .ok_or_else(|| BracketError::InvalidArgument(format!("champion {champion} has no name")))?;

    Ok(RunSummary {
        rule,
        champion,
        expected_points,
        rows,
        output_path,
    })
}

/// Run the pipeline with everything taken from `config`.
pub fn run(config: &AppConfig) -> Result<RunSummary> {
    build_ev_bracket(
        Path::new(&config.folder),
        &config.filename,
        config.scoring.as_deref(),
        &RunOptions::from(config),
    )
}
