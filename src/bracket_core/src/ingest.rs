// Reads the wide per-team probability table and writes the legible bracket.

use std::io;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::constants::{
    ROUND_COLUMN_PREFIX, TEAM_NAME_COLUMN, TEAM_NUM_COLUMN, TEAM_SEED_COLUMN,
};
use crate::error::{BracketError, Result};
use crate::render::LegibleRow;
use crate::team::TeamEntry;

/// Column positions of one input file
struct Layout {
    name: usize,
    seed: usize,
    num: usize,
    /// `rounds[r - 1]` is the column of `round_<r>`
    rounds: Vec<usize>,
}

impl Layout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| BracketError::MalformedInput(format!("missing column {column:?}")))
        };

        let mut round_columns = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            // round_<r> only; other round_* headers are extra columns
            let round = header
                .trim()
                .strip_prefix(ROUND_COLUMN_PREFIX)
                .and_then(|suffix| suffix.parse::<u32>().ok());
            if let Some(round) = round {
                round_columns.push((round, idx));
            }
        }
        round_columns.sort_unstable();

        if round_columns.is_empty() {
            return Err(BracketError::MalformedInput(format!(
                "no {ROUND_COLUMN_PREFIX}<r> columns"
            )));
        }
        for (expected, &(round, _)) in (1u32..).zip(&round_columns) {
            if round != expected {
                return Err(BracketError::MalformedInput(format!(
                    "round columns must run {p}1..{p}{}, found {p}{round} at position {expected}",
                    round_columns.len(),
                    p = ROUND_COLUMN_PREFIX,
                )));
            }
        }

        Ok(Layout {
            name: find(TEAM_NAME_COLUMN)?,
            seed: find(TEAM_SEED_COLUMN)?,
            num: find(TEAM_NUM_COLUMN)?,
            rounds: round_columns.into_iter().map(|(_, idx)| idx).collect(),
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<TeamEntry> {
        let line = record.position().map_or(0, |p| p.line());
        let field = |idx: usize| {
            record.get(idx).map(str::trim).ok_or_else(|| {
                BracketError::MalformedInput(format!("line {line}: missing field {idx}"))
            })
        };
        let number = |idx: usize, what: &str| -> Result<u32> {
            let raw = field(idx)?;
            raw.parse().map_err(|_| {
                BracketError::MalformedInput(format!("line {line}: bad {what} {raw:?}"))
            })
        };

        let round_probs = self
            .rounds
            .iter()
            .map(|&idx| {
                let raw = field(idx)?;
                raw.parse::<f64>().map_err(|_| {
                    BracketError::MalformedInput(format!("line {line}: bad probability {raw:?}"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(TeamEntry::new(
            field(self.name)?,
            number(self.seed, "seed")?,
            number(self.num, "team number")?,
            round_probs,
        ))
    }
}

/// Read teams from any CSV source with a header row.
pub fn read_teams_from_reader<R: io::Read>(reader: R) -> Result<Vec<TeamEntry>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let layout = Layout::from_headers(rdr.headers()?)?;

    let mut teams = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let team = layout.parse(&record)?;
        team.validate()?;
        teams.push(team);
    }
    debug!(teams = teams.len(), rounds = layout.rounds.len(), "read team table");
    Ok(teams)
}

/// Read the wide team table at `path`.
pub fn read_teams(path: &Path) -> Result<Vec<TeamEntry>> {
    if !path.exists() {
        return Err(BracketError::NotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    read_teams_from_reader(io::BufReader::new(file))
}

/// Write legible rows as CSV to any sink.
pub fn write_legible_to_writer<W: io::Write>(writer: W, rows: &[LegibleRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write legible rows to `path`, replacing any existing file.
pub fn write_legible(path: &Path, rows: &[LegibleRow]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_legible_to_writer(io::BufWriter::new(file), rows)
}
