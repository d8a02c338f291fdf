use crate::error::{BracketError, Result};

/// One entrant as it appears in the wide input table.
///
/// `round_probs[r - 1]` is the probability that the team wins round `r`.
#[derive(Clone, Debug, PartialEq)]
pub struct TeamEntry {
    pub name: String,

    pub seed: u32,

    /// Bracket position, 1-based. Adjacent numbers meet in round 1.
    pub num: u32,

    pub round_probs: Vec<f64>,
}

impl TeamEntry {
    pub fn new(name: impl Into<String>, seed: u32, num: u32, round_probs: Vec<f64>) -> Self {
        TeamEntry {
            name: name.into(),
            seed,
            num,
            round_probs,
        }
    }

    /// Number of rounds this entry carries probabilities for
    pub fn rounds(&self) -> u32 {
        self.round_probs.len() as u32
    }

    /// Reject probabilities outside [0, 1] (NaN included).
    pub fn validate(&self) -> Result<()> {
        if self.num == 0 {
            return Err(BracketError::MalformedInput(format!(
                "team {:?} has team_num 0; numbering starts at 1",
                self.name
            )));
        }
        for (idx, &p) in self.round_probs.iter().enumerate() {
            if !(0.0..=1.0).contains(&p) {
                return Err(BracketError::MalformedInput(format!(
                    "team {:?} (#{}) has probability {} for round {}",
                    self.name,
                    self.num,
                    p,
                    idx + 1
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for TeamEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} ({} seed)", self.num, self.name, self.seed)
    }
}
