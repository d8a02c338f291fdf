//! Configuration for the bracket builder.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ROUNDS, OUTPUT_FILE_NAME};
use crate::error::{BracketError, Result};

/// Run settings. Sources, lowest priority first: built-in defaults, an
/// optional `ev_bracket.{toml,yaml,json}` file, `EV_BRACKET_*` environment
/// variables, then command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Folder holding the input table; the output is written here too
    #[serde(default = "default_folder")]
    pub folder: String,

    #[serde(default = "default_filename")]
    pub filename: String,

    /// One of flat, seed, round, SR. Unset means flat.
    #[serde(default)]
    pub scoring: Option<String>,

    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Tournament depth the input must describe
    #[serde(default = "default_rounds")]
    pub rounds: u32,

    /// Solve levels in parallel with rayon
    #[serde(default)]
    pub parallel: bool,
}

fn default_folder() -> String {
    ".".to_string()
}

fn default_filename() -> String {
    "bracket_probs.csv".to_string()
}

fn default_output_file() -> String {
    OUTPUT_FILE_NAME.to_string()
}

fn default_rounds() -> u32 {
    DEFAULT_ROUNDS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            filename: default_filename(),
            scoring: None,
            output_file: default_output_file(),
            rounds: default_rounds(),
            parallel: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `ev_bracket.*` in the working directory and
    /// the environment.
    pub fn load() -> Result<Self> {
        Self::load_from("ev_bracket")
    }

    /// Load configuration using `file_stem` as the (optional) config file.
    pub fn load_from(file_stem: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default()).map_err(config_error)?)
            .add_source(config::File::with_name(file_stem).required(false))
            // EV_BRACKET_OUTPUT_FILE, EV_BRACKET_ROUNDS, ...
            .add_source(config::Environment::with_prefix("EV_BRACKET").try_parsing(true))
            .build()
            .map_err(config_error)?;

        settings.try_deserialize().map_err(config_error)
    }
}

fn config_error(err: config::ConfigError) -> BracketError {
    BracketError::InvalidConfig(err.to_string())
}
