//! Load options
//!
//! Options are plain serde data so they can live next to the input files:
//!
//! ```yaml
//! delimiter: ":"
//! resolution: unique        # or first_match (default)
//! inline_matrices: eager    # or deferred (default)
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub use dca_json_core::InlineMatrices;

/// How partial keys that match several index entries are treated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// First entry in index order wins
    #[default]
    FirstMatch,
    /// More than one match is an `AmbiguousKey` error for `get`
    Unique,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadOptions {
    /// Separator between map keys in flat keys
    pub delimiter: char,
    pub resolution: Resolution,
    pub inline_matrices: InlineMatrices,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: Self::DEFAULT_DELIMITER,
            resolution: Resolution::default(),
            inline_matrices: InlineMatrices::default(),
        }
    }
}

impl LoadOptions {
    pub const DEFAULT_DELIMITER: char = ':';

    /// Same options with `Resolution::Unique`
    pub fn strict(mut self) -> Self {
        self.resolution = Resolution::Unique;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_inline_matrices(mut self, inline: InlineMatrices) -> Self {
        self.inline_matrices = inline;
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let options: LoadOptions =
            serde_yaml::from_str(content).context("Failed to parse load options")?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading load options from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_yaml_str(&content).with_context(|| format!("Invalid options in {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.delimiter.is_alphanumeric() || self.delimiter.is_whitespace() {
            return Err(anyhow!(
                "delimiter '{}' must be a punctuation character",
                self.delimiter
            ));
        }
        Ok(())
    }
}
