//! Curriculum configuration
//!
//! Loaded from an optional TOML file; every key falls back to a default.
//!
//! ```toml
//! data_dir = "/srv/novels/progress"
//! corpus_path = "/srv/novels/ielts_source.json"
//! preference_pool = "/srv/novels/missing_words.txt"
//! new_words_per_unit = 60
//! review_words_per_unit = 20
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::storage::{CurriculumError, Result};

/// Name of the corpus file looked up inside the data directory by default
pub const DEFAULT_CORPUS_FILE: &str = "corpus.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurriculumConfig {
    /// Directory holding per-track state files
    pub data_dir: Option<PathBuf>,
    /// JSON array of corpus words
    pub corpus_path: Option<PathBuf>,
    /// Newline-delimited words to reserve first
    pub preference_pool: Option<PathBuf>,
    pub new_words_per_unit: usize,
    pub review_words_per_unit: usize,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            corpus_path: None,
            preference_pool: None,
            new_words_per_unit: 60,
            review_words_per_unit: 20,
        }
    }
}

impl CurriculumConfig {
    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("vocab-curriculum"))
            .ok_or(CurriculumError::DataDirNotFound)
    }

    /// Read a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| CurriculumError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_data_dir(),
        }
    }

    /// Configured corpus path, or `corpus.json` inside the data directory
    pub fn corpus_path(&self) -> Result<PathBuf> {
        match &self.corpus_path {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join(DEFAULT_CORPUS_FILE)),
        }
    }
}
