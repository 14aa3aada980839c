//! Canonical word form, corpus loading and preference pools
//!
//! Every word that enters the curriculum passes through [`normalize_word`],
//! so set membership is always checked against one form.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::storage::{CurriculumError, Result};

/// Canonical form of a word: trimmed and lowercased. `None` for blank input.
pub fn normalize_word(word: &str) -> Option<String> {
    let word = word.trim();
    if word.is_empty() {
        None
    } else {
        Some(word.to_lowercase())
    }
}

/// The deduplicated vocabulary source, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    words: Vec<String>,
}

impl Corpus {
    /// Build a corpus from raw words, normalizing and keeping first occurrences
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let words = words
            .into_iter()
            .filter_map(|w| normalize_word(w.as_ref()))
            .filter(|w| seen.insert(w.clone()))
            .collect();
        Self { words }
    }

    /// Load a corpus from a JSON array of strings
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CurriculumError::CorpusMissing(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let raw: Vec<String> =
            serde_json::from_slice(&content).map_err(|source| CurriculumError::CorpusInvalid {
                path: path.to_path_buf(),
                source,
            })?;

        let corpus = Self::from_words(&raw);
        if corpus.len() < raw.len() {
            log::debug!(
                "Dropped {} duplicate or blank entries from corpus {:?}",
                raw.len() - corpus.len(),
                path
            );
        }
        Ok(corpus)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Words to extract first when reserving a batch, e.g. words earlier units
/// failed to cover.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencePool {
    words: HashSet<String>,
    source: Option<PathBuf>,
}

impl PreferencePool {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .filter_map(|w| normalize_word(w.as_ref()))
                .collect(),
            source: None,
        }
    }

    /// Read a newline-delimited word list.
    ///
    /// The pool is only a hint: a missing or unreadable file yields an empty
    /// pool, so extraction falls back to plain pending order.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => {
                let mut pool = Self::from_words(content.lines());
                pool.source = Some(path.to_path_buf());
                log::info!("Loaded preference pool of {} words from {:?}", pool.len(), path);
                pool
            }
            Err(e) => {
                log::warn!(
                    "Preference pool {:?} unavailable ({}); using plain pending order",
                    path,
                    e
                );
                Self::default()
            }
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// File the pool was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
