//! Data models for the vocabulary curriculum

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::storage::CurriculumError;
use super::words::Corpus;

/// Chapter number a freshly bootstrapped track starts at
pub const FIRST_CHAPTER: u32 = 1;

/// Identifies an independently scheduled partition of the corpus.
///
/// The default track has no category; every category gets its own state file
/// so exhausting one category never touches another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TrackKey(Option<String>);

impl TrackKey {
    /// The default (global) track
    pub fn global() -> Self {
        Self(None)
    }

    /// A category track. Category ids may only contain ASCII alphanumerics,
    /// `-` and `_`, since they become part of a file name.
    pub fn category(id: &str) -> Result<Self, CurriculumError> {
        let id = id.trim();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CurriculumError::InvalidTrackKey(id.to_string()));
        }
        Ok(Self(Some(id.to_string())))
    }

    /// Build a key from an optional category, treating `None` as the global track
    pub fn from_option(category: Option<&str>) -> Result<Self, CurriculumError> {
        match category {
            Some(id) => Self::category(id),
            None => Ok(Self::global()),
        }
    }

    pub fn category_id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Name of the state file for this track
    pub fn file_name(&self) -> String {
        match &self.0 {
            Some(id) => format!("progress_tracker_{}.json", id),
            None => "progress_tracker.json".to_string(),
        }
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "global"),
        }
    }
}

/// Persisted curriculum state of one track.
///
/// `pending_words`, `assigned_words` and `learned_words` partition the corpus:
/// pairwise disjoint, union equal to every word the track knows about.
/// `pending_words` order is the default extraction order and
/// `assigned_words` keeps reservation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumState {
    pub total_words: usize,
    pub learned_words: BTreeSet<String>,
    pub pending_words: Vec<String>,
    pub assigned_words: Vec<String>,
    #[serde(rename = "current_book_chapter")]
    pub current_chapter: u32,
}

impl CurriculumState {
    /// Fresh state with every corpus word pending, in corpus order
    pub fn bootstrap(corpus: &Corpus) -> Self {
        let mut state = Self {
            total_words: 0,
            learned_words: BTreeSet::new(),
            pending_words: corpus.words().to_vec(),
            assigned_words: Vec::new(),
            current_chapter: FIRST_CHAPTER,
        };
        state.recount();
        state
    }

    /// Recompute `total_words` from the three partitions
    pub fn recount(&mut self) {
        self.total_words =
            self.pending_words.len() + self.assigned_words.len() + self.learned_words.len();
    }

    pub fn is_pending(&self, word: &str) -> bool {
        self.pending_words.iter().any(|w| w == word)
    }

    pub fn is_assigned(&self, word: &str) -> bool {
        self.assigned_words.iter().any(|w| w == word)
    }

    pub fn is_learned(&self, word: &str) -> bool {
        self.learned_words.contains(word)
    }

    /// Every word known to the track, regardless of partition
    pub fn all_words(&self) -> BTreeSet<String> {
        self.pending_words
            .iter()
            .chain(self.assigned_words.iter())
            .chain(self.learned_words.iter())
            .cloned()
            .collect()
    }

    /// True when the partitions are pairwise disjoint, free of duplicates,
    /// and `total_words` matches their union.
    pub fn is_partitioned(&self) -> bool {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.total_words);
        let all_unique = self
            .pending_words
            .iter()
            .chain(self.assigned_words.iter())
            .chain(self.learned_words.iter())
            .all(|w| seen.insert(w.as_str()));
        all_unique && seen.len() == self.total_words
    }

    pub fn stats(&self) -> CurriculumStats {
        CurriculumStats {
            total_words: self.total_words,
            pending_words: self.pending_words.len(),
            assigned_words: self.assigned_words.len(),
            learned_words: self.learned_words.len(),
            pending_percent: percent(self.pending_words.len(), self.total_words),
            progress_percent: percent(self.learned_words.len(), self.total_words),
            current_chapter: self.current_chapter,
        }
    }
}

/// Share of `part` in `total` as a percentage rounded to two decimals
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = part as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Read-only snapshot of a track's progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumStats {
    pub total_words: usize,
    pub pending_words: usize,
    pub assigned_words: usize,
    pub learned_words: usize,
    /// pending / total, as a percentage
    pub pending_percent: f64,
    /// learned / total, as a percentage
    pub progress_percent: f64,
    pub current_chapter: u32,
}

/// How a track's state was obtained when it was loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadOrigin {
    /// Read as-is from disk
    Existing,
    /// No state on disk; created from the corpus
    Bootstrapped,
    /// Older schema on disk; missing fields were added and the file rewritten
    Upgraded,
    /// State on disk overlapped or held non-canonical words; fixed and rewritten
    Repaired,
    /// State on disk was unreadable; moved aside and re-bootstrapped
    Recovered,
}

/// New words moved from pending to assigned by one reservation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub words: Vec<String>,
    pub requested: usize,
    /// How many of `words` came from the preference pool
    pub from_pool: usize,
}

impl Reservation {
    /// Fewer words were pending than requested
    pub fn is_short(&self) -> bool {
        self.words.len() < self.requested
    }

    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.words.len())
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Learned words drawn for review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSample {
    pub words: Vec<String>,
    pub requested: usize,
}

impl ReviewSample {
    /// Fewer words were learned than requested, so every learned word was returned
    pub fn is_insufficient(&self) -> bool {
        self.words.len() < self.requested
    }
}

/// Result of marking a batch as learned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// Words moved into `learned_words` by this call
    pub learned: Vec<String>,
    /// Words that were already learned
    pub already_learned: Vec<String>,
    /// Words the track does not know; ignored
    pub unknown: Vec<String>,
}

/// Result of handing assigned words back to pending
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub released: Vec<String>,
    /// Words that were not assigned; left untouched
    pub not_assigned: Vec<String>,
}
