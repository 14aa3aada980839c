//! Storage operations for curriculum tracks
//!
//! Directory structure:
//! ```text
//! {data_dir}/
//! ├── progress_tracker.json              # default track
//! ├── progress_tracker_{category}.json   # one file per category track
//! └── *.json.corrupt[.N]                 # unreadable states moved aside on recovery
//! ```
//!
//! Every mutation builds the next state on a copy, writes it atomically
//! (temp file + rename) and only then swaps it into the in-memory [`Track`].
//! A failed write leaves both the file and the track at the previous state.
//! There is no locking: one writer per track is assumed.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use super::config::CurriculumConfig;
use super::models::*;
use super::selector::{sample_review, select_batch};
use super::words::{normalize_word, Corpus, PreferencePool};

#[derive(Error, Debug)]
pub enum CurriculumError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corpus not found: {0:?}")]
    CorpusMissing(PathBuf),

    #[error("Corpus {path:?} is not a JSON array of words: {source}")]
    CorpusInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No curriculum state at {0:?}")]
    NotFound(PathBuf),

    #[error("Curriculum state {path:?} cannot be parsed: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write curriculum state {path:?}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid track key: {0:?}")]
    InvalidTrackKey(String),

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Invalid config {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Chapter counter cannot advance past {0}")]
    ChapterOverflow(u32),

    #[error("Content generation failed for chapter {chapter}: {source}")]
    Generation {
        chapter: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, CurriculumError>;

/// On-disk shape as written by any schema version.
///
/// `pending_words` and `learned_words` are required: a file without them
/// fails to parse and is treated as corrupt rather than as an empty track.
#[derive(Deserialize)]
struct StoredState {
    total_words: Option<usize>,
    learned_words: Vec<String>,
    pending_words: Vec<String>,
    assigned_words: Option<Vec<String>>,
    current_book_chapter: Option<u32>,
}

/// A parsed state plus what had to change to make it valid
struct DecodedState {
    state: CurriculumState,
    upgraded: bool,
    repaired: bool,
}

impl StoredState {
    /// Canonicalize into a partitioned state.
    ///
    /// Words are normalized and deduplicated; a word listed in more than one
    /// partition stays in the most advanced one (learned, then assigned).
    fn decode(self) -> DecodedState {
        let upgraded = self.assigned_words.is_none() || self.current_book_chapter.is_none();
        let mut repaired = false;

        let mut learned_words = BTreeSet::new();
        for raw in self.learned_words {
            match normalize_word(&raw) {
                Some(word) => {
                    repaired |= word != raw;
                    repaired |= !learned_words.insert(word);
                }
                None => repaired = true,
            }
        }

        let mut seen: HashSet<String> = learned_words.iter().cloned().collect();
        let mut keep = |raw: String, repaired: &mut bool| -> Option<String> {
            match normalize_word(&raw) {
                Some(word) if seen.insert(word.clone()) => {
                    *repaired |= word != raw;
                    Some(word)
                }
                _ => {
                    *repaired = true;
                    None
                }
            }
        };

        let assigned_words: Vec<String> = self
            .assigned_words
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| keep(raw, &mut repaired))
            .collect();
        let pending_words: Vec<String> = self
            .pending_words
            .into_iter()
            .filter_map(|raw| keep(raw, &mut repaired))
            .collect();

        let mut state = CurriculumState {
            total_words: 0,
            learned_words,
            pending_words,
            assigned_words,
            current_chapter: self.current_book_chapter.unwrap_or(FIRST_CHAPTER),
        };
        state.recount();
        repaired |= self.total_words != Some(state.total_words);

        DecodedState {
            state,
            upgraded,
            repaired,
        }
    }
}

/// Parse a state file without writing anything
fn read_stored(path: &Path) -> Result<DecodedState> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CurriculumError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let stored: StoredState =
        serde_json::from_slice(&content).map_err(|source| CurriculumError::CorruptState {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(stored.decode())
}

/// First unused backup name: `<file>.corrupt`, then `<file>.corrupt.1`, ...
fn backup_path(path: &Path) -> PathBuf {
    let first = path.with_extension("json.corrupt");
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|n| path.with_extension(format!("json.corrupt.{}", n)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Write the full state atomically: temp file, then rename over the target
fn write_state(path: &Path, state: &CurriculumState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    let tmp_path = path.with_extension("json.tmp");

    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)
    };

    write().map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        CurriculumError::WriteFailure {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Owns where track states live and where the corpus comes from
#[derive(Debug, Clone)]
pub struct CurriculumStore {
    data_dir: PathBuf,
    corpus_path: PathBuf,
}

impl CurriculumStore {
    pub fn new(data_dir: PathBuf, corpus_path: PathBuf) -> Self {
        Self {
            data_dir,
            corpus_path,
        }
    }

    /// Resolve data directory and corpus location from configuration
    pub fn from_config(config: &CurriculumConfig) -> Result<Self> {
        Ok(Self::new(config.data_dir()?, config.corpus_path()?))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn corpus_path(&self) -> &Path {
        &self.corpus_path
    }

    /// Get the state file path for a track
    pub fn track_path(&self, key: &TrackKey) -> PathBuf {
        self.data_dir.join(key.file_name())
    }

    /// Read a track's persisted state without bootstrapping, upgrading or
    /// repairing anything on disk.
    ///
    /// Fails with `NotFound` when there is no file and `CorruptState` when
    /// the file cannot be parsed.
    pub fn read_state(&self, key: &TrackKey) -> Result<CurriculumState> {
        read_stored(&self.track_path(key)).map(|decoded| decoded.state)
    }

    /// Load a track, bootstrapping it from the corpus on first access.
    ///
    /// Older or inconsistent files are fixed and rewritten. An unparseable
    /// file is moved aside to `*.json.corrupt` and the track re-bootstrapped.
    pub fn load(&self, key: &TrackKey) -> Result<Track> {
        let path = self.track_path(key);

        match read_stored(&path) {
            Ok(decoded) => {
                let origin = if decoded.upgraded {
                    LoadOrigin::Upgraded
                } else if decoded.repaired {
                    LoadOrigin::Repaired
                } else {
                    LoadOrigin::Existing
                };

                match origin {
                    LoadOrigin::Upgraded => {
                        write_state(&path, &decoded.state)?;
                        log::info!("Upgraded curriculum state for track {} at {:?}", key, path);
                    }
                    LoadOrigin::Repaired => {
                        write_state(&path, &decoded.state)?;
                        log::warn!(
                            "Repaired inconsistent curriculum state for track {} at {:?}",
                            key,
                            path
                        );
                    }
                    _ => log::debug!("Loaded curriculum state for track {} from {:?}", key, path),
                }

                Ok(Track {
                    key: key.clone(),
                    path,
                    state: decoded.state,
                    origin,
                })
            }
            Err(CurriculumError::NotFound(_)) => self.bootstrap(key, path, LoadOrigin::Bootstrapped),
            Err(CurriculumError::CorruptState { path, source }) => {
                // Corpus first, so a missing corpus leaves the damaged file where it was
                let corpus = Corpus::load(&self.corpus_path)?;
                let backup = backup_path(&path);
                fs::rename(&path, &backup)?;
                log::warn!(
                    "Curriculum state {:?} is unreadable ({}); moved to {:?} and re-bootstrapping track {}",
                    path,
                    source,
                    backup,
                    key
                );
                self.bootstrap_from(corpus, key, path, LoadOrigin::Recovered)
            }
            Err(e) => Err(e),
        }
    }

    fn bootstrap(&self, key: &TrackKey, path: PathBuf, origin: LoadOrigin) -> Result<Track> {
        let corpus = Corpus::load(&self.corpus_path)?;
        self.bootstrap_from(corpus, key, path, origin)
    }

    fn bootstrap_from(
        &self,
        corpus: Corpus,
        key: &TrackKey,
        path: PathBuf,
        origin: LoadOrigin,
    ) -> Result<Track> {
        let state = CurriculumState::bootstrap(&corpus);
        write_state(&path, &state)?;
        log::info!(
            "Initialized track {} from {:?} with {} words",
            key,
            self.corpus_path,
            state.total_words
        );

        Ok(Track {
            key: key.clone(),
            path,
            state,
            origin,
        })
    }
}

/// A loaded track. All mutations persist before they return.
#[derive(Debug, Clone)]
pub struct Track {
    key: TrackKey,
    path: PathBuf,
    state: CurriculumState,
    origin: LoadOrigin,
}

impl Track {
    pub fn key(&self) -> &TrackKey {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &CurriculumState {
        &self.state
    }

    pub fn origin(&self) -> LoadOrigin {
        self.origin
    }

    pub fn current_chapter(&self) -> u32 {
        self.state.current_chapter
    }

    pub fn stats(&self) -> CurriculumStats {
        self.state.stats()
    }

    /// Persist `next`, then adopt it
    fn commit(&mut self, next: CurriculumState) -> Result<()> {
        write_state(&self.path, &next)?;
        self.state = next;
        Ok(())
    }

    /// Move up to `count` pending words to assigned and return them.
    ///
    /// Pool words are taken first (see [`select_batch`]). A short result is
    /// not an error; check [`Reservation::is_short`].
    pub fn reserve_batch(
        &mut self,
        count: usize,
        prefer_pool: Option<&PreferencePool>,
    ) -> Result<Reservation> {
        let selection = select_batch(&self.state.pending_words, count, prefer_pool);
        let reservation = Reservation {
            words: selection.words,
            requested: count,
            from_pool: selection.from_pool,
        };

        if reservation.is_short() {
            log::warn!(
                "Track {} has only {} of {} requested pending words",
                self.key,
                reservation.words.len(),
                count
            );
        }
        if reservation.is_empty() {
            return Ok(reservation);
        }

        let chosen: HashSet<&str> = reservation.words.iter().map(String::as_str).collect();
        let mut next = self.state.clone();
        next.pending_words.retain(|w| !chosen.contains(w.as_str()));
        next.assigned_words.extend(reservation.words.iter().cloned());
        next.recount();
        self.commit(next)?;

        log::info!(
            "Assigned {} words in track {} ({} from preference pool)",
            reservation.words.len(),
            self.key,
            reservation.from_pool
        );
        Ok(reservation)
    }

    /// Draw up to `count` learned words for review. Read-only.
    pub fn sample_review(&self, count: usize) -> ReviewSample {
        self.sample_review_with(count, &mut rand::thread_rng())
    }

    pub fn sample_review_with<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> ReviewSample {
        let sample = ReviewSample {
            words: sample_review(&self.state.learned_words, count, rng),
            requested: count,
        };
        if sample.is_insufficient() {
            log::warn!(
                "Track {} has only {} learned words, fewer than the {} requested for review",
                self.key,
                sample.words.len(),
                count
            );
        }
        sample
    }

    /// Mark words as learned, wherever they currently are.
    ///
    /// Idempotent: words already learned are reported and left alone, words
    /// the track does not know are ignored.
    pub fn complete_batch<S: AsRef<str>>(&mut self, words: &[S]) -> Result<Completion> {
        let mut completion = Completion::default();
        let mut moving: HashSet<String> = HashSet::new();
        {
            let pending: HashSet<&str> = self.state.pending_words.iter().map(String::as_str).collect();
            let assigned: HashSet<&str> =
                self.state.assigned_words.iter().map(String::as_str).collect();
            let mut seen = HashSet::new();

            for word in words.iter().filter_map(|w| normalize_word(w.as_ref())) {
                if !seen.insert(word.clone()) {
                    continue;
                }
                if self.state.learned_words.contains(&word) {
                    completion.already_learned.push(word);
                } else if pending.contains(word.as_str()) || assigned.contains(word.as_str()) {
                    moving.insert(word.clone());
                    completion.learned.push(word);
                } else {
                    completion.unknown.push(word);
                }
            }
        }

        if !completion.unknown.is_empty() {
            log::warn!(
                "Ignoring {} words unknown to track {}: {:?}",
                completion.unknown.len(),
                self.key,
                completion.unknown
            );
        }
        if moving.is_empty() {
            return Ok(completion);
        }

        let mut next = self.state.clone();
        next.pending_words.retain(|w| !moving.contains(w));
        next.assigned_words.retain(|w| !moving.contains(w));
        next.learned_words.extend(moving);
        next.recount();
        self.commit(next)?;

        log::info!(
            "Marked {} words learned in track {} (pending {}, assigned {}, learned {})",
            completion.learned.len(),
            self.key,
            self.state.pending_words.len(),
            self.state.assigned_words.len(),
            self.state.learned_words.len()
        );
        Ok(completion)
    }

    /// Hand assigned words back to pending, ahead of everything else
    /// pending, so they are the next ones reserved.
    pub fn release<S: AsRef<str>>(&mut self, words: &[S]) -> Result<Release> {
        let mut release = Release::default();
        {
            let assigned: HashSet<&str> =
                self.state.assigned_words.iter().map(String::as_str).collect();
            let mut seen = HashSet::new();

            for word in words.iter().filter_map(|w| normalize_word(w.as_ref())) {
                if !seen.insert(word.clone()) {
                    continue;
                }
                if assigned.contains(word.as_str()) {
                    release.released.push(word);
                } else {
                    release.not_assigned.push(word);
                }
            }
        }
        self.apply_release(release)
    }

    /// Release every assigned word, in reservation order
    pub fn release_all(&mut self) -> Result<Release> {
        let release = Release {
            released: self.state.assigned_words.clone(),
            not_assigned: Vec::new(),
        };
        self.apply_release(release)
    }

    fn apply_release(&mut self, release: Release) -> Result<Release> {
        if !release.not_assigned.is_empty() {
            log::warn!(
                "Not releasing {} words that are not assigned in track {}: {:?}",
                release.not_assigned.len(),
                self.key,
                release.not_assigned
            );
        }
        if release.released.is_empty() {
            return Ok(release);
        }

        let released: HashSet<&str> = release.released.iter().map(String::as_str).collect();
        let mut next = self.state.clone();
        next.assigned_words.retain(|w| !released.contains(w.as_str()));
        let mut pending = release.released.clone();
        pending.append(&mut next.pending_words);
        next.pending_words = pending;
        next.recount();
        self.commit(next)?;

        log::info!(
            "Released {} assigned words back to pending in track {}",
            release.released.len(),
            self.key
        );
        Ok(release)
    }

    /// Increment the chapter counter and return the new chapter number
    pub fn advance_chapter(&mut self) -> Result<u32> {
        let mut next = self.state.clone();
        next.current_chapter = next
            .current_chapter
            .checked_add(1)
            .ok_or(CurriculumError::ChapterOverflow(next.current_chapter))?;
        self.commit(next)?;

        log::info!("Track {} advanced to chapter {}", self.key, self.state.current_chapter);
        Ok(self.state.current_chapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn create_test_store(corpus: &[&str]) -> (CurriculumStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let corpus_path = temp_dir.path().join("corpus.json");
        fs::write(&corpus_path, serde_json::to_string(corpus).unwrap()).unwrap();
        let store = CurriculumStore::new(temp_dir.path().join("state"), corpus_path);
        (store, temp_dir)
    }

    fn assert_partition(track: &Track, corpus: &[&str]) {
        let state = track.state();
        assert!(state.is_partitioned(), "partitions overlap: {:?}", state);
        let expected: BTreeSet<String> = corpus.iter().map(|w| w.to_lowercase()).collect();
        assert_eq!(state.all_words(), expected);
    }

    #[test]
    fn test_bootstrap_on_first_load() {
        let corpus = ["alpha", "beta", "Alpha", "gamma"];
        let (store, _temp) = create_test_store(&corpus);

        let track = store.load(&TrackKey::global()).unwrap();
        assert_eq!(track.origin(), LoadOrigin::Bootstrapped);
        assert_eq!(track.state().pending_words, vec!["alpha", "beta", "gamma"]);
        assert_eq!(track.current_chapter(), 1);
        assert!(track.path().exists());

        let again = store.load(&TrackKey::global()).unwrap();
        assert_eq!(again.origin(), LoadOrigin::Existing);
        assert_eq!(again.state(), track.state());
    }

    #[test]
    fn test_bootstrap_without_corpus() {
        let temp = TempDir::new().unwrap();
        let store = CurriculumStore::new(temp.path().to_path_buf(), temp.path().join("none.json"));

        let err = store.load(&TrackKey::global()).unwrap_err();
        assert!(matches!(err, CurriculumError::CorpusMissing(_)));
        assert!(!store.track_path(&TrackKey::global()).exists());
    }

    #[test]
    fn test_reserve_in_pending_order() {
        let corpus = ["a", "b", "c", "d"];
        let (store, _temp) = create_test_store(&corpus);
        let mut track = store.load(&TrackKey::global()).unwrap();

        let reservation = track.reserve_batch(2, None).unwrap();
        assert_eq!(reservation.words, vec!["a", "b"]);
        assert!(!reservation.is_short());
        assert_eq!(track.state().pending_words, vec!["c", "d"]);
        assert_eq!(track.state().assigned_words, vec!["a", "b"]);
        assert_partition(&track, &corpus);

        let reloaded = store.read_state(&TrackKey::global()).unwrap();
        assert_eq!(&reloaded, track.state());
    }

    #[test]
    fn test_reserve_prefers_pool() {
        let corpus = ["a", "b", "c", "d"];
        let (store, _temp) = create_test_store(&corpus);
        let mut track = store.load(&TrackKey::global()).unwrap();
        let pool = PreferencePool::from_words(["C"]);

        let reservation = track.reserve_batch(2, Some(&pool)).unwrap();
        assert_eq!(reservation.words, vec!["c", "a"]);
        assert_eq!(reservation.from_pool, 1);
        assert_eq!(track.state().pending_words, vec!["b", "d"]);
    }

    #[test]
    fn test_reserve_never_reassigns() {
        let corpus = ["a", "b", "c", "d", "e"];
        let (store, _temp) = create_test_store(&corpus);
        let mut track = store.load(&TrackKey::global()).unwrap();

        let first = track.reserve_batch(2, None).unwrap();
        track.complete_batch(&["a"]).unwrap();
        let pool = PreferencePool::from_words(["a", "b", "e"]);
        let second = track.reserve_batch(10, Some(&pool)).unwrap();

        assert_eq!(second.words, vec!["e", "c", "d"]);
        assert!(second.words.iter().all(|w| !first.words.contains(w)));
        assert_partition(&track, &corpus);
    }

    #[test]
    fn test_reserve_shortage() {
        let corpus = ["a", "b"];
        let (store, _temp) = create_test_store(&corpus);
        let mut track = store.load(&TrackKey::global()).unwrap();

        let reservation = track.reserve_batch(5, None).unwrap();
        assert_eq!(reservation.words.len(), 2);
        assert!(reservation.is_short());
        assert_eq!(reservation.shortfall(), 3);

        let empty = track.reserve_batch(5, None).unwrap();
        assert!(empty.is_empty());
        assert_partition(&track, &corpus);
    }

    #[test]
    fn test_sample_review_shortage() {
        let corpus = ["a", "b", "c", "d"];
        let (store, _temp) = create_test_store(&corpus);
        let mut track = store.load(&TrackKey::global()).unwrap();
        track.reserve_batch(3, None).unwrap();
        track.complete_batch(&["a", "b", "c"]).unwrap();
        let before = track.state().clone();

        let mut rng = StdRng::seed_from_u64(3);
        let sample = track.sample_review_with(5, &mut rng);
        assert!(sample.is_insufficient());
        assert_eq!(sample.words, vec!["a", "b", "c"]);

        let sample = track.sample_review_with(2, &mut rng);
        assert!(!sample.is_insufficient());
        assert_eq!(sample.words.len(), 2);
        assert!(sample.words.iter().all(|w| before.learned_words.contains(w)));
        assert_eq!(track.state(), &before);
    }

    #[test]
    fn test_complete_batch_moves_from_anywhere() {
        let corpus = ["a", "b", "c", "d"];
        let (store, _temp) = create_test_store(&corpus);
        let mut track = store.load(&TrackKey::global()).unwrap();
        track.reserve_batch(2, None).unwrap();

        let completion = track.complete_batch(&[" A ", "d", "zebra", "a"]).unwrap();
        assert_eq!(completion.learned, vec!["a", "d"]);
        assert_eq!(completion.unknown, vec!["zebra"]);
        assert_eq!(track.state().pending_words, vec!["c"]);
        assert_eq!(track.state().assigned_words, vec!["b"]);
        assert!(track.state().is_learned("a"));
        assert!(track.state().is_learned("d"));
        assert_partition(&track, &corpus);
    }

    #[test]
    fn test_complete_batch_is_idempotent() {
        let corpus = ["a", "b", "c"];
        let (store, _temp) = create_test_store(&corpus);
        let mut track = store.load(&TrackKey::global()).unwrap();
        let batch = track.reserve_batch(2, None).unwrap().words;

        track.complete_batch(&batch).unwrap();
        let once = track.state().clone();

        let completion = track.complete_batch(&batch).unwrap();
        assert!(completion.learned.is_empty());
        assert_eq!(completion.already_learned, vec!["a", "b"]);
        assert_eq!(track.state(), &once);
        assert_eq!(store.read_state(&TrackKey::global()).unwrap(), once);
    }

    #[test]
    fn test_release_puts_words_back_first() {
        let corpus = ["a", "b", "c", "d"];
        let (store, _temp) = create_test_store(&corpus);
        let mut track = store.load(&TrackKey::global()).unwrap();
        track.reserve_batch(3, None).unwrap();

        let release = track.release(&["C", "d"]).unwrap();
        assert_eq!(release.released, vec!["c"]);
        assert_eq!(release.not_assigned, vec!["d"]);
        assert_eq!(track.state().pending_words, vec!["c", "d"]);
        assert_eq!(track.state().assigned_words, vec!["a", "b"]);

        let release = track.release_all().unwrap();
        assert_eq!(release.released, vec!["a", "b"]);
        assert_eq!(track.state().pending_words, vec!["a", "b", "c", "d"]);
        assert!(track.state().assigned_words.is_empty());
        assert_partition(&track, &corpus);

        let again = track.reserve_batch(2, None).unwrap();
        assert_eq!(again.words, vec!["a", "b"]);
    }

    #[test]
    fn test_advance_chapter_persists() {
        let (store, _temp) = create_test_store(&["a"]);
        let mut track = store.load(&TrackKey::global()).unwrap();

        assert_eq!(track.advance_chapter().unwrap(), 2);
        assert_eq!(track.advance_chapter().unwrap(), 3);
        assert_eq!(store.load(&TrackKey::global()).unwrap().current_chapter(), 3);
    }

    #[test]
    fn test_advance_chapter_overflow_is_an_error() {
        let (store, _temp) = create_test_store(&["a"]);
        let path = store.track_path(&TrackKey::global());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            format!(
                r#"{{"total_words": 1, "learned_words": [], "pending_words": ["a"], "assigned_words": [], "current_book_chapter": {}}}"#,
                u32::MAX
            ),
        )
        .unwrap();

        let mut track = store.load(&TrackKey::global()).unwrap();
        let err = track.advance_chapter().unwrap_err();
        assert!(matches!(err, CurriculumError::ChapterOverflow(u32::MAX)));
        assert_eq!(track.current_chapter(), u32::MAX);
        assert_eq!(store.read_state(&TrackKey::global()).unwrap().current_chapter, u32::MAX);
    }

    #[test]
    fn test_stats() {
        let (store, _temp) = create_test_store(&["a", "b", "c", "d"]);
        let mut track = store.load(&TrackKey::global()).unwrap();
        track.reserve_batch(2, None).unwrap();
        track.complete_batch(&["a"]).unwrap();

        let stats = track.stats();
        assert_eq!(stats.total_words, 4);
        assert_eq!(stats.pending_words, 2);
        assert_eq!(stats.assigned_words, 1);
        assert_eq!(stats.learned_words, 1);
        assert_eq!(stats.pending_percent, 50.0);
        assert_eq!(stats.progress_percent, 25.0);
        assert_eq!(stats.current_chapter, 1);
    }

    #[test]
    fn test_schema_upgrade_adds_assigned_words() {
        let (store, _temp) = create_test_store(&["a", "b", "c"]);
        let path = store.track_path(&TrackKey::global());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"total_words": 3, "learned_words": ["a"], "pending_words": ["c", "b"], "current_book_chapter": 4}"#,
        )
        .unwrap();

        let track = store.load(&TrackKey::global()).unwrap();
        assert_eq!(track.origin(), LoadOrigin::Upgraded);
        assert!(track.state().assigned_words.is_empty());
        assert_eq!(track.state().pending_words, vec!["c", "b"]);
        assert!(track.state().is_learned("a"));
        assert_eq!(track.state().total_words, 3);
        assert_eq!(track.current_chapter(), 4);

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["assigned_words"], serde_json::json!([]));
        assert_eq!(store.load(&TrackKey::global()).unwrap().origin(), LoadOrigin::Existing);
    }

    #[test]
    fn test_load_repairs_overlapping_partitions() {
        let (store, _temp) = create_test_store(&["a", "b", "c"]);
        let path = store.track_path(&TrackKey::global());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"total_words": 9, "learned_words": ["A"], "pending_words": ["a", "b", "c"], "assigned_words": ["b"], "current_book_chapter": 2}"#,
        )
        .unwrap();

        let track = store.load(&TrackKey::global()).unwrap();
        assert_eq!(track.origin(), LoadOrigin::Repaired);
        assert_eq!(track.state().pending_words, vec!["c"]);
        assert_eq!(track.state().assigned_words, vec!["b"]);
        assert!(track.state().is_learned("a"));
        assert_eq!(track.state().total_words, 3);
        assert!(track.state().is_partitioned());
    }

    #[test]
    fn test_corrupt_state_is_reported_then_recovered() {
        let (store, _temp) = create_test_store(&["a", "b"]);
        let path = store.track_path(&TrackKey::global());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let err = store.read_state(&TrackKey::global()).unwrap_err();
        assert!(matches!(err, CurriculumError::CorruptState { .. }));

        let track = store.load(&TrackKey::global()).unwrap();
        assert_eq!(track.origin(), LoadOrigin::Recovered);
        assert_eq!(track.state().pending_words, vec!["a", "b"]);
        assert_eq!(
            fs::read_to_string(path.with_extension("json.corrupt")).unwrap(),
            "{ not json"
        );
    }

    #[test]
    fn test_state_without_word_lists_is_corrupt() {
        let (store, _temp) = create_test_store(&["a", "b", "c"]);
        let path = store.track_path(&TrackKey::global());
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        fs::write(&path, r#"{"pending_words": ["a"], "current_book_chapter": 3}"#).unwrap();
        let err = store.read_state(&TrackKey::global()).unwrap_err();
        assert!(matches!(err, CurriculumError::CorruptState { .. }));

        fs::write(&path, "{}").unwrap();
        let err = store.read_state(&TrackKey::global()).unwrap_err();
        assert!(matches!(err, CurriculumError::CorruptState { .. }));

        let track = store.load(&TrackKey::global()).unwrap();
        assert_eq!(track.origin(), LoadOrigin::Recovered);
        assert_eq!(track.state().pending_words, vec!["a", "b", "c"]);
        assert_eq!(track.state().total_words, 3);
        assert_eq!(fs::read_to_string(path.with_extension("json.corrupt")).unwrap(), "{}");
    }

    #[test]
    fn test_repeated_recovery_keeps_every_backup() {
        let (store, _temp) = create_test_store(&["a", "b"]);
        let path = store.track_path(&TrackKey::global());
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        fs::write(&path, "first-bad").unwrap();
        assert_eq!(store.load(&TrackKey::global()).unwrap().origin(), LoadOrigin::Recovered);
        fs::write(&path, "second-bad").unwrap();
        assert_eq!(store.load(&TrackKey::global()).unwrap().origin(), LoadOrigin::Recovered);
        fs::write(&path, "third-bad").unwrap();
        assert_eq!(store.load(&TrackKey::global()).unwrap().origin(), LoadOrigin::Recovered);

        let read = |ext: &str| fs::read_to_string(path.with_extension(ext)).unwrap();
        assert_eq!(read("json.corrupt"), "first-bad");
        assert_eq!(read("json.corrupt.1"), "second-bad");
        assert_eq!(read("json.corrupt.2"), "third-bad");
    }

    #[test]
    fn test_corrupt_state_without_corpus_is_left_in_place() {
        let (store, _temp) = create_test_store(&["a", "b"]);
        let path = store.track_path(&TrackKey::global());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        fs::remove_file(store.corpus_path()).unwrap();

        let err = store.load(&TrackKey::global()).unwrap_err();
        assert!(matches!(err, CurriculumError::CorpusMissing(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
        assert!(!path.with_extension("json.corrupt").exists());
    }

    #[test]
    fn test_read_state_not_found() {
        let (store, _temp) = create_test_store(&["a"]);
        let err = store.read_state(&TrackKey::global()).unwrap_err();
        assert!(matches!(err, CurriculumError::NotFound(_)));
    }

    #[test]
    fn test_tracks_are_independent() {
        let corpus = ["a", "b", "c"];
        let (store, _temp) = create_test_store(&corpus);
        let romance = TrackKey::category("romance").unwrap();
        let suspense = TrackKey::category("suspense").unwrap();

        let mut track = store.load(&romance).unwrap();
        track.reserve_batch(3, None).unwrap();
        track.complete_batch(&corpus).unwrap();

        let other = store.load(&suspense).unwrap();
        assert_eq!(other.state().pending_words, vec!["a", "b", "c"]);
        assert_eq!(store.load(&romance).unwrap().stats().learned_words, 3);
        assert!(store.data_dir().join("progress_tracker_romance.json").exists());
        assert!(store.data_dir().join("progress_tracker_suspense.json").exists());
    }

    #[test]
    fn test_round_trip() {
        let (store, _temp) = create_test_store(&["a", "b", "c", "d", "e"]);
        let mut track = store.load(&TrackKey::global()).unwrap();
        track.reserve_batch(3, None).unwrap();
        track.complete_batch(&["b"]).unwrap();
        track.advance_chapter().unwrap();

        let reloaded = store.load(&TrackKey::global()).unwrap();
        assert_eq!(reloaded.origin(), LoadOrigin::Existing);
        assert_eq!(reloaded.state(), track.state());
    }

    #[test]
    fn test_write_failure_keeps_previous_state() {
        let (store, temp) = create_test_store(&["a", "b"]);
        let mut track = store.load(&TrackKey::global()).unwrap();
        let before = track.state().clone();

        // A directory where the temp file should go makes the write fail
        let blocker = track.path().with_extension("json.tmp");
        fs::create_dir_all(&blocker).unwrap();

        let err = track.reserve_batch(1, None).unwrap_err();
        assert!(matches!(err, CurriculumError::WriteFailure { .. }));
        assert_eq!(track.state(), &before);
        assert_eq!(store.read_state(&TrackKey::global()).unwrap(), before);
        drop(temp);
    }

    #[test]
    fn test_random_operation_sequence_keeps_partition() {
        let corpus: Vec<String> = (0..40).map(|i| format!("word{}", i)).collect();
        let corpus_refs: Vec<&str> = corpus.iter().map(String::as_str).collect();
        let (store, _temp) = create_test_store(&corpus_refs);
        let mut track = store.load(&TrackKey::global()).unwrap();
        let mut rng = StdRng::seed_from_u64(99);

        for step in 0..60 {
            match rng.gen_range(0..4) {
                0 => {
                    let before = track.state().clone();
                    let pool = PreferencePool::from_words(
                        (0..5).map(|_| format!("word{}", rng.gen_range(0..40))),
                    );
                    let reservation = track.reserve_batch(rng.gen_range(0..6), Some(&pool)).unwrap();
                    for word in &reservation.words {
                        assert!(!before.is_assigned(word) && !before.is_learned(word));
                    }
                }
                1 => {
                    let assigned = track.state().assigned_words.clone();
                    let take = rng.gen_range(0..=assigned.len());
                    track.complete_batch(&assigned[..take]).unwrap();
                }
                2 => {
                    let word = format!("WORD{}", rng.gen_range(0..40));
                    track.release(&[word]).unwrap();
                }
                _ => {
                    track.sample_review_with(3, &mut rng);
                }
            }
            assert_partition(&track, &corpus_refs);
            assert_eq!(
                &store.read_state(&TrackKey::global()).unwrap(),
                track.state(),
                "disk diverged at step {}",
                step
            );
        }
    }
}
