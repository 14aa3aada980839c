use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use curriculum_lib::curriculum::{
    Completion, CurriculumConfig, CurriculumStats, CurriculumStore, PreferencePool, Release,
    Reservation, ReviewSample, Track, TrackKey,
};

/// Shared application state for CLI commands
pub struct App {
    pub config: CurriculumConfig,
    pub track: Track,
}

impl App {
    /// Resolve configuration (file, then flag overrides) and load the track
    pub fn new(
        config_path: Option<&Path>,
        data_dir: Option<PathBuf>,
        corpus: Option<PathBuf>,
        category: Option<&str>,
    ) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => CurriculumConfig::load(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => CurriculumConfig::default(),
        };
        if data_dir.is_some() {
            config.data_dir = data_dir;
        }
        if corpus.is_some() {
            config.corpus_path = corpus;
        }

        let store = CurriculumStore::from_config(&config)
            .context("Failed to resolve data directory")?;
        let key = TrackKey::from_option(category)?;
        let track = store
            .load(&key)
            .with_context(|| format!("Failed to load track '{}'", key))?;

        Ok(Self { config, track })
    }

    pub fn stats(&self) -> CurriculumStats {
        self.track.stats()
    }

    /// Preference pool from an explicit file, else from config when asked for
    pub fn preference_pool(&self, prefer_missing: bool, pool_file: Option<&Path>) -> Option<PreferencePool> {
        match pool_file {
            Some(path) => Some(PreferencePool::load(path)),
            None if prefer_missing => match self.config.preference_pool.as_deref() {
                Some(path) => Some(PreferencePool::load(path)),
                None => {
                    log::warn!("--prefer-missing given but no preference_pool is configured");
                    None
                }
            },
            None => None,
        }
    }

    pub fn reserve(&mut self, count: usize, pool: Option<&PreferencePool>) -> Result<Reservation> {
        self.track
            .reserve_batch(count, pool)
            .context("Failed to reserve new words")
    }

    pub fn review(&self, count: usize) -> ReviewSample {
        self.track.sample_review(count)
    }

    pub fn complete(&mut self, words: &[String]) -> Result<Completion> {
        self.track
            .complete_batch(words)
            .context("Failed to mark words as learned")
    }

    pub fn release(&mut self, words: &[String], all: bool) -> Result<Release> {
        let release = if all {
            self.track.release_all()
        } else {
            self.track.release(words)
        };
        release.context("Failed to release assigned words")
    }

    pub fn advance(&mut self) -> Result<u32> {
        self.track
            .advance_chapter()
            .context("Failed to advance chapter")
    }
}
