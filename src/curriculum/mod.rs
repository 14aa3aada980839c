//! Vocabulary curriculum for chapter-by-chapter content generation
//!
//! This module provides:
//! - Per-track curriculum state (pending, assigned, learned) persisted as JSON
//! - Batch selection with preference-pool backfill
//! - Review sampling from learned words
//! - The reserve, generate, complete workflow around an external generator

pub mod config;
pub mod models;
pub mod selector;
pub mod storage;
pub mod words;
pub mod workflow;

pub use config::CurriculumConfig;
pub use models::*;
pub use storage::{CurriculumError, CurriculumStore, Track};
pub use words::{normalize_word, Corpus, PreferencePool};
pub use workflow::{produce_unit, ContentGenerator, GenerationRequest, UnitOutcome, UnitPlan};
