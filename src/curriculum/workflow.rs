//! One content unit end to end: reserve, generate, complete.
//!
//! The text generator is an external collaborator behind
//! [`ContentGenerator`]. A failed generation leaves the reserved words
//! assigned; they can be completed later or handed back with
//! [`Track::release`]. Nothing is retried here.

use serde::Serialize;

use super::config::CurriculumConfig;
use super::storage::{CurriculumError, Result, Track};
use super::words::PreferencePool;

pub type GenerationError = Box<dyn std::error::Error + Send + Sync>;

/// Everything the generator is told about one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub chapter: u32,
    pub new_words: Vec<String>,
    pub review_words: Vec<String>,
    /// Free-form story context (genre, theme) passed through untouched
    pub context: String,
}

pub trait ContentGenerator {
    fn generate(&mut self, request: &GenerationRequest) -> std::result::Result<String, GenerationError>;
}

impl<F> ContentGenerator for F
where
    F: FnMut(&GenerationRequest) -> std::result::Result<String, GenerationError>,
{
    fn generate(&mut self, request: &GenerationRequest) -> std::result::Result<String, GenerationError> {
        self(request)
    }
}

/// Sizes and hints for one unit
#[derive(Debug, Clone, Default)]
pub struct UnitPlan {
    pub new_words: usize,
    pub review_words: usize,
    pub preference_pool: Option<PreferencePool>,
    pub context: String,
}

impl UnitPlan {
    /// Unit sizes from config; the preference pool file is read if configured
    pub fn from_config(config: &CurriculumConfig) -> Self {
        Self {
            new_words: config.new_words_per_unit,
            review_words: config.review_words_per_unit,
            preference_pool: config.preference_pool.as_deref().map(PreferencePool::load),
            context: String::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// A unit whose words are now learned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOutcome {
    pub chapter: u32,
    pub content: String,
    pub new_words: Vec<String>,
    pub review_words: Vec<String>,
}

/// Produce the next unit for `track`.
///
/// Returns `Ok(None)` when no pending words are left.
pub fn produce_unit<G: ContentGenerator + ?Sized>(
    track: &mut Track,
    generator: &mut G,
    plan: &UnitPlan,
) -> Result<Option<UnitOutcome>> {
    let chapter = track.current_chapter();
    let reservation = track.reserve_batch(plan.new_words, plan.preference_pool.as_ref())?;
    if reservation.is_empty() {
        log::info!("Track {} has no pending words left", track.key());
        return Ok(None);
    }
    let review = track.sample_review(plan.review_words);

    let request = GenerationRequest {
        chapter,
        new_words: reservation.words,
        review_words: review.words,
        context: plan.context.clone(),
    };

    let content = match generator.generate(&request) {
        Ok(content) => content,
        Err(source) => {
            log::warn!(
                "Generation failed for chapter {} of track {}; {} words stay assigned",
                chapter,
                track.key(),
                request.new_words.len()
            );
            return Err(CurriculumError::Generation { chapter, source });
        }
    };

    track.complete_batch(&request.new_words)?;
    track.advance_chapter()?;

    Ok(Some(UnitOutcome {
        chapter,
        content,
        new_words: request.new_words,
        review_words: request.review_words,
    }))
}
