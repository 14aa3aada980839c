use std::path::Path;

use anyhow::Result;

use curriculum_lib::curriculum::ReviewSample;

use crate::app::App;
use crate::OutputFormat;

/// Reserve new words and sample review words for the next unit
pub fn run_reserve(
    app: &mut App,
    count: Option<usize>,
    review_count: Option<usize>,
    prefer_missing: bool,
    pool_file: Option<&Path>,
    format: &OutputFormat,
) -> Result<()> {
    let count = count.unwrap_or(app.config.new_words_per_unit);
    let review_count = review_count.unwrap_or(app.config.review_words_per_unit);
    let pool = app.preference_pool(prefer_missing, pool_file);

    let chapter = app.track.current_chapter();
    let reservation = app.reserve(count, pool.as_ref())?;
    let review = app.review(review_count);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "track": app.track.key().to_string(),
                "chapter": chapter,
                "newWords": reservation,
                "reviewWords": review,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Chapter {} ({} track)", chapter, app.track.key());
            println!(
                "New words ({} of {} requested, {} from preference pool):",
                reservation.words.len(),
                reservation.requested,
                reservation.from_pool
            );
            for word in &reservation.words {
                println!("  - {}", word);
            }
            if reservation.is_short() {
                println!(
                    "  (only {} pending; {} short)",
                    reservation.words.len(),
                    reservation.shortfall()
                );
            }
            print_review(&review);
        }
    }

    Ok(())
}

/// Sample review words only; nothing is written
pub fn run_review(app: &App, count: Option<usize>, format: &OutputFormat) -> Result<()> {
    let count = count.unwrap_or(app.config.review_words_per_unit);
    let review = app.review(count);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&review)?),
        OutputFormat::Plain => print_review(&review),
    }

    Ok(())
}

fn print_review(review: &ReviewSample) {
    if review.words.is_empty() {
        println!("No review words yet");
        return;
    }
    if review.is_insufficient() {
        println!(
            "Review words (only {} learned, {} requested):",
            review.words.len(),
            review.requested
        );
    } else {
        println!("Review words:");
    }
    for word in &review.words {
        println!("  - {}", word);
    }
}
