use anyhow::{bail, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run_complete(app: &mut App, words: &[String], format: &OutputFormat) -> Result<()> {
    if words.is_empty() {
        bail!("No words given to mark as learned");
    }
    let completion = app.complete(words)?;
    let stats = app.stats();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "completion": completion,
                "stats": stats,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Marked {} words as learned", completion.learned.len());
            if !completion.already_learned.is_empty() {
                println!("  Already learned: {}", completion.already_learned.join(", "));
            }
            if !completion.unknown.is_empty() {
                println!("  Not in this track: {}", completion.unknown.join(", "));
            }
            println!(
                "  Pending: {}, assigned: {}, learned: {}",
                stats.pending_words, stats.assigned_words, stats.learned_words
            );
        }
    }

    Ok(())
}

pub fn run_release(app: &mut App, words: &[String], all: bool, format: &OutputFormat) -> Result<()> {
    if words.is_empty() && !all {
        bail!("Give words to release, or --all");
    }
    let release = app.release(words, all)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&release)?),
        OutputFormat::Plain => {
            println!("Released {} words back to pending", release.released.len());
            if !release.not_assigned.is_empty() {
                println!("  Not assigned: {}", release.not_assigned.join(", "));
            }
        }
    }

    Ok(())
}

pub fn run_advance(app: &mut App, format: &OutputFormat) -> Result<()> {
    let chapter = app.advance()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "currentChapter": chapter }));
        }
        OutputFormat::Plain => println!("Now at chapter {}", chapter),
    }

    Ok(())
}
