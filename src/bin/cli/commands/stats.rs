use anyhow::Result;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let stats = app.stats();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "track": app.track.key().to_string(),
                "category": app.track.key().category_id(),
                "stateFile": app.track.path().to_string_lossy(),
                "stats": stats,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Track: {} ({})", app.track.key(), app.track.path().display());
            println!("  Total words:    {}", stats.total_words);
            println!("  Learned:        {}", stats.learned_words);
            println!("  Pending:        {} ({}%)", stats.pending_words, stats.pending_percent);
            if stats.assigned_words > 0 {
                println!("  Assigned:       {}", stats.assigned_words);
            }
            println!("  Progress:       {}%", stats.progress_percent);
            println!("  Chapter:        {}", stats.current_chapter);
        }
    }

    Ok(())
}
