mod app;
mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use curriculum_lib::curriculum::normalize_word;

#[derive(Parser)]
#[command(name = "curriculum-cli", about = "Vocabulary curriculum progress tracker", version)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding track state files (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Corpus JSON file (overrides config)
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Category track to operate on (default: global track)
    #[arg(long, global = true)]
    category: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Show progress statistics for the track
    Stats,

    /// Reserve new words (and sample review words) for the next unit
    Reserve {
        /// Number of new words (default from config)
        #[arg(long)]
        count: Option<usize>,
        /// Number of review words (default from config)
        #[arg(long)]
        review: Option<usize>,
        /// Take words from the configured preference pool first
        #[arg(long)]
        prefer_missing: bool,
        /// Preference pool file (newline-delimited); implies --prefer-missing
        #[arg(long)]
        pool: Option<PathBuf>,
    },

    /// Sample review words from learned words without changing anything
    Review {
        /// Number of review words (default from config)
        #[arg(long)]
        count: Option<usize>,
    },

    /// Mark words as learned
    Complete {
        /// Words to mark
        words: Vec<String>,
        /// Read additional words from a newline-delimited file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Return assigned words to pending
    Release {
        /// Words to release
        words: Vec<String>,
        /// Release every assigned word
        #[arg(long, conflicts_with = "words")]
        all: bool,
    },

    /// Advance the chapter counter
    Advance,
}

/// Combine positional words with words read from a file
fn collect_words(mut words: Vec<String>, file: Option<PathBuf>) -> Result<Vec<String>> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read word list {}", path.display()))?;
        words.extend(content.lines().filter_map(normalize_word));
    }
    Ok(words)
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut app = app::App::new(
        cli.config.as_deref(),
        cli.data_dir,
        cli.corpus,
        cli.category.as_deref(),
    )?;

    match cli.command {
        Command::Stats => commands::stats::run(&app, &cli.format)?,
        Command::Reserve {
            count,
            review,
            prefer_missing,
            pool,
        } => {
            commands::batch::run_reserve(
                &mut app,
                count,
                review,
                prefer_missing,
                pool.as_deref(),
                &cli.format,
            )?;
        }
        Command::Review { count } => commands::batch::run_review(&app, count, &cli.format)?,
        Command::Complete { words, file } => {
            let words = collect_words(words, file)?;
            commands::progress::run_complete(&mut app, &words, &cli.format)?;
        }
        Command::Release { words, all } => {
            commands::progress::run_release(&mut app, &words, all, &cli.format)?;
        }
        Command::Advance => commands::progress::run_advance(&mut app, &cli.format)?,
    }

    Ok(())
}
