use anyhow::{Context, Result};
use colored::Colorize;

use crate::cache::{CacheStore, SqliteStore};
use crate::config::Config;

fn open_store(config: &Config) -> Result<SqliteStore> {
    let path = config.memo_db_path()?;
    SqliteStore::open_at_path(path).context("Failed to open the quiz cache")
}

/// Show how many parsed files, searches and quizzes are cached
pub async fn info() -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;

    println!("\n{}", "Quiz cache:".bold());
    println!("{}", "─".repeat(30).dimmed());
    println!(
        "  Database: {}",
        store.path().display().to_string().dimmed()
    );

    let counts = store.namespace_counts()?;
    if counts.is_empty() {
        println!("  {}", "(empty)".dimmed());
    }
    for (namespace, count) in counts {
        println!("  {:<12} {}", format!("{}:", namespace), count.to_string().cyan());
    }

    let scratch = config.cache_dir()?.join("quiz_files");
    let files = std::fs::read_dir(&scratch).map(|d| d.count()).unwrap_or(0);
    println!("  {:<12} {}", "uploads:", files.to_string().cyan());

    Ok(())
}

/// Drop every cached result and the uploaded scratch files
pub async fn clear() -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;

    let removed = store.clear()?;

    let scratch = config.cache_dir()?.join("quiz_files");
    if scratch.exists() {
        std::fs::remove_dir_all(&scratch)
            .with_context(|| format!("Failed to remove {:?}", scratch))?;
    }

    println!("{} Cleared {} cached entries.", "✓".green(), removed);
    Ok(())
}
