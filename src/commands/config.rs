use anyhow::Result;
use colored::Colorize;
use inquire::{Password, Select};

use crate::config::{API_KEY_ENV, Config};
use crate::llm::openai::DEFAULT_MODEL;

pub async fn run() -> Result<()> {
    println!();
    println!(
        "    {}",
        "╭──────────────────────────────────────────────────────╮".bright_black()
    );
    println!(
        "    {}            {}            {}",
        "│".bright_black(),
        "⚙️  SETTINGS ⚙️".bold().white(),
        "│".bright_black()
    );
    println!(
        "    {}           {}           {}",
        "│".bright_black(),
        "Configure QuizGPT to your liking".dimmed(),
        "│".bright_black()
    );
    println!(
        "    {}",
        "╰──────────────────────────────────────────────────────╯".bright_black()
    );
    println!();

    let mut config = Config::load()?;

    let options = vec![
        "🔑  Set API Key        │ Configure OpenAI API access",
        "🧹  Clear API Key      │ Forget the stored key",
        "📋  View Settings      │ See current configuration",
        "←   Back",
    ];

    loop {
        let selection =
            Select::new("What would you like to configure?", options.clone()).prompt();

        let selection = match selection {
            Ok(s) => s,
            Err(inquire::InquireError::OperationCanceled)
            | Err(inquire::InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match selection {
            s if s.contains("Set API Key") => {
                if let Err(e) = set_api_key(&mut config) {
                    eprintln!("{} {}", "Error:".red(), e);
                }
            }
            s if s.contains("Clear API Key") => {
                if let Err(e) = clear_api_key(&mut config) {
                    eprintln!("{} {}", "Error:".red(), e);
                }
            }
            s if s.contains("View Settings") => {
                view_config(&config);
            }
            s if s.contains("Back") => break,
            _ => {}
        }

        println!();
    }

    Ok(())
}

fn set_api_key(config: &mut Config) -> Result<()> {
    println!(
        "\n{} Get your API key from {}",
        "Tip:".yellow(),
        "https://platform.openai.com/api-keys".cyan()
    );

    let key = Password::new("Enter your OpenAI API key:")
        .without_confirmation()
        .prompt()?;

    if key.trim().is_empty() {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }

    config.openai_api_key = Some(key.trim().to_string());
    config.save()?;

    println!("{} API key saved!", "✓".green());

    Ok(())
}

fn clear_api_key(config: &mut Config) -> Result<()> {
    config.openai_api_key = None;
    config.save()?;

    println!("{} Stored API key removed.", "✓".green());
    Ok(())
}

fn view_config(config: &Config) {
    println!("\n{}", "Current Configuration:".bold());
    println!("{}", "─".repeat(30).dimmed());

    let api_status = if config.has_stored_key() {
        "configured".green().to_string()
    } else if std::env::var(API_KEY_ENV).is_ok() {
        format!("set via {} env", API_KEY_ENV).yellow().to_string()
    } else {
        "not set".red().to_string()
    };

    println!("  API Key: {}", api_status);
    println!("  Model: {}", DEFAULT_MODEL);

    if let Ok(path) = Config::config_path() {
        println!("  Config file: {}", path.display().to_string().dimmed());
    }

    if let Ok(path) = config.cache_dir() {
        println!("  Cache directory: {}", path.display().to_string().dimmed());
    }
}
