use anyhow::Result;
use clap::{ArgGroup, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::Colorize;
use std::io;

mod app;
mod cache;
mod commands;
mod config;
mod error;
mod ingest;
mod llm;
mod pipeline;
mod quiz;
mod render;
mod retriever;
mod session;

use quiz::Difficulty;

/// ASCII art banner for the application
const BANNER: &str = r#"
   ___        _      ____ ____ _____
  / _ \ _   _(_)____/ ___|  _ \_   _|
 | | | | | | | |_  / |  _| |_) || |
 | |_| | |_| | |/ /| |_| |  __/ | |
  \__\_\\__,_|_/___|\____|_|    |_|
"#;

/// Print the application banner
fn print_banner() {
    println!("{}", BANNER.cyan().bold());
}

/// Print a styled status line
fn print_status(label: &str, value: &str, icon: &str) {
    println!(
        "  {} {} {}",
        icon,
        format!("{}:", label).dimmed(),
        value.cyan()
    );
}

#[derive(Parser)]
#[command(name = "quizgpt")]
#[command(about = "Make a quiz from a document or a Wikipedia topic with an LLM")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz (prompts for anything not given)
    #[command(group(ArgGroup::new("source").args(["file", "topic"])))]
    Quiz {
        /// Quiz difficulty (easy or hard)
        #[arg(short, long, value_parser = parse_difficulty)]
        difficulty: Option<Difficulty>,
        /// Document to quiz on (pdf, docx or txt)
        #[arg(short, long)]
        file: Option<String>,
        /// Wikipedia topic to quiz on
        #[arg(short, long)]
        topic: Option<String>,
    },
    /// Configure settings (API key)
    Config,
    /// Inspect or clear cached files, searches and quizzes
    Cache {
        #[command(subcommand)]
        action: Option<CacheAction>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache contents
    Info,
    /// Remove every cached entry and uploaded file
    Clear,
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::parse(s).ok_or_else(|| format!("unknown difficulty '{}' (easy or hard)", s))
}

fn init_tracing() {
    // Logs go to stderr so they do not interleave with the quiz screen
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizgpt=warn".into()),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Quiz {
            difficulty,
            file,
            topic,
        }) => {
            commands::quiz::run(commands::quiz::QuizArgs {
                difficulty,
                file,
                topic,
            })
            .await?;
        }
        Some(Commands::Config) => {
            commands::config::run().await?;
        }
        Some(Commands::Cache { action }) => match action {
            Some(CacheAction::Clear) => commands::cache::clear().await?,
            Some(CacheAction::Info) | None => commands::cache::info().await?,
        },
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
        None => {
            run_interactive().await?;
        }
    }

    Ok(())
}

async fn run_interactive() -> Result<()> {
    use inquire::Select;

    print_banner();

    println!(
        "  {} {}",
        "Version:".dimmed(),
        env!("CARGO_PKG_VERSION").cyan()
    );
    println!(
        "  {} {}\n",
        "Powered by:".dimmed(),
        "OpenAI function calling + Wikipedia".green()
    );

    println!("{}", "─".repeat(50).dimmed());

    let has_api_key = config::Config::load()
        .map(|c| c.get_api_key().is_some())
        .unwrap_or(false);

    let api_status = if has_api_key {
        "Configured".green().to_string()
    } else {
        "Not set (you will be asked)".yellow().to_string()
    };
    print_status("API Key", &api_status, "🔑");
    print_status("Model", llm::openai::DEFAULT_MODEL, "🤖");

    println!("{}\n", "─".repeat(50).dimmed());

    let options = vec![
        "❓  Take a quiz",
        "🗄️   Cache info",
        "🧹  Clear cache",
        "⚙️   Configure settings",
        "🚪  Exit",
    ];

    let selection = Select::new("What would you like to do?", options)
        .with_help_message("Use arrow keys to navigate, Enter to select")
        .prompt()?;

    println!();

    match selection {
        s if s.contains("Take a quiz") => {
            commands::quiz::run(commands::quiz::QuizArgs::default()).await?
        }
        s if s.contains("Cache info") => commands::cache::info().await?,
        s if s.contains("Clear cache") => commands::cache::clear().await?,
        s if s.contains("Configure") => commands::config::run().await?,
        s if s.contains("Exit") => {
            println!("{}", "👋 Thanks for using QuizGPT! Happy learning!".cyan());
        }
        _ => unreachable!(),
    }

    Ok(())
}
