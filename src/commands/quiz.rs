use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{InquireError, Password, Select, Text};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::app::QuizApp;
use crate::cache::{CacheStore, SqliteStore};
use crate::config::Config;
use crate::ingest::splitter::SplitterConfig;
use crate::ingest::{ACCEPTED_TYPES, CharacterTextSplitter, UploadedFile};
use crate::llm::OpenAiProvider;
use crate::pipeline::QuizPipeline;
use crate::quiz::Difficulty;
use crate::render;
use crate::retriever::WikipediaRetriever;
use crate::session::{Event, Phase, Session, SessionContext, SourceKind};

/// Inputs given on the command line
#[derive(Debug, Default)]
pub struct QuizArgs {
    pub difficulty: Option<Difficulty>,
    pub file: Option<String>,
    pub topic: Option<String>,
}

pub async fn run(args: QuizArgs) -> Result<()> {
    let config = Config::load()?;
    let cache_dir = config.cache_dir()?;
    let store = SqliteStore::open_at_path(config.memo_db_path()?)
        .context("Failed to open the quiz cache")?;
    let store: Arc<dyn CacheStore> = Arc::new(store);

    let pipeline = QuizPipeline::new(
        store,
        cache_dir,
        Box::new(WikipediaRetriever::default()),
        Box::new(OpenAiProvider),
    )
    .with_splitter(
        CharacterTextSplitter::from_tiktoken_encoder(SplitterConfig::default())
            .context("Failed to load the tokenizer")?,
    );

    let context = SessionContext::with_credential(&config.get_api_key().unwrap_or_default());
    let mut app = QuizApp::new(Session::new(context), pipeline);

    print_title();

    let difficulty = match args.difficulty {
        Some(d) => Some(d),
        None => prompt_difficulty()?,
    };
    if let Some(difficulty) = difficulty {
        app.dispatch(Event::DifficultyChanged(difficulty)).await;
    }

    if let Some(path) = args.file {
        load_file(&mut app, &path).await;
    } else if let Some(topic) = args.topic {
        search_topic(&mut app, topic).await;
    } else {
        choose_source(&mut app).await?;
    }

    if !app.session.context.has_credential() && !app.session.docs.is_empty() {
        prompt_credential(&mut app).await?;
    }

    main_loop(&mut app).await
}

fn print_title() {
    println!();
    println!(
        "    {}",
        "╭──────────────────────────────────────────────────────╮".magenta()
    );
    println!(
        "    {}                   {}                    {}",
        "│".magenta(),
        "❓ QUIZGPT ❓".bold().white(),
        "│".magenta()
    );
    println!(
        "    {}   {}   {}",
        "│".magenta(),
        "Make a quiz from a file or a Wikipedia topic".dimmed(),
        "│".magenta()
    );
    println!(
        "    {}",
        "╰──────────────────────────────────────────────────────╯".magenta()
    );
    println!();
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Dispatch an event behind a spinner
async fn dispatch_with_spinner(app: &mut QuizApp, event: Event, message: &str) {
    let spinner = spinner(message);
    app.dispatch(event).await;
    spinner.finish_and_clear();
}

/// Esc or Ctrl-C on a follow-up prompt leaves the session unchanged
fn optional<T>(answer: Result<T, InquireError>) -> Result<Option<T>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn prompt_difficulty() -> Result<Option<Difficulty>> {
    let select = Select::new("Choose the difficulty of the quiz", Difficulty::ALL.to_vec());
    optional(select.prompt())
}

async fn choose_source(app: &mut QuizApp) -> Result<()> {
    let select = Select::new("Choose the source of the quiz", SourceKind::ALL.to_vec());
    let Some(kind) = optional(select.prompt())? else {
        return Ok(());
    };

    match kind {
        SourceKind::Wikipedia => {
            let topic = Text::new("Search Wikipedia:")
                .with_help_message("A topic such as \"Paris\"")
                .prompt();
            if let Some(topic) = optional(topic)? {
                app.dispatch(Event::SourceKindChanged(SourceKind::Wikipedia))
                    .await;
                search_topic(app, topic).await;
            }
        }
        SourceKind::File => {
            let help = format!("Path to a {} file", ACCEPTED_TYPES.join(", "));
            let path = Text::new("Upload a file:").with_help_message(&help).prompt();
            if let Some(path) = optional(path)? {
                load_file(app, path.trim()).await;
            }
        }
    }

    Ok(())
}

/// Read a file from disk and hand it to the app.
///
/// An unreadable path becomes the screen notice and leaves the current quiz in place.
async fn load_file(app: &mut QuizApp, path: &str) {
    match UploadedFile::from_path(Path::new(path)) {
        Ok(file) => dispatch_with_spinner(app, Event::FileSelected(file), "Loading file...").await,
        Err(e) => {
            warn!(path, error = %e, "could not read upload");
            app.report(e);
        }
    }
}

async fn search_topic(app: &mut QuizApp, topic: String) {
    dispatch_with_spinner(app, Event::TopicSubmitted(topic), "Searching Wikipedia...").await;
}

async fn prompt_credential(app: &mut QuizApp) -> Result<()> {
    let key = Password::new("Enter your OpenAI API key:")
        .without_confirmation()
        .with_help_message("Leave empty to clear the key for this session")
        .prompt();
    if let Some(key) = optional(key)? {
        dispatch_with_spinner(app, Event::CredentialChanged(key), "Making quiz...").await;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Answer(usize),
    Submit,
    ChangeDifficulty,
    NewSource,
    SetKey,
    Exit,
}

fn actions(session: &Session) -> Vec<(String, Action)> {
    let mut actions = Vec::new();
    if let Some(quiz) = &session.quiz {
        for (i, q) in quiz.questions.iter().enumerate() {
            actions.push((
                format!("✏️   Answer question {} │ {}", i + 1, q.question),
                Action::Answer(i),
            ));
        }
        actions.push(("✅  Submit".to_string(), Action::Submit));
    }
    actions.push(("🎚️   Change difficulty".to_string(), Action::ChangeDifficulty));
    actions.push(("📄  New source".to_string(), Action::NewSource));
    actions.push(("🔑  Set API key".to_string(), Action::SetKey));
    actions.push(("🚪  Exit".to_string(), Action::Exit));
    actions
}

async fn main_loop(app: &mut QuizApp) -> Result<()> {
    loop {
        println!();
        render::print(&render::view(&app.session));

        if app.session.phase() == Phase::QuizSubmitted
            && app.session.score().is_some_and(|s| s.is_perfect())
        {
            celebrate();
        }

        let (labels, choices): (Vec<String>, Vec<Action>) =
            actions(&app.session).into_iter().unzip();

        let action = match Select::new("What next?", labels).raw_prompt() {
            Ok(choice) => choices[choice.index],
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match action {
            Action::Answer(index) => answer_question(app, index).await?,
            Action::Submit => app.dispatch(Event::Submitted).await,
            Action::ChangeDifficulty => {
                if let Some(difficulty) = prompt_difficulty()? {
                    dispatch_with_spinner(
                        app,
                        Event::DifficultyChanged(difficulty),
                        "Making quiz...",
                    )
                    .await;
                }
            }
            Action::NewSource => choose_source(app).await?,
            Action::SetKey => prompt_credential(app).await?,
            Action::Exit => break,
        }
    }

    println!("{}", "👋 Thanks for using QuizGPT!".cyan());
    Ok(())
}

async fn answer_question(app: &mut QuizApp, index: usize) -> Result<()> {
    let Some(question) = app
        .session
        .quiz
        .as_ref()
        .and_then(|q| q.questions.get(index))
        .cloned()
    else {
        return Ok(());
    };

    let options: Vec<String> = question
        .answers
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{}) {}", render::option_label(i), a.answer))
        .collect();

    let choice = Select::new(&question.question, options)
        .with_help_message("Select an option")
        .raw_prompt();
    if let Some(choice) = optional(choice)? {
        app.dispatch(Event::AnswerSelected {
            question: index,
            answer: choice.index,
        })
        .await;
    }
    Ok(())
}

fn celebrate() {
    println!(
        "\n    {}  {}  {}\n",
        "🎈🎉🎈".bold(),
        "PERFECT SCORE".green().bold(),
        "🎈🎉🎈".bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{MockProvider, MockRetriever, test_pipeline};
    use crate::session::Notice;

    async fn app_with_quiz(name: &str) -> QuizApp {
        let pipeline = test_pipeline(name, MockRetriever::default(), MockProvider::default());
        let mut app = QuizApp::new(
            Session::new(SessionContext::with_credential("sk-test")),
            pipeline,
        );
        app.dispatch(Event::TopicSubmitted("Paris".to_string())).await;
        app
    }

    #[tokio::test]
    async fn test_unreadable_path_keeps_quiz() {
        let mut app = app_with_quiz("badpath").await;
        let quiz = app.session.quiz.clone();
        assert!(quiz.is_some());

        let missing = format!("/tmp/quizgpt_missing_{}.txt", std::process::id());
        load_file(&mut app, &missing).await;

        assert!(matches!(app.session.notice, Some(Notice::Error(_))));
        assert_eq!(app.session.quiz, quiz);
        assert_eq!(app.session.source_label.as_deref(), Some("Paris"));
        assert_eq!(app.session.phase(), Phase::QuizDisplayed);
    }

    #[tokio::test]
    async fn test_readable_path_replaces_source() {
        let mut app = app_with_quiz("goodpath").await;

        let path = format!("/tmp/quizgpt_upload_{}.txt", std::process::id());
        std::fs::write(&path, "The Louvre is in Paris.").unwrap();
        load_file(&mut app, &path).await;

        assert_eq!(app.session.notice, None);
        assert_eq!(
            app.session.source_label.as_deref(),
            Some(format!("quizgpt_upload_{}.txt", std::process::id()).as_str())
        );
        assert_eq!(app.session.source_kind, SourceKind::File);
        assert!(app.session.quiz.is_some());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_actions_map_to_question_indices() {
        let app = app_with_quiz("actions").await;
        let choices: Vec<Action> = actions(&app.session).into_iter().map(|(_, a)| a).collect();

        assert_eq!(
            choices,
            vec![
                Action::Answer(0),
                Action::Answer(1),
                Action::Submit,
                Action::ChangeDifficulty,
                Action::NewSource,
                Action::SetKey,
                Action::Exit,
            ]
        );

        let empty: Vec<Action> = actions(&Session::default())
            .into_iter()
            .map(|(_, a)| a)
            .collect();
        assert_eq!(empty.first(), Some(&Action::ChangeDifficulty));
    }
}
