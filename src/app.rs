use tracing::debug;

use crate::error::QuizError;
use crate::pipeline::{QuizPipeline, QuizRequest};
use crate::session::{Event, Notice, Session, SourceKind};

/// Applies events to a session and runs the pipeline steps they need
pub struct QuizApp {
    pub session: Session,
    pipeline: QuizPipeline,
}

impl QuizApp {
    pub fn new(session: Session, pipeline: QuizPipeline) -> Self {
        Self { session, pipeline }
    }

    pub async fn dispatch(&mut self, event: Event) {
        debug!(?event, "dispatch");
        self.session.notice = None;

        match event {
            Event::DifficultyChanged(difficulty) => self.session.set_difficulty(difficulty),
            Event::SourceKindChanged(kind) => self.session.set_source_kind(kind),
            Event::FileSelected(file) => {
                self.session.set_source_kind(SourceKind::File);
                match self.pipeline.split_file(&file).await {
                    Ok(docs) => self.session.set_source(file.safe_name(), docs),
                    Err(e) => {
                        self.session.clear_source();
                        self.report(e);
                    }
                }
            }
            Event::TopicSubmitted(topic) => {
                self.session.set_source_kind(SourceKind::Wikipedia);
                let topic = topic.trim().to_string();
                if topic.is_empty() {
                    self.session.clear_source();
                } else {
                    match self.pipeline.wikipedia_search(&topic).await {
                        Ok(docs) => {
                            if docs.is_empty() {
                                self.session.notice = Some(Notice::Warning(format!(
                                    "No Wikipedia articles found for '{}'",
                                    topic
                                )));
                            }
                            self.session.set_source(topic, docs);
                        }
                        Err(e) => {
                            self.session.clear_source();
                            self.report(e);
                        }
                    }
                }
            }
            Event::CredentialChanged(value) => self.session.set_credential(&value),
            Event::AnswerSelected { question, answer } => {
                self.session.select(question, answer);
            }
            Event::Submitted => {
                self.session.submit();
            }
        }

        self.refresh_quiz().await;
    }

    /// Build the quiz once a source and a credential are both present
    async fn refresh_quiz(&mut self) {
        if !self.session.needs_quiz() {
            return;
        }

        let request = QuizRequest {
            docs: self.session.docs.clone(),
            source: self.session.source_label.clone().unwrap_or_default(),
            difficulty: self.session.difficulty,
        };

        match self
            .pipeline
            .run_quiz_chain(&mut self.session.context, &request)
            .await
        {
            Ok(quiz) => self.session.set_quiz(quiz),
            Err(e) => self.report(e),
        }
    }

    /// Record an error as the notice shown on the next screen
    pub fn report(&mut self, error: QuizError) {
        self.session.notice = Some(match error {
            QuizError::NoLlm => Notice::Warning("Please enter your OpenAI API key".to_string()),
            e if e.is_credential() => Notice::Warning(
                "Error initializing LLM: please check your OpenAI API key and try again."
                    .to_string(),
            ),
            other => Notice::Error(format!("Error running quiz chain: {}", other)),
        });
    }
}
