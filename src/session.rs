//! Quiz session state.
//!
//! A [`Session`] holds the user's inputs and the quiz built from them. It is
//! mutated only through its methods, which the app controller calls while
//! handling an [`Event`], so the screen can be rendered from it at any time.

use std::fmt;

use crate::ingest::{Document, UploadedFile};
use crate::quiz::{Difficulty, Quiz};

/// Credential scope for one user session
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    credential: Option<String>,
}

impl SessionContext {
    pub fn with_credential(value: &str) -> Self {
        let mut ctx = Self::default();
        ctx.set_credential(value);
        ctx
    }

    /// Store a non-empty key, or clear the stored key when `value` is empty
    pub fn set_credential(&mut self, value: &str) {
        let value = value.trim();
        self.credential = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
    }

    pub fn clear_credential(&mut self) {
        self.credential = None;
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    File,
    Wikipedia,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::File, SourceKind::Wikipedia];
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::File => f.write_str("File"),
            SourceKind::Wikipedia => f.write_str("Wikipedia"),
        }
    }
}

/// User interactions that drive the session
#[derive(Debug, Clone)]
pub enum Event {
    DifficultyChanged(Difficulty),
    SourceKindChanged(SourceKind),
    FileSelected(UploadedFile),
    TopicSubmitted(String),
    CredentialChanged(String),
    AnswerSelected { question: usize, answer: usize },
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoSource,
    AwaitingCredential,
    QuizDisplayed,
    QuizSubmitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Wrong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    pub fn is_perfect(&self) -> bool {
        self.correct == self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Warning(String),
    Error(String),
}

#[derive(Debug, Default)]
pub struct Session {
    pub difficulty: Difficulty,
    pub source_kind: SourceKind,
    /// File name or topic the current documents came from
    pub source_label: Option<String>,
    pub docs: Vec<Document>,
    pub context: SessionContext,
    pub quiz: Option<Quiz>,
    selections: Vec<Option<usize>>,
    score: Option<Score>,
    pub notice: Option<Notice>,
}

impl Session {
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        if self.docs.is_empty() {
            Phase::NoSource
        } else if !self.context.has_credential() || self.quiz.is_none() {
            Phase::AwaitingCredential
        } else if self.score.is_some() {
            Phase::QuizSubmitted
        } else {
            Phase::QuizDisplayed
        }
    }

    /// True when a quiz can be requested but none is loaded
    pub fn needs_quiz(&self) -> bool {
        !self.docs.is_empty() && self.context.has_credential() && self.quiz.is_none()
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        if self.difficulty != difficulty {
            self.difficulty = difficulty;
            self.clear_quiz();
        }
    }

    pub fn set_source_kind(&mut self, kind: SourceKind) {
        if self.source_kind != kind {
            self.source_kind = kind;
            self.clear_source();
        }
    }

    pub fn set_source(&mut self, label: impl Into<String>, docs: Vec<Document>) {
        self.source_label = Some(label.into());
        self.docs = docs;
        self.clear_quiz();
    }

    pub fn clear_source(&mut self) {
        self.source_label = None;
        self.docs.clear();
        self.clear_quiz();
    }

    /// Empty input clears the credential and hides the quiz
    pub fn set_credential(&mut self, value: &str) {
        self.context.set_credential(value);
        if !self.context.has_credential() {
            self.clear_quiz();
        }
    }

    pub fn set_quiz(&mut self, quiz: Quiz) {
        self.selections = vec![None; quiz.len()];
        self.score = None;
        self.quiz = Some(quiz);
    }

    pub fn clear_quiz(&mut self) {
        self.quiz = None;
        self.selections.clear();
        self.score = None;
    }

    /// Select one answer for a question, replacing any earlier choice.
    ///
    /// Returns the immediate feedback, or `None` if the indices are out of range.
    pub fn select(&mut self, question: usize, answer: usize) -> Option<Feedback> {
        let quiz = self.quiz.as_ref()?;
        let q = quiz.questions.get(question)?;
        if answer >= q.answers.len() {
            return None;
        }

        self.selections[question] = Some(answer);
        // A changed form is no longer graded
        self.score = None;
        self.feedback(question)
    }

    pub fn selection(&self, question: usize) -> Option<usize> {
        self.selections.get(question).copied().flatten()
    }

    pub fn feedback(&self, question: usize) -> Option<Feedback> {
        let selected = self.selection(question)?;
        let q = self.quiz.as_ref()?.questions.get(question)?;
        if q.is_correct(selected) {
            Some(Feedback::Correct)
        } else {
            Some(Feedback::Wrong)
        }
    }

    /// Grade the current selections
    pub fn submit(&mut self) -> Option<Score> {
        let quiz = self.quiz.as_ref()?;
        let correct = quiz
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| self.selection(*i).is_some_and(|s| q.is_correct(s)))
            .count();

        let score = Score {
            correct,
            total: quiz.len(),
        };
        self.score = Some(score);
        Some(score)
    }

    pub fn score(&self) -> Option<Score> {
        self.score
    }
}
