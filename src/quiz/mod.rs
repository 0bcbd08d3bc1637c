pub mod prompt;
pub mod schema;

pub use prompt::{Difficulty, build_prompt};

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::QuizResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub answers: Vec<Answer>,
}

impl Question {
    /// Index of the first answer flagged correct
    pub fn correct_index(&self) -> Option<usize> {
        self.answers.iter().position(|a| a.correct)
    }

    pub fn is_correct(&self, selected: usize) -> bool {
        self.answers.get(selected).is_some_and(|a| a.correct)
    }
}

/// Arguments of a `create_quiz` function call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Decode the JSON arguments returned by the model.
    ///
    /// Questions with no correct answer are accepted and logged.
    pub fn from_arguments(arguments: &str) -> QuizResult<Self> {
        let quiz: Quiz = serde_json::from_str(arguments)?;

        for (i, q) in quiz.questions.iter().enumerate() {
            if q.correct_index().is_none() {
                warn!(question = i + 1, text = %q.question, "question has no correct answer");
            }
        }

        Ok(quiz)
    }

    /// Shuffle each question's answers independently
    pub fn shuffle_answers(&mut self) {
        let mut rng = rand::thread_rng();
        for question in &mut self.questions {
            question.answers.shuffle(&mut rng);
        }
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.questions.len()
    }
}
