use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ingest::Document;

const QUIZ_PROMPT: &str = "Make a {difficulty} 2-question quiz about this context: {context}.
Use 'Easy' for straightforward questions and 'Hard' for questions that demand deeper analysis.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Hard,
}

impl Difficulty {
    /// Selector order, the first entry is the default
    pub const ALL: [Difficulty; 2] = [Difficulty::Hard, Difficulty::Easy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Hard
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join chunk contents with a blank line
pub fn format_docs(docs: &[Document]) -> String {
    docs.iter()
        .map(|d| d.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(docs: &[Document], difficulty: Difficulty) -> String {
    // Fill context last so braces inside the documents are left alone
    QUIZ_PROMPT
        .replacen("{difficulty}", difficulty.as_str(), 1)
        .replacen("{context}", &format_docs(docs), 1)
}
