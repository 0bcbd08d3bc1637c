use thiserror::Error;

/// Errors raised while building a quiz.
///
/// `NoLlm` and `Credential` are credential problems and are shown as warnings;
/// everything else is a pipeline error caught at the quiz-generation boundary.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("No LLM available: enter your OpenAI API key")]
    NoLlm,
    #[error("Invalid API key: {0}")]
    Credential(String),
    #[error("Unsupported file type: {0} (expected pdf, docx or txt)")]
    UnsupportedFile(String),
    #[error("Failed to extract text: {0}")]
    Extraction(String),
    #[error("Wikipedia search failed: {0}")]
    Retrieval(String),
    #[error("OpenAI API error: {0}")]
    Api(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Could not decode quiz: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache error: {0}")]
    Cache(String),
}

impl QuizError {
    /// True for errors caused by a missing or rejected API key.
    pub fn is_credential(&self) -> bool {
        matches!(self, QuizError::NoLlm | QuizError::Credential(_))
    }
}

impl From<rusqlite::Error> for QuizError {
    fn from(e: rusqlite::Error) -> Self {
        QuizError::Cache(e.to_string())
    }
}

pub type QuizResult<T> = std::result::Result<T, QuizError>;
