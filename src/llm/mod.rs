pub mod openai;

pub use openai::{OpenAiClient, OpenAiProvider};

use async_trait::async_trait;

use crate::error::QuizResult;

/// A chat model bound to the `create_quiz` function
#[async_trait]
pub trait QuizModel: Send + Sync {
    /// Send the prompt and return the raw function-call arguments
    async fn create_quiz(&self, prompt: &str) -> QuizResult<String>;
}

/// Builds a model for a session credential
pub trait ModelProvider: Send + Sync {
    fn connect(&self, api_key: &str) -> Box<dyn QuizModel>;
}
