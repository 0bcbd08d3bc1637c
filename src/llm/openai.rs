use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use super::{ModelProvider, QuizModel};
use crate::error::{QuizError, QuizResult};
use crate::quiz::schema;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Low-cost model used for every quiz
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    functions: Vec<Value>,
    function_call: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: TEMPERATURE,
        }
    }

    fn request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
                function_call: None,
            }],
            temperature: self.temperature,
            functions: vec![schema::function_schema()],
            function_call: schema::function_call(),
        }
    }
}

/// Pull the function-call arguments out of a chat response
fn extract_arguments(response: ChatResponse) -> QuizResult<String> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| QuizError::Api("no choices in response".to_string()))?;

    match message.function_call {
        Some(call) if call.name == schema::FUNCTION_NAME => Ok(call.arguments),
        Some(call) => Err(QuizError::Api(format!(
            "model called unexpected function '{}'",
            call.name
        ))),
        None => Err(QuizError::Api(
            "model did not return a function call".to_string(),
        )),
    }
}

#[async_trait]
impl QuizModel for OpenAiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn create_quiz(&self, prompt: &str) -> QuizResult<String> {
        info!(prompt_chars = prompt.len(), "requesting quiz");

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let text = response.text().await.unwrap_or_default();
            return Err(QuizError::Credential(format!("{} {}", status, text)));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(QuizError::Api(format!("({}): {}", status, text)));
        }

        let chat_response: ChatResponse = response.json().await?;
        extract_arguments(chat_response)
    }
}

/// Connects OpenAI clients with the fixed model and temperature
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiProvider;

impl ModelProvider for OpenAiProvider {
    fn connect(&self, api_key: &str) -> Box<dyn QuizModel> {
        Box::new(OpenAiClient::new(api_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_forces_create_quiz() {
        let client = OpenAiClient::new("sk-test");
        let body = serde_json::to_value(client.request("prompt")).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(body["function_call"]["name"], "create_quiz");
        assert_eq!(body["functions"][0], schema::function_schema());
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "prompt");
        assert!(body["messages"][0].get("function_call").is_none());
    }

    #[test]
    fn test_extract_arguments() {
        let raw = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":null,
            "function_call":{"name":"create_quiz","arguments":"{\"questions\":[]}"}},"finish_reason":"stop"}]}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_arguments(response).unwrap(), r#"{"questions":[]}"#);
    }

    #[test]
    fn test_extract_arguments_requires_function_call() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Sure!"}}]}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(extract_arguments(response), Err(QuizError::Api(_))));

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(extract_arguments(empty).is_err());
    }
}
