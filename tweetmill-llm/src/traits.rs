use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;
use tweetmill_http::HttpError;

/// Shown when a non-streaming reply carries no `response` text.
pub const NO_RESPONSE: &str = "No response received.";

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("{0}")]
    Unreachable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Malformed stream chunk: {0}")]
    Decode(String),

    #[error("Model server error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

/// Lazy, finite sequence of generated text fragments. Not restartable.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Body of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub stream: bool,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: 500,
            system: None,
            stream: false,
        }
    }

    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system.filter(|s| !s.is_empty());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// An installed model as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

/// Display text of a non-streaming reply.
///
/// ```
/// use serde_json::json;
/// use tweetmill_llm::traits::{response_text, NO_RESPONSE};
///
/// assert_eq!(response_text(&json!({"response": "ok"})), "ok");
/// assert_eq!(response_text(&json!({"done": true})), NO_RESPONSE);
/// ```
pub fn response_text(reply: &Value) -> &str {
    reply
        .get("response")
        .and_then(Value::as_str)
        .unwrap_or(NO_RESPONSE)
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Installed models, in server order. Empty when none are installed.
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>>;

    /// Single-shot generation; returns the server's JSON reply untouched.
    async fn generate(&self, request: &GenerateRequest) -> Result<Value>;

    /// Streaming generation; fragments arrive as the server produces them.
    async fn generate_stream(&self, request: &GenerateRequest) -> Result<FragmentStream>;
}
