use crate::stream::fragments;
use crate::traits::{FragmentStream, GenerateRequest, LlmClient, LlmError, ModelDescriptor, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tweetmill_http::{HttpClient, HttpError, RequestOpts};

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

/// Whole-request ceiling for single-shot generations.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for a local Ollama server.
///
/// Construction does not touch the network; an unreachable server surfaces on
/// the first call.
pub struct OllamaClient {
    http: HttpClient,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

impl OllamaClient {
    pub fn new(host: &str) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(host)?,
        })
    }

    pub fn host(&self) -> &str {
        self.http.base().as_str()
    }
}

fn connection_hint(err: HttpError) -> LlmError {
    match err {
        HttpError::Network(detail) => {
            tracing::debug!(%detail, "ollama.unreachable");
            LlmError::Unreachable(OLLAMA_CONNECTION_ERROR.to_string())
        }
        other => LlmError::Http(other),
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        let tags: TagsResponse = self
            .http
            .get_json("api/tags", RequestOpts::default())
            .await
            .map_err(connection_hint)?;
        tracing::debug!(count = tags.models.len(), "ollama.models");
        Ok(tags.models)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Value> {
        let body = GenerateRequest {
            stream: false,
            ..request.clone()
        };
        tracing::info!(model = %body.model, stream = false, "ollama.generate");
        let opts = RequestOpts {
            timeout: Some(GENERATE_TIMEOUT),
            ..Default::default()
        };
        self.http
            .post_json("api/generate", &body, opts)
            .await
            .map_err(connection_hint)
    }

    async fn generate_stream(&self, request: &GenerateRequest) -> Result<FragmentStream> {
        let body = GenerateRequest {
            stream: true,
            ..request.clone()
        };
        tracing::info!(model = %body.model, stream = true, "ollama.generate");
        let bytes = self
            .http
            .post_stream("api/generate", &body, RequestOpts::default())
            .await
            .map_err(connection_hint)?;
        Ok(fragments(bytes))
    }
}
