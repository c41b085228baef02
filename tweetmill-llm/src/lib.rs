//! Local model access for Tweetmill.
//!
//! This crate exposes the [`traits::LlmClient`] interface, an Ollama
//! implementation, and the NDJSON plumbing used for streamed generations.
//!
//! # Examples
//! ```no_run
//! use tweetmill_llm::ollama::OllamaClient;
//! use tweetmill_llm::stream::accumulate;
//! use tweetmill_llm::traits::{GenerateRequest, LlmClient, Result};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let client = OllamaClient::new(tweetmill_llm::DEFAULT_OLLAMA_HOST)?;
//! let req = GenerateRequest::new(tweetmill_llm::DEFAULT_OLLAMA_MODEL, "Say hi");
//! let text = accumulate(client.generate_stream(&req).await?, |f| print!("{f}")).await?;
//! assert!(!text.is_empty());
//! # Ok(())
//! # }
//! ```
pub mod ollama;
pub mod stream;
pub mod traits;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama2";
