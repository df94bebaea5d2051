//! Client for the external text-generation service used by student summaries.
//!
//! The service speaks the Ollama `/api/generate` protocol: a JSON `{model, prompt}` request
//! answered by a stream of JSON objects whose `response` fields are concatenated into the final
//! text. Requests are never retried.

mod stream;

pub use stream::{Fragment, FragmentDecoder, collect_fragments, fragment_stream};

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "student-registry/summary";
const ERROR_BODY_LIMIT: usize = 512;

/// Errors surfaced while requesting generated text.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The request could not be built or sent, or the transport failed mid-stream.
    #[error("Failed to communicate with generator: {0}")]
    Unavailable(String),
    /// The generator answered with a non-success status.
    #[error("Generator returned an error response ({status}): {body}")]
    Status {
        /// HTTP status returned by the generator.
        status: StatusCode,
        /// Leading portion of the response body.
        body: String,
    },
    /// An object in the response stream could not be decoded.
    #[error("Failed to parse response from generator: {0}")]
    Decode(String),
    /// The stream ended without producing any text.
    #[error("No summary found in generator response")]
    EmptyResult,
}

impl From<reqwest::Error> for GeneratorError {
    fn from(error: reqwest::Error) -> Self {
        Self::Unavailable(error.to_string())
    }
}

/// Payload forwarded to the generator.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier understood by the generator.
    pub model: String,
    /// Natural-language prompt.
    pub prompt: String,
}

/// Interface implemented by text-generation backends.
#[async_trait]
pub trait GeneratorClient: Send + Sync {
    /// Run `request` to completion and return the concatenated text.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeneratorError>;
}

/// Streaming client for an Ollama-compatible generator.
pub struct OllamaGeneratorClient {
    http: Client,
    base_url: String,
}

impl OllamaGeneratorClient {
    /// Build a client targeting `base_url`, optionally bounding each request by `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, GeneratorError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Build a client from the generator settings in `config`.
    pub fn from_config(config: &Config) -> Result<Self, GeneratorError> {
        Self::new(config.ollama_url.clone(), config.summary_timeout())
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl GeneratorClient for OllamaGeneratorClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeneratorError> {
        let payload = json!({
            "model": request.model,
            "prompt": request.prompt,
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                GeneratorError::Unavailable(format!(
                    "failed to reach generator at {}: {error}",
                    self.base_url
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_on_char_boundary(&mut body, ERROR_BODY_LIMIT);
            tracing::warn!(%status, model = %request.model, "Generator returned an error response");
            return Err(GeneratorError::Status { status, body });
        }

        collect_fragments(fragment_stream(response.bytes_stream())).await
    }
}

fn truncate_on_char_boundary(text: &mut String, limit: usize) {
    if text.len() <= limit {
        return;
    }
    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> OllamaGeneratorClient {
        OllamaGeneratorClient::new(server.base_url(), None).expect("client")
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "llama3.2".into(),
            prompt: "Summarize".into(),
        }
    }

    #[tokio::test]
    async fn concatenates_streamed_fragments() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .json_body(json!({ "model": "llama3.2", "prompt": "Summarize" }));
                then.status(200)
                    .header("content-type", "application/x-ndjson")
                    .body(concat!(
                        "{\"response\":\"Hello \",\"done\":false}\n",
                        "{\"response\":\"world\",\"done\":false}\n",
                        "{\"response\":\"\",\"done\":true}\n",
                    ));
            })
            .await;

        let text = client_for(&server)
            .generate(request())
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client_for(&server)
            .generate(request())
            .await
            .expect_err("error response");

        match error {
            GeneratorError::Status { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_body_is_an_empty_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).body("");
            })
            .await;

        let error = client_for(&server)
            .generate(request())
            .await
            .expect_err("empty result");

        assert!(matches!(error, GeneratorError::EmptyResult));
    }

    #[tokio::test]
    async fn unreachable_generator_is_unavailable() {
        let client = OllamaGeneratorClient::new("http://127.0.0.1:1", None).expect("client");
        let error = client.generate(request()).await.expect_err("unreachable");
        assert!(matches!(error, GeneratorError::Unavailable(_)));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut text = "ééé".to_string();
        truncate_on_char_boundary(&mut text, 3);
        assert_eq!(text, "é");
    }
}
