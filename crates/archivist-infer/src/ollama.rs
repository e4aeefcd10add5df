//! Ollama `/api/generate` client.
//!
//! Every call is bounded by a connect timeout, a read timeout and a retry
//! budget. Failures never propagate: the caller gets empty text plus the
//! elapsed time, and treats it like an empty model answer.
//!
//! Retry policy:
//! - HTTP 429 and 5xx → retry with exponential backoff
//! - Connection and timeout errors → retry
//! - Other 4xx → give up immediately

use std::time::{Duration, Instant};

use async_trait::async_trait;
use archivist_core::{Error, ExtractorConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::backend::{Generation, InferenceBackend};
use crate::registry::ModelProfile;

/// Generation stops at these markers when structured output is requested.
const STOP_SEQUENCES: &[&str] = &["\n\nText:", "\n\nExtraction:"];

/// Upper bound on the backoff exponent.
const MAX_BACKOFF_SHIFT: u32 = 5;

/// HTTP client for a local Ollama server.
pub struct OllamaClient {
    base_url: String,
    client: Client,
    max_retries: u32,
    retry_backoff: Duration,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions<'a> {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [&'a str]>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct StructuredAnswer {
    value: serde_json::Value,
}

impl OllamaClient {
    /// Build a client from the extractor configuration.
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            client,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff * (1u32 << (attempt - 1).min(MAX_BACKOFF_SHIFT))
    }

    /// One request with retries. `None` means the call failed soft.
    async fn request(&self, body: &GenerateRequest<'_>) -> Option<String> {
        let url = format!("{}/api/generate", self.base_url);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.backoff(attempt)).await;
            }

            let response = match self.client.post(&url).json(body).send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(
                        model = body.model,
                        attempt,
                        "Ollama connection error (is Ollama running at {}?): {}",
                        self.base_url,
                        e
                    );
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return match response.json::<GenerateResponse>().await {
                    Ok(parsed) => Some(parsed.response),
                    Err(e) => {
                        warn!(model = body.model, "Invalid Ollama response: {}", e);
                        None
                    }
                };
            }

            let body_text = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 || status.is_server_error() {
                warn!(model = body.model, attempt, "Ollama API error {}: {}", status, body_text);
                continue;
            }

            warn!(model = body.model, "Ollama API error {}: {}", status, body_text);
            return None;
        }

        warn!(
            model = body.model,
            "Ollama generate failed after {} attempts",
            self.max_retries + 1
        );
        None
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        profile: &ModelProfile,
        structured: bool,
    ) -> Result<Generation> {
        let start = Instant::now();
        let body = request_body(model, prompt, profile, structured);

        let text = match self.request(&body).await {
            Some(raw) if structured => parse_structured(&raw),
            Some(raw) => raw.trim().to_string(),
            None => String::new(),
        };

        let latency = start.elapsed().as_secs_f64();
        debug!(model, latency, chars = text.len(), "Generation complete");
        Ok(Generation::new(text, latency))
    }
}

fn request_body<'a>(
    model: &'a str,
    prompt: &'a str,
    profile: &ModelProfile,
    structured: bool,
) -> GenerateRequest<'a> {
    GenerateRequest {
        model,
        prompt,
        stream: false,
        options: GenerateOptions {
            temperature: profile.temperature,
            top_p: profile.top_p,
            top_k: profile.top_k,
            num_predict: profile.max_tokens,
            stop: structured.then_some(STOP_SEQUENCES),
        },
        format: structured.then(answer_schema),
    }
}

/// JSON schema for a single-field answer object.
fn answer_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": { "value": { "type": "string" } },
        "required": ["value"],
    })
}

/// Pull `value` out of a structured answer, or fall back to the raw text.
pub fn parse_structured(raw: &str) -> String {
    match serde_json::from_str::<StructuredAnswer>(raw.trim()) {
        Ok(StructuredAnswer {
            value: serde_json::Value::String(s),
        }) => s.trim().to_string(),
        Ok(StructuredAnswer {
            value: serde_json::Value::Null,
        }) => String::new(),
        Ok(StructuredAnswer { value }) => value.to_string(),
        Err(_) => {
            debug!("Structured output did not parse, using raw text");
            raw.trim().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ModelRegistry, PHI3_5};

    fn profile() -> ModelProfile {
        ModelRegistry::new().get(PHI3_5).unwrap().clone()
    }

    #[test]
    fn test_parse_structured_value() {
        assert_eq!(parse_structured(r#"{"value": " 1986-01-06 "}"#), "1986-01-06");
        assert_eq!(parse_structured(r#"{"value": null}"#), "");
        assert_eq!(parse_structured(r#"{"value": 1986}"#), "1986");
    }

    #[test]
    fn test_parse_structured_falls_back_to_raw() {
        assert_eq!(parse_structured("  Spring Newsletter \n"), "Spring Newsletter");
        assert_eq!(parse_structured(r#"{"answer": "x"}"#), r#"{"answer": "x"}"#);
    }

    #[test]
    fn test_plain_request_body() {
        let p = profile();
        let body = serde_json::to_value(request_body("phi3.5:3.8b", "prompt", &p, false)).unwrap();
        assert_eq!(body["model"], "phi3.5:3.8b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 64);
        assert_eq!(body["options"]["top_k"], 40);
        assert!(body.get("format").is_none());
        assert!(body["options"].get("stop").is_none());
    }

    #[test]
    fn test_structured_request_body() {
        let p = profile();
        let body = serde_json::to_value(request_body("phi3.5:3.8b", "prompt", &p, true)).unwrap();
        assert_eq!(body["format"]["required"][0], "value");
        assert_eq!(body["options"]["stop"].as_array().unwrap().len(), STOP_SEQUENCES.len());
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let mut config = ExtractorConfig::default();
        config.retry_backoff_ms = 100;
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.backoff(1), Duration::from_millis(100));
        assert_eq!(client.backoff(3), Duration::from_millis(400));
        assert_eq!(client.backoff(20), Duration::from_millis(3200));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let mut config = ExtractorConfig::default();
        config.ollama_url = "http://localhost:11434/".into();
        assert_eq!(OllamaClient::new(&config).unwrap().base_url(), "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_soft() {
        let mut config = ExtractorConfig::default();
        config.ollama_url = "http://127.0.0.1:9".into();
        config.max_retries = 1;
        config.retry_backoff_ms = 1;
        config.connect_timeout_secs = 1;
        config.read_timeout_secs = 2;

        let client = OllamaClient::new(&config).unwrap();
        let generation = client
            .generate(PHI3_5, "Extract the title.", &profile(), false)
            .await
            .unwrap();
        assert_eq!(generation.text, "");
        assert!(generation.latency >= 0.0);
    }

    #[tokio::test]
    async fn test_silent_server_hits_read_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let mut config = ExtractorConfig::default();
        config.ollama_url = format!("http://{}", addr);
        config.max_retries = 0;
        config.read_timeout_secs = 1;

        let client = OllamaClient::new(&config).unwrap();
        let generation = client
            .generate(PHI3_5, "Extract the title.", &profile(), false)
            .await
            .unwrap();
        assert_eq!(generation.text, "");
        assert!(generation.latency >= 1.0);
        assert!(generation.latency < 10.0);
    }
}
