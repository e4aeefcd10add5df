//! Inference backend trait.
//!
//! The `InferenceBackend` trait abstracts over text generation.
//! Implementations:
//! - `OllamaClient`: HTTP client for a local Ollama server
//! - Test doubles: scripted in-memory backends

use async_trait::async_trait;
use archivist_core::Result;

use crate::registry::ModelProfile;

/// Raw text returned by one generate call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// Trimmed model output; empty when the backend failed soft.
    pub text: String,
    /// Wall-clock seconds spent, including retries.
    pub latency: f64,
}

impl Generation {
    pub fn new(text: impl Into<String>, latency: f64) -> Self {
        Self {
            text: text.into(),
            latency,
        }
    }
}

/// Trait for text-generation backends.
///
/// Transport and decoding failures are expected to be absorbed into an
/// empty [`Generation`]. An `Err` means something unexpected happened and
/// is handled by the caller's fan-out boundary.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        profile: &ModelProfile,
        structured: bool,
    ) -> Result<Generation>;
}
