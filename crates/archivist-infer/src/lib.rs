//! Archivist Infer: model registry, model selection, inference backends,
//! result cache.
//!
//! Provides the `InferenceBackend` trait for text generation. `OllamaClient`
//! talks to a local Ollama server; tests substitute scripted backends.

pub mod backend;
pub mod cache;
pub mod ollama;
pub mod performance;
pub mod registry;
pub mod selector;

pub use backend::{Generation, InferenceBackend};
pub use cache::ResultCache;
pub use ollama::OllamaClient;
pub use performance::{ModelStats, PerformanceLog, PerformanceRecord};
pub use registry::{ModelProfile, ModelRegistry};
pub use selector::ModelSelector;

use std::sync::Arc;

use archivist_core::{ExtractorConfig, Result};

/// Create the Ollama backend described by `config`.
pub fn create_backend(config: &ExtractorConfig) -> Result<Arc<dyn InferenceBackend>> {
    let client = OllamaClient::new(config)?;
    tracing::info!("Using Ollama backend at {}", client.base_url());
    Ok(Arc::new(client))
}
