//! Extractor configuration: backend endpoint, policies, escalation graph.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// How the selector maps a task to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// One fixed model per task. Disables escalation.
    Dedicated,
    /// Ranked candidates per task, adjusted by document type, quality and priority.
    Adaptive,
}

/// How much instruction text the prompt builder renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptFidelity {
    Minimal,
    Enhanced,
}

/// Which OCR quality heuristic to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPolicy {
    Fast,
    Detailed,
}

/// Second-pass model override graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// First-pass model -> second-pass model.
    pub chain: BTreeMap<String, String>,
    /// Used when the first-pass model has no entry in `chain`.
    pub fallback: String,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        let mut chain = BTreeMap::new();
        chain.insert("llama3.1:8b".to_string(), "granite3.2-vision".to_string());
        chain.insert("granite3.2-vision".to_string(), "llama3.1:70b".to_string());
        Self {
            chain,
            fallback: "granite3.2-vision".to_string(),
        }
    }
}

impl EscalationConfig {
    /// Model to use for the second pass after `first`.
    ///
    /// Never returns `first` itself. `None` when neither the chain entry nor
    /// the fallback names a different model.
    pub fn next_model(&self, first: &str) -> Option<&str> {
        match self.chain.get(first) {
            Some(next) if next != first => Some(next),
            _ if self.fallback != first => Some(&self.fallback),
            _ => {
                warn!("No second-pass model differs from {}", first);
                None
            }
        }
    }
}

/// Top-level extractor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Base URL of the local Ollama server.
    pub ollama_url: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Retries after the first attempt on 429/5xx and connection errors.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    pub retry_backoff_ms: u64,
    pub selection_policy: SelectionPolicy,
    pub prompt_fidelity: PromptFidelity,
    pub quality_policy: QualityPolicy,
    /// Request JSON-constrained output from the backend.
    pub structured_output: bool,
    /// Concurrent workers for the per-document fan-out.
    pub max_workers: usize,
    /// Pre-extraction results at or above this confidence skip inference.
    pub pre_extract_threshold: f64,
    /// Extract from task-focused segments instead of every line.
    pub focus_segments: bool,
    /// The two models consulted in consensus mode.
    pub consensus_models: Vec<String>,
    pub escalation: EscalationConfig,
    /// Directory of correction files used as few-shot examples.
    pub training_examples_dir: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            connect_timeout_secs: 5,
            read_timeout_secs: 120,
            max_retries: 3,
            retry_backoff_ms: 500,
            selection_policy: SelectionPolicy::Adaptive,
            prompt_fidelity: PromptFidelity::Enhanced,
            quality_policy: QualityPolicy::Detailed,
            structured_output: false,
            max_workers: 4,
            pre_extract_threshold: 0.75,
            focus_segments: false,
            consensus_models: vec!["llama3.1:8b".into(), "granite3.2-vision".into()],
            escalation: EscalationConfig::default(),
            training_examples_dir: None,
        }
    }
}

impl ExtractorConfig {
    /// Load config from a JSON file, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load(config_path: &Path) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(config) => {
                    info!("Loaded extractor config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    warn!(
                        "Invalid config {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `OLLAMA_URL` and `ARCHIVIST_*` environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            self.ollama_url = url;
        }
        if let Some(policy) = env_parse::<SelectionPolicy>("ARCHIVIST_POLICY") {
            self.selection_policy = policy;
        }
        if let Some(fidelity) = env_parse::<PromptFidelity>("ARCHIVIST_PROMPTS") {
            self.prompt_fidelity = fidelity;
        }
        if let Some(quality) = env_parse::<QualityPolicy>("ARCHIVIST_QUALITY") {
            self.quality_policy = quality;
        }
        if let Some(workers) = std::env::var("ARCHIVIST_WORKERS")
            .ok()
            .and_then(|w| w.parse().ok())
        {
            self.max_workers = workers;
        }
        if let Some(retries) = std::env::var("ARCHIVIST_MAX_RETRIES")
            .ok()
            .and_then(|r| r.parse().ok())
        {
            self.max_retries = retries;
        }
        if let Ok(structured) = std::env::var("ARCHIVIST_STRUCTURED") {
            self.structured_output = matches!(structured.as_str(), "1" | "true" | "yes");
        }
        if let Ok(dir) = std::env::var("ARCHIVIST_TRAINING_DIR") {
            self.training_examples_dir = Some(PathBuf::from(dir));
        }
    }

    /// The two consensus models, or `None` when fewer than two distinct
    /// models are configured.
    pub fn consensus_pair(&self) -> Option<(&str, &str)> {
        match self.consensus_models.as_slice() {
            [a, b, ..] if a != b => Some((a.as_str(), b.as_str())),
            [a, _, ..] => {
                warn!("Consensus models must differ, both are {}", a);
                None
            }
            other => {
                warn!("Consensus needs two models, {} configured", other.len());
                None
            }
        }
    }

    /// Save config to disk as pretty JSON.
    pub fn save(&self, config_path: &Path) -> crate::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        info!("Saved extractor config to {}", config_path.display());
        Ok(())
    }
}

/// Parse a lowercase enum value from an env var via its serde name.
fn env_parse<T: serde::de::DeserializeOwned>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase())).ok()
}
