//! Scripted inference backend for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use archivist_core::{Error, Result};
use archivist_infer::{Generation, InferenceBackend, ModelProfile};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Answers per model, with a default for unscripted models.
pub(crate) struct ScriptedBackend {
    default_answer: String,
    answers: HashMap<String, String>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    calls: AtomicUsize,
    models: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub(crate) fn new(default_answer: &str) -> Self {
        Self {
            default_answer: default_answer.to_string(),
            answers: HashMap::new(),
            failing: HashSet::new(),
            panicking: HashSet::new(),
            calls: AtomicUsize::new(0),
            models: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn answer(mut self, model: &str, text: &str) -> Self {
        self.answers.insert(model.to_string(), text.to_string());
        self
    }

    pub(crate) fn fail(mut self, model: &str) -> Self {
        self.failing.insert(model.to_string());
        self
    }

    pub(crate) fn panic_on(mut self, model: &str) -> Self {
        self.panicking.insert(model.to_string());
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn models_called(&self) -> Vec<String> {
        self.models.lock().clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn generate(
        &self,
        model: &str,
        _prompt: &str,
        _profile: &ModelProfile,
        _structured: bool,
    ) -> Result<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.models.lock().push(model.to_string());

        if self.panicking.contains(model) {
            panic!("scripted panic for {model}");
        }
        if self.failing.contains(model) {
            return Err(Error::Inference(format!("scripted failure for {}", model)));
        }
        let text = self.answers.get(model).unwrap_or(&self.default_answer);
        Ok(Generation::new(text.clone(), 0.01))
    }
}
