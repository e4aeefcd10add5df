//! Per-task model selection and decoding-parameter tuning.

use archivist_core::{DocumentType, Error, ExtractionTask, Priority, Result, SelectionPolicy};
use tracing::debug;

use crate::registry::{
    ModelProfile, ModelRegistry, GEMMA2_2B, GRANITE_VISION, LLAMA3_1_70B, LLAMA3_1_8B,
    LLAMA3_2_1B, PHI3_5, QWEN2_5_3B,
};

/// Text quality below this forces the high-accuracy model.
pub const LOW_QUALITY_THRESHOLD: f64 = 0.7;

/// Temperature ceiling for factual tasks.
const FACTUAL_MAX_TEMPERATURE: f64 = 0.2;
/// Temperature floor for free-text summaries.
const DESCRIPTION_MIN_TEMPERATURE: f64 = 0.5;

/// Picks a model name per task and hands out tuned profile copies.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    registry: ModelRegistry,
    policy: SelectionPolicy,
}

impl ModelSelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self::with_registry(ModelRegistry::default(), policy)
    }

    pub fn with_registry(registry: ModelRegistry, policy: SelectionPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Choose the model for one task invocation.
    pub fn select(
        &self,
        task: ExtractionTask,
        doc_type: DocumentType,
        quality: f64,
        priority: Priority,
    ) -> String {
        let model = match self.policy {
            SelectionPolicy::Dedicated => dedicated_model(task).to_string(),
            SelectionPolicy::Adaptive => self.adaptive(task, doc_type, quality, priority),
        };
        debug!(
            task = %task,
            doc_type = %doc_type,
            quality,
            priority = %priority,
            "Selected model {}",
            model
        );
        model
    }

    fn adaptive(
        &self,
        task: ExtractionTask,
        doc_type: DocumentType,
        quality: f64,
        priority: Priority,
    ) -> String {
        // Multi-column newsletter layouts hide titles and issue lines.
        if doc_type == DocumentType::Newsletter
            && matches!(task, ExtractionTask::Title | ExtractionTask::VolumeIssue)
            && self.registry.contains(GRANITE_VISION)
        {
            return GRANITE_VISION.to_string();
        }

        if quality < LOW_QUALITY_THRESHOLD && self.registry.contains(LLAMA3_1_70B) {
            return LLAMA3_1_70B.to_string();
        }

        let score = |profile: &ModelProfile| match priority {
            Priority::Speed => f64::from(profile.speed_score),
            Priority::Accuracy => f64::from(profile.accuracy_score),
            Priority::Balanced => profile.balanced_score(),
        };

        let mut best: Option<(&ModelProfile, f64)> = None;
        for name in adaptive_candidates(task) {
            let Some(profile) = self.registry.get(name) else {
                continue;
            };
            let s = score(profile);
            // Strict comparison keeps the earliest candidate on ties.
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((profile, s));
            }
        }

        best.map(|(p, _)| p.name.clone())
            .unwrap_or_else(|| dedicated_model(task).to_string())
    }

    /// Copy of the model's profile with the task's temperature clamp applied.
    ///
    /// The registry entry itself is never modified.
    pub fn get_config(&self, model: &str, task: ExtractionTask) -> Result<ModelProfile> {
        let mut profile = self
            .registry
            .get(model)
            .cloned()
            .ok_or_else(|| Error::UnknownModel(model.to_string()))?;

        if task.is_factual() {
            profile.temperature = profile.temperature.min(FACTUAL_MAX_TEMPERATURE);
        } else if task == ExtractionTask::Description {
            profile.temperature = profile.temperature.max(DESCRIPTION_MIN_TEMPERATURE);
        }
        Ok(profile)
    }
}

/// One fixed model per task.
pub fn dedicated_model(task: ExtractionTask) -> &'static str {
    match task {
        ExtractionTask::Title => PHI3_5,
        ExtractionTask::Date => LLAMA3_2_1B,
        ExtractionTask::Description => QWEN2_5_3B,
        ExtractionTask::VolumeIssue => GEMMA2_2B,
    }
}

/// Ranked candidates for the adaptive policy, best first.
pub fn adaptive_candidates(task: ExtractionTask) -> &'static [&'static str] {
    match task {
        ExtractionTask::Title => &[PHI3_5, LLAMA3_1_8B, GRANITE_VISION],
        ExtractionTask::Date => &[LLAMA3_2_1B, LLAMA3_1_8B, PHI3_5],
        ExtractionTask::Description => &[QWEN2_5_3B, LLAMA3_1_8B, GRANITE_VISION],
        ExtractionTask::VolumeIssue => &[GEMMA2_2B, LLAMA3_2_1B, LLAMA3_1_8B],
    }
}
