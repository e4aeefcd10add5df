//! Extraction orchestrator: runs one task end to end and fans out all four.
//!
//! Per task: cache → pre-extraction → classify → quality → select → prompt
//! → infer → confidence → optional second pass → cache.
//!
//! Consensus mode bypasses the cache and pre-extraction and asks two fixed
//! models for every task.

use std::collections::BTreeMap;
use std::sync::Arc;

use archivist_analyze::{estimate_quality, ClassifierGranularity, DocumentClassifier};
use archivist_core::{
    DocumentType, Error, ExtractionResult, ExtractionTask, ExtractorConfig, Priority, Result,
    SelectionPolicy,
};
use archivist_extract::pre_extract::try_extract_segments;
use archivist_extract::{score, PromptBuilder, ScoringMode, TrainingExamples};
use archivist_infer::{InferenceBackend, ModelSelector, PerformanceLog, ResultCache};
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{debug, error, info};

use crate::types::RuntimeStatus;

/// First-pass confidence below this always triggers a second pass.
const ESCALATE_BELOW: f64 = 0.6;
/// Threshold for layout-heavy documents (newsletters, reports).
const ESCALATE_COMPLEX_BELOW: f64 = 0.8;
/// Threshold for free-text summaries.
const ESCALATE_DESCRIPTION_BELOW: f64 = 0.75;
/// Consensus answers closer than this count as a tie.
const CONSENSUS_TIE_MARGIN: f64 = 0.2;

/// Model tag when neither consensus model produced a result.
pub const CONSENSUS_FAILED_TAG: &str = "consensus_failed";

/// Owns every piece of per-run state: caches, selector, examples, log.
pub struct ExtractionOrchestrator {
    config: ExtractorConfig,
    backend: Arc<dyn InferenceBackend>,
    selector: ModelSelector,
    classifier: DocumentClassifier,
    prompts: PromptBuilder,
    examples: TrainingExamples,
    cache: ResultCache,
    performance: PerformanceLog,
}

impl ExtractionOrchestrator {
    /// Create an orchestrator; examples load from `training_examples_dir`.
    pub fn new(config: ExtractorConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        let examples = TrainingExamples::load(config.training_examples_dir.as_deref());
        Self::with_examples(config, backend, examples)
    }

    pub fn with_examples(
        config: ExtractorConfig,
        backend: Arc<dyn InferenceBackend>,
        examples: TrainingExamples,
    ) -> Self {
        info!(
            "Orchestrator initialized: policy={:?}, prompts={:?}, workers={}, examples={}",
            config.selection_policy,
            config.prompt_fidelity,
            config.max_workers,
            examples.len()
        );
        Self {
            selector: ModelSelector::new(config.selection_policy),
            prompts: PromptBuilder::new(config.prompt_fidelity),
            classifier: DocumentClassifier::new(),
            cache: ResultCache::new(),
            performance: PerformanceLog::new(),
            examples,
            backend,
            config,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn classifier(&self) -> &DocumentClassifier {
        &self.classifier
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn performance(&self) -> &PerformanceLog {
        &self.performance
    }

    pub fn status(&self) -> RuntimeStatus {
        RuntimeStatus {
            cached_results: self.cache.len(),
            cached_classifications: self.classifier.cached(),
            model_stats: self.performance.summary(),
        }
    }

    /// Extract one field.
    ///
    /// Backend failures that the client absorbs show up as low-confidence
    /// results. An `Err` here means the backend itself reported an error or
    /// the selected model is not registered.
    pub async fn extract_single(
        &self,
        task: ExtractionTask,
        segments: &[String],
        priority: Priority,
    ) -> Result<ExtractionResult> {
        if let Some(hit) = self.cache.get(task, segments) {
            debug!(task = %task, "Cache hit");
            return Ok(hit);
        }

        if let Some(pre) = try_extract_segments(task, segments) {
            if pre.confidence() >= self.config.pre_extract_threshold {
                info!(
                    task = %task,
                    confidence = pre.confidence(),
                    "Pre-extracted '{}'",
                    pre.value()
                );
                self.cache.put(task, segments, &pre);
                return Ok(pre);
            }
            debug!(task = %task, confidence = pre.confidence(), "Pre-extraction below threshold");
        }

        let doc_type = self
            .classifier
            .classify(segments, ClassifierGranularity::for_priority(priority));
        let quality = estimate_quality(segments, self.config.quality_policy);
        let model = self.selector.select(task, doc_type, quality, priority);

        info!(
            "Extracting {} using {} (doc_type: {}, quality: {:.2})",
            task, model, doc_type, quality
        );

        let mut result = self
            .extract_with_model(task, segments, &model, doc_type, priority)
            .await?;

        if self.should_escalate(task, result.confidence(), doc_type) {
            result = self
                .second_pass(task, segments, doc_type, priority, result)
                .await?;
        }

        self.cache.put(task, segments, &result);
        Ok(result)
    }

    /// One prompt → generate → score round trip with a fixed model.
    async fn extract_with_model(
        &self,
        task: ExtractionTask,
        segments: &[String],
        model: &str,
        doc_type: DocumentType,
        priority: Priority,
    ) -> Result<ExtractionResult> {
        let profile = self.selector.get_config(model, task)?;
        let prompt = self
            .prompts
            .build(task, doc_type, segments, self.examples.for_task(task));

        let generation = self
            .backend
            .generate(model, &prompt, &profile, self.config.structured_output)
            .await?;

        let confidence = score(
            &generation.text,
            task,
            segments,
            ScoringMode::for_priority(priority),
        );
        self.performance
            .record(model, task, generation.latency, confidence);

        Ok(ExtractionResult::new(
            generation.text,
            confidence,
            model,
            generation.latency,
        ))
    }

    fn should_escalate(&self, task: ExtractionTask, confidence: f64, doc_type: DocumentType) -> bool {
        if self.config.selection_policy == SelectionPolicy::Dedicated {
            return false;
        }
        confidence < ESCALATE_BELOW
            || (matches!(doc_type, DocumentType::Newsletter | DocumentType::Report)
                && confidence < ESCALATE_COMPLEX_BELOW)
            || (task == ExtractionTask::Description && confidence < ESCALATE_DESCRIPTION_BELOW)
    }

    /// Re-run with the next model in the escalation graph; keep the better result.
    async fn second_pass(
        &self,
        task: ExtractionTask,
        segments: &[String],
        doc_type: DocumentType,
        priority: Priority,
        first: ExtractionResult,
    ) -> Result<ExtractionResult> {
        let Some(second_model) = self.config.escalation.next_model(first.model_used()) else {
            return Ok(first);
        };
        let second_model = second_model.to_string();
        info!("Performing second-pass extraction with {}", second_model);

        let second = self
            .extract_with_model(task, segments, &second_model, doc_type, priority)
            .await?;

        if second.confidence() > first.confidence() {
            info!(
                "Second-pass improved confidence: {:.2} -> {:.2}",
                first.confidence(),
                second.confidence()
            );
            Ok(second)
        } else {
            info!(
                "First-pass result retained (confidence: {:.2})",
                first.confidence()
            );
            Ok(first)
        }
    }

    /// Run all four tasks concurrently over the same segments.
    pub async fn extract_parallel(
        self: &Arc<Self>,
        segments: &[String],
        priority: Priority,
    ) -> BTreeMap<ExtractionTask, ExtractionResult> {
        let inputs = ExtractionTask::ALL
            .iter()
            .map(|task| (*task, segments.to_vec()))
            .collect();
        self.extract_tasks(inputs, priority).await
    }

    /// Run each task on its own segment list, at most `max_workers` at a time.
    ///
    /// A task that returns an error or panics becomes an `error` placeholder;
    /// the others are unaffected. Results are keyed by task, not arrival order.
    pub async fn extract_tasks(
        self: &Arc<Self>,
        inputs: Vec<(ExtractionTask, Vec<String>)>,
        priority: Priority,
    ) -> BTreeMap<ExtractionTask, ExtractionResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));

        let handles: Vec<_> = inputs
            .into_iter()
            .map(|(task, segments)| {
                let this = Arc::clone(self);
                let semaphore = Arc::clone(&semaphore);
                let handle = tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| Error::Internal(format!("worker pool closed: {}", e)))?;
                    this.extract_single(task, &segments, priority).await
                });
                (task, handle)
            })
            .collect();

        let mut results = BTreeMap::new();
        for (task, handle) in handles {
            let result = match handle.await {
                Ok(Ok(result)) => {
                    info!(
                        "Completed {}: confidence={:.2}, time={:.2}s",
                        task,
                        result.confidence(),
                        result.processing_time()
                    );
                    result
                }
                Ok(Err(e)) => {
                    error!("Task {} failed: {}", task, e);
                    ExtractionResult::failed()
                }
                Err(e) => {
                    error!("Task {} aborted: {}", task, e);
                    ExtractionResult::failed()
                }
            };
            results.insert(task, result);
        }
        results
    }

    /// Ask both consensus models and keep the better answer.
    ///
    /// Each model runs in its own task, so an error or a panic in one only
    /// drops that model's answer.
    pub async fn extract_with_consensus(
        self: &Arc<Self>,
        task: ExtractionTask,
        segments: &[String],
        priority: Priority,
    ) -> ExtractionResult {
        let Some((first_model, second_model)) = self.config.consensus_pair() else {
            return ExtractionResult::new("", 0.0, CONSENSUS_FAILED_TAG, 0.0);
        };
        let (first_model, second_model) = (first_model.to_string(), second_model.to_string());

        let doc_type = self
            .classifier
            .classify(segments, ClassifierGranularity::for_priority(priority));

        let spawn_model = |model: String| {
            let this = Arc::clone(self);
            let segments = segments.to_vec();
            tokio::spawn(async move {
                this.extract_with_model(task, &segments, &model, doc_type, priority)
                    .await
            })
        };
        let (first, second) = tokio::join!(
            spawn_model(first_model.clone()),
            spawn_model(second_model.clone()),
        );

        let keep = |model: &str, outcome: std::result::Result<Result<ExtractionResult>, JoinError>| {
            match outcome {
                Ok(Ok(result)) => Some(result),
                Ok(Err(e)) => {
                    error!("Consensus extraction failed for {}: {}", model, e);
                    None
                }
                Err(e) => {
                    error!("Consensus extraction aborted for {}: {}", model, e);
                    None
                }
            }
        };

        match pick_consensus(
            task,
            keep(&first_model, first),
            keep(&second_model, second),
        ) {
            Some(result) => {
                info!(
                    "Consensus {}: confidence={:.2} ({})",
                    task,
                    result.confidence(),
                    result.model_used()
                );
                result
            }
            None => ExtractionResult::new("", 0.0, CONSENSUS_FAILED_TAG, 0.0),
        }
    }
}

/// Choose between two consensus answers and tag the winner.
///
/// Higher confidence wins, the first answer on ties. For titles, answers
/// within the tie margin that disagree resolve to the shorter value.
pub fn pick_consensus(
    task: ExtractionTask,
    first: Option<ExtractionResult>,
    second: Option<ExtractionResult>,
) -> Option<ExtractionResult> {
    let winner = match (first, second) {
        (Some(a), Some(b)) => {
            let close = (a.confidence() - b.confidence()).abs() < CONSENSUS_TIE_MARGIN;
            if task == ExtractionTask::Title && close && a.value() != b.value() {
                if b.value().chars().count() < a.value().chars().count() {
                    b
                } else {
                    a
                }
            } else if b.confidence() > a.confidence() {
                b
            } else {
                a
            }
        }
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => return None,
    };
    Some(winner.into_consensus())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use archivist_core::types::PRE_EXTRACT_TAG;

    fn letter() -> Vec<String> {
        vec![
            "Dear Friends,".to_string(),
            "We thank everyone for the support this season.".to_string(),
            "Sincerely, Ruth".to_string(),
        ]
    }

    fn orchestrator(
        backend: Arc<ScriptedBackend>,
        policy: SelectionPolicy,
    ) -> Arc<ExtractionOrchestrator> {
        let config = ExtractorConfig {
            selection_policy: policy,
            ..ExtractorConfig::default()
        };
        Arc::new(ExtractionOrchestrator::with_examples(
            config,
            backend,
            TrainingExamples::builtin(),
        ))
    }

    #[tokio::test]
    async fn test_second_call_is_cache_hit() {
        let backend = Arc::new(ScriptedBackend::new("Thanks For Your Support"));
        let orch = orchestrator(backend.clone(), SelectionPolicy::Adaptive);

        let first = orch
            .extract_single(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 1);

        let second = orch
            .extract_single(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(orch.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_pre_extracted_date_skips_backend() {
        let backend = Arc::new(ScriptedBackend::new("unused"));
        let orch = orchestrator(backend.clone(), SelectionPolicy::Adaptive);
        let segments = vec!["Minutes of the meeting held 2021-03-05".to_string()];

        let result = orch
            .extract_single(ExtractionTask::Date, &segments, Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(result.value(), "2021-03-05");
        assert_eq!(result.confidence(), 0.9);
        assert_eq!(result.model_used(), PRE_EXTRACT_TAG);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_weak_pre_extraction_falls_through() {
        let backend = Arc::new(ScriptedBackend::new("Issue 4"));
        let orch = orchestrator(backend.clone(), SelectionPolicy::Dedicated);
        let segments = vec!["Parish bulletin No. 4".to_string()];

        let result = orch
            .extract_single(ExtractionTask::VolumeIssue, &segments, Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 1);
        assert_eq!(result.model_used(), "gemma2:2b");
    }

    #[tokio::test]
    async fn test_low_confidence_escalates_once() {
        let backend = Arc::new(
            ScriptedBackend::new("xyz").answer("granite3.2-vision", "Letter Of Thanks To Supporters"),
        );
        let orch = orchestrator(backend.clone(), SelectionPolicy::Adaptive);

        let result = orch
            .extract_single(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 2);
        assert_eq!(backend.models_called(), vec!["phi3.5:3.8b", "granite3.2-vision"]);
        assert_eq!(result.model_used(), "granite3.2-vision");
        assert_eq!(result.value(), "Letter Of Thanks To Supporters");
    }

    #[tokio::test]
    async fn test_escalation_tie_keeps_first_pass() {
        let backend = Arc::new(ScriptedBackend::new("xyz"));
        let orch = orchestrator(backend.clone(), SelectionPolicy::Adaptive);

        let result = orch
            .extract_single(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 2);
        assert_eq!(result.model_used(), "phi3.5:3.8b");
    }

    #[tokio::test]
    async fn test_dedicated_policy_never_escalates() {
        let backend = Arc::new(ScriptedBackend::new("xyz"));
        let orch = orchestrator(backend.clone(), SelectionPolicy::Dedicated);

        orch.extract_single(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 1);
    }

    fn newsletter() -> Vec<String> {
        vec![
            "Parish Newsletter".to_string(),
            "Vol. 3 No. 2".to_string(),
            "Printed 1986-01-06".to_string(),
            "Our spring fair raised funds for the new roof.".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_fan_out_isolates_failing_task() {
        let backend = Arc::new(
            ScriptedBackend::new("Parish Newsletter Spring Edition").fail("qwen2.5:3b"),
        );
        let orch = orchestrator(backend.clone(), SelectionPolicy::Dedicated);

        let results = orch.extract_parallel(&newsletter(), Priority::Balanced).await;
        assert_eq!(results.len(), 4);

        let description = &results[&ExtractionTask::Description];
        assert!(description.is_error());
        assert_eq!(description.confidence(), 0.0);

        assert_eq!(results[&ExtractionTask::Title].model_used(), "phi3.5:3.8b");
        assert_eq!(
            results[&ExtractionTask::Title].value(),
            "Parish Newsletter Spring Edition"
        );
        assert_eq!(results[&ExtractionTask::Date].value(), "1986-01-06");
        assert_eq!(
            results[&ExtractionTask::VolumeIssue].value(),
            "Volume 3, Issue 2"
        );
    }

    #[tokio::test]
    async fn test_fan_out_survives_panicking_task() {
        let backend = Arc::new(
            ScriptedBackend::new("Parish Newsletter Spring Edition").panic_on("qwen2.5:3b"),
        );
        let orch = orchestrator(backend.clone(), SelectionPolicy::Dedicated);

        let results = orch.extract_parallel(&newsletter(), Priority::Balanced).await;
        assert!(results[&ExtractionTask::Description].is_error());
        assert!(!results[&ExtractionTask::Title].is_error());
    }

    #[tokio::test]
    async fn test_fan_out_reuses_cache() {
        let backend = Arc::new(ScriptedBackend::new("Parish Newsletter Spring Edition"));
        let orch = orchestrator(backend.clone(), SelectionPolicy::Dedicated);

        orch.extract_parallel(&newsletter(), Priority::Balanced).await;
        let after_first = backend.calls();
        orch.extract_parallel(&newsletter(), Priority::Balanced).await;
        assert_eq!(backend.calls(), after_first);
        assert_eq!(orch.status().cached_results, 4);
    }

    #[test]
    fn test_consensus_prefers_shorter_close_title() {
        let short = ExtractionResult::new("Fair Day", 0.70, "llama3.1:8b", 0.1);
        let long = ExtractionResult::new("A".repeat(40), 0.85, "granite3.2-vision", 0.1);

        let picked = pick_consensus(ExtractionTask::Title, Some(short.clone()), Some(long.clone()))
            .unwrap();
        assert_eq!(picked.value(), "Fair Day");
        assert_eq!(picked.model_used(), "consensus(llama3.1:8b)");

        let picked = pick_consensus(ExtractionTask::Title, Some(long), Some(short)).unwrap();
        assert_eq!(picked.value(), "Fair Day");
    }

    #[test]
    fn test_consensus_otherwise_highest_confidence() {
        let a = ExtractionResult::new("1985", 0.70, "llama3.1:8b", 0.1);
        let b = ExtractionResult::new("1986-01-06", 0.85, "granite3.2-vision", 0.1);
        let picked = pick_consensus(ExtractionTask::Date, Some(a.clone()), Some(b)).unwrap();
        assert_eq!(picked.model_used(), "consensus(granite3.2-vision)");

        let equal = ExtractionResult::new("1986", 0.70, "granite3.2-vision", 0.1);
        let picked = pick_consensus(ExtractionTask::Date, Some(a), Some(equal)).unwrap();
        assert_eq!(picked.model_used(), "consensus(llama3.1:8b)");

        assert!(pick_consensus(ExtractionTask::Title, None, None).is_none());
    }

    #[tokio::test]
    async fn test_consensus_runs_two_models() {
        let backend = Arc::new(
            ScriptedBackend::new("Thanks For Your Support").fail("granite3.2-vision"),
        );
        let orch = orchestrator(backend.clone(), SelectionPolicy::Adaptive);

        let result = orch
            .extract_with_consensus(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await;
        assert_eq!(backend.calls(), 2);
        assert_eq!(result.model_used(), "consensus(llama3.1:8b)");
    }

    #[tokio::test]
    async fn test_consensus_all_failed() {
        let backend = Arc::new(
            ScriptedBackend::new("x")
                .fail("llama3.1:8b")
                .fail("granite3.2-vision"),
        );
        let orch = orchestrator(backend, SelectionPolicy::Adaptive);

        let result = orch
            .extract_with_consensus(ExtractionTask::Date, &letter(), Priority::Balanced)
            .await;
        assert_eq!(result.model_used(), CONSENSUS_FAILED_TAG);
        assert_eq!(result.confidence(), 0.0);
    }

    #[tokio::test]
    async fn test_performance_log_records_calls() {
        let backend = Arc::new(ScriptedBackend::new("Thanks For Your Support"));
        let orch = orchestrator(backend, SelectionPolicy::Adaptive);
        orch.extract_single(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await
            .unwrap();

        let stats = orch.status().model_stats;
        assert_eq!(stats["phi3.5:3.8b"].calls, 1);
    }

    #[tokio::test]
    async fn test_consensus_survives_panicking_model() {
        let backend = Arc::new(
            ScriptedBackend::new("Thanks For Your Support").panic_on("granite3.2-vision"),
        );
        let orch = orchestrator(backend.clone(), SelectionPolicy::Adaptive);

        let result = orch
            .extract_with_consensus(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await;
        assert_eq!(backend.calls(), 2);
        assert_eq!(result.model_used(), "consensus(llama3.1:8b)");
        assert_eq!(result.value(), "Thanks For Your Support");
    }

    #[tokio::test]
    async fn test_consensus_with_duplicate_models_fails() {
        let backend = Arc::new(ScriptedBackend::new("unused"));
        let config = ExtractorConfig {
            consensus_models: vec!["llama3.1:8b".into(), "llama3.1:8b".into()],
            ..ExtractorConfig::default()
        };
        let orch = Arc::new(ExtractionOrchestrator::with_examples(
            config,
            backend.clone(),
            TrainingExamples::builtin(),
        ));

        let result = orch
            .extract_with_consensus(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await;
        assert_eq!(result.model_used(), CONSENSUS_FAILED_TAG);
        assert_eq!(backend.calls(), 0);
    }

    fn editorial_newsletter() -> Vec<String> {
        vec![
            "Parish Newsletter".to_string(),
            "From the editor: articles on the new roof".to_string(),
            "Our spring fair raised funds for the roof.".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_newsletter_mid_confidence_escalates() {
        // "Spring": capitalised and found in the text, but short: 0.7.
        let backend = Arc::new(ScriptedBackend::new("Spring"));
        let orch = orchestrator(backend.clone(), SelectionPolicy::Adaptive);

        let result = orch
            .extract_single(ExtractionTask::Title, &editorial_newsletter(), Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(result.confidence(), 0.7);
        assert_eq!(backend.calls(), 2);
        assert_eq!(
            backend.models_called(),
            vec!["granite3.2-vision", "llama3.1:70b"]
        );
    }

    #[tokio::test]
    async fn test_letter_mid_confidence_title_is_kept() {
        let backend = Arc::new(ScriptedBackend::new("Sincerely"));
        let orch = orchestrator(backend.clone(), SelectionPolicy::Adaptive);

        let result = orch
            .extract_single(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(result.confidence(), 0.7);
        assert_eq!(backend.calls(), 1);
    }

    fn short_letter() -> Vec<String> {
        vec![
            "Dear Friends,".to_string(),
            "We met. We prayed.".to_string(),
            "Sincerely, Ruth".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_description_below_threshold_escalates() {
        // Two sentences, quoted from the text, under 50 chars: 0.7.
        let backend = Arc::new(ScriptedBackend::new("We met. We prayed."));
        let orch = orchestrator(backend.clone(), SelectionPolicy::Adaptive);

        let result = orch
            .extract_single(ExtractionTask::Description, &short_letter(), Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(result.confidence(), 0.7);
        assert_eq!(backend.calls(), 2);
        let models = backend.models_called();
        assert_ne!(models[0], models[1]);
    }

    #[tokio::test]
    async fn test_confident_description_on_letter_is_kept() {
        let backend = Arc::new(ScriptedBackend::new(
            "A letter thanking supporters. It closes with a blessing.",
        ));
        let orch = orchestrator(backend.clone(), SelectionPolicy::Adaptive);

        let result = orch
            .extract_single(ExtractionTask::Description, &short_letter(), Priority::Balanced)
            .await
            .unwrap();
        assert!(result.confidence() >= 0.75);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_distinct_second_model_skips_second_pass() {
        let backend = Arc::new(ScriptedBackend::new("xyz"));
        let mut config = ExtractorConfig::default();
        config.escalation.fallback = "phi3.5:3.8b".into();
        let orch = Arc::new(ExtractionOrchestrator::with_examples(
            config,
            backend.clone(),
            TrainingExamples::builtin(),
        ));

        let result = orch
            .extract_single(ExtractionTask::Title, &letter(), Priority::Balanced)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 1);
        assert_eq!(result.model_used(), "phi3.5:3.8b");
    }
}
