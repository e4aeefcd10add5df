//! Document-level pipeline: analysis, extraction, record assembly, saving.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use archivist_analyze::{ClassifierGranularity, DocumentAnalyzer};
use archivist_core::{ExtractionResult, ExtractionTask, ExtractorConfig, Priority, Result};
use chrono::Utc;
use tracing::info;

use crate::orchestrator::ExtractionOrchestrator;
use crate::source::DocumentSource;
use crate::types::{DocumentAnalysis, ExtractionMetadata, ExtractionMode, FieldDetail, MetadataRecord};

/// Runs the orchestrator over whole documents.
pub struct MetadataPipeline {
    orchestrator: Arc<ExtractionOrchestrator>,
    analyzer: DocumentAnalyzer,
}

impl MetadataPipeline {
    pub fn new(orchestrator: Arc<ExtractionOrchestrator>) -> Self {
        Self {
            orchestrator,
            analyzer: DocumentAnalyzer::new(),
        }
    }

    /// Pipeline backed by the Ollama server named in `config`.
    pub fn from_config(config: ExtractorConfig) -> Result<Self> {
        let backend = archivist_infer::create_backend(&config)?;
        Ok(Self::new(Arc::new(ExtractionOrchestrator::new(config, backend))))
    }

    pub fn orchestrator(&self) -> &Arc<ExtractionOrchestrator> {
        &self.orchestrator
    }

    /// Structure, quality and type of a document.
    pub fn analyze_document(&self, text: &str) -> DocumentAnalysis {
        let structure = self.analyzer.analyze_structure(text);
        let quality = self.analyzer.quality_metrics(text);
        let segments: Vec<String> = self
            .analyzer
            .segment(text)
            .into_iter()
            .map(|s| s.content)
            .collect();
        let document_type = self
            .orchestrator
            .classifier()
            .classify(&segments, ClassifierGranularity::Detailed);

        info!(
            "Document analysis complete: type={}, quality={:.2}",
            document_type, quality.overall_quality
        );

        DocumentAnalysis {
            structure,
            quality,
            document_type,
            total_segments: segments.len(),
            analysis_timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Analyze and extract one document's text.
    pub async fn process_text(
        &self,
        text: &str,
        mode: ExtractionMode,
        priority: Priority,
    ) -> MetadataRecord {
        info!("Processing document (mode: {}, priority: {})", mode, priority);
        let analysis = self.analyze_document(text);

        let start = Instant::now();
        let segments = general_segments(text);
        let results = match mode {
            ExtractionMode::Parallel => self.extract_parallel(text, &segments, priority).await,
            ExtractionMode::Consensus => self.extract_consensus(&segments, priority).await,
        };
        let total_processing_time = start.elapsed().as_secs_f64();

        let record = assemble_record(results, analysis, mode, priority, total_processing_time);
        info!(
            "Extraction complete: {:.2}s, avg_confidence={:.2}",
            total_processing_time,
            record.mean_confidence()
        );
        record
    }

    /// Look up a document by name in `source`, then process its text.
    pub async fn process_document(
        &self,
        source: &dyn DocumentSource,
        name: &str,
        mode: ExtractionMode,
        priority: Priority,
    ) -> Result<MetadataRecord> {
        let id = source.find_document(name).await?;
        let text = source.fetch_text(&id).await?;
        let mut record = self.process_text(&text, mode, priority).await;
        record.source_file = Some(id);
        Ok(record)
    }

    async fn extract_parallel(
        &self,
        text: &str,
        segments: &[String],
        priority: Priority,
    ) -> BTreeMap<ExtractionTask, ExtractionResult> {
        if !self.orchestrator.config().focus_segments {
            return self.orchestrator.extract_parallel(segments, priority).await;
        }

        let inputs = ExtractionTask::ALL
            .iter()
            .map(|task| {
                let focused = self.analyzer.segments_for_task(text, *task);
                let chosen = if focused.is_empty() {
                    segments.to_vec()
                } else {
                    focused
                };
                (*task, chosen)
            })
            .collect();
        self.orchestrator.extract_tasks(inputs, priority).await
    }

    async fn extract_consensus(
        &self,
        segments: &[String],
        priority: Priority,
    ) -> BTreeMap<ExtractionTask, ExtractionResult> {
        let mut results = BTreeMap::new();
        for task in ExtractionTask::ALL {
            let result = self
                .orchestrator
                .extract_with_consensus(task, segments, priority)
                .await;
            results.insert(task, result);
        }
        results
    }
}

/// Trimmed, non-empty lines.
pub fn general_segments(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn assemble_record(
    mut results: BTreeMap<ExtractionTask, ExtractionResult>,
    analysis: DocumentAnalysis,
    mode: ExtractionMode,
    priority: Priority,
    total_processing_time: f64,
) -> MetadataRecord {
    let mut take = |task: ExtractionTask| results.remove(&task).unwrap_or_else(ExtractionResult::missing);
    let title = take(ExtractionTask::Title);
    let date = take(ExtractionTask::Date);
    let description = take(ExtractionTask::Description);
    let volume_issue = take(ExtractionTask::VolumeIssue);

    let field_details = [
        (ExtractionTask::Title, &title),
        (ExtractionTask::Date, &date),
        (ExtractionTask::Description, &description),
        (ExtractionTask::VolumeIssue, &volume_issue),
    ]
    .into_iter()
    .map(|(task, result)| (task.field_name().to_string(), FieldDetail::from(result)))
    .collect();

    MetadataRecord {
        title: title.value().to_string(),
        date: date.value().to_string(),
        description: description.value().to_string(),
        volume_issue: volume_issue.value().to_string(),
        extraction_metadata: ExtractionMetadata {
            total_processing_time,
            extraction_timestamp: Utc::now().to_rfc3339(),
            extraction_method: mode,
            priority_mode: priority,
            field_details,
        },
        document_analysis: analysis,
        source_file: None,
    }
}

/// Write `<stem>_results.json` into `output_dir` and return its path.
pub fn save_record(record: &MetadataRecord, source: &Path, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let path = output_dir.join(format!("{}_results.json", stem));
    std::fs::write(&path, serde_json::to_string_pretty(record)?)?;
    info!("Results saved to: {}", path.display());
    Ok(path)
}
