//! Runtime types: extraction modes and the persisted metadata record.

use std::collections::BTreeMap;
use std::str::FromStr;

use archivist_analyze::{QualityMetrics, StructureAnalysis};
use archivist_core::{DocumentType, Error, ExtractionResult, ExtractionTask, Priority};
use archivist_infer::ModelStats;
use serde::{Deserialize, Serialize};

/// Top-level extraction strategy for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Four tasks fanned out concurrently with cache, pre-extraction and escalation.
    #[default]
    Parallel,
    /// Each task run through two models, best answer kept.
    Consensus,
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parallel => write!(f, "parallel"),
            Self::Consensus => write!(f, "consensus"),
        }
    }
}

impl FromStr for ExtractionMode {
    type Err = Error;

    fn from_str(s: &str) -> archivist_core::Result<Self> {
        match s.to_lowercase().as_str() {
            "parallel" => Ok(Self::Parallel),
            "consensus" => Ok(Self::Consensus),
            other => Err(Error::Config(format!("unknown extraction mode: {}", other))),
        }
    }
}

/// Per-field provenance in the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDetail {
    pub confidence: f64,
    pub model_used: String,
    pub processing_time: f64,
}

impl From<&ExtractionResult> for FieldDetail {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            confidence: result.confidence(),
            model_used: result.model_used().to_string(),
            processing_time: result.processing_time(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub total_processing_time: f64,
    /// RFC 3339, UTC.
    pub extraction_timestamp: String,
    pub extraction_method: ExtractionMode,
    pub priority_mode: Priority,
    /// Keyed by field name (`title`, `date`, `description`, `volume_issue`).
    pub field_details: BTreeMap<String, FieldDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub structure: StructureAnalysis,
    pub quality: QualityMetrics,
    pub document_type: DocumentType,
    pub total_segments: usize,
    pub analysis_timestamp: String,
}

/// Persisted result of processing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    pub date: String,
    pub description: String,
    pub volume_issue: String,
    pub extraction_metadata: ExtractionMetadata,
    pub document_analysis: DocumentAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl MetadataRecord {
    /// Field value by task.
    pub fn value(&self, task: ExtractionTask) -> &str {
        match task {
            ExtractionTask::Title => &self.title,
            ExtractionTask::Date => &self.date,
            ExtractionTask::Description => &self.description,
            ExtractionTask::VolumeIssue => &self.volume_issue,
        }
    }

    /// Mean confidence over the four fields.
    pub fn mean_confidence(&self) -> f64 {
        let details = &self.extraction_metadata.field_details;
        if details.is_empty() {
            return 0.0;
        }
        details.values().map(|d| d.confidence).sum::<f64>() / details.len() as f64
    }
}

/// Orchestrator state snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStatus {
    pub cached_results: usize,
    pub cached_classifications: usize,
    pub model_stats: BTreeMap<String, ModelStats>,
}
