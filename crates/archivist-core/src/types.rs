//! Extraction tasks, document types, priority modes and extraction results.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model tag for results answered by the deterministic pre-extractor.
pub const PRE_EXTRACT_TAG: &str = "pre_extract";
/// Model tag for placeholders produced when a task failed.
pub const ERROR_TAG: &str = "error";
/// Model tag for the zero-value result of a task that produced nothing.
pub const MISSING_TAG: &str = "none";

/// One of the four metadata fields extracted from every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTask {
    Title,
    Date,
    Description,
    VolumeIssue,
}

impl ExtractionTask {
    /// All tasks, in the order they appear in the persisted record.
    pub const ALL: [ExtractionTask; 4] = [
        ExtractionTask::Title,
        ExtractionTask::Date,
        ExtractionTask::Description,
        ExtractionTask::VolumeIssue,
    ];

    /// Field name used in result records and training files.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Date => "date",
            Self::Description => "description",
            Self::VolumeIssue => "volume_issue",
        }
    }

    /// Map a record field name back to its task.
    pub fn from_field(field: &str) -> Option<Self> {
        match field {
            "title" => Some(Self::Title),
            "date" => Some(Self::Date),
            "description" => Some(Self::Description),
            "volume_issue" => Some(Self::VolumeIssue),
            _ => None,
        }
    }

    /// Factual tasks want near-deterministic decoding.
    pub fn is_factual(&self) -> bool {
        matches!(self, Self::Date | Self::VolumeIssue)
    }
}

impl std::fmt::Display for ExtractionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Coarse document genre, derived from text on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Letter,
    Newsletter,
    Report,
    Article,
    Unknown,
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Letter => write!(f, "letter"),
            Self::Newsletter => write!(f, "newsletter"),
            Self::Report => write!(f, "report"),
            Self::Article => write!(f, "article"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Caller-supplied knob biasing model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Speed,
    #[default]
    Balanced,
    Accuracy,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Speed => write!(f, "speed"),
            Self::Balanced => write!(f, "balanced"),
            Self::Accuracy => write!(f, "accuracy"),
        }
    }
}

impl FromStr for Priority {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "speed" => Ok(Self::Speed),
            "balanced" => Ok(Self::Balanced),
            "accuracy" => Ok(Self::Accuracy),
            other => Err(crate::Error::Config(format!("unknown priority: {}", other))),
        }
    }
}

/// Outcome of one extraction task.
///
/// Fields are private: a result is never edited after construction, only
/// replaced by another instance (escalation, consensus tagging).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    value: String,
    confidence: f64,
    model_used: String,
    processing_time: f64,
    timestamp: DateTime<Utc>,
}

impl ExtractionResult {
    /// Build a result. Confidence is clamped to [0, 1], latency to >= 0.
    pub fn new(
        value: impl Into<String>,
        confidence: f64,
        model_used: impl Into<String>,
        processing_time: f64,
    ) -> Self {
        Self {
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            model_used: model_used.into(),
            processing_time: processing_time.max(0.0),
            timestamp: Utc::now(),
        }
    }

    /// Zero-confidence placeholder for a task that failed.
    pub fn failed() -> Self {
        Self::new("", 0.0, ERROR_TAG, 0.0)
    }

    /// Zero value for a task with no result at all.
    pub fn missing() -> Self {
        Self::new("", 0.0, MISSING_TAG, 0.0)
    }

    /// Same result, with the model identifier wrapped as `consensus(<model>)`.
    pub fn into_consensus(self) -> Self {
        Self {
            model_used: format!("consensus({})", self.model_used),
            ..self
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn model_used(&self) -> &str {
        &self.model_used
    }

    /// Processing latency in seconds.
    pub fn processing_time(&self) -> f64 {
        self.processing_time
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_error(&self) -> bool {
        self.model_used == ERROR_TAG
    }
}

/// Structural role of a single line of OCR text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentType {
    Header,
    Title,
    Date,
    Body,
    Signature,
    Metadata,
    Unknown,
}

/// A classified line, produced during structural segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    pub content: String,
    pub segment_type: SegmentType,
    pub confidence: f64,
    /// Zero-based line index in the source text.
    pub line_number: usize,
    /// Byte offset of the first occurrence of the line in the source text.
    pub char_position: usize,
}
