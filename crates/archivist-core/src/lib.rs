//! Archivist Core: extraction tasks, document types, results, configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    EscalationConfig, ExtractorConfig, PromptFidelity, QualityPolicy, SelectionPolicy,
};
pub use error::{Error, Result};
pub use types::{
    DocumentType, ExtractionResult, ExtractionTask, Priority, SegmentType, TextSegment,
};
