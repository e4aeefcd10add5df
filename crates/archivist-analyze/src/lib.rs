//! Archivist Analyze: cheap, model-free document analysis.
//!
//! Everything here is deterministic and runs before any inference call:
//! document-type classification, OCR quality scoring, and line-level
//! structural segmentation.

pub mod classifier;
pub mod quality;
pub mod structure;

pub use classifier::{ClassifierGranularity, DocumentClassifier};
pub use quality::estimate_quality;
pub use structure::{DocumentAnalyzer, QualityMetrics, StructureAnalysis};
