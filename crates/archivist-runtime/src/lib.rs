//! Archivist Runtime: extraction orchestration and the document pipeline.
//!
//! `ExtractionOrchestrator` runs single tasks, the concurrent four-task
//! fan-out and consensus extraction. `MetadataPipeline` wraps it with
//! document analysis and assembles the persisted `MetadataRecord`.

pub mod orchestrator;
pub mod pipeline;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{pick_consensus, ExtractionOrchestrator};
pub use pipeline::{save_record, MetadataPipeline};
pub use source::{DirectorySource, DocumentSource};
pub use types::*;
