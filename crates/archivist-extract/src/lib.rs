//! Archivist Extract: everything between model selection and the raw
//! model answer: prompt rendering, few-shot examples, deterministic
//! pre-extraction and answer confidence scoring.

pub mod confidence;
pub mod examples;
pub mod pre_extract;
pub mod prompt;

pub use confidence::{score, ScoringMode};
pub use examples::{TrainingExample, TrainingExamples};
pub use pre_extract::try_extract;
pub use prompt::PromptBuilder;
