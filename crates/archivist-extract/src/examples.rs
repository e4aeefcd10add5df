//! Few-shot examples for prompt construction.
//!
//! A small built-in set per task, optionally extended from a directory of
//! correction files:
//!
//! ```json
//! { "source_text": "6 January 1986. Dear Friends, ...",
//!   "corrections": { "date": "1986-01-06", "title": "New Year Letter" } }
//! ```
//!
//! Unreadable or malformed files are skipped with a warning.

use std::collections::BTreeMap;
use std::path::Path;

use archivist_core::ExtractionTask;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Characters of `source_text` kept as the example input.
const SOURCE_PREVIEW_CHARS: usize = 200;

/// One input/answer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    pub result: String,
}

impl TrainingExample {
    pub fn new(text: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            result: result.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CorrectionFile {
    #[serde(default)]
    source_text: String,
    #[serde(default)]
    corrections: BTreeMap<String, String>,
}

/// Examples grouped by task.
#[derive(Debug, Clone, Default)]
pub struct TrainingExamples {
    by_task: BTreeMap<ExtractionTask, Vec<TrainingExample>>,
}

impl TrainingExamples {
    /// Built-in examples only.
    pub fn builtin() -> Self {
        let mut examples = Self::default();
        let mut add = |task, text: &str, result: &str| examples.push(task, TrainingExample::new(text, result));

        add(ExtractionTask::Date, "6 January 1986. Dear Friends,", "1986-01-06");
        add(ExtractionTask::Date, "November 15-17, 1985 meeting", "1985-11-15");
        add(ExtractionTask::Date, "Published in 1984", "1984");

        add(
            ExtractionTask::Title,
            "Central American Task Force Newsletter",
            "Central American Task Force Newsletter",
        );
        add(
            ExtractionTask::Title,
            "Dear Members, Re: Annual General Meeting",
            "Annual General Meeting Notice",
        );
        add(
            ExtractionTask::Title,
            "Blessings of peace and courage for the new year!",
            "New Year Blessings Message",
        );

        add(
            ExtractionTask::Description,
            "The Annual General Meeting took place...",
            "Summary of Annual General Meeting proceedings and decisions",
        );

        add(ExtractionTask::VolumeIssue, "Volume 3, Issue 1", "Volume 3, Issue 1");
        add(ExtractionTask::VolumeIssue, "Vol. 2 No. 4", "Volume 2, Issue 4");
        add(ExtractionTask::VolumeIssue, "Newsletter #12", "Issue 12");

        examples
    }

    /// Built-in examples plus any correction files found in `dir`.
    pub fn load(dir: Option<&Path>) -> Self {
        let mut examples = Self::builtin();
        if let Some(dir) = dir {
            examples.load_dir(dir);
        }
        examples
    }

    /// Append examples from every `*.json` file in `dir`, in file-name order.
    pub fn load_dir(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("No training examples at {}: {}", dir.display(), e);
                return;
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let before = self.len();
        for path in paths {
            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<CorrectionFile>(&s).map_err(|e| e.to_string()));

            match parsed {
                Ok(file) => self.add_corrections(file),
                Err(e) => warn!("Could not load training data from {}: {}", path.display(), e),
            }
        }
        info!(
            "Loaded {} training examples from {}",
            self.len() - before,
            dir.display()
        );
    }

    fn add_corrections(&mut self, file: CorrectionFile) {
        let text: String = file.source_text.chars().take(SOURCE_PREVIEW_CHARS).collect();
        for (field, value) in file.corrections {
            match ExtractionTask::from_field(&field) {
                Some(task) => self.push(task, TrainingExample::new(text.clone(), value)),
                None => debug!("Ignoring correction for unknown field '{}'", field),
            }
        }
    }

    pub fn push(&mut self, task: ExtractionTask, example: TrainingExample) {
        self.by_task.entry(task).or_default().push(example);
    }

    pub fn for_task(&self, task: ExtractionTask) -> &[TrainingExample] {
        self.by_task.get(&task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total examples across all tasks.
    pub fn len(&self) -> usize {
        self.by_task.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_task() {
        let examples = TrainingExamples::builtin();
        for task in ExtractionTask::ALL {
            assert!(!examples.for_task(task).is_empty(), "{task}");
        }
        assert_eq!(examples.for_task(ExtractionTask::Date)[0].result, "1986-01-06");
        assert_eq!(examples.len(), 10);
    }

    #[test]
    fn test_load_corrections_and_skip_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            r#"{"source_text": "Parish Newsletter, Vol. 4 No. 2",
                "corrections": {"volume_issue": "Volume 4, Issue 2", "author": "x"}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("b.json"), "{broken").unwrap();
        std::fs::write(dir.path().join("c.json"), r#"{"corrections": ["title"]}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let examples = TrainingExamples::load(Some(dir.path()));
        assert_eq!(examples.len(), 11);

        let volume = examples.for_task(ExtractionTask::VolumeIssue);
        let added = volume.last().unwrap();
        assert_eq!(added.result, "Volume 4, Issue 2");
        assert_eq!(added.text, "Parish Newsletter, Vol. 4 No. 2");
    }

    #[test]
    fn test_source_text_truncated() {
        let mut examples = TrainingExamples::default();
        examples.add_corrections(CorrectionFile {
            source_text: "é".repeat(500),
            corrections: BTreeMap::from([("title".to_string(), "T".to_string())]),
        });
        let text = &examples.for_task(ExtractionTask::Title)[0].text;
        assert_eq!(text.chars().count(), SOURCE_PREVIEW_CHARS);
    }

    #[test]
    fn test_missing_dir_keeps_builtin() {
        let examples = TrainingExamples::load(Some(Path::new("/nonexistent/training")));
        assert_eq!(examples.len(), TrainingExamples::builtin().len());
    }
}
