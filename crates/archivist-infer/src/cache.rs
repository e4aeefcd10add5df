//! Process-local result cache.
//!
//! Keyed by (task, SHA-256 of the newline-joined segments). Values are the
//! JSON serialization of the stored result, so a hit hands back an
//! independent copy. Unbounded and never evicted: one orchestrator serves
//! one short-lived pipeline run.

use archivist_core::{ExtractionResult, ExtractionTask};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::warn;

/// Thread-safe result cache shared by concurrent extraction tasks.
#[derive(Default)]
pub struct ResultCache {
    entries: DashMap<(ExtractionTask, String), String>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content hash used as the text half of the key.
    pub fn text_hash(segments: &[String]) -> String {
        hex::encode(Sha256::digest(segments.join("\n").as_bytes()))
    }

    /// Cached result for this task and text, if any.
    pub fn get(&self, task: ExtractionTask, segments: &[String]) -> Option<ExtractionResult> {
        let key = (task, Self::text_hash(segments));
        let raw = self.entries.get(&key)?;
        match serde_json::from_str(raw.value()) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(task = %task, "Discarding unreadable cache entry: {}", e);
                None
            }
        }
    }

    /// Store a serialized copy of `result`.
    pub fn put(&self, task: ExtractionTask, segments: &[String], result: &ExtractionResult) {
        match serde_json::to_string(result) {
            Ok(json) => {
                self.entries.insert((task, Self::text_hash(segments)), json);
            }
            Err(e) => warn!(task = %task, "Failed to cache result: {}", e),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = ResultCache::new();
        let doc = segments("Dear Friends,\nHappy new year.");
        assert!(cache.get(ExtractionTask::Title, &doc).is_none());

        let result = ExtractionResult::new("Happy new year", 0.8, "phi3.5:3.8b", 0.42);
        cache.put(ExtractionTask::Title, &doc, &result);

        let hit = cache.get(ExtractionTask::Title, &doc).unwrap();
        assert_eq!(hit.value(), result.value());
        assert_eq!(hit.confidence(), result.confidence());
        assert_eq!(hit.model_used(), result.model_used());
        assert_eq!(hit.processing_time(), result.processing_time());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_includes_task() {
        let cache = ResultCache::new();
        let doc = segments("Volume 3, Issue 2");
        cache.put(
            ExtractionTask::VolumeIssue,
            &doc,
            &ExtractionResult::new("Volume 3, Issue 2", 0.85, "pre_extract", 0.0),
        );
        assert!(cache.get(ExtractionTask::Title, &doc).is_none());
    }

    #[test]
    fn test_hash_depends_on_line_boundaries() {
        let a = vec!["ab".to_string(), "c".to_string()];
        let b = vec!["a".to_string(), "bc".to_string()];
        assert_ne!(ResultCache::text_hash(&a), ResultCache::text_hash(&b));
        assert_eq!(ResultCache::text_hash(&a).len(), 64);
    }
}
