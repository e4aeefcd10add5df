//! Passive log of model invocations.
//!
//! Records are only summarised for reporting; nothing reads them back into
//! model selection.

use std::collections::BTreeMap;

use archivist_core::ExtractionTask;
use parking_lot::Mutex;
use serde::Serialize;

/// One model invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
    pub model: String,
    pub task: ExtractionTask,
    pub latency: f64,
    pub confidence: f64,
}

/// Aggregate figures for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelStats {
    pub calls: usize,
    pub mean_latency: f64,
    pub mean_confidence: f64,
}

#[derive(Default)]
pub struct PerformanceLog {
    records: Mutex<Vec<PerformanceRecord>>,
}

impl PerformanceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, model: &str, task: ExtractionTask, latency: f64, confidence: f64) {
        self.records.lock().push(PerformanceRecord {
            model: model.to_string(),
            task,
            latency,
            confidence,
        });
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<PerformanceRecord> {
        self.records.lock().clone()
    }

    /// Per-model call count and mean latency/confidence, sorted by model name.
    pub fn summary(&self) -> BTreeMap<String, ModelStats> {
        let records = self.records.lock();
        let mut sums: BTreeMap<String, (usize, f64, f64)> = BTreeMap::new();
        for r in records.iter() {
            let entry = sums.entry(r.model.clone()).or_default();
            entry.0 += 1;
            entry.1 += r.latency;
            entry.2 += r.confidence;
        }

        sums.into_iter()
            .map(|(model, (calls, latency, confidence))| {
                let n = calls as f64;
                (
                    model,
                    ModelStats {
                        calls,
                        mean_latency: latency / n,
                        mean_confidence: confidence / n,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_per_model() {
        let log = PerformanceLog::new();
        log.record("phi3.5:3.8b", ExtractionTask::Title, 1.0, 0.9);
        log.record("phi3.5:3.8b", ExtractionTask::Title, 3.0, 0.5);
        log.record("gemma2:2b", ExtractionTask::VolumeIssue, 0.5, 0.85);

        let summary = log.summary();
        assert_eq!(summary.len(), 2);
        let phi = &summary["phi3.5:3.8b"];
        assert_eq!(phi.calls, 2);
        assert_eq!(phi.mean_latency, 2.0);
        assert!((phi.mean_confidence - 0.7).abs() < 1e-9);
        assert_eq!(summary["gemma2:2b"].calls, 1);
    }

    #[test]
    fn test_empty_summary() {
        let log = PerformanceLog::new();
        assert!(log.is_empty());
        assert!(log.summary().is_empty());
    }
}
