//! Deterministic pattern shortcuts that can answer a task without a model.

use std::time::Instant;

use archivist_core::types::PRE_EXTRACT_TAG;
use archivist_core::{ExtractionResult, ExtractionTask};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap());
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d\d|20\d\d)\b").unwrap());

static VOLUME_ISSUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:volume|vol\.?)\s*(\d+)\s*[,;.]?\s*(?:issue|number|no\.?)\s*#?\s*(\d+)")
        .unwrap()
});
static ISSUE_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\bissue\s*#?\s*|\bno\.\s*|#\s*)(\d+)\b").unwrap());

static SUBJECT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*subject:[ \t]*(\S[^\r\n]*?)\s*$").unwrap());

/// Try to answer `task` from `text` by pattern matching alone.
pub fn try_extract(task: ExtractionTask, text: &str) -> Option<ExtractionResult> {
    let start = Instant::now();
    let (value, confidence) = match task {
        ExtractionTask::Date => date(text)?,
        ExtractionTask::VolumeIssue => volume_issue(text)?,
        ExtractionTask::Title => subject(text)?,
        ExtractionTask::Description => return None,
    };
    Some(ExtractionResult::new(
        value,
        confidence,
        PRE_EXTRACT_TAG,
        start.elapsed().as_secs_f64(),
    ))
}

/// Same as [`try_extract`] over text given as lines.
pub fn try_extract_segments(task: ExtractionTask, segments: &[String]) -> Option<ExtractionResult> {
    try_extract(task, &segments.join("\n"))
}

fn date(text: &str) -> Option<(String, f64)> {
    if let Some(c) = ISO_DATE.captures(text) {
        return Some((c[1].to_string(), 0.9));
    }
    YEAR.captures(text).map(|c| (c[1].to_string(), 0.8))
}

fn volume_issue(text: &str) -> Option<(String, f64)> {
    if let Some(c) = VOLUME_ISSUE.captures(text) {
        return Some((format!("Volume {}, Issue {}", &c[1], &c[2]), 0.85));
    }
    ISSUE_ONLY
        .captures(text)
        .map(|c| (format!("Issue {}", &c[1]), 0.7))
}

fn subject(text: &str) -> Option<(String, f64)> {
    SUBJECT_LINE
        .captures(text)
        .map(|c| (c[1].to_string(), 0.75))
}
