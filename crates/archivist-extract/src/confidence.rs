//! Plausibility scoring for raw model answers.

use archivist_core::{ExtractionTask, Priority};
use once_cell::sync::Lazy;
use regex::Regex;

/// Score for an empty or explicit non-answer.
pub const NO_ANSWER_SCORE: f64 = 0.1;

const BASE_SCORE: f64 = 0.5;
const SOURCE_MATCH_BONUS: f64 = 0.1;

const FAST_HIGH: f64 = 0.9;
const FAST_LOW: f64 = 0.6;

/// Literal answers that mean the model found nothing.
const NO_ANSWER: &[&str] = &["no", "none", "not found", "n/a"];

static ISO_DATE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());
static YEAR_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}").unwrap());
static VOLUME_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:volume|vol|issue|no)\b").unwrap());
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());

/// Scorer granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Base score plus bounded per-task increments.
    Detailed,
    /// Two tiers per task from a single check.
    Fast,
}

impl ScoringMode {
    pub fn for_priority(priority: Priority) -> Self {
        match priority {
            Priority::Speed => Self::Fast,
            Priority::Balanced | Priority::Accuracy => Self::Detailed,
        }
    }
}

/// Confidence in [0, 1] that `raw` is a real answer for `task`.
pub fn score(raw: &str, task: ExtractionTask, segments: &[String], mode: ScoringMode) -> f64 {
    let value = raw.trim();
    if is_no_answer(value) {
        return NO_ANSWER_SCORE;
    }
    match mode {
        ScoringMode::Detailed => detailed(value, task, segments),
        ScoringMode::Fast => fast(value, task),
    }
}

fn is_no_answer(value: &str) -> bool {
    value.is_empty() || NO_ANSWER.iter().any(|na| value.eq_ignore_ascii_case(na))
}

fn detailed(value: &str, task: ExtractionTask, segments: &[String]) -> f64 {
    let len = value.chars().count();
    let mut confidence = BASE_SCORE;

    confidence += match task {
        ExtractionTask::Date if ISO_DATE_PREFIX.is_match(value) => 0.4,
        ExtractionTask::Date if YEAR_PREFIX.is_match(value) => 0.3,
        ExtractionTask::Date => 0.0,
        ExtractionTask::Title => {
            let mut bonus = 0.0;
            if (10..=100).contains(&len) {
                bonus += 0.3;
            }
            if value.chars().next().is_some_and(char::is_uppercase) {
                bonus += 0.1;
            }
            bonus
        }
        ExtractionTask::Description => {
            let mut bonus = 0.0;
            if (50..=500).contains(&len) {
                bonus += 0.3;
            }
            if value.matches('.').count() >= 2 {
                bonus += 0.1;
            }
            bonus
        }
        ExtractionTask::VolumeIssue if VOLUME_KEYWORD.is_match(value) => 0.4,
        ExtractionTask::VolumeIssue => 0.0,
    };

    let source = segments.join(" ").to_lowercase();
    if source.contains(&value.to_lowercase()) {
        confidence += SOURCE_MATCH_BONUS;
    }

    confidence.min(1.0)
}

fn fast(value: &str, task: ExtractionTask) -> f64 {
    let len = value.chars().count();
    let plausible = match task {
        ExtractionTask::Date => YEAR_PREFIX.is_match(value),
        ExtractionTask::Title => (10..=100).contains(&len),
        ExtractionTask::Description => len >= 50,
        ExtractionTask::VolumeIssue => DIGIT.is_match(value),
    };
    if plausible {
        FAST_HIGH
    } else {
        FAST_LOW
    }
}
