//! Line-level structural analysis of OCR text.
//!
//! Classifies each non-empty line (date, title, header, signature,
//! metadata, body), summarises document layout, and builds task-focused
//! line subsets for extraction.

use archivist_core::{DocumentType, ExtractionTask, SegmentType, TextSegment};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}\b",
        r"\b\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}\b",
        r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b",
        r"(?i)\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\.?\s+\d{1,2},?\s+\d{4}\b",
        r"(?i)\b\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4}\b",
    ])
});

static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"^[A-Z][A-Z\s]{5,50}$",
        r"^[A-Z][a-zA-Z\s]{10,80}$",
        r"(?i)^\s*(?:Re:|Subject:|Title:)\s*(.+)$",
    ])
});

static SIGNATURE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:Sincerely|Best regards|Yours truly|Cordially|Respectfully)\b",
        r"(?i)\b(?:Signed|Signature|Name)\s*:",
        r"^\s*[A-Z][a-z]+\s+[A-Z][a-z]+\s*$",
    ])
});

static METADATA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:Volume|Vol\.?)\s*\d+",
        r"(?i)\b(?:Issue|No\.?)\s*\d+",
        r"(?i)\b(?:Page|P\.?)\s*\d+",
        r"(?i)\b(?:Edition|Ed\.?)\s*\d+",
    ])
});

static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());
static LONG_MONTH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b").unwrap()
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static structure pattern"))
        .collect()
}

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|re| re.is_match(text))
}

/// Layout summary of a whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub total_lines: usize,
    pub total_chars: usize,
    pub avg_line_length: f64,
    pub has_headers: bool,
    pub has_signatures: bool,
    pub has_metadata: bool,
    pub estimated_type: DocumentType,
    pub structure_confidence: f64,
}

/// OCR quality indicators, each in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub text_clarity: f64,
    pub structure_clarity: f64,
    pub completeness: f64,
    pub overall_quality: f64,
}

/// Stateless analyzer; all patterns are compiled once per process.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentAnalyzer;

impl DocumentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Summarise line statistics and detect layout elements.
    pub fn analyze_structure(&self, text: &str) -> StructureAnalysis {
        let lines: Vec<&str> = text.split('\n').collect();
        let avg_line_length = if lines.is_empty() {
            0.0
        } else {
            lines.iter().map(|l| l.chars().count()).sum::<usize>() as f64 / lines.len() as f64
        };

        let has_headers = lines
            .iter()
            .any(|line| any_match(&TITLE_PATTERNS[..2], line.trim()));
        let has_signatures = lines
            .iter()
            .any(|line| any_match(&SIGNATURE_PATTERNS, line.trim()));
        let has_metadata = any_match(&METADATA_PATTERNS, text);

        let lower = text.to_lowercase();
        let (estimated_type, structure_confidence) = if lower.contains("dear") && has_signatures {
            (DocumentType::Letter, 0.8)
        } else if has_metadata || lower.contains("newsletter") {
            (DocumentType::Newsletter, 0.7)
        } else if lower.contains("report") || lower.contains("analysis") {
            (DocumentType::Report, 0.7)
        } else {
            (DocumentType::Unknown, 0.5)
        };

        StructureAnalysis {
            total_lines: lines.len(),
            total_chars: text.chars().count(),
            avg_line_length,
            has_headers,
            has_signatures,
            has_metadata,
            estimated_type,
            structure_confidence,
        }
    }

    /// Classify every non-empty line of `text`.
    pub fn segment(&self, text: &str) -> Vec<TextSegment> {
        let lines: Vec<&str> = text.split('\n').collect();
        let total = lines.len();

        lines
            .iter()
            .enumerate()
            .filter_map(|(line_number, raw)| {
                let line = raw.trim();
                if line.is_empty() {
                    return None;
                }
                let segment_type = classify_line(line, line_number, total);
                Some(TextSegment {
                    content: line.to_string(),
                    segment_type,
                    confidence: segment_confidence(line, segment_type),
                    line_number,
                    char_position: text.find(line).unwrap_or(0),
                })
            })
            .collect()
    }

    /// Line subset most relevant to `task`, in document order without duplicates.
    pub fn segments_for_task(&self, text: &str, task: ExtractionTask) -> Vec<String> {
        let segments = self.segment(text);
        let picked = match task {
            ExtractionTask::Title => {
                let mut out = contextual(&segments, SegmentType::Title);
                out.extend(contextual(&segments, SegmentType::Header));
                out
            }
            ExtractionTask::Date => {
                let mut out = contextual(&segments, SegmentType::Date);
                out.extend(contextual(&segments, SegmentType::Header));
                out
            }
            ExtractionTask::Description => segments
                .iter()
                .filter(|s| s.segment_type == SegmentType::Body)
                .take(10)
                .map(|s| s.content.clone())
                .collect(),
            ExtractionTask::VolumeIssue => {
                let mut out = contextual(&segments, SegmentType::Metadata);
                out.extend(contextual(&segments, SegmentType::Header));
                out
            }
        };
        dedup_in_order(picked)
    }

    /// Heuristic OCR quality metrics.
    pub fn quality_metrics(&self, text: &str) -> QualityMetrics {
        if text.is_empty() {
            return QualityMetrics::default();
        }

        let total = text.chars().count() as f64;
        let alpha = text.chars().filter(|c| c.is_alphabetic()).count() as f64;
        let space = text.chars().filter(|c| c.is_whitespace()).count() as f64;
        let punct = text
            .chars()
            .filter(|c| matches!(c, '.' | ',' | '!' | '?' | ';' | ':'))
            .count() as f64;
        let text_clarity = (alpha / total + space / total * 2.0 + punct / total * 5.0).min(1.0);

        let lines: Vec<&str> = text
            .split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let structure_clarity = if lines.is_empty() {
            0.0
        } else {
            let n = lines.len() as f64;
            let lengths: Vec<f64> = lines.iter().map(|l| l.chars().count() as f64).collect();
            let avg = lengths.iter().sum::<f64>() / n;
            let variance = lengths.iter().map(|l| (l - avg).powi(2)).sum::<f64>() / n;
            ((avg / 100.0) * (1.0 - variance / 10_000.0)).clamp(0.0, 1.0)
        };

        let has_beginning = text.chars().count() > 100;
        let has_end = text.trim_end().ends_with(&['.', '!', '?', '"'][..]) || text.chars().count() > 500;
        let has_structure = lines.len() > 3;
        let completeness = [has_beginning, has_end, has_structure]
            .iter()
            .filter(|b| **b)
            .count() as f64
            / 3.0;

        QualityMetrics {
            text_clarity,
            structure_clarity,
            completeness,
            overall_quality: text_clarity * 0.4 + structure_clarity * 0.3 + completeness * 0.3,
        }
    }
}

fn classify_line(line: &str, line_number: usize, total_lines: usize) -> SegmentType {
    if any_match(&DATE_PATTERNS, line) {
        return SegmentType::Date;
    }

    if line_number < 5 {
        if any_match(&TITLE_PATTERNS, line) {
            return SegmentType::Title;
        }
        let starts_upper = line.chars().next().is_some_and(char::is_uppercase);
        if line.chars().count() > 10 && starts_upper && line.matches(' ').count() < 8 {
            return SegmentType::Title;
        }
    }

    if line_number < 3 || (line.chars().count() < 50 && is_all_caps(line)) {
        return SegmentType::Header;
    }

    if line_number + 10 > total_lines && any_match(&SIGNATURE_PATTERNS, line) {
        return SegmentType::Signature;
    }

    if any_match(&METADATA_PATTERNS, line) {
        return SegmentType::Metadata;
    }

    SegmentType::Body
}

fn is_all_caps(line: &str) -> bool {
    line.chars().any(char::is_alphabetic) && !line.chars().any(char::is_lowercase)
}

fn segment_confidence(line: &str, segment_type: SegmentType) -> f64 {
    match segment_type {
        SegmentType::Date if ISO_DATE.is_match(line) => 0.9,
        SegmentType::Date if LONG_MONTH_DATE.is_match(line) => 0.8,
        SegmentType::Title => {
            let len = line.chars().count();
            if is_all_caps(line) && (10..=60).contains(&len) {
                0.8
            } else if line.chars().next().is_some_and(char::is_uppercase)
                && line.matches(' ').count() < 8
            {
                0.7
            } else {
                0.6
            }
        }
        SegmentType::Signature => {
            let lower = line.to_lowercase();
            if ["sincerely", "regards", "yours"].iter().any(|w| lower.contains(w)) {
                0.9
            } else {
                0.6
            }
        }
        _ => 0.6,
    }
}

/// Segments of `target` type with two neighbours either side, or a
/// positional fallback when none exist.
fn contextual(segments: &[TextSegment], target: SegmentType) -> Vec<String> {
    const CONTEXT: usize = 2;

    let hits: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.segment_type == target)
        .map(|(i, _)| i)
        .collect();

    if hits.is_empty() {
        let fallback: Vec<&TextSegment> = match target {
            SegmentType::Title => segments.iter().take(5).collect(),
            SegmentType::Date => segments
                .iter()
                .filter(|s| s.segment_type == SegmentType::Header)
                .chain(segments.iter().take(3))
                .collect(),
            SegmentType::Signature => {
                segments.iter().skip(segments.len().saturating_sub(5)).collect()
            }
            _ => Vec::new(),
        };
        return fallback.into_iter().map(|s| s.content.clone()).collect();
    }

    let mut out = Vec::new();
    for i in hits {
        let start = i.saturating_sub(CONTEXT);
        let end = (i + CONTEXT + 1).min(segments.len());
        out.extend(segments[start..end].iter().map(|s| s.content.clone()));
    }
    out
}

fn dedup_in_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|s| seen.insert(s.clone())).collect()
}
