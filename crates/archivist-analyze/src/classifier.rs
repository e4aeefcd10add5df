//! Document-type classification by keyword and regex scoring.
//!
//! Two granularities share the same priority order (Letter > Newsletter >
//! Report > Unknown):
//! - `Detailed`: each type has a fixed pattern set; every distinct pattern
//!   that matches scores one point, and two points elect the type.
//! - `Fast`: a single keyword hit elects the type.
//!
//! Results are cached per classifier instance, keyed by a SHA-256 of the
//! first 500 characters of the lower-cased text. Two long documents that
//! share that prefix resolve to the same type; this is an accepted
//! approximation.

use archivist_core::{DocumentType, Priority};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Points a pattern set must reach to elect its type.
const ELECTION_THRESHOLD: usize = 2;

/// Characters of lower-cased text hashed for the cache key.
const CACHE_PREFIX_CHARS: usize = 500;

static LETTER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\bdear\b",
        r"\bsincerely\b",
        r"\byours\b",
        r"\bbest regards\b",
        r"\bfrom:",
        r"\bto:",
        r"\bsubject:",
    ])
});

static NEWSLETTER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\bvolume\b",
        r"\bissue\b",
        r"\bnewsletter\b",
        r"\bpublication\b",
        r"\beditor\b",
        r"\barticles?\b",
        r"\bfeatures?\b",
    ])
});

static REPORT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\breport\b",
        r"\banalysis\b",
        r"\bfindings\b",
        r"\bconclusion\b",
        r"\bexecutive summary\b",
        r"\brecommendations?\b",
    ])
});

const LETTER_KEYWORDS: &[&str] = &["dear", "sincerely"];
const NEWSLETTER_KEYWORDS: &[&str] = &["newsletter", "volume", "issue"];
const REPORT_KEYWORDS: &[&str] = &["report", "findings"];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static classifier pattern"))
        .collect()
}

/// Which classifier variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierGranularity {
    Detailed,
    Fast,
}

impl ClassifierGranularity {
    /// Speed priority trades classification accuracy for latency.
    pub fn for_priority(priority: Priority) -> Self {
        match priority {
            Priority::Speed => Self::Fast,
            Priority::Balanced | Priority::Accuracy => Self::Detailed,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Self::Detailed => "detailed",
            Self::Fast => "fast",
        }
    }
}

/// Classifier with a per-instance document-type cache.
#[derive(Default)]
pub struct DocumentClassifier {
    cache: DashMap<String, DocumentType>,
}

impl DocumentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a document given as text lines.
    pub fn classify(&self, segments: &[String], granularity: ClassifierGranularity) -> DocumentType {
        let full_text = segments.join(" ").to_lowercase();
        let key = cache_key(&full_text, granularity);

        if let Some(hit) = self.cache.get(&key) {
            return *hit;
        }

        let doc_type = match granularity {
            ClassifierGranularity::Detailed => classify_detailed(&full_text),
            ClassifierGranularity::Fast => classify_fast(&full_text),
        };

        // Concurrent callers may race here; they compute the same value.
        self.cache.insert(key, doc_type);
        debug!("Detected document type: {} ({})", doc_type, granularity.tag());
        doc_type
    }

    /// Number of cached classifications.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

fn cache_key(lower_text: &str, granularity: ClassifierGranularity) -> String {
    let prefix: String = lower_text.chars().take(CACHE_PREFIX_CHARS).collect();
    let digest = Sha256::digest(prefix.as_bytes());
    format!("{}:{}", granularity.tag(), hex::encode(digest))
}

/// Point-accumulating classification. Expects lower-cased text.
pub fn classify_detailed(lower_text: &str) -> DocumentType {
    let score = |patterns: &[Regex]| patterns.iter().filter(|re| re.is_match(lower_text)).count();

    if score(&LETTER_PATTERNS) >= ELECTION_THRESHOLD {
        DocumentType::Letter
    } else if score(&NEWSLETTER_PATTERNS) >= ELECTION_THRESHOLD {
        DocumentType::Newsletter
    } else if score(&REPORT_PATTERNS) >= ELECTION_THRESHOLD {
        DocumentType::Report
    } else {
        DocumentType::Unknown
    }
}

/// Single-keyword classification. Expects lower-cased text.
pub fn classify_fast(lower_text: &str) -> DocumentType {
    let hit = |keywords: &[&str]| keywords.iter().any(|kw| lower_text.contains(kw));

    if hit(LETTER_KEYWORDS) {
        DocumentType::Letter
    } else if hit(NEWSLETTER_KEYWORDS) {
        DocumentType::Newsletter
    } else if hit(REPORT_KEYWORDS) {
        DocumentType::Report
    } else {
        DocumentType::Unknown
    }
}
