//! OCR text quality heuristics.
//!
//! Both policies return a score in [0, 1] where messier text scores lower.

use archivist_core::QualityPolicy;

/// Punctuation that counts as ordinary text, not as an OCR artifact.
const STANDARD_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '\'', '"', '(', ')', '-', '/', '&', '#', '%', '$',
];

/// Short words that are normal English, not broken fragments.
const COMMON_SHORT_WORDS: &[&str] = &[
    "a", "i", "an", "as", "at", "be", "by", "do", "go", "he", "if", "in", "is", "it", "me",
    "my", "no", "of", "on", "or", "so", "to", "up", "us", "we", "am", "re", "st", "mr", "ms",
    "dr",
];

/// Weight of a 1-2 character fragment relative to other issues.
const FRAGMENT_WEIGHT: usize = 2;

/// Score the text quality of a document given as lines.
pub fn estimate_quality(segments: &[String], policy: QualityPolicy) -> f64 {
    let full_text = segments.join(" ");
    match policy {
        QualityPolicy::Fast => fast_quality(&full_text),
        QualityPolicy::Detailed => detailed_quality(&full_text),
    }
}

/// 0.5 for near-empty text, 0.8 when any sentence punctuation is present, else 0.6.
pub fn fast_quality(text: &str) -> f64 {
    if text.chars().count() < 10 {
        return 0.5;
    }
    if text.contains(&['.', ',', '!', '?'][..]) {
        0.8
    } else {
        0.6
    }
}

/// 1 - 10 x (issue count / character count), clamped to [0, 1].
pub fn detailed_quality(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let issues = odd_symbols(text) + whitespace_runs(text) + case_breaks(text) + fragments(text);
    let issue_ratio = issues as f64 / total as f64;
    (1.0 - issue_ratio * 10.0).clamp(0.0, 1.0)
}

/// Characters that are neither word characters, whitespace, nor standard punctuation.
fn odd_symbols(text: &str) -> usize {
    text.chars()
        .filter(|c| {
            !(c.is_alphanumeric()
                || *c == '_'
                || c.is_whitespace()
                || STANDARD_PUNCTUATION.contains(c))
        })
        .count()
}

/// Runs of three or more whitespace characters.
fn whitespace_runs(text: &str) -> usize {
    let mut runs = 0;
    let mut current = 0;
    for c in text.chars() {
        if c.is_whitespace() {
            current += 1;
            if current == 3 {
                runs += 1;
            }
        } else {
            current = 0;
        }
    }
    runs
}

/// Lower-to-upper case transitions inside a word, e.g. "tHe".
fn case_breaks(text: &str) -> usize {
    text.split_whitespace()
        .map(|word| {
            let chars: Vec<char> = word.chars().collect();
            chars
                .windows(2)
                .filter(|w| w[0].is_lowercase() && w[1].is_uppercase())
                .count()
        })
        .sum()
}

/// Weighted count of 1-2 character tokens that look like broken words.
fn fragments(text: &str) -> usize {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| STANDARD_PUNCTUATION.contains(&c)))
        .filter(|token| {
            let len = token.chars().count();
            (1..=2).contains(&len)
                && !token.chars().all(|c| c.is_ascii_digit())
                && !COMMON_SHORT_WORDS.contains(&token.to_lowercase().as_str())
        })
        .count()
        * FRAGMENT_WEIGHT
}
