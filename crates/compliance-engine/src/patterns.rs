//! Keyword anchors for locating sections in filing text

use lazy_static::lazy_static;
use regex::Regex;

/// Section anchors in scan order
pub const SECTION_ANCHORS: &[&str] = &[
    "balance sheet",
    "statement of profit and loss",
    "cash flow",
    "notes",
    "related party",
    "auditor",
    "esg",
    "brsr",
];

lazy_static! {
    /// One case-insensitive pattern per anchor, tolerant of line breaks and
    /// repeated spaces between words
    pub static ref SECTION_PATTERNS: Vec<(&'static str, Regex)> = SECTION_ANCHORS
        .iter()
        .map(|anchor| {
            let words: Vec<String> = anchor.split_whitespace().map(regex::escape).collect();
            let pattern = format!(r"(?i){}", words.join(r"\s+"));
            (*anchor, Regex::new(&pattern).unwrap())
        })
        .collect();
}

/// Byte offset of the first match of `anchor`-style text, if any
pub fn find_anchor(text: &str, pattern: &Regex) -> Option<usize> {
    pattern.find(text).map(|m| m.start())
}
