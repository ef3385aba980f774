//! Section and evidence extraction from raw filing text
//!
//! Pages are separated by form feeds (`\x0c`), as emitted by most PDF text
//! extractors. Text without form feeds is a single page.

use shared_types::{BoundingBox, EvidenceSnippet, Section};

use crate::patterns::{find_anchor, SECTION_PATTERNS};

pub const MAX_EVIDENCE_SNIPPETS: usize = 5;
pub const SECTION_CONFIDENCE: f64 = 0.7;
pub const EVIDENCE_SOURCE: &str = "ocr_or_digital_text";

/// Turns raw filing text into sections and evidence snippets
pub trait Extractor: Send + Sync {
    fn extract_sections(&self, raw_text: &str) -> Vec<Section>;

    fn extract_evidence(&self, raw_text: &str) -> Vec<EvidenceSnippet>;
}

/// Keyword-anchor extractor with a fixed line layout for snippet boxes
#[derive(Debug, Default, Clone, Copy)]
pub struct AnchorExtractor;

fn pages(raw_text: &str) -> impl Iterator<Item = (u32, &str)> {
    raw_text.split('\x0c').zip(1u32..).map(|(text, page)| (page, text))
}

/// Layout box for the `index`-th snippet line on a page
pub fn line_bbox(index: usize) -> BoundingBox {
    let offset = 20.0 * index as f64;
    BoundingBox::new(50.0, 100.0 + offset, 550.0, 118.0 + offset)
}

impl Extractor for AnchorExtractor {
    fn extract_sections(&self, raw_text: &str) -> Vec<Section> {
        SECTION_PATTERNS
            .iter()
            .filter_map(|(anchor, pattern)| {
                pages(raw_text)
                    .find(|(_, text)| find_anchor(text, pattern).is_some())
                    .map(|(page, _)| Section {
                        section_title: anchor.to_string(),
                        start_page: page,
                        end_page: page,
                        confidence: SECTION_CONFIDENCE,
                    })
            })
            .collect()
    }

    fn extract_evidence(&self, raw_text: &str) -> Vec<EvidenceSnippet> {
        pages(raw_text)
            .flat_map(|(page, text)| {
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .enumerate()
                    .map(move |(i, line)| EvidenceSnippet {
                        evidence_text: line.to_string(),
                        page,
                        bbox: line_bbox(i),
                        source: EVIDENCE_SOURCE.to_string(),
                    })
            })
            .take(MAX_EVIDENCE_SNIPPETS)
            .collect()
    }
}
