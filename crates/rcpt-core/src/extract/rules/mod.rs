//! Rule-based field extractors for receipts.

pub mod amounts;
pub mod dates;
pub mod details;
pub mod establishment;
pub mod patterns;

pub use amounts::{parse_money, KeywordScorer, PriceExtractor};
pub use dates::{normalize_date, DateExtractor};
pub use details::{details_excerpt, ItemExtractor, ReceiptItem};
pub use establishment::EstablishmentExtractor;
pub use patterns::*;

use serde::Serialize;

/// Trait for field extractors working on cleaned receipt lines.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the best match for the field.
    fn extract(&self, lines: &[&str]) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, lines: &[&str]) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Index of the line the value came from.
    pub line: Option<usize>,
    /// Byte span within that line.
    pub position: Option<(usize, usize)>,
    /// Source line that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            line: None,
            position: None,
            source: source.into(),
        }
    }

    pub fn on_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// Split OCR text into trimmed, non-empty lines.
pub fn clean_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Lowercased alphabetic words of a line.
///
/// Digits and punctuation split words, so `TOTAL:4.50` yields `total`.
pub fn words(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}
