//! Merchant name detection.

use std::collections::HashSet;

use super::{words, ExtractionMatch, FieldExtractor};

/// Picks the merchant line among the first few receipt lines.
pub struct EstablishmentExtractor {
    /// Number of leading lines searched.
    scan_lines: usize,
    /// Letters must exceed digits by more than this on lines after the first.
    letter_margin: usize,
    /// Lowercased whole words that disqualify a line.
    noise_words: HashSet<String>,
}

impl EstablishmentExtractor {
    pub fn new() -> Self {
        Self {
            scan_lines: 5,
            letter_margin: 2,
            noise_words: ["receipt", "tel", "phone", "address"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn with_scan_lines(mut self, scan_lines: usize) -> Self {
        self.scan_lines = scan_lines;
        self
    }

    pub fn with_letter_margin(mut self, letter_margin: usize) -> Self {
        self.letter_margin = letter_margin;
        self
    }

    pub fn with_noise_words<I, S>(mut self, noise_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.noise_words = noise_words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    /// Whether a line reads like a merchant name.
    pub fn is_name_like(&self, line: &str) -> bool {
        self.passes(line, self.letter_margin)
    }

    /// The top line only needs more letters than digits, so short names
    /// like `BP` or `H&M` still win there.
    fn accepts(&self, index: usize, line: &str) -> bool {
        let margin = if index == 0 { 0 } else { self.letter_margin };
        self.passes(line, margin)
    }

    fn passes(&self, line: &str, margin: usize) -> bool {
        let letters = line.chars().filter(|c| c.is_alphabetic()).count();
        let digits = line.chars().filter(|c| c.is_numeric()).count();

        letters > digits + margin && !self.is_noise(line)
    }

    fn is_noise(&self, line: &str) -> bool {
        words(line).any(|w| self.noise_words.contains(&w))
    }
}

impl Default for EstablishmentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for EstablishmentExtractor {
    type Output = ExtractionMatch<String>;

    /// First name-like line, else the first line with low confidence.
    fn extract(&self, lines: &[&str]) -> Option<Self::Output> {
        if let Some(found) = self.extract_all(lines).into_iter().next() {
            return Some(found);
        }

        lines
            .first()
            .map(|first| ExtractionMatch::new(first.to_string(), 0.3, *first).on_line(0))
    }

    fn extract_all(&self, lines: &[&str]) -> Vec<Self::Output> {
        lines
            .iter()
            .take(self.scan_lines)
            .enumerate()
            .filter(|(i, line)| self.accepts(*i, line))
            .map(|(i, line)| ExtractionMatch::new(line.to_string(), 0.8, *line).on_line(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_alphabetic_line() {
        let extractor = EstablishmentExtractor::new();

        let found = extractor.extract(&["STARBUCKS", "12/05/2023"]).unwrap();
        assert_eq!(found.value, "STARBUCKS");
        assert_eq!(found.line, Some(0));
    }

    #[test]
    fn test_short_name_on_first_line() {
        let extractor = EstablishmentExtractor::new();

        let found = extractor.extract(&["BP", "FUEL STATION", "TOTAL 40.00"]).unwrap();
        assert_eq!(found.value, "BP");
        assert_eq!(found.line, Some(0));

        let found = extractor.extract(&["ok", "corner shop", "thanks"]).unwrap();
        assert_eq!(found.value, "ok");
    }

    #[test]
    fn test_margin_applies_after_first_line() {
        let extractor = EstablishmentExtractor::new();

        let found = extractor.extract(&["1234", "QT", "Joe's Diner"]).unwrap();
        assert_eq!(found.value, "Joe's Diner");
        assert_eq!(found.line, Some(2));
    }

    #[test]
    fn test_skips_noise_and_numeric_lines() {
        let extractor = EstablishmentExtractor::new();
        let lines = [
            "RECEIPT",
            "Tel: 555 123 4567",
            "#0042 17/02",
            "Joe's Diner",
            "TOTAL 12.00",
        ];

        let found = extractor.extract(&lines).unwrap();
        assert_eq!(found.value, "Joe's Diner");
        assert_eq!(found.line, Some(3));
    }

    #[test]
    fn test_noise_is_whole_word() {
        let extractor = EstablishmentExtractor::new();

        assert!(extractor.is_name_like("Grand Hotel"));
        assert!(!extractor.is_name_like("Phone: 020 7946 0000"));
        assert!(!extractor.is_name_like("Sales Receipt"));
    }

    #[test]
    fn test_fallback_to_first_line() {
        let extractor = EstablishmentExtractor::new();

        let found = extractor.extract(&["1234", "RECEIPT"]).unwrap();
        assert_eq!(found.value, "1234");
        assert!(found.confidence < 0.5);
    }

    #[test]
    fn test_scan_window() {
        let extractor = EstablishmentExtractor::new().with_scan_lines(2);

        let found = extractor.extract(&["12", "34", "CAFE NERO"]).unwrap();
        assert_eq!(found.value, "12");
    }

    #[test]
    fn test_no_lines() {
        assert!(EstablishmentExtractor::new().extract(&[]).is_none());
    }
}
