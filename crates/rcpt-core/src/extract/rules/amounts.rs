//! Price candidate extraction and ranking.

use std::collections::HashMap;

use regex::Regex;
use rust_decimal::Decimal;

use super::patterns::MONEY;
use super::{words, ExtractionMatch, FieldExtractor};
use crate::models::config::{default_keywords, KeywordWeight, PriceStrategy};
use crate::models::receipt::PriceCandidate;

/// Scores a line by the keywords it contains.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    weights: HashMap<String, i32>,
}

impl KeywordScorer {
    pub fn new(keywords: &[KeywordWeight]) -> Self {
        let weights = keywords
            .iter()
            .map(|k| (k.keyword.trim().to_lowercase(), k.weight))
            .collect();
        Self { weights }
    }

    /// Sum of weights of the whole words present in `line`.
    /// A keyword repeated on a line counts once.
    pub fn score(&self, line: &str) -> i32 {
        let mut seen: Vec<String> = Vec::new();
        let mut score = 0;

        for word in words(line) {
            if let Some(weight) = self.weights.get(&word) {
                if !seen.contains(&word) {
                    score += weight;
                    seen.push(word);
                }
            }
        }

        score
    }

    /// Whether any configured keyword appears on the line.
    pub fn mentions_keyword(&self, line: &str) -> bool {
        words(line).any(|w| self.weights.contains_key(&w))
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new(&default_keywords())
    }
}

/// Price field extractor.
pub struct PriceExtractor {
    money: Regex,
    scorer: KeywordScorer,
    strategy: PriceStrategy,
}

impl PriceExtractor {
    pub fn new() -> Self {
        Self {
            money: MONEY.clone(),
            scorer: KeywordScorer::default(),
            strategy: PriceStrategy::KeywordScore,
        }
    }

    pub fn with_money_pattern(mut self, money: Regex) -> Self {
        self.money = money;
        self
    }

    pub fn with_scorer(mut self, scorer: KeywordScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_strategy(mut self, strategy: PriceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> PriceStrategy {
        self.strategy
    }

    /// All money-like amounts in the text, in line order, unranked.
    pub fn candidates(&self, lines: &[&str]) -> Vec<PriceCandidate> {
        let mut candidates = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let score = self.scorer.score(line);

            for m in self.money.find_iter(line) {
                if is_embedded(line, m.start(), m.end()) {
                    continue;
                }
                if let Some(amount) = parse_money(m.as_str()) {
                    candidates.push(PriceCandidate {
                        text: m.as_str().to_string(),
                        amount,
                        line: i,
                        score,
                    });
                }
            }
        }

        candidates
    }

    /// Order candidates best first according to the strategy.
    pub fn rank(&self, mut candidates: Vec<PriceCandidate>) -> Vec<PriceCandidate> {
        match self.strategy {
            PriceStrategy::KeywordScore => candidates.sort_by(|a, b| {
                b.score
                    .cmp(&a.score)
                    .then_with(|| b.amount.cmp(&a.amount))
                    .then_with(|| b.line.cmp(&a.line))
            }),
            PriceStrategy::MaxValue => candidates.sort_by(|a, b| {
                b.amount.cmp(&a.amount).then_with(|| b.line.cmp(&a.line))
            }),
        }
        candidates
    }

    fn confidence(&self, candidate: &PriceCandidate) -> f32 {
        match self.strategy {
            PriceStrategy::MaxValue => 0.5,
            PriceStrategy::KeywordScore if candidate.score > 0 => 0.9,
            PriceStrategy::KeywordScore if candidate.score == 0 => 0.6,
            PriceStrategy::KeywordScore => 0.3,
        }
    }
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PriceExtractor {
    type Output = ExtractionMatch<PriceCandidate>;

    fn extract(&self, lines: &[&str]) -> Option<Self::Output> {
        self.extract_all(lines).into_iter().next()
    }

    fn extract_all(&self, lines: &[&str]) -> Vec<Self::Output> {
        self.rank(self.candidates(lines))
            .into_iter()
            .map(|candidate| {
                let confidence = self.confidence(&candidate);
                let line = candidate.line;
                let source = lines.get(line).copied().unwrap_or_default();
                ExtractionMatch::new(candidate, confidence, source).on_line(line)
            })
            .collect()
    }
}

/// Whether a match is glued to a date, time, version or percentage
/// (`12.05.2023`, `10:15.30`, `8.25%`).
fn is_embedded(line: &str, start: usize, end: usize) -> bool {
    let before: Vec<char> = line[..start].chars().rev().take(2).collect();
    let after: Vec<char> = line[end..].chars().take(2).collect();

    let joins = |c: char| matches!(c, '.' | '/' | '-' | ':');

    let glued_before = matches!(before.as_slice(), [sep, digit, ..] if joins(*sep) && digit.is_ascii_digit());
    let glued_after = matches!(after.as_slice(), [sep, digit, ..] if joins(*sep) && digit.is_ascii_digit());
    let percent = after.first() == Some(&'%');

    glued_before || glued_after || percent
}

/// Parse a money substring into a decimal.
///
/// The last `.` or `,` is the decimal mark; other separators are thousands
/// separators: `"1,234.56"` and `"1.234,56"` both give `1234.56`.
pub fn parse_money(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let (integer, fraction) = match cleaned.rfind(['.', ',']) {
        Some(pos) => (&cleaned[..pos], &cleaned[pos + 1..]),
        None => (cleaned.as_str(), ""),
    };

    let integer: String = integer.chars().filter(char::is_ascii_digit).collect();
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let integer = if integer.is_empty() { "0" } else { integer.as_str() };
    let normalized = if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    };

    normalized.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("4.50"), Some(dec("4.50")));
        assert_eq!(parse_money("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_money("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_money("12,99"), Some(dec("12.99")));
        assert_eq!(parse_money("$"), None);
    }

    #[test]
    fn test_keyword_scorer() {
        let scorer = KeywordScorer::default();

        assert_eq!(scorer.score("TOTAL 4.50"), 2);
        assert_eq!(scorer.score("Change due 15.50"), -2);
        assert_eq!(scorer.score("Total total TOTAL"), 2);
        assert_eq!(scorer.score("Internet cafe 3.00"), 0);
        assert!(scorer.mentions_keyword("CASH 20.00"));
    }

    #[test]
    fn test_keyword_beats_magnitude() {
        let extractor = PriceExtractor::new();
        let lines = ["CAFE", "TOTAL 4.50", "CASH 20.00", "CHANGE 15.50"];

        let best = extractor.extract(&lines).unwrap();
        assert_eq!(best.value.text, "4.50");
        assert_eq!(best.line, Some(1));
        assert!(best.confidence > 0.8);
    }

    #[test]
    fn test_max_value_strategy() {
        let extractor = PriceExtractor::new().with_strategy(PriceStrategy::MaxValue);
        let lines = ["CAFE", "TOTAL 4.50", "CASH 20.00", "CHANGE 15.50"];

        let best = extractor.extract(&lines).unwrap();
        assert_eq!(best.value.text, "20.00");
    }

    #[test]
    fn test_ties_prefer_larger_then_later() {
        let extractor = PriceExtractor::new();

        let best = extractor.extract(&["SUBTOTAL 10.00", "TAX 0.80", "SUM 10.80"]).unwrap();
        assert_eq!(best.value.text, "10.80");

        let best = extractor.extract(&["ITEM 3.00", "ITEM 3.00"]).unwrap();
        assert_eq!(best.line, Some(1));
    }

    #[test]
    fn test_dates_and_rates_are_not_prices() {
        let extractor = PriceExtractor::new();

        let candidates = extractor.candidates(&["12.05.2023 10:15", "VAT 8.25% 0.37"]);
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["0.37"]);
    }

    #[test]
    fn test_dot_thousands_comma_decimal() {
        let extractor = PriceExtractor::new();

        let best = extractor.extract(&["SHOP", "TOTAL 1.234,56"]).unwrap();
        assert_eq!(best.value.text, "1.234,56");
        assert_eq!(best.value.amount, dec("1234.56"));
    }

    #[test]
    fn test_no_candidates() {
        assert!(PriceExtractor::new().extract(&["NO DIGITS HERE"]).is_none());
    }
}
