//! Receipt parser combining the field rules.

use std::time::Instant;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::config::{ExtractionConfig, PriceStrategy};
use crate::models::receipt::{ParsedReceipt, PriceCandidate, UNKNOWN};

use super::rules::{
    clean_lines, details_excerpt, normalize_date, DateExtractor, EstablishmentExtractor,
    ExtractionMatch, FieldExtractor, ItemExtractor, KeywordScorer, PriceExtractor, ReceiptItem,
};
use super::{ReceiptExtractor, Result};

/// Per-field extraction outcome. `None` means nothing matched.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptFields {
    pub establishment: Option<ExtractionMatch<String>>,
    pub date: Option<ExtractionMatch<String>>,
    pub price: Option<ExtractionMatch<PriceCandidate>>,
    pub details: String,
    /// Item lines found between header and totals.
    pub items: Vec<ReceiptItem>,
    /// All price candidates, best first.
    pub candidates: Vec<PriceCandidate>,
}

impl ReceiptFields {
    /// Collapse into a fully populated record, substituting `sentinel`.
    pub fn to_parsed(&self, sentinel: &str) -> ParsedReceipt {
        ParsedReceipt {
            establishment: self
                .establishment
                .as_ref()
                .map(|m| m.value.clone())
                .unwrap_or_else(|| sentinel.to_string()),
            date: self
                .date
                .as_ref()
                .map(|m| m.value.clone())
                .unwrap_or_else(|| sentinel.to_string()),
            price: self
                .price
                .as_ref()
                .map(|m| m.value.text.clone())
                .unwrap_or_else(|| sentinel.to_string()),
            details: self.details.clone(),
        }
    }

    /// Calendar date for the extracted date text, if it can be read.
    pub fn date_value(&self, day_first: bool) -> Option<NaiveDate> {
        self.date
            .as_ref()
            .and_then(|m| normalize_date(&m.value, day_first))
    }

    /// Mean confidence over the three heuristic fields, missing ones count 0.
    pub fn confidence(&self) -> f32 {
        let sum = self.establishment.as_ref().map_or(0.0, |m| m.confidence)
            + self.date.as_ref().map_or(0.0, |m| m.confidence)
            + self.price.as_ref().map_or(0.0, |m| m.confidence);
        sum / 3.0
    }
}

/// Result of receipt extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Fully populated record.
    pub receipt: ParsedReceipt,
    /// Per-field matches with confidence.
    pub fields: ReceiptFields,
    /// Extracted date as a calendar date, when it can be read.
    pub date_value: Option<NaiveDate>,
    /// Number of non-empty lines seen.
    pub line_count: usize,
    /// One entry per field that fell back to a sentinel.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Heuristic receipt parser.
pub struct ReceiptParser {
    establishment: EstablishmentExtractor,
    dates: DateExtractor,
    prices: PriceExtractor,
    items: ItemExtractor,
    details_start: usize,
    details_len: usize,
    details_separator: String,
    sentinel: String,
    day_first: bool,
}

impl ReceiptParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self {
            establishment: EstablishmentExtractor::new(),
            dates: DateExtractor::new(),
            prices: PriceExtractor::new(),
            items: ItemExtractor::default(),
            details_start: 1,
            details_len: 4,
            details_separator: " | ".to_string(),
            sentinel: UNKNOWN.to_string(),
            day_first: true,
        }
    }

    /// Build a parser from configuration, compiling every pattern.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        if config.establishment_scan_lines == 0 {
            return Err(ExtractionError::InvalidSetting {
                field: "establishment_scan_lines".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if config.noise_words.iter().any(|w| w.trim().is_empty()) {
            return Err(ExtractionError::EmptyKeyword("noise_words".to_string()));
        }
        if config.keywords.iter().any(|k| k.keyword.trim().is_empty()) {
            return Err(ExtractionError::EmptyKeyword("keywords".to_string()));
        }

        let date_patterns = config
            .date_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;
        let money = compile(&config.money_pattern)?;
        let scorer = KeywordScorer::new(&config.keywords);

        debug!(
            "Built parser with {} date patterns and {} keywords",
            date_patterns.len(),
            config.keywords.len()
        );

        Ok(Self {
            establishment: EstablishmentExtractor::new()
                .with_scan_lines(config.establishment_scan_lines)
                .with_letter_margin(config.letter_margin)
                .with_noise_words(&config.noise_words),
            dates: DateExtractor::new().with_patterns(date_patterns),
            prices: PriceExtractor::new()
                .with_money_pattern(money)
                .with_scorer(scorer.clone())
                .with_strategy(config.price_strategy),
            items: ItemExtractor::new(scorer),
            details_start: config.details_start,
            details_len: config.details_len,
            details_separator: config.details_separator.clone(),
            sentinel: config.sentinel.clone(),
            day_first: config.day_first,
        })
    }

    /// Set the price ranking policy.
    pub fn with_price_strategy(mut self, strategy: PriceStrategy) -> Self {
        self.prices = self.prices.with_strategy(strategy);
        self
    }

    /// Set the details window.
    pub fn with_details_window(mut self, start: usize, len: usize) -> Self {
        self.details_start = start;
        self.details_len = len;
        self
    }

    /// Set the sentinel written to unmatched fields.
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Read ambiguous numeric dates as day-first (`03/04` is 3 April).
    pub fn with_day_first(mut self, day_first: bool) -> Self {
        self.day_first = day_first;
        self
    }

    pub fn price_strategy(&self) -> PriceStrategy {
        self.prices.strategy()
    }

    /// Run every field rule and keep the optional per-field matches.
    pub fn extract_fields(&self, text: &str) -> ReceiptFields {
        let lines = clean_lines(text);

        let ranked = self.prices.extract_all(&lines);
        let candidates: Vec<PriceCandidate> = ranked.iter().map(|m| m.value.clone()).collect();
        if let Some(best) = candidates.first() {
            debug!(
                "Picked price {} from line {} (score {}) among {} candidates",
                best.text,
                best.line,
                best.score,
                candidates.len()
            );
        }

        ReceiptFields {
            establishment: self.establishment.extract(&lines),
            date: self.dates.extract(&lines),
            price: ranked.into_iter().next(),
            details: details_excerpt(&lines, self.details_start, self.details_len, &self.details_separator),
            items: self.items.extract_all(&lines),
            candidates,
        }
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptExtractor for ReceiptParser {
    fn extract(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();

        info!("Parsing receipt from {} characters of text", text.len());

        let line_count = clean_lines(text).len();
        let fields = self.extract_fields(text);

        let mut warnings = Vec::new();
        if fields.establishment.is_none() {
            warnings.push("Could not extract establishment".to_string());
        }
        if fields.date.is_none() {
            warnings.push("Could not extract date".to_string());
        }
        if fields.price.is_none() {
            warnings.push("Could not extract price".to_string());
        }

        let receipt = fields.to_parsed(&self.sentinel);
        let date_value = fields.date_value(self.day_first);
        if fields.date.is_some() && date_value.is_none() {
            warnings.push(format!("Could not normalize date {:?}", receipt.date));
        }

        debug!(
            "Extracted receipt from {:?} with confidence {:.2}",
            receipt.establishment,
            fields.confidence()
        );

        ExtractionResult {
            receipt,
            fields,
            date_value,
            line_count,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ExtractionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::KeywordWeight;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_basic_receipt() {
        let parser = ReceiptParser::new();
        let receipt = parser.parse("STARBUCKS\n12/05/2023\nTOTAL 4.50\n");

        assert_eq!(receipt.establishment, "STARBUCKS");
        assert_eq!(receipt.date, "12/05/2023");
        assert_eq!(receipt.price, "4.50");
        assert_eq!(receipt.details, "12/05/2023 | TOTAL 4.50");
    }

    #[test]
    fn test_parse_full_receipt() {
        let text = r#"
            RECEIPT
            Blue Bottle Coffee
            300 Webster St, Oakland
            Tel: 510-555-0101

            May 12, 2023  08:41
            Cappuccino            4.75
            Almond Croissant      3.95
            SUBTOTAL              8.70
            Tax                   0.78
            TOTAL                 9.48
            CASH                 20.00
            CHANGE               10.52
        "#;

        let result = ReceiptParser::new().extract(text);

        assert_eq!(result.receipt.establishment, "Blue Bottle Coffee");
        assert_eq!(result.receipt.date, "May 12, 2023");
        assert_eq!(result.receipt.price, "9.48");
        assert_eq!(
            result.receipt.details,
            "Blue Bottle Coffee | 300 Webster St, Oakland | Tel: 510-555-0101 | May 12, 2023  08:41"
        );
        assert_eq!(result.line_count, 12);
        assert!(result.warnings.is_empty());

        let items: Vec<&str> = result.fields.items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(items, vec!["Cappuccino", "Almond Croissant"]);
        assert_eq!(result.date_value, NaiveDate::from_ymd_opt(2023, 5, 12));
    }

    #[test]
    fn test_empty_text_uses_sentinels() {
        let result = ReceiptParser::new().extract("");

        assert_eq!(result.receipt, ParsedReceipt::unknown());
        assert_eq!(result.warnings.len(), 3);
        assert_eq!(result.fields.confidence(), 0.0);
    }

    #[test]
    fn test_no_digits() {
        let receipt = ReceiptParser::new().parse("corner shop\nthank you\n");

        assert_eq!(receipt.establishment, "corner shop");
        assert_eq!(receipt.date, "Unknown");
        assert_eq!(receipt.price, "Unknown");
    }

    #[test]
    fn test_price_strategy_policy() {
        let text = "DELI\nTOTAL 4.50\nCHANGE 15.50";

        let scored = ReceiptParser::new().parse(text);
        assert_eq!(scored.price, "4.50");

        let max = ReceiptParser::new()
            .with_price_strategy(PriceStrategy::MaxValue)
            .parse(text);
        assert_eq!(max.price, "15.50");
    }

    #[test]
    fn test_custom_sentinel_and_window() {
        let receipt = ReceiptParser::new()
            .with_sentinel("N/A")
            .with_details_window(0, 1)
            .parse("MARKET\nthanks");

        assert_eq!(receipt.date, "N/A");
        assert_eq!(receipt.price, "N/A");
        assert_eq!(receipt.details, "MARKET");
    }

    #[test]
    fn test_idempotent() {
        let parser = ReceiptParser::new();
        let text = "TESCO\n2023-01-15\nBALANCE DUE 23.10\nCARD 23.10";

        assert_eq!(parser.parse(text), parser.parse(text));
    }

    #[test]
    fn test_from_config() {
        let mut config = ExtractionConfig::default();
        config.keywords.push(KeywordWeight::new("due", 3));
        config.price_strategy = PriceStrategy::KeywordScore;

        let parser = ReceiptParser::from_config(&config).unwrap();
        let receipt = parser.parse("SHOP\nTOTAL 9.00\nDUE 7.00");
        assert_eq!(receipt.price, "7.00");
    }

    #[test]
    fn test_day_first_from_config() {
        let text = "SHOP\n03/04/2023\nTOTAL 1.00";

        let result = ReceiptParser::from_config(&ExtractionConfig::default())
            .unwrap()
            .extract(text);
        assert_eq!(result.date_value, NaiveDate::from_ymd_opt(2023, 4, 3));

        let config = ExtractionConfig {
            day_first: false,
            ..ExtractionConfig::default()
        };
        let result = ReceiptParser::from_config(&config).unwrap().extract(text);
        assert_eq!(result.receipt.date, "03/04/2023");
        assert_eq!(result.date_value, NaiveDate::from_ymd_opt(2023, 3, 4));
    }

    #[test]
    fn test_dot_thousands_total() {
        let receipt = ReceiptParser::new().parse("SHOP\nTOTAL 1.234,56\n");
        assert_eq!(receipt.price, "1.234,56");
    }

    #[test]
    fn test_short_first_line_name() {
        let receipt = ReceiptParser::new().parse("BP\nFUEL STATION\nTOTAL 40.00\n");
        assert_eq!(receipt.establishment, "BP");

        let receipt = ReceiptParser::new().parse("ok\ncorner shop\nthanks\n");
        assert_eq!(receipt.establishment, "ok");
    }

    #[test]
    fn test_from_config_rejects_bad_pattern() {
        let mut config = ExtractionConfig::default();
        config.date_patterns = vec![r"(\d{2}".to_string()];

        let err = ReceiptParser::from_config(&config).err().unwrap();
        assert!(matches!(err, ExtractionError::InvalidPattern { .. }));
    }

    #[test]
    fn test_from_config_rejects_empty_keyword() {
        let mut config = ExtractionConfig::default();
        config.noise_words.push("  ".to_string());

        let err = ReceiptParser::from_config(&config).err().unwrap();
        assert!(matches!(err, ExtractionError::EmptyKeyword(_)));
    }
}
