//! Configuration structures for receipt extraction.

use serde::{Deserialize, Serialize};

use crate::error::RcptError;
use crate::extract::rules::patterns;
use crate::models::receipt::UNKNOWN;

/// Main configuration for rcpt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

/// How the total is picked among price candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStrategy {
    /// Keyword score, then amount, then later line.
    #[default]
    KeywordScore,
    /// Largest amount, then later line. Keywords are ignored.
    MaxValue,
}

/// A keyword and the weight it adds to a price candidate's line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordWeight {
    pub keyword: String,
    pub weight: i32,
}

impl KeywordWeight {
    pub fn new(keyword: impl Into<String>, weight: i32) -> Self {
        Self {
            keyword: keyword.into(),
            weight,
        }
    }
}

/// Receipt field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Number of leading lines searched for the merchant name.
    pub establishment_scan_lines: usize,

    /// Letters must exceed digits by more than this for a merchant line.
    pub letter_margin: usize,

    /// Whole words that disqualify a merchant line.
    pub noise_words: Vec<String>,

    /// Date regexes in priority order.
    pub date_patterns: Vec<String>,

    /// Regex for money-like amounts.
    pub money_pattern: String,

    /// Keyword weights used to score price lines.
    pub keywords: Vec<KeywordWeight>,

    /// Price ranking policy.
    pub price_strategy: PriceStrategy,

    /// First line (0-based) of the details excerpt.
    pub details_start: usize,

    /// Number of lines in the details excerpt.
    pub details_len: usize,

    /// Separator used to join details lines.
    pub details_separator: String,

    /// Value written to fields that matched nothing.
    pub sentinel: String,

    /// Read ambiguous numeric dates as day-first when normalizing.
    pub day_first: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            establishment_scan_lines: 5,
            letter_margin: 2,
            noise_words: ["receipt", "tel", "phone", "address"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            date_patterns: patterns::DEFAULT_DATE_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            money_pattern: patterns::MONEY_SRC.to_string(),
            keywords: default_keywords(),
            price_strategy: PriceStrategy::KeywordScore,
            details_start: 1,
            details_len: 4,
            details_separator: " | ".to_string(),
            sentinel: UNKNOWN.to_string(),
            day_first: true,
        }
    }
}

/// Default keyword weights for price scoring.
pub fn default_keywords() -> Vec<KeywordWeight> {
    vec![
        KeywordWeight::new("total", 2),
        KeywordWeight::new("subtotal", 1),
        KeywordWeight::new("amount", 1),
        KeywordWeight::new("balance", 1),
        KeywordWeight::new("sum", 1),
        KeywordWeight::new("payment", 1),
        KeywordWeight::new("net", 1),
        KeywordWeight::new("cash", -1),
        KeywordWeight::new("change", -2),
        KeywordWeight::new("received", -1),
        // Neutral: marks the line as a summary line, not an item
        KeywordWeight::new("tax", 0),
    ]
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// chrono format string for the `recorded_at` sheet column.
    pub timestamp_format: String,

    /// Delimiter for CSV output and ledgers.
    pub csv_delimiter: char,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
            csv_delimiter: ',',
        }
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check output settings that serde alone cannot reject.
    pub fn validate(&self) -> crate::Result<()> {
        let delimiter = self.output.csv_delimiter;
        if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
            return Err(RcptError::Config(format!(
                "csv_delimiter {:?} must be a single ASCII character other than a quote or newline",
                delimiter
            )));
        }
        if self.output.timestamp_format.trim().is_empty() {
            return Err(RcptError::Config("timestamp_format is empty".to_string()));
        }
        Ok(())
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_keywords_signs() {
        let keywords = default_keywords();
        let weight = |k: &str| keywords.iter().find(|w| w.keyword == k).unwrap().weight;

        assert!(weight("total") > 0);
        assert!(weight("net") > 0);
        assert!(weight("cash") < 0);
        assert!(weight("change") < 0);
        assert!(weight("received") < 0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RcptConfig =
            serde_json::from_str(r#"{"extraction": {"price_strategy": "max_value"}}"#).unwrap();

        assert_eq!(config.extraction.price_strategy, PriceStrategy::MaxValue);
        assert_eq!(config.extraction.establishment_scan_lines, 5);
        assert_eq!(config.output.csv_delimiter, ',');
    }

    #[test]
    fn test_from_file_rejects_bad_output_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{"output": {"csv_delimiter": "é"}}"#).unwrap();
        let err = RcptConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, RcptError::Config(_)));

        std::fs::write(&path, r#"{"output": {"timestamp_format": " "}}"#).unwrap();
        assert!(matches!(RcptConfig::from_file(&path), Err(RcptError::Config(_))));

        std::fs::write(&path, r#"{"output": {"csv_delimiter": ";"}}"#).unwrap();
        assert_eq!(RcptConfig::from_file(&path).unwrap().output.csv_delimiter, ';');
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = RcptConfig::default();
        config.extraction.details_len = 2;
        config.save(&path).unwrap();

        let loaded = RcptConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.details_len, 2);
        assert_eq!(loaded.extraction.noise_words, config.extraction.noise_words);
    }
}
