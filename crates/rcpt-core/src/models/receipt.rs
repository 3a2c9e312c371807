//! Receipt data models and the spreadsheet row they map to.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sentinel written to a field when nothing matched.
pub const UNKNOWN: &str = "Unknown";

/// Best-guess structured record extracted from receipt text.
///
/// Every field is always populated. `date` and `price` hold the matched
/// substring verbatim; they are never normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReceipt {
    /// Merchant name line.
    pub establishment: String,

    /// Transaction date as it appeared in the text.
    pub date: String,

    /// Total amount as it appeared in the text.
    pub price: String,

    /// Excerpt of surrounding lines for human review.
    pub details: String,
}

impl ParsedReceipt {
    /// A record made only of sentinels.
    pub fn unknown() -> Self {
        Self {
            establishment: UNKNOWN.to_string(),
            date: UNKNOWN.to_string(),
            price: UNKNOWN.to_string(),
            details: String::new(),
        }
    }

    /// Whether a date was found (compared against the default sentinel).
    pub fn has_date(&self) -> bool {
        self.date != UNKNOWN
    }

    /// Whether a price was found (compared against the default sentinel).
    pub fn has_price(&self) -> bool {
        self.price != UNKNOWN
    }

    /// Build the five-column row appended to the receipts sheet.
    pub fn to_sheet_row(&self, recorded_at: impl Into<String>) -> SheetRow {
        SheetRow {
            establishment: self.establishment.clone(),
            date: self.date.clone(),
            price: self.price.clone(),
            details: self.details.clone(),
            recorded_at: recorded_at.into(),
        }
    }
}

impl Default for ParsedReceipt {
    fn default() -> Self {
        Self::unknown()
    }
}

/// One row of the receipts sheet (`A:E`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    pub establishment: String,
    pub date: String,
    pub price: String,
    pub details: String,
    /// Local time the row was recorded.
    pub recorded_at: String,
}

impl SheetRow {
    /// Column headers, in sheet order.
    pub const HEADERS: [&'static str; 5] = ["establishment", "date", "price", "details", "recorded_at"];

    /// Cell values, in sheet order.
    pub fn as_record(&self) -> [&str; 5] {
        [
            &self.establishment,
            &self.date,
            &self.price,
            &self.details,
            &self.recorded_at,
        ]
    }
}

/// A money-like substring considered as the receipt total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCandidate {
    /// Matched substring, e.g. `"1,234.56"`.
    pub text: String,

    /// Parsed value used for ranking.
    pub amount: Decimal,

    /// Index of the source line among the non-empty lines.
    pub line: usize,

    /// Sum of keyword weights found on the source line.
    pub score: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_receipt() {
        let receipt = ParsedReceipt::default();
        assert_eq!(receipt.establishment, "Unknown");
        assert_eq!(receipt.details, "");
        assert!(!receipt.has_date());
        assert!(!receipt.has_price());
    }

    #[test]
    fn test_sheet_row_order() {
        let receipt = ParsedReceipt {
            establishment: "STARBUCKS".to_string(),
            date: "12/05/2023".to_string(),
            price: "4.50".to_string(),
            details: "TOTAL 4.50".to_string(),
        };

        let row = receipt.to_sheet_row("2023-05-12 09:30:00");
        assert_eq!(
            row.as_record(),
            ["STARBUCKS", "12/05/2023", "4.50", "TOTAL 4.50", "2023-05-12 09:30:00"]
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(ParsedReceipt::unknown()).unwrap();
        assert_eq!(json["establishment"], "Unknown");
        assert_eq!(json["date"], "Unknown");
        assert_eq!(json["price"], "Unknown");
        assert_eq!(json["details"], "");
    }
}
