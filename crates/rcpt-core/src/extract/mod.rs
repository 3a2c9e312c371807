//! Receipt field extraction module.

mod parser;
pub mod rules;

pub use parser::{ExtractionResult, ReceiptFields, ReceiptParser};

use crate::error::ExtractionError;
use crate::models::receipt::ParsedReceipt;

/// Result type for extractor construction.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for receipt field extractors.
///
/// Extraction never fails: unmatched fields fall back to sentinels.
pub trait ReceiptExtractor {
    /// Extract fields with per-field confidence and warnings.
    fn extract(&self, text: &str) -> ExtractionResult;

    /// Extract the fully populated record.
    fn parse(&self, text: &str) -> ParsedReceipt {
        self.extract(text).receipt
    }
}

/// Parse receipt text with the default configuration.
pub fn parse_receipt(text: &str) -> ParsedReceipt {
    ReceiptParser::new().parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_receipt() {
        let receipt = parse_receipt("STARBUCKS\n12/05/2023\nTOTAL 4.50\n");

        assert_eq!(receipt.establishment, "STARBUCKS");
        assert_eq!(receipt.date, "12/05/2023");
        assert_eq!(receipt.price, "4.50");
    }

    #[test]
    fn test_fields_always_populated() {
        let inputs = ["", "\n\n\n", "???", "12345", "RECEIPT\nTel 123", "ÅÄÖ\u{0}\u{feff}"];

        for input in inputs {
            let receipt = parse_receipt(input);
            assert!(!receipt.establishment.is_empty(), "establishment for {:?}", input);
            assert!(!receipt.date.is_empty(), "date for {:?}", input);
            assert!(!receipt.price.is_empty(), "price for {:?}", input);
        }
    }
}
