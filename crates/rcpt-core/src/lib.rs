//! Core library for receipt field extraction.
//!
//! This crate provides:
//! - Heuristic extraction of merchant, date, total and details from OCR text
//! - Per-field confidence so callers can tell guesses from sentinels
//! - Receipt data models and the spreadsheet row they map to
//! - Serializable configuration for every heuristic knob

pub mod error;
pub mod models;
pub mod extract;

pub use error::{RcptError, Result};
pub use models::config::{ExtractionConfig, KeywordWeight, PriceStrategy, RcptConfig};
pub use models::receipt::{ParsedReceipt, PriceCandidate, SheetRow};
pub use extract::{parse_receipt, ExtractionResult, ReceiptExtractor, ReceiptFields, ReceiptParser};
