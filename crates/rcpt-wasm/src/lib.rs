//! WASM bindings for receipt field extraction.
//!
//! Lets the upload page run extraction on Tesseract.js output in-browser
//! before posting the row to the sheet endpoint.

use wasm_bindgen::prelude::*;

use rcpt_core::models::config::{ExtractionConfig, PriceStrategy};
use rcpt_core::models::receipt::ParsedReceipt;
use rcpt_core::{ReceiptExtractor as _, ReceiptParser};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract `{establishment, date, price, details}` from OCR text.
#[wasm_bindgen]
pub fn extract_receipt_from_text(text: &str) -> Result<JsValue, JsValue> {
    let receipt = ReceiptParser::new().parse(text);

    serde_wasm_bindgen::to_value(&receipt)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_strategy(strategy: &str) -> Result<PriceStrategy, JsValue> {
    match strategy {
        "keyword_score" | "keyword-score" => Ok(PriceStrategy::KeywordScore),
        "max_value" | "max-value" => Ok(PriceStrategy::MaxValue),
        other => Err(JsValue::from_str(&format!("unknown price strategy: {}", other))),
    }
}

/// Receipt extractor class for browser use.
#[wasm_bindgen]
pub struct ReceiptExtractor {
    parser: ReceiptParser,
}

#[wasm_bindgen]
impl ReceiptExtractor {
    /// Create an extractor with default settings.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: ReceiptParser::new(),
        }
    }

    /// Create an extractor from a JSON `ExtractionConfig`.
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(config_json: &str) -> Result<ReceiptExtractor, JsValue> {
        let config: ExtractionConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let parser = ReceiptParser::from_config(&config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(Self { parser })
    }

    /// Switch price ranking between `keyword_score` and `max_value`.
    #[wasm_bindgen]
    pub fn set_price_strategy(&mut self, strategy: &str) -> Result<(), JsValue> {
        let strategy = parse_strategy(strategy)?;
        let parser = std::mem::take(&mut self.parser);
        self.parser = parser.with_price_strategy(strategy);
        Ok(())
    }

    /// Extract the fully populated record.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.parser.parse(text))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Get extraction result with per-field confidence and warnings.
    #[wasm_bindgen]
    pub fn extract_with_metadata(&self, text: &str) -> Result<JsValue, JsValue> {
        let result = self.parser.extract(text);

        serde_wasm_bindgen::to_value(&result)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Sheet row `[establishment, date, price, details, recorded_at]`,
    /// stamped with the browser's current time.
    #[wasm_bindgen]
    pub fn sheet_row(&self, text: &str) -> Result<JsValue, JsValue> {
        let recorded_at: String = js_sys::Date::new_0().to_iso_string().into();
        let row = self.parser.parse(text).to_sheet_row(recorded_at);

        serde_wasm_bindgen::to_value(&row.as_record())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Default for ReceiptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a parsed field holds a real match rather than the sentinel.
#[wasm_bindgen]
pub fn has_price(receipt: JsValue) -> Result<bool, JsValue> {
    let receipt: ParsedReceipt = serde_wasm_bindgen::from_value(receipt)?;
    Ok(receipt.has_price())
}
