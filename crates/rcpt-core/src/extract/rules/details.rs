//! Details excerpt and item lines.

use rust_decimal::Decimal;
use serde::Serialize;

use super::amounts::{parse_money, KeywordScorer};
use super::patterns::LINE_ITEM;

/// Join `len` lines starting at `start` with `separator`.
/// Returns an empty string when the window is past the end.
pub fn details_excerpt(lines: &[&str], start: usize, len: usize, separator: &str) -> String {
    lines
        .iter()
        .skip(start)
        .take(len)
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}

/// A purchased item line, e.g. `Caffe Latte 4.50`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptItem {
    pub description: String,
    pub amount: Decimal,
    pub line: usize,
}

/// Finds `<description> <amount>` lines that are not totals or tender lines.
pub struct ItemExtractor {
    scorer: KeywordScorer,
}

impl ItemExtractor {
    pub fn new(scorer: KeywordScorer) -> Self {
        Self { scorer }
    }

    pub fn extract_all(&self, lines: &[&str]) -> Vec<ReceiptItem> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !self.scorer.mentions_keyword(line))
            .filter_map(|(i, line)| {
                let caps = LINE_ITEM.captures(line)?;
                Some(ReceiptItem {
                    description: caps["desc"].trim().to_string(),
                    amount: parse_money(&caps["amount"])?,
                    line: i,
                })
            })
            .collect()
    }
}

impl Default for ItemExtractor {
    fn default() -> Self {
        Self::new(KeywordScorer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_details_window() {
        let lines = ["A", "B", "C", "D", "E", "F"];

        assert_eq!(details_excerpt(&lines, 1, 4, " | "), "B | C | D | E");
        assert_eq!(details_excerpt(&lines[..2], 1, 4, " | "), "B");
        assert_eq!(details_excerpt(&lines[..1], 1, 4, " | "), "");
    }

    #[test]
    fn test_items_skip_totals() {
        let lines = [
            "STARBUCKS",
            "Caffe Latte 4.50",
            "Blueberry Muffin 2.95",
            "Subtotal 7.45",
            "CASH 10.00",
        ];

        let items = ItemExtractor::default().extract_all(&lines);
        let descriptions: Vec<&str> = items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Caffe Latte", "Blueberry Muffin"]);
        assert_eq!(items[1].line, 2);
    }
}
