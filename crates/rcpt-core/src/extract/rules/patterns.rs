//! Common regex patterns for receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Day-month-year with `/` or `-` separators: `12/05/2023`, `1-2-23`.
pub const DATE_DMY_SRC: &str = r"\b\d{1,2}[/\-]\d{1,2}[/\-](?:\d{4}|\d{2})\b";

/// ISO-like year first: `2023-05-12`, `2023/5/12`.
pub const DATE_YMD_SRC: &str = r"\b\d{4}[/\-]\d{1,2}[/\-]\d{1,2}\b";

/// Day then month name: `12 May 2023`, `3rd Sept. 23`.
pub const DATE_DAY_MONTH_SRC: &str = r"(?i)\b\d{1,2}(?:st|nd|rd|th)?[\s\-]+(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?,?[\s\-]+(?:\d{4}|\d{2})\b";

/// Month name then day: `May 12, 2023`, `Dec. 3 23`.
pub const DATE_MONTH_DAY_SRC: &str = r"(?i)\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+(?:\d{4}|\d{2})\b";

/// Date patterns in default priority order.
pub const DEFAULT_DATE_PATTERNS: [&str; 4] = [
    DATE_DMY_SRC,
    DATE_YMD_SRC,
    DATE_DAY_MONTH_SRC,
    DATE_MONTH_DAY_SRC,
];

/// Decimal money amount: `4.50`, `1,234.56`, `1.234,56`, `12,99`.
pub const MONEY_SRC: &str =
    r"(?:\d{1,3}(?:,\d{3})+[.,]\d{2}|\d{1,3}(?:\.\d{3})+,\d{2}|\d+[.,]\d{2})\b";

lazy_static! {
    pub static ref DATE_DMY: Regex = Regex::new(DATE_DMY_SRC).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(DATE_YMD_SRC).unwrap();

    pub static ref DATE_DAY_MONTH: Regex = Regex::new(DATE_DAY_MONTH_SRC).unwrap();

    pub static ref DATE_MONTH_DAY: Regex = Regex::new(DATE_MONTH_DAY_SRC).unwrap();

    pub static ref MONEY: Regex = Regex::new(MONEY_SRC).unwrap();

    // "<description> <amount>" item lines
    pub static ref LINE_ITEM: Regex = Regex::new(
        r"^(?P<desc>.*\p{L}.*?)\s+[$€£]?\s?(?P<amount>\d{1,3}(?:,\d{3})+[.,]\d{2}|\d{1,3}(?:\.\d{3})+,\d{2}|\d+[.,]\d{2})$"
    ).unwrap();

    // Purely numeric date, used to sanity check day/month ranges
    pub static ref NUMERIC_DATE: Regex = Regex::new(
        r"^(\d{1,4})[/\-.](\d{1,2})[/\-.](\d{1,4})$"
    ).unwrap();
}

/// Default date patterns, compiled.
pub fn default_date_regexes() -> Vec<Regex> {
    vec![
        DATE_DMY.clone(),
        DATE_YMD.clone(),
        DATE_DAY_MONTH.clone(),
        DATE_MONTH_DAY.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_patterns() {
        assert!(DATE_DMY.is_match("12/05/2023"));
        assert!(DATE_DMY.is_match("1-2-23"));
        assert!(!DATE_DMY.is_match("2023-05-12"));
        assert!(DATE_YMD.is_match("2023-05-12"));
        assert!(DATE_DAY_MONTH.is_match("12 May 2023"));
        assert!(DATE_DAY_MONTH.is_match("3rd Sept. 23"));
        assert!(DATE_MONTH_DAY.is_match("May 12, 2023"));
        assert!(!DATE_DAY_MONTH.is_match("12 Mayor 2023"));
    }

    #[test]
    fn test_money_pattern() {
        let found: Vec<&str> = MONEY
            .find_iter("TOTAL $1,234.56 TIP 4,50 QTY 3")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["1,234.56", "4,50"]);

        let found: Vec<&str> = MONEY
            .find_iter("SUMA 1.234,56 RABAT 12,99")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["1.234,56", "12,99"]);
    }

    #[test]
    fn test_line_item_pattern() {
        let caps = LINE_ITEM.captures("Caffe Latte Grande $4.50").unwrap();
        assert_eq!(&caps["desc"], "Caffe Latte Grande");
        assert_eq!(&caps["amount"], "4.50");
        assert!(LINE_ITEM.captures("12.50").is_none());

        let caps = LINE_ITEM.captures("Espresso machine 1.299,00").unwrap();
        assert_eq!(&caps["amount"], "1.299,00");
    }
}
