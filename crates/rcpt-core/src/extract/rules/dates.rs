//! Date extraction for receipts.

use chrono::NaiveDate;
use regex::Regex;

use super::patterns::{default_date_regexes, NUMERIC_DATE};
use super::{ExtractionMatch, FieldExtractor};

/// Date field extractor.
///
/// Patterns are tried in priority order; each pattern scans every line
/// top to bottom before the next pattern is tried.
pub struct DateExtractor {
    patterns: Vec<Regex>,
}

impl DateExtractor {
    pub fn new() -> Self {
        Self {
            patterns: default_date_regexes(),
        }
    }

    /// Replace the pattern list. Order is priority.
    pub fn with_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.patterns = patterns;
        self
    }

    fn matches_in(&self, pattern: &Regex, index: usize, line: &str) -> Vec<ExtractionMatch<String>> {
        pattern
            .find_iter(line)
            .filter(|m| is_plausible(m.as_str()))
            .map(|m| {
                ExtractionMatch::new(m.as_str().to_string(), 0.9, line)
                    .on_line(index)
                    .with_position(m.start(), m.end())
            })
            .collect()
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, lines: &[&str]) -> Option<Self::Output> {
        for pattern in &self.patterns {
            for (i, line) in lines.iter().enumerate() {
                if let Some(found) = self.matches_in(pattern, i, line).into_iter().next() {
                    return Some(found);
                }
            }
        }
        None
    }

    fn extract_all(&self, lines: &[&str]) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        for pattern in &self.patterns {
            for (i, line) in lines.iter().enumerate() {
                for found in self.matches_in(pattern, i, line) {
                    // Skip spans already claimed by a higher-priority pattern
                    if results
                        .iter()
                        .any(|r| r.line == found.line && r.position == found.position)
                    {
                        continue;
                    }
                    results.push(found);
                }
            }
        }

        results
    }
}

/// Reject numeric matches whose day or month is out of range (`45/13/2023`).
/// Anything that is not a plain numeric date passes.
fn is_plausible(text: &str) -> bool {
    let Some(caps) = NUMERIC_DATE.captures(text) else {
        return true;
    };

    let parts: Vec<u32> = (1..=3).filter_map(|i| caps[i].parse().ok()).collect();
    let (a, b) = if caps[1].len() == 4 {
        (parts[2], parts[1])
    } else {
        (parts[0], parts[1])
    };

    let valid = |n: u32| (1..=31).contains(&n);
    valid(a) && valid(b) && (a <= 12 || b <= 12)
}

/// Best-effort conversion of an extracted date string into a calendar date.
///
/// Year-first numeric dates are read as `Y-M-D`. Other numeric dates follow
/// `day_first`, falling back to the other order when the first is invalid.
/// Month names may appear before or after the day.
pub fn normalize_date(text: &str, day_first: bool) -> Option<NaiveDate> {
    if let Some(caps) = NUMERIC_DATE.captures(text.trim()) {
        if caps[1].len() == 4 {
            return NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        }

        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3]);

        let (day, month) = if day_first { (first, second) } else { (second, first) };
        return NaiveDate::from_ymd_opt(year, month, day)
            .or_else(|| NaiveDate::from_ymd_opt(year, day, month));
    }

    let mut month = None;
    let mut numbers = Vec::new();

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            numbers.push(digits);
        } else if month.is_none() {
            month = month_to_number(token);
        }
    }

    let month = month?;
    match numbers.as_slice() {
        [day, year] => NaiveDate::from_ymd_opt(parse_year(year), month, day.parse().ok()?),
        _ => None,
    }
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}

fn month_to_number(month: &str) -> Option<u32> {
    let month = month.to_lowercase();
    let number = match month.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(number)
}
