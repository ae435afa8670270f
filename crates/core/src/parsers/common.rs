//! Shared parsing helpers: locale-tolerant numbers, dates, currency cells,
//! mojibake repair and header lookup.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

lazy_static! {
    static ref ISO_DATE: Regex = Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})").unwrap();
    static ref SLASH_ISO_DATE: Regex = Regex::new(r"^(\d{4})/(\d{1,2})/(\d{1,2})").unwrap();
    static ref CZECH_DATE: Regex =
        Regex::new(r"^(\d{1,2})\.\s*(\d{1,2})\.\s*(\d{4})").unwrap();
    static ref SLASH_DATE: Regex = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})").unwrap();
    static ref COMPACT_DATE: Regex = Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap();
    static ref DAY_MONTH_YEAR: Regex =
        Regex::new(r"^(\d{1,2})[\s\-]+([A-Za-z]{3,9})\.?[\s\-,]+(\d{4})").unwrap();
    static ref MONTH_DAY_YEAR: Regex =
        Regex::new(r"^([A-Za-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})").unwrap();
    static ref CURRENCY_CODE: Regex = Regex::new(r"\b([A-Z]{3})\b").unwrap();
}

/// Currency codes recognized inside free text, where three capital letters
/// could otherwise be a ticker.
pub const KNOWN_CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "CZK", "CHF", "CAD", "AUD", "JPY", "HKD", "PLN", "HUF", "SEK", "NOK",
    "DKK", "CNH", "SGD", "NZD", "MXN", "ZAR", "ILS",
];

pub fn is_known_currency(token: &str) -> bool {
    KNOWN_CURRENCIES.contains(&token)
}

/// UTF-8 text that was decoded as cp1250 or cp1252, mapped back.
const MOJIBAKE: &[(&str, &str)] = &[
    ("Ăˇ", "á"),
    ("ÄŤ", "č"),
    ("ÄŹ", "ď"),
    ("Ă©", "é"),
    ("Ä›", "ě"),
    ("Ă\u{ad}", "í"),
    ("Ăł", "ó"),
    ("Ĺ™", "ř"),
    ("Ĺˇ", "š"),
    ("ĹĄ", "ť"),
    ("Ăş", "ú"),
    ("ĹŻ", "ů"),
    ("Ă˝", "ý"),
    ("Ĺľ", "ž"),
    ("ÄŚ", "Č"),
    ("ÄŽ", "Ď"),
    ("Ă‰", "É"),
    ("Äš", "Ě"),
    ("ĂŤ", "Í"),
    ("Ĺ‡", "Ň"),
    ("Ă“", "Ó"),
    ("Ĺ\u{a0}", "Š"),
    ("Ĺ¤", "Ť"),
    ("Ăš", "Ú"),
    ("Ĺ®", "Ů"),
    ("Ăť", "Ý"),
    ("Ĺ˝", "Ž"),
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã\u{ad}", "í"),
    ("Åˆ", "ň"),
    ("Ã³", "ó"),
    ("Å™", "ř"),
    ("Å¡", "š"),
    ("Å¥", "ť"),
    ("Ãº", "ú"),
    ("Å¯", "ů"),
    ("Ã½", "ý"),
    ("Å¾", "ž"),
    ("ÄŒ", "Č"),
    ("Ã‰", "É"),
    ("Å‡", "Ň"),
    ("Ã“", "Ó"),
    ("Å˜", "Ř"),
    ("Å\u{a0}", "Š"),
    ("Å¤", "Ť"),
    ("Ãš", "Ú"),
    ("Å®", "Ů"),
    ("Å½", "Ž"),
];

/// Undo the usual UTF-8-read-as-Windows-codepage damage on Czech text.
pub fn repair_mojibake(s: &str) -> String {
    if !s.contains(['Ă', 'Ä', 'Ĺ', 'Ã', 'Å']) {
        return s.to_string();
    }
    MOJIBAKE
        .iter()
        .fold(s.to_string(), |acc, (bad, good)| acc.replace(bad, good))
}

/// Parse a number written with either `.` or `,` as decimal separator.
///
/// When both separators occur, the one appearing last is the decimal point.
/// A single kind that occurs more than once is a thousands separator.
/// A lone comma is always a decimal separator, so `1,000` reads as 1.0;
/// English-locale callers must write `1,000.00` to get one thousand.
/// Whitespace, currency symbols and other residue are dropped. A minus sign
/// anywhere, or surrounding parentheses, make the value negative.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let negative = trimmed.contains(['-', '\u{2212}'])
        || (trimmed.starts_with('(') && trimmed.ends_with(')'));

    let last_dot = trimmed.rfind('.');
    let last_comma = trimmed.rfind(',');
    let decimal_sep = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(if d > c { '.' } else { ',' }),
        (Some(_), None) if trimmed.matches('.').count() == 1 => Some('.'),
        (None, Some(_)) if trimmed.matches(',').count() == 1 => Some(','),
        _ => None,
    };

    let mut digits = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if Some(ch) == decimal_sep {
            digits.push('.');
        }
    }

    // Only the last separator survived as '.', earlier ones were thousands
    if digits.matches('.').count() > 1 {
        return None;
    }
    if digits.is_empty() || digits == "." {
        return None;
    }

    let value = Decimal::from_str(&digits).ok()?;
    Some(if negative { -value } else { value })
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    let prefix = lower.get(..3)?;
    let month = match prefix {
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
    Some(month)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

/// Parse the calendar date at the start of a free-form date cell.
///
/// Accepts ISO (`2024-03-15`, with or without a time part), `2024/03/15`,
/// Czech (`15.3.2024`, `15. 3. 2024`), slashed day-first (`15/03/2024`,
/// month-first only when the day-first reading is impossible), compact
/// `20240315` and English month names (`15 Mar 2024`, `Mar 15, 2024`,
/// `15-Mar-2024`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().trim_start_matches('\u{feff}').trim_matches('"');

    if let Some(c) = ISO_DATE.captures(s).or_else(|| SLASH_ISO_DATE.captures(s)) {
        return ymd(&c[1], c[2].parse().ok()?, &c[3]);
    }
    if let Some(c) = CZECH_DATE.captures(s) {
        return ymd(&c[3], c[2].parse().ok()?, &c[1]);
    }
    if let Some(c) = SLASH_DATE.captures(s) {
        let first: u32 = c[1].parse().ok()?;
        let second: u32 = c[2].parse().ok()?;
        let year: i32 = c[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, second, first)
            .or_else(|| NaiveDate::from_ymd_opt(year, first, second));
    }
    if let Some(c) = COMPACT_DATE.captures(s) {
        return ymd(&c[1], c[2].parse().ok()?, &c[3]);
    }
    if let Some(c) = DAY_MONTH_YEAR.captures(s) {
        return ymd(&c[3], month_from_name(&c[2])?, &c[1]);
    }
    if let Some(c) = MONTH_DAY_YEAR.captures(s) {
        return ymd(&c[3], month_from_name(&c[1])?, &c[2]);
    }
    None
}

/// ISO `YYYY-MM-DD` form of a date cell. Idempotent on ISO input.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|d| format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
}

fn currency_for_symbol(s: &str) -> Option<&'static str> {
    if s.contains('$') {
        Some("USD")
    } else if s.contains('€') {
        Some("EUR")
    } else if s.contains('£') {
        Some("GBP")
    } else if s.contains("Kč") || s.contains("Kc") {
        Some("CZK")
    } else {
        None
    }
}

/// Split a free-text cell such as `USD 12.50`, `-1 234,50 EUR` or `$12.50`
/// into currency code and signed amount.
pub fn split_currency_amount(cell: &str) -> Option<(String, Decimal)> {
    let cell = cell.trim();
    let currency = CURRENCY_CODE
        .captures(cell)
        .map(|c| c[1].to_string())
        .or_else(|| currency_for_symbol(cell).map(str::to_string))?;

    let rest = CURRENCY_CODE.replace_all(cell, "");
    let amount = parse_number(&rest)?;
    Some((currency, amount))
}

/// Cell by index, empty string when the row is short.
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|s| s.trim()).unwrap_or("")
}

/// Lower-cased, trimmed, mojibake-repaired header token.
pub fn normalize_header(cell: &str) -> String {
    repair_mojibake(cell.trim_start_matches('\u{feff}'))
        .trim()
        .trim_matches('"')
        .trim()
        .to_lowercase()
}

/// Column lookup by header name, tolerant to aliases.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(header: &[String]) -> Self {
        let mut columns = HashMap::with_capacity(header.len());
        for (i, name) in header.iter().enumerate() {
            columns.entry(normalize_header(name)).or_insert(i);
        }
        Self { columns }
    }

    /// Index of the first alias present.
    pub fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|a| self.columns.get(&a.to_lowercase()).copied())
    }

    /// Index of the first column whose name starts with `prefix`.
    pub fn find_prefix(&self, prefix: &str) -> Option<(usize, &str)> {
        self.all_with_prefix(prefix).into_iter().next()
    }

    /// Every column whose name starts with `prefix`, in column order.
    pub fn all_with_prefix(&self, prefix: &str) -> Vec<(usize, &str)> {
        let prefix = prefix.to_lowercase();
        let mut found: Vec<(usize, &str)> = self
            .columns
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, i)| (*i, name.as_str()))
            .collect();
        found.sort_unstable_by_key(|(i, _)| *i);
        found
    }

    pub fn has(&self, name: &str) -> bool {
        self.columns.contains_key(&name.to_lowercase())
    }

    /// Non-empty trimmed value of the first alias present in `row`.
    pub fn get<'a>(&self, row: &'a [String], aliases: &[&str]) -> Option<&'a str> {
        let index = self.find(aliases)?;
        let value = cell(row, index);
        (!value.is_empty()).then_some(value)
    }

    /// Numeric value of the first alias present in `row`.
    pub fn number(&self, row: &[String], aliases: &[&str]) -> Option<Decimal> {
        self.get(row, aliases).and_then(parse_number)
    }
}

/// Index of the first row for which `is_header` holds, scanning a bounded
/// prefix of the table.
pub fn find_header_row(
    rows: &[Vec<String>],
    limit: usize,
    is_header: impl Fn(&HeaderIndex) -> bool,
) -> Option<usize> {
    rows.iter()
        .take(limit)
        .position(|row| is_header(&HeaderIndex::new(row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_number_both_locales() {
        assert_eq!(parse_number("1.234,56"), Some(dec!(1234.56)));
        assert_eq!(parse_number("1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_number("1 234,56"), Some(dec!(1234.56)));
        assert_eq!(parse_number("1\u{a0}234,56 Kč"), Some(dec!(1234.56)));
    }

    #[test]
    fn test_parse_number_single_separator() {
        assert_eq!(parse_number("12,5"), Some(dec!(12.5)));
        assert_eq!(parse_number("12.5"), Some(dec!(12.5)));
        assert_eq!(parse_number("1,234,567"), Some(dec!(1234567)));
        assert_eq!(parse_number("1.234.567"), Some(dec!(1234567)));
        assert_eq!(parse_number("1,234,567.89"), Some(dec!(1234567.89)));
    }

    #[test]
    fn test_parse_number_lone_comma_is_decimal() {
        assert_eq!(parse_number("1,000"), Some(dec!(1.000)));
        assert_eq!(parse_number("1,000.00"), Some(dec!(1000.00)));
        assert_eq!(parse_number("1.000,00"), Some(dec!(1000.00)));
    }

    #[test]
    fn test_parse_number_signs_and_residue() {
        assert_eq!(parse_number("-$1,000.50"), Some(dec!(-1000.50)));
        assert_eq!(parse_number("$-5"), Some(dec!(-5)));
        assert_eq!(parse_number("(12.00)"), Some(dec!(-12.00)));
        assert_eq!(parse_number("USD 7.25"), Some(dec!(7.25)));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("--"), None);
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("15.3.2024").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("15. 3. 2024").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("2024-03-15 14:22:01 UTC").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("2024-03-15T09:30:00Z").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("15/03/2024 10:00:00").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("03/15/2024").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("15 Mar 2024").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("Mar 15, 2024").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("15-Mar-2024").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("20240315").as_deref(), Some("2024-03-15"));
        assert_eq!(normalize_date("someday"), None);
        assert_eq!(normalize_date("31.2.2024"), None);
    }

    #[test]
    fn test_normalize_date_idempotent_on_iso() {
        let iso = normalize_date("2024-03-05").unwrap();
        assert_eq!(iso, "2024-03-05");
        assert_eq!(normalize_date(&iso).unwrap(), iso);
    }

    #[test]
    fn test_split_currency_amount() {
        assert_eq!(
            split_currency_amount("USD 12.50"),
            Some(("USD".to_string(), dec!(12.50)))
        );
        assert_eq!(
            split_currency_amount("-1 234,50 EUR"),
            Some(("EUR".to_string(), dec!(-1234.50)))
        );
        assert_eq!(
            split_currency_amount("$3,000.00"),
            Some(("USD".to_string(), dec!(3000.00)))
        );
        assert_eq!(split_currency_amount("12.50"), None);
    }

    #[test]
    fn test_repair_mojibake() {
        assert_eq!(repair_mojibake("NĂˇkup"), "Nákup");
        assert_eq!(repair_mojibake("VĂ˝bÄ›r"), "Výběr");
        assert_eq!(repair_mojibake("PoplatkyĹˇ"), "Poplatkyš");
        assert_eq!(repair_mojibake("Objem v CZK"), "Objem v CZK");
        assert_eq!(repair_mojibake("Nákup"), "Nákup");
    }

    #[test]
    fn test_header_index_lookup() {
        let header: Vec<String> = ["\u{feff}Date", " Ticker ", "Total Amount"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let index = HeaderIndex::new(&header);
        assert_eq!(index.find(&["date"]), Some(0));
        assert_eq!(index.find(&["symbol", "ticker"]), Some(1));
        assert!(index.has("total amount"));

        let row: Vec<String> = ["2024-03-15", "AAPL", "1,500.00"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(index.get(&row, &["ticker"]), Some("AAPL"));
        assert_eq!(index.number(&row, &["total amount"]), Some(dec!(1500.00)));
        assert_eq!(index.get(&row, &["missing"]), None);
    }
}
