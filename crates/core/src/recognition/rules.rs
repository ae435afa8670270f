//! Declarative recognition rules.

use std::collections::HashSet;

use regex::Regex;

use crate::constants::SHEET_SCAN_ROWS;
use crate::import::{Provider, Workbook};
use crate::parsers::common::normalize_header;

/// What a [`PatternRule`] is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTarget {
    Content,
    Filename,
}

/// Regex rule: matches when at least `required` distinct patterns hit.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub provider: Provider,
    pub target: MatchTarget,
    pub patterns: Vec<Regex>,
    pub required: usize,
}

impl PatternRule {
    pub fn new(provider: Provider, patterns: &[&str], required: usize) -> Self {
        Self {
            provider,
            target: MatchTarget::Content,
            patterns: compile(patterns),
            required: required.max(1),
        }
    }

    /// Single-pattern rule over the file name.
    pub fn filename(provider: Provider, pattern: &str) -> Self {
        Self {
            provider,
            target: MatchTarget::Filename,
            patterns: compile(&[pattern]),
            required: 1,
        }
    }

    pub fn matches(&self, haystack: &str) -> bool {
        self.patterns
            .iter()
            .filter(|p| p.is_match(haystack))
            .take(self.required)
            .count()
            >= self.required
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                log::error!("Invalid recognition pattern {:?}: {}", p, e);
                None
            }
        })
        .collect()
}

/// Header rule: every required header present, plus one optional header
/// when any are declared.
#[derive(Debug, Clone)]
pub struct HeaderRule {
    pub provider: Provider,
    pub required_headers: &'static [&'static str],
    pub optional_headers: &'static [&'static str],
}

impl HeaderRule {
    pub fn matches(&self, headers: &HashSet<String>) -> bool {
        self.required_headers.iter().all(|h| headers.contains(*h))
            && (self.optional_headers.is_empty()
                || self.optional_headers.iter().any(|h| headers.contains(*h)))
    }
}

/// Structural rule over a whole workbook.
#[derive(Debug, Clone)]
pub struct PredicateRule {
    pub provider: Provider,
    pub predicate: fn(&Workbook) -> bool,
}

#[derive(Debug, Clone)]
pub enum Rule {
    Pattern(PatternRule),
    Header(HeaderRule),
    Predicate(PredicateRule),
}

impl Rule {
    pub fn provider(&self) -> Provider {
        match self {
            Rule::Pattern(r) => r.provider,
            Rule::Header(r) => r.provider,
            Rule::Predicate(r) => r.provider,
        }
    }
}

/// Normalized header tokens of one row.
pub fn header_tokens(row: &[String]) -> HashSet<String> {
    row.iter()
        .map(|c| normalize_header(c))
        .filter(|c| !c.is_empty())
        .collect()
}

const ETORO_SIGNATURES: &[&str] = &["etoro", "account statement"];

/// Any sheet carrying eToro signature text near the top, or a closed
/// positions header.
pub fn is_etoro_workbook(book: &Workbook) -> bool {
    book.sheets.iter().any(|sheet| {
        let signed = sheet.rows.iter().take(SHEET_SCAN_ROWS).any(|row| {
            row.iter().any(|c| {
                let c = c.to_lowercase();
                ETORO_SIGNATURES.iter().any(|s| c.contains(s))
            })
        });
        signed
            || sheet.rows.first().is_some_and(|first| {
                let tokens = header_tokens(first);
                tokens.contains("position id") && tokens.contains("close rate")
            })
    })
}

/// Fast path: exact Trading 212 header prefix.
pub const TRADING212_HEADER_PREFIX: &str =
    "action,time,isin,ticker,name,notes,id,no. of shares,price / share";

/// Header rules in evaluation order.
pub fn header_rules() -> Vec<Rule> {
    vec![
        Rule::Header(HeaderRule {
            provider: Provider::Trading212,
            required_headers: &["action", "time", "ticker", "no. of shares"],
            optional_headers: &["price / share", "total", "isin"],
        }),
        Rule::Header(HeaderRule {
            provider: Provider::Coinbase,
            required_headers: &["timestamp", "transaction type", "asset"],
            optional_headers: &[
                "quantity transacted",
                "subtotal",
                "spot price at transaction",
                "price at transaction",
            ],
        }),
        Rule::Header(HeaderRule {
            provider: Provider::Revolut,
            required_headers: &["date", "ticker", "type", "total amount"],
            optional_headers: &["price per share", "quantity", "fx rate"],
        }),
        Rule::Header(HeaderRule {
            provider: Provider::Fio,
            required_headers: &["datum obchodu"],
            optional_headers: &["směr", "symbol", "počet", "text fio"],
        }),
    ]
}

/// Filename fallback for tabular content, checked after header rules.
pub fn row_filename_rules() -> Vec<Rule> {
    vec![
        Rule::Pattern(PatternRule::filename(Provider::Trading212, r"(?i)trading212|t212")),
        Rule::Pattern(PatternRule::filename(
            Provider::Trading212,
            r"^from_\d{4}-\d{2}-\d{2}_to_\d{4}-\d{2}-\d{2}",
        )),
        Rule::Pattern(PatternRule::filename(Provider::Coinbase, r"(?i)coinbase")),
        Rule::Pattern(PatternRule::filename(Provider::Revolut, r"(?i)revolut")),
        Rule::Pattern(PatternRule::filename(Provider::Fio, r"(?i)fio|ebroker")),
    ]
}

/// Pattern rules for markup and document text. Filename rules come first and
/// win before any content rule is tried.
pub fn pattern_rules() -> Vec<Rule> {
    vec![
        Rule::Pattern(PatternRule::filename(Provider::Ibkr, r"^U\d{6,8}_\d{8}_\d{8}")),
        Rule::Pattern(PatternRule::filename(Provider::Coinbase, r"(?i)coinbase")),
        Rule::Pattern(PatternRule::new(
            Provider::Ibkr,
            &[
                r"Interactive Brokers",
                r"Activity Statement",
                r"\bU\d{6,8}\b",
                r"Realized (?:&|and) Unrealized",
                r"Mark-to-Market Performance Summary",
            ],
            2,
        )),
        Rule::Pattern(PatternRule::new(
            Provider::Coinbase,
            &[
                r"(?i)\bcoinbase\b",
                r"(?i)transaction history",
                r"\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}Z?\s*UTC",
                r"(?i)staking income|rewards income|learning reward|inflation reward|coinbase earn",
            ],
            2,
        )),
    ]
}

/// Structural rules for spreadsheets.
pub fn predicate_rules() -> Vec<Rule> {
    vec![Rule::Predicate(PredicateRule {
        provider: Provider::Etoro,
        predicate: is_etoro_workbook,
    })]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::Sheet;

    #[test]
    fn test_pattern_rule_needs_required_distinct_hits() {
        let rule = PatternRule::new(Provider::Ibkr, &["alpha", "beta", "gamma"], 2);
        assert!(!rule.matches("alpha alpha alpha"));
        assert!(rule.matches("alpha then gamma"));
    }

    #[test]
    fn test_header_rule_optional_set() {
        let rule = HeaderRule {
            provider: Provider::Revolut,
            required_headers: &["date", "type"],
            optional_headers: &["ticker"],
        };
        let row: Vec<String> = vec!["Date".into(), " Type ".into()];
        assert!(!rule.matches(&header_tokens(&row)));
        let row: Vec<String> = vec!["Date".into(), "Type".into(), "Ticker".into()];
        assert!(rule.matches(&header_tokens(&row)));
    }

    #[test]
    fn test_etoro_predicate() {
        let signed = Workbook::new(vec![Sheet::new(
            "Account Summary",
            vec![vec![String::new()], vec!["eToro (Europe) Ltd.".into()]],
        )]);
        assert!(is_etoro_workbook(&signed));

        let positions = Workbook::new(vec![Sheet::new(
            "Sheet1",
            vec![vec!["Position ID".into(), "Action".into(), "Close Rate".into()]],
        )]);
        assert!(is_etoro_workbook(&positions));

        let other = Workbook::new(vec![Sheet::new("Data", vec![vec!["Date".into()]])]);
        assert!(!is_etoro_workbook(&other));
    }
}
