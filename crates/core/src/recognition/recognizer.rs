//! Provider recognition, one strategy per content shape.

use log::debug;

use super::rules::{
    header_rules, header_tokens, pattern_rules, predicate_rules, row_filename_rules, MatchTarget,
    Rule, TRADING212_HEADER_PREFIX,
};
use super::provider_tag;
use crate::import::{ImportContent, Provider, Workbook};
use crate::parsers::common::normalize_header;

/// Rule sets for every content shape.
pub struct Recognizer {
    header_rules: Vec<Rule>,
    row_filename_rules: Vec<Rule>,
    pattern_rules: Vec<Rule>,
    predicate_rules: Vec<Rule>,
}

impl Default for Recognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer {
    pub fn new() -> Self {
        Self {
            header_rules: header_rules(),
            row_filename_rules: row_filename_rules(),
            pattern_rules: pattern_rules(),
            predicate_rules: predicate_rules(),
        }
    }

    /// Provider of `content`, or `None` when nothing matches.
    pub fn identify(&self, content: &ImportContent, filename: &str) -> Option<Provider> {
        let filename = base_name(filename);
        let provider = match content {
            ImportContent::Rows(rows) => self.identify_rows(rows, filename),
            ImportContent::Markup(text) | ImportContent::Text(text) => {
                self.identify_text(text, filename)
            }
            ImportContent::Sheets(book) => self.identify_sheets(book),
        };
        debug!("Recognized {:?} as {}", filename, provider_tag(provider));
        provider
    }

    fn identify_rows(&self, rows: &[Vec<String>], filename: &str) -> Option<Provider> {
        if let Some(first) = rows
            .iter()
            .find(|r| r.iter().any(|c| !c.trim().is_empty()))
        {
            let joined = first
                .iter()
                .map(|c| normalize_header(c))
                .collect::<Vec<_>>()
                .join(",");
            if joined.starts_with(TRADING212_HEADER_PREFIX) {
                return Some(Provider::Trading212);
            }

            let tokens = header_tokens(first);
            let by_header = self.header_rules.iter().find_map(|rule| match rule {
                Rule::Header(r) if r.matches(&tokens) => Some(r.provider),
                _ => None,
            });
            if by_header.is_some() {
                return by_header;
            }
        }

        self.row_filename_rules.iter().find_map(|rule| match rule {
            Rule::Pattern(r) if r.matches(filename) => Some(r.provider),
            _ => None,
        })
    }

    fn identify_text(&self, text: &str, filename: &str) -> Option<Provider> {
        let by_filename = self.pattern_rules.iter().find_map(|rule| match rule {
            Rule::Pattern(r) if r.target == MatchTarget::Filename && r.matches(filename) => {
                Some(r.provider)
            }
            _ => None,
        });
        if by_filename.is_some() {
            return by_filename;
        }

        self.pattern_rules.iter().find_map(|rule| match rule {
            Rule::Pattern(r) if r.target == MatchTarget::Content && r.matches(text) => {
                Some(r.provider)
            }
            _ => None,
        })
    }

    fn identify_sheets(&self, book: &Workbook) -> Option<Provider> {
        self.predicate_rules.iter().find_map(|rule| match rule {
            Rule::Predicate(r) if (r.predicate)(book) => Some(r.provider),
            _ => None,
        })
    }
}

/// File name without directories.
fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
