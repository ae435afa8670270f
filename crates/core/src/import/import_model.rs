//! Content and provider models for the import pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::HOME_CURRENCY;
use crate::transactions::StagedTransaction;

/// Closed set of decoded content shapes, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentShape {
    /// Delimited table, one `Vec<String>` per row
    Rows,
    /// Tagged markup (HTML/XML) as one string
    Markup,
    /// Plain or reconstructed document text
    Text,
    /// Spreadsheet workbook
    Sheets,
}

impl ContentShape {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" | "tsv" => Some(ContentShape::Rows),
            "html" | "htm" | "xml" => Some(ContentShape::Markup),
            "txt" | "pdf" => Some(ContentShape::Text),
            "xlsx" | "xls" | "ods" => Some(ContentShape::Sheets),
            _ => None,
        }
    }

    /// Shape for a file name, by its last extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentShape::Rows => "rows",
            ContentShape::Markup => "markup",
            ContentShape::Text => "text",
            ContentShape::Sheets => "sheets",
        }
    }
}

impl fmt::Display for ContentShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named sheet of string cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// First row with at least one non-blank cell.
    pub fn header(&self) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row.iter().any(|c| !c.trim().is_empty()))
            .map(|row| row.as_slice())
    }
}

/// Ordered list of named sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Case-insensitive sheet lookup by name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name.trim().eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.iter().all(|s| s.rows.is_empty())
    }
}

/// Decoded file content, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportContent {
    Rows(Vec<Vec<String>>),
    Markup(String),
    Text(String),
    Sheets(Workbook),
}

impl ImportContent {
    pub fn shape(&self) -> ContentShape {
        match self {
            ImportContent::Rows(_) => ContentShape::Rows,
            ImportContent::Markup(_) => ContentShape::Markup,
            ImportContent::Text(_) => ContentShape::Text,
            ImportContent::Sheets(_) => ContentShape::Sheets,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ImportContent::Rows(rows) => rows
                .iter()
                .all(|row| row.iter().all(|c| c.trim().is_empty())),
            ImportContent::Markup(s) | ImportContent::Text(s) => s.trim().is_empty(),
            ImportContent::Sheets(book) => book.is_empty(),
        }
    }
}

/// Closed set of supported statement providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ibkr,
    Coinbase,
    Trading212,
    Etoro,
    Fio,
    Revolut,
}

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::Ibkr,
        Provider::Coinbase,
        Provider::Trading212,
        Provider::Etoro,
        Provider::Fio,
        Provider::Revolut,
    ];

    /// Stable string tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Provider::Ibkr => "ibkr",
            Provider::Coinbase => "coinbase",
            Provider::Trading212 => "trading212",
            Provider::Etoro => "etoro",
            Provider::Fio => "fio",
            Provider::Revolut => "revolut",
        }
    }

    /// Platform name written to canonical records.
    pub fn platform(&self) -> &'static str {
        match self {
            Provider::Ibkr => "Interactive Brokers",
            Provider::Coinbase => "Coinbase",
            Provider::Trading212 => "Trading 212",
            Provider::Etoro => "eToro",
            Provider::Fio => "Fio e-Broker",
            Provider::Revolut => "Revolut",
        }
    }

    pub fn accepted_shapes(&self) -> &'static [ContentShape] {
        match self {
            Provider::Ibkr => &[ContentShape::Text],
            Provider::Coinbase => &[ContentShape::Rows, ContentShape::Markup, ContentShape::Text],
            Provider::Trading212 | Provider::Fio | Provider::Revolut => &[ContentShape::Rows],
            Provider::Etoro => &[ContentShape::Sheets],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.tag() == tag)
            .ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

/// Knobs for one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub home_currency: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            home_currency: HOME_CURRENCY.to_string(),
        }
    }
}

/// Summary of one import call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub provider: Provider,
    /// Records produced by the parser
    pub parsed: usize,
    /// Records that survived normalization
    pub normalized: usize,
    /// Records dropped during normalization
    pub dropped: usize,
    /// Records accepted by the sink (0 for previews)
    pub saved: usize,
}

/// Result of a dry run: everything an import would save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub provider: Provider,
    pub parsed: usize,
    pub dropped: usize,
    pub transactions: Vec<StagedTransaction>,
}
