//! File → [`ImportContent`] by extension.
//!
//! Delimited files go through the `csv` reader with the delimiter guessed from
//! the first non-empty line. Spreadsheets are read with `calamine`. Markup and
//! text are passed through as strings. Bytes that are not UTF-8 (Czech bank
//! exports are often windows-1250) are decoded with the detected encoding.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chardetng::EncodingDetector;
use ledgerly_core::import::{ContentError, ContentShape, Sheet, Workbook};
use ledgerly_core::ImportContent;

const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

pub fn decode_file(path: &Path) -> Result<ImportContent> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let shape = ContentShape::from_filename(filename)
        .ok_or_else(|| ContentError::UnknownExtension(filename.to_string()))?;

    match shape {
        ContentShape::Rows => decode_rows(&read_text(path)?),
        ContentShape::Markup => Ok(ImportContent::Markup(read_text(path)?)),
        ContentShape::Text => {
            if has_extension(path, "pdf") {
                bail!(
                    "{}: extract the document text first and import the .txt file",
                    path.display()
                );
            }
            Ok(ImportContent::Text(read_text(path)?))
        }
        ContentShape::Sheets => decode_workbook(path),
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
    Ok(decode_bytes(&bytes))
}

/// UTF-8 (BOM stripped) when valid, otherwise the detected legacy encoding.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, false);
    tracing::debug!("Input is not UTF-8, decoding as {}", encoding.name());
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!("Some bytes could not be decoded as {}", encoding.name());
    }
    text.into_owned()
}

/// The candidate delimiter occurring most often on the first non-empty line.
pub fn sniff_delimiter(text: &str) -> u8 {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
    DELIMITERS
        .iter()
        .copied()
        .max_by_key(|d| first.bytes().filter(|b| b == d).count())
        .filter(|d| first.as_bytes().contains(d))
        .unwrap_or(b',')
}

pub fn decode_rows(text: &str) -> Result<ImportContent> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(text))
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed delimited row")?;
        rows.push(record.iter().map(|c| c.trim().to_string()).collect());
    }
    Ok(ImportContent::Rows(rows))
}

fn decode_workbook(path: &Path) -> Result<ImportContent> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Cannot open {}", path.display()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| anyhow!("Cannot read sheet {}: {}", name, e))?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        sheets.push(Sheet::new(name, rows));
    }
    Ok(ImportContent::Sheets(Workbook::new(sheets)))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| dt.to_string()),
        other => other.to_string(),
    }
}
