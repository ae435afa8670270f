//! Coinbase transaction history.
//!
//! Three independent grammars (delimited rows, an HTML table, extracted
//! document text) all produce [`CoinbaseRow`]s, which are mapped to drafts by
//! one shared routine.

use std::str::FromStr;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};

use super::common::{find_header_row, parse_number, HeaderIndex};
use super::{ensure_readable, ParseContext, StatementParser};
use crate::constants::{FEE_EPSILON, SHEET_SCAN_ROWS};
use crate::errors::Result;
use crate::import::{ContentError, ImportContent, Provider};
use crate::transactions::{
    DraftTransaction, FeeInKind, ParsedRecord, ProductKind, TransactionKind,
};

const TIMESTAMP: &[&str] = &["timestamp", "date", "time"];
const TYPE: &[&str] = &["transaction type", "type"];
const ASSET: &[&str] = &["asset"];
const QUANTITY: &[&str] = &["quantity transacted", "quantity", "amount"];
const PRICE_CURRENCY: &[&str] = &["price currency", "spot price currency", "currency"];
const PRICE: &[&str] = &["price at transaction", "spot price at transaction", "price"];
const SUBTOTAL: &[&str] = &["subtotal"];
const TOTAL: &[&str] = &[
    "total (inclusive of fees and/or spread)",
    "total (inclusive of fees)",
    "total",
];
const FEES: &[&str] = &["fees and/or spread", "fees", "fee"];
const NOTES: &[&str] = &["notes"];

const REWARD_TYPES: &[&str] = &[
    "staking income",
    "rewards income",
    "learning reward",
    "inflation reward",
    "coinbase earn",
];

/// Multi-word types first so the longest phrase wins.
const TEXT_TYPES: &[&str] = &[
    "advanced trade buy",
    "advanced trade sell",
    "pro withdrawal",
    "pro deposit",
    "staking income",
    "rewards income",
    "learning reward",
    "inflation reward",
    "coinbase earn",
    "buy",
    "sell",
    "convert",
    "send",
    "receive",
    "deposit",
    "withdrawal",
];

lazy_static! {
    static ref TIMESTAMP_LEAD: Regex =
        Regex::new(r"^(\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(?::\d{2})?Z?)(?:\s+UTC)?\s+").unwrap();
    static ref SYMBOL_MONEY: Regex = Regex::new(r"^-?([$€£])-?[\d,]+(?:\.\d+)?$").unwrap();
    static ref CONVERTED: Regex =
        Regex::new(r"(?i)converted\s+([\d.,]+)\s+([A-Z0-9]+)\s+to\s+([\d.,]+)\s+([A-Z0-9]+)").unwrap();
}

/// One history line, whatever grammar produced it.
#[derive(Debug, Clone, Default, PartialEq)]
struct CoinbaseRow {
    timestamp: String,
    kind: String,
    asset: String,
    quantity: Decimal,
    price_currency: String,
    price: Option<Decimal>,
    subtotal: Option<Decimal>,
    total: Option<Decimal>,
    fees: Option<Decimal>,
    notes: String,
}

pub struct CoinbaseParser;

impl StatementParser for CoinbaseParser {
    fn provider(&self) -> Provider {
        Provider::Coinbase
    }

    fn parse(&self, content: &ImportContent, ctx: &ParseContext) -> Result<Vec<ParsedRecord>> {
        ensure_readable(Provider::Coinbase, content)?;

        let rows = match content {
            ImportContent::Rows(rows) => rows_grammar(rows),
            ImportContent::Markup(html) => rows_grammar(&markup_rows(html)?),
            ImportContent::Text(text) => text_grammar(text),
            ImportContent::Sheets(_) => Vec::new(),
        };

        Ok(rows
            .into_iter()
            .flat_map(|row| to_records(row, ctx))
            .collect())
    }
}

fn rows_grammar(rows: &[Vec<String>]) -> Vec<CoinbaseRow> {
    let Some(header_at) = find_header_row(rows, SHEET_SCAN_ROWS, |h| {
        h.find(TIMESTAMP).is_some() && h.find(TYPE).is_some() && h.find(ASSET).is_some()
    }) else {
        debug!("Coinbase: no header row found");
        return Vec::new();
    };
    let header = HeaderIndex::new(&rows[header_at]);

    rows[header_at + 1..]
        .iter()
        .filter_map(|row| {
            let timestamp = header.get(row, TIMESTAMP)?;
            let kind = header.get(row, TYPE)?;
            Some(CoinbaseRow {
                timestamp: timestamp.to_string(),
                kind: kind.to_lowercase(),
                asset: header.get(row, ASSET).unwrap_or_default().to_uppercase(),
                quantity: header.number(row, QUANTITY).unwrap_or_default().abs(),
                price_currency: header
                    .get(row, PRICE_CURRENCY)
                    .unwrap_or_default()
                    .to_uppercase(),
                price: header.number(row, PRICE).map(|p| p.abs()),
                subtotal: header.number(row, SUBTOTAL).map(|v| v.abs()),
                total: header.number(row, TOTAL).map(|v| v.abs()),
                fees: header.number(row, FEES).map(|v| v.abs()),
                notes: header.get(row, NOTES).unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Every `<tr>` becomes a row of trimmed cell texts.
fn markup_rows(html: &str) -> Result<Vec<Vec<String>>> {
    let document = Html::parse_document(html);
    let tr = Selector::parse("tr").map_err(|e| ContentError::Malformed(e.to_string()))?;
    let cells = Selector::parse("td, th").map_err(|e| ContentError::Malformed(e.to_string()))?;

    Ok(document
        .select(&tr)
        .map(|row| {
            row.select(&cells)
                .map(|c| {
                    c.text()
                        .collect::<Vec<_>>()
                        .join(" ")
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect()
        })
        .collect())
}

fn text_grammar(text: &str) -> Vec<CoinbaseRow> {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if TIMESTAMP_LEAD.is_match(line) {
            lines.push(line.to_string());
        } else if let Some(last) = lines.last_mut() {
            last.push(' ');
            last.push_str(line);
        }
    }
    lines.iter().filter_map(|l| text_line(l)).collect()
}

/// Token positions after the type phrase of one document-text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TextLayout {
    asset: usize,
    quantity: usize,
    /// Price currency and spot price, trades only
    price: Option<(usize, usize)>,
    /// Free text (counterparty, conversion) starts here
    notes_from: Option<usize>,
}

/// Layouts of the exported transaction history document:
///
/// ```text
/// Buy             BTC 0.01 USD 60,000.00 $600.00 $605.00
/// Sell            0.5 ETH USD 3,000.00 $1,500.00 $1,485.00
/// Deposit         500 EUR €500.00 €500.00
/// Withdrawal      100 EUR €100.00 €100.00
/// Send / Receive  BTC 0.1 to bc1q... $6,000.00
/// Pro Withdrawal  0.5 BTC $30,000.00
/// Convert         ETH 0.5 $1,000.00 $1,000.00 Converted 0.5 ETH to 1,000.00 USDC
/// rewards         ETH 0.001 $3.00 $3.00
/// ```
fn text_layout(kind: &str) -> TextLayout {
    let asset_first = TextLayout {
        asset: 0,
        quantity: 1,
        price: None,
        notes_from: None,
    };
    let quantity_first = TextLayout {
        asset: 1,
        quantity: 0,
        price: None,
        notes_from: None,
    };
    match kind {
        "buy" | "advanced trade buy" => TextLayout {
            price: Some((2, 3)),
            ..asset_first
        },
        "sell" | "advanced trade sell" => TextLayout {
            price: Some((2, 3)),
            ..quantity_first
        },
        "deposit" | "withdrawal" | "pro withdrawal" | "pro deposit" => quantity_first,
        "send" | "receive" | "convert" => TextLayout {
            notes_from: Some(2),
            ..asset_first
        },
        _ => asset_first,
    }
}

fn text_line(line: &str) -> Option<CoinbaseRow> {
    let caps = TIMESTAMP_LEAD.captures(line)?;
    let timestamp = caps.get(1)?.as_str().to_string();
    let rest = &line[caps.get(0)?.end()..];
    let lower = rest.to_lowercase();

    let kind = TEXT_TYPES.iter().find(|t| {
        lower.starts_with(*t) && lower[t.len()..].starts_with(char::is_whitespace)
    })?;
    let tokens: Vec<&str> = rest[kind.len()..].split_whitespace().collect();
    let layout = text_layout(kind);

    let asset = tokens
        .get(layout.asset)
        .filter(|t| t.chars().any(|c| c.is_ascii_alphabetic()))?
        .to_uppercase();
    let quantity = parse_number(tokens.get(layout.quantity)?)?.abs();
    let (price_currency, price) = match layout.price {
        Some((currency_at, price_at)) => {
            let currency = tokens
                .get(currency_at)
                .filter(|t| t.len() == 3 && t.chars().all(|c| c.is_ascii_alphabetic()))
                .map(|t| t.to_uppercase());
            let price = tokens
                .get(price_at)
                .filter(|t| !SYMBOL_MONEY.is_match(t))
                .and_then(|t| parse_number(t));
            (currency, price)
        }
        None => (None, None),
    };

    // Subtotal and total are the last two symbol-prefixed amounts
    let money: Vec<(&str, Decimal)> = tokens
        .iter()
        .filter_map(|t| {
            let c = SYMBOL_MONEY.captures(t)?;
            Some((symbol_currency(c.get(1)?.as_str()), parse_number(t)?.abs()))
        })
        .collect();
    let (subtotal, total) = match money.as_slice() {
        [] => (None, None),
        [only] => (Some(only.1), Some(only.1)),
        [.., sub, tot] => (Some(sub.1), Some(tot.1)),
    };
    let price_currency = price_currency
        .or_else(|| money.last().map(|m| m.0.to_string()))
        .unwrap_or_default();

    let notes = layout
        .notes_from
        .and_then(|from| tokens.get(from..))
        .map(|rest| {
            rest.iter()
                .copied()
                .filter(|t| !SYMBOL_MONEY.is_match(t))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    Some(CoinbaseRow {
        timestamp,
        kind: kind.to_string(),
        asset,
        quantity,
        price_currency,
        price,
        subtotal,
        total,
        fees: None,
        notes,
    })
}

fn symbol_currency(symbol: &str) -> &'static str {
    match symbol {
        "€" => "EUR",
        "£" => "GBP",
        _ => "USD",
    }
}

/// Fee charged on a row: subtotal above total means the fee was deducted,
/// otherwise the explicit fee column.
fn row_fee(row: &CoinbaseRow) -> Option<FeeInKind> {
    let epsilon = Decimal::from_str(FEE_EPSILON).unwrap_or_default();
    let deducted = match (row.subtotal, row.total) {
        (Some(sub), Some(total)) if sub - total > epsilon => Some(sub - total),
        _ => None,
    };
    deducted
        .or(row.fees)
        .filter(|f| *f > Decimal::ZERO)
        .map(|f| FeeInKind::new(f, row.price_currency.clone()))
}

fn to_records(mut row: CoinbaseRow, ctx: &ParseContext) -> Vec<ParsedRecord> {
    if row.price_currency.is_empty() {
        row.price_currency = ctx.home_currency.clone();
    }
    let value = row
        .subtotal
        .or_else(|| row.price.map(|p| p * row.quantity))
        .unwrap_or_default();
    let draft = |kind, product| {
        DraftTransaction::new(row.timestamp.clone(), row.asset.clone(), kind, product)
            .with_quantity(row.quantity)
            .with_price(row.price)
            .with_notes(row.notes.clone())
    };

    match row.kind.as_str() {
        "buy" | "advanced trade buy" => {
            let paid = row.total.unwrap_or(value);
            vec![ParsedRecord::with_fee(
                draft(TransactionKind::Buy, ProductKind::Crypto)
                    .with_amount(-paid, row.price_currency.clone()),
                row_fee(&row),
            )]
        }
        "sell" | "advanced trade sell" => {
            let received = row.total.unwrap_or(value);
            vec![ParsedRecord::with_fee(
                draft(TransactionKind::Sell, ProductKind::Crypto)
                    .with_amount(received, row.price_currency.clone()),
                row_fee(&row),
            )]
        }
        "convert" => convert_legs(&row, value),
        "send" | "pro deposit" => vec![draft(TransactionKind::Withdrawal, ProductKind::Crypto)
            .with_amount(-value, row.price_currency.clone())
            .into()],
        "receive" | "pro withdrawal" => vec![draft(TransactionKind::Deposit, ProductKind::Crypto)
            .with_amount(value, row.price_currency.clone())
            .into()],
        "deposit" => vec![draft(TransactionKind::Deposit, ProductKind::Cash)
            .with_price(None)
            .with_amount(row.quantity, row.asset.clone())
            .into()],
        "withdrawal" => vec![draft(TransactionKind::Withdrawal, ProductKind::Cash)
            .with_price(None)
            .with_amount(-row.quantity, row.asset.clone())
            .into()],
        k if REWARD_TYPES.contains(&k) => vec![draft(TransactionKind::Revenue, ProductKind::Crypto)
            .with_amount(value, row.price_currency.clone())
            .into()],
        other => {
            debug!("Coinbase: unsupported transaction type '{}'", other);
            Vec::new()
        }
    }
}

/// `Converted 0.5 ETH to 1,000.00 USDC` becomes a sell leg and a buy leg.
fn convert_legs(row: &CoinbaseRow, value: Decimal) -> Vec<ParsedRecord> {
    let sell = DraftTransaction::new(
        row.timestamp.clone(),
        row.asset.clone(),
        TransactionKind::Sell,
        ProductKind::Crypto,
    )
    .with_quantity(row.quantity)
    .with_price(row.price)
    .with_amount(value, row.price_currency.clone())
    .with_notes(row.notes.clone());

    let mut legs = vec![ParsedRecord::with_fee(sell, row_fee(row))];

    match CONVERTED.captures(&row.notes) {
        Some(c) => {
            let target_qty = parse_number(&c[3]).unwrap_or_default().abs();
            let target = c[4].to_uppercase();
            let price = (!target_qty.is_zero()).then(|| value / target_qty);
            legs.push(
                DraftTransaction::new(
                    row.timestamp.clone(),
                    target,
                    TransactionKind::Buy,
                    ProductKind::Crypto,
                )
                .with_quantity(target_qty)
                .with_price(price.map(|p| p.round_dp(8)))
                .with_amount(-value, row.price_currency.clone())
                .with_notes(row.notes.clone())
                .into(),
            );
        }
        None => debug!("Coinbase: convert without target leg '{}'", row.notes),
    }
    legs
}
