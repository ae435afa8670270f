//! Revolut trading account statement.
//!
//! Money cells carry their currency inline (`USD 1,725.00`), so amounts and
//! prices go through [`split_currency_amount`] before the plain number parser.

use log::debug;
use rust_decimal::Decimal;

use super::common::{parse_number, split_currency_amount, HeaderIndex};
use super::{ensure_readable, ParseContext, StatementParser};
use crate::errors::Result;
use crate::import::{ImportContent, Provider};
use crate::transactions::{DraftTransaction, ParsedRecord, ProductKind, TransactionKind};

const DATE: &[&str] = &["date"];
const TICKER: &[&str] = &["ticker"];
const TYPE: &[&str] = &["type"];
const QUANTITY: &[&str] = &["quantity"];
const PRICE: &[&str] = &["price per share"];
const TOTAL: &[&str] = &["total amount"];
const CURRENCY: &[&str] = &["currency"];

pub struct RevolutParser;

impl StatementParser for RevolutParser {
    fn provider(&self) -> Provider {
        Provider::Revolut
    }

    fn parse(&self, content: &ImportContent, ctx: &ParseContext) -> Result<Vec<ParsedRecord>> {
        ensure_readable(Provider::Revolut, content)?;
        let ImportContent::Rows(rows) = content else {
            return Ok(Vec::new());
        };

        let Some(header_at) = rows
            .iter()
            .position(|r| r.iter().any(|c| !c.trim().is_empty()))
        else {
            return Ok(Vec::new());
        };
        let header = HeaderIndex::new(&rows[header_at]);

        let mut records = Vec::new();
        for row in &rows[header_at + 1..] {
            match parse_row(&header, row, ctx) {
                Some(record) => records.push(record),
                None => debug!("Revolut: skipped row {:?}", row),
            }
        }
        Ok(records)
    }
}

/// Currency and value of a money cell, plain numbers take `fallback`.
fn money(raw: Option<&str>, fallback: &str) -> Option<(String, Decimal)> {
    let raw = raw?;
    split_currency_amount(raw).or_else(|| parse_number(raw).map(|v| (fallback.to_string(), v)))
}

fn classify(kind: &str) -> Option<(TransactionKind, ProductKind)> {
    let kind = kind.trim().to_uppercase();
    let classified = if kind.starts_with("BUY") {
        (TransactionKind::Buy, ProductKind::Stock)
    } else if kind.starts_with("SELL") {
        (TransactionKind::Sell, ProductKind::Stock)
    } else if kind.starts_with("DIVIDEND TAX") {
        (TransactionKind::Tax, ProductKind::Tax)
    } else if kind == "DIVIDEND" {
        (TransactionKind::Dividend, ProductKind::Stock)
    } else if kind == "CASH TOP-UP" {
        (TransactionKind::Deposit, ProductKind::Cash)
    } else if kind == "CASH WITHDRAWAL" {
        (TransactionKind::Withdrawal, ProductKind::Cash)
    } else if kind == "CUSTODY FEE" {
        (TransactionKind::Fee, ProductKind::Fee)
    } else if kind == "STOCK SPLIT" {
        (TransactionKind::CorporateAction, ProductKind::Stock)
    } else {
        return None;
    };
    Some(classified)
}

fn parse_row(header: &HeaderIndex, row: &[String], ctx: &ParseContext) -> Option<ParsedRecord> {
    let date = header.get(row, DATE)?;
    let raw_type = header.get(row, TYPE)?;
    let (kind, product) = classify(raw_type)?;

    let declared = header
        .get(row, CURRENCY)
        .map(str::to_uppercase)
        .unwrap_or_else(|| ctx.home_currency.clone());
    let (currency, total) =
        money(header.get(row, TOTAL), &declared).unwrap_or((declared.clone(), Decimal::ZERO));
    let magnitude = total.abs();
    let amount = match kind {
        TransactionKind::Buy | TransactionKind::Withdrawal | TransactionKind::Fee => -magnitude,
        TransactionKind::Sell | TransactionKind::Deposit | TransactionKind::Dividend => magnitude,
        // Tax corrections may be refunds; keep the reported sign
        TransactionKind::Tax => {
            if total.is_sign_positive() && !raw_type.to_uppercase().contains("CORRECTION") {
                -total
            } else {
                total
            }
        }
        _ => Decimal::ZERO,
    };

    let symbol = match product {
        ProductKind::Cash | ProductKind::Fee => header
            .get(row, TICKER)
            .map(str::to_uppercase)
            .unwrap_or_else(|| currency.clone()),
        _ => header.get(row, TICKER)?.to_uppercase(),
    };

    let mut draft = DraftTransaction::new(date, symbol, kind, product)
        .with_amount(amount, currency.clone())
        .with_notes(raw_type);
    if let Some(quantity) = header.number(row, QUANTITY) {
        draft = draft.with_quantity(quantity.abs());
    } else if kind.is_trade() {
        return None;
    }
    if let Some((_, price)) = money(header.get(row, PRICE), &currency) {
        draft = draft.with_price(Some(price.abs()));
    }
    Some(draft.into())
}
