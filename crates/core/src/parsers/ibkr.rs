//! Interactive Brokers activity statement, from extracted document text.
//!
//! Extraction breaks logical lines apart, sometimes in the middle of the
//! leading date. Lines are first re-glued, then each logical line is either a
//! trade (located by its `Buy`/`Sell` token) or a non-trade line classified
//! by an ordered regex list.

use std::collections::HashSet;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use super::common::{is_known_currency, parse_number};
use super::{ensure_readable, ParseContext, StatementParser};
use crate::errors::Result;
use crate::import::{ImportContent, Provider};
use crate::transactions::{
    DraftTransaction, FeeInKind, ParsedRecord, ProductKind, TransactionKind,
};

lazy_static! {
    static ref DATE_LEAD: Regex = Regex::new(r"^(\d{4}-\d{2}-\d{2})\b").unwrap();
    static ref PARTIAL_DATE: Regex = Regex::new(r"^\d{4}-(\d{1,2}-?)?$").unwrap();
    static ref SECTION_BREAK: Regex = Regex::new(
        r"(?i)^(trades|dividends|withholding tax|deposits\s*&\s*withdrawals|fees|interest|corporate actions|transaction history|total\b.*)$"
    )
    .unwrap();
    static ref MONEY: Regex = Regex::new(r"^-?(\d{1,3}(,\d{3})+|\d+)\.\d{2}$").unwrap();
    static ref ISIN_TICKER: Regex =
        Regex::new(r"\b([A-Z][A-Z0-9.]{0,11})\s?\(([A-Z]{2}[A-Z0-9]{9}\d)\)").unwrap();
    static ref BARE_ISIN: Regex = Regex::new(r"\b([A-Z]{2}[A-Z0-9]{9}\d)\b").unwrap();
    static ref BARE_TICKER: Regex = Regex::new(
        r"\b([A-Z][A-Z0-9.]{0,9})\s+(?:Cash Dividend|Dividend|Payment in Lieu|Tax|Withholding|Split|Merged|Spin-?off|Tendered)"
    )
    .unwrap();
    static ref ACCOUNT_ID: Regex = Regex::new(r"^U\d{5,}$").unwrap();
    static ref TIME_TOKEN: Regex = Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?,?$").unwrap();

    /// Order matters: a dividend line carrying " - US Tax" is a tax line.
    static ref LINE_RULES: Vec<(Regex, LineClass)> = vec![
        (
            Regex::new(r"(?i)(\s-\s[A-Z]{2}\s+Tax\b|withholding\s+tax|\bwithholding\b)").unwrap(),
            LineClass::Tax,
        ),
        (
            Regex::new(r"(?i)\b(cash\s+dividend|dividend|payment\s+in\s+lieu)").unwrap(),
            LineClass::Dividend,
        ),
        (
            Regex::new(r"(?i)\b(fx\s+translation|forex|currency\s+conversion)").unwrap(),
            LineClass::FxTranslation,
        ),
        (
            Regex::new(r"(?i)\b(fees?|commission\s+adjustment|market\s+data|snapshot)\b").unwrap(),
            LineClass::Fee,
        ),
        (
            Regex::new(r"(?i)\b(split|spin-?off|merged|merger|tendered|corporate\s+action)").unwrap(),
            LineClass::CorporateAction,
        ),
        (
            Regex::new(r"(?i)\b(deposit|withdrawal|electronic\s+fund\s+transfer|cash\s+transfer|wire)").unwrap(),
            LineClass::CashTransfer,
        ),
        (
            Regex::new(r"(?i)\binterest\b").unwrap(),
            LineClass::Interest,
        ),
    ];
}

/// Tokens that look like tickers but never are.
const TICKER_STOPLIST: &[&str] = &[
    "US", "TAX", "CASH", "FX", "PER", "SHARE", "ADR", "ORDINARY", "DIVIDEND", "WITHHOLDING", "NRA",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Tax,
    Dividend,
    FxTranslation,
    Fee,
    CorporateAction,
    CashTransfer,
    Interest,
}

pub struct IbkrParser;

impl StatementParser for IbkrParser {
    fn provider(&self) -> Provider {
        Provider::Ibkr
    }

    fn parse(&self, content: &ImportContent, ctx: &ParseContext) -> Result<Vec<ParsedRecord>> {
        ensure_readable(Provider::Ibkr, content)?;
        let ImportContent::Text(text) = content else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for line in reconstruct_lines(text) {
            let Some(record) = parse_line(&line, ctx) else {
                debug!("IBKR: skipped line '{}'", line);
                continue;
            };

            let draft = &record.draft;
            let key = (
                draft.date.clone(),
                draft.symbol.clone(),
                draft.kind,
                draft.amount.abs().round_dp(2),
                draft.quantity.abs().round_dp(4),
            );
            if !seen.insert(key) {
                debug!("IBKR: duplicate line dropped '{}'", line);
                continue;
            }

            records.push(record);
        }

        Ok(records)
    }
}

/// Re-glue extracted text into one physical line per transaction.
///
/// Pass one joins a leading date that was split over two lines
/// (`"2024-12"` + `"02 Buy ..."`). Pass two appends every line that does not
/// start with a date to the preceding date-led line. Section headings end
/// the current line and are discarded.
pub fn reconstruct_lines(text: &str) -> Vec<String> {
    let raw: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut repaired: Vec<String> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let line = raw[i];
        if PARTIAL_DATE.is_match(line) {
            if let Some(next) = raw.get(i + 1) {
                let glued = glue_date(line, next);
                if DATE_LEAD.is_match(&glued) {
                    repaired.push(glued);
                    i += 2;
                    continue;
                }
            }
        }
        repaired.push(line.to_string());
        i += 1;
    }

    let mut merged: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    for line in repaired {
        if DATE_LEAD.is_match(&line) {
            if let Some(done) = current.replace(line) {
                merged.push(done);
            }
        } else if SECTION_BREAK.is_match(&line) {
            if let Some(done) = current.take() {
                merged.push(done);
            }
        } else if let Some(cur) = current.as_mut() {
            cur.push(' ');
            cur.push_str(&line);
        }
    }
    if let Some(done) = current {
        merged.push(done);
    }
    merged
}

fn glue_date(head: &str, next: &str) -> String {
    let next = next.trim();
    if head.ends_with('-') || next.starts_with('-') {
        format!("{}{}", head, next)
    } else {
        format!("{}-{}", head, next)
    }
}

fn parse_line(line: &str, ctx: &ParseContext) -> Option<ParsedRecord> {
    let date = DATE_LEAD.captures(line)?.get(1)?.as_str().to_string();
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if let Some(pos) = tokens.iter().position(|t| *t == "Buy" || *t == "Sell") {
        return parse_trade(&date, line, &tokens, pos, ctx);
    }
    parse_non_trade(&date, line, &tokens, ctx).map(ParsedRecord::from)
}

fn money_tokens<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    tokens.iter().copied().filter(|t| MONEY.is_match(t)).collect()
}

fn find_isin(line: &str) -> Option<String> {
    ISIN_TICKER
        .captures(line)
        .map(|c| c[2].to_string())
        .or_else(|| BARE_ISIN.captures(line).map(|c| c[1].to_string()))
}

fn parse_trade(
    date: &str,
    line: &str,
    tokens: &[&str],
    pos: usize,
    ctx: &ParseContext,
) -> Option<ParsedRecord> {
    let kind = if tokens[pos] == "Buy" {
        TransactionKind::Buy
    } else {
        TransactionKind::Sell
    };

    let symbol = tokens.get(pos + 1).filter(|t| !MONEY.is_match(t))?;
    let quantity = tokens.get(pos + 2).and_then(|t| parse_number(t))?.abs();
    if quantity.is_zero() {
        return None;
    }
    let price = tokens.get(pos + 3).and_then(|t| parse_number(t)).map(|p| p.abs());
    let quote_currency = tokens
        .get(pos + 4)
        .filter(|t| t.len() == 3 && t.chars().all(|c| c.is_ascii_uppercase()))
        .copied();

    let tail_start = if quote_currency.is_some() { pos + 5 } else { pos + 4 };
    let money = money_tokens(tokens.get(tail_start..).unwrap_or(&[]));
    // Trailing column count varies; the settlement amount is always last
    let settlement = parse_number(money.last()?)?.abs();
    let commission = if money.len() >= 3 {
        parse_number(money[money.len() - 2]).map(|c| c.abs())
    } else {
        None
    };

    let company: Vec<&str> = tokens[1..pos]
        .iter()
        .copied()
        .filter(|t| !ACCOUNT_ID.is_match(t) && !TIME_TOKEN.is_match(t))
        .collect();

    let amount = match kind {
        TransactionKind::Buy => -settlement,
        _ => settlement,
    };

    let notes = format!(
        "{} {} {} @ {} {}",
        kind,
        quantity.normalize(),
        symbol,
        price.map(|p| p.to_string()).unwrap_or_default(),
        quote_currency.unwrap_or("")
    );

    let draft = DraftTransaction::new(date, *symbol, kind, ProductKind::Stock)
        .with_quantity(quantity)
        .with_price(price)
        .with_amount(amount, ctx.home_currency.clone())
        .with_notes(notes.trim())
        .with_isin(find_isin(line))
        .with_company_name((!company.is_empty()).then(|| company.join(" ")));

    // Commission is charged in the instrument's quote currency
    let fee_currency = quote_currency.unwrap_or(ctx.home_currency.as_str());
    let fee = commission.map(|c| FeeInKind::new(c, fee_currency));
    Some(ParsedRecord::with_fee(draft, fee))
}

fn classify(line: &str) -> Option<LineClass> {
    LINE_RULES
        .iter()
        .find(|(re, _)| re.is_match(line))
        .map(|(_, class)| *class)
}

/// Ticker near an ISIN first, then a bare ticker in front of a keyword.
fn extract_symbol(line: &str) -> Option<(String, Option<String>)> {
    if let Some(c) = ISIN_TICKER.captures(line) {
        return Some((c[1].to_string(), Some(c[2].to_string())));
    }
    BARE_TICKER
        .captures_iter(line)
        .map(|c| c[1].to_string())
        .find(|t| {
            !TICKER_STOPLIST.contains(&t.as_str())
                && !is_known_currency(t)
                && !ACCOUNT_ID.is_match(t)
        })
        .map(|t| (t, None))
}

fn parse_non_trade(
    date: &str,
    line: &str,
    tokens: &[&str],
    ctx: &ParseContext,
) -> Option<DraftTransaction> {
    let class = classify(line)?;
    let amount = parse_number(money_tokens(tokens).last()?)?;
    let currency = tokens
        .iter()
        .copied()
        .find(|t| is_known_currency(t))
        .map(str::to_string)
        .unwrap_or_else(|| ctx.home_currency.clone());

    let (kind, product) = match class {
        LineClass::Tax => (TransactionKind::Tax, ProductKind::Tax),
        LineClass::Dividend => (TransactionKind::Dividend, ProductKind::Stock),
        LineClass::FxTranslation => (TransactionKind::Other, ProductKind::Fx),
        LineClass::Fee => (TransactionKind::Fee, ProductKind::Fee),
        LineClass::CorporateAction => (TransactionKind::CorporateAction, ProductKind::Stock),
        LineClass::CashTransfer if amount.is_sign_negative() => {
            (TransactionKind::Withdrawal, ProductKind::Cash)
        }
        LineClass::CashTransfer => (TransactionKind::Deposit, ProductKind::Cash),
        LineClass::Interest => (TransactionKind::Revenue, ProductKind::Cash),
    };

    let instrument_bound = matches!(
        class,
        LineClass::Tax | LineClass::Dividend | LineClass::CorporateAction
    );
    let (symbol, isin) = if instrument_bound {
        extract_symbol(line).unwrap_or_else(|| (currency.clone(), None))
    } else {
        (currency.clone(), None)
    };

    let notes = line[date.len()..].trim().to_string();

    Some(
        DraftTransaction::new(date, symbol, kind, product)
            .with_amount(amount, currency)
            .with_notes(notes)
            .with_isin(isin),
    )
}
