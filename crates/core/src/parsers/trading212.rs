//! Trading 212 account history export.

use log::{debug, warn};
use rust_decimal::Decimal;

use super::common::HeaderIndex;
use super::{ensure_readable, ParseContext, StatementParser};
use crate::errors::Result;
use crate::import::{ImportContent, Provider};
use crate::transactions::{
    DraftTransaction, FeeInKind, ParsedRecord, ProductKind, TransactionKind,
};

const ACTION: &[&str] = &["action"];
const TIME: &[&str] = &["time"];
const ISIN: &[&str] = &["isin"];
const TICKER: &[&str] = &["ticker"];
const NAME: &[&str] = &["name"];
const NOTES: &[&str] = &["notes"];
const SHARES: &[&str] = &["no. of shares"];
const PRICE: &[&str] = &["price / share"];
const PRICE_CURRENCY: &[&str] = &["currency (price / share)"];
const EXCHANGE_RATE: &[&str] = &["exchange rate"];
const TOTAL: &[&str] = &["total"];
const TOTAL_CURRENCY: &[&str] = &["currency (total)"];
const WITHHOLDING: &[&str] = &["withholding tax"];
const WITHHOLDING_CURRENCY: &[&str] = &["currency (withholding tax)"];

/// Fee columns and their currency columns, summed into one fee.
const FEE_COLUMNS: &[(&str, &str)] = &[
    ("stamp duty reserve tax", "currency (stamp duty reserve tax)"),
    ("currency conversion fee", "currency (currency conversion fee)"),
    ("french transaction tax", "currency (french transaction tax)"),
    ("transaction fee", "currency (transaction fee)"),
    ("finra fee", "currency (finra fee)"),
];

const MAX_FEE_COLUMNS: usize = 4;

pub struct Trading212Parser;

impl StatementParser for Trading212Parser {
    fn provider(&self) -> Provider {
        Provider::Trading212
    }

    fn parse(&self, content: &ImportContent, ctx: &ParseContext) -> Result<Vec<ParsedRecord>> {
        ensure_readable(Provider::Trading212, content)?;
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
                Some(mut parsed) => records.append(&mut parsed),
                None => debug!("Trading212: skipped row {:?}", row),
            }
        }
        Ok(records)
    }
}

fn parse_row(header: &HeaderIndex, row: &[String], ctx: &ParseContext) -> Option<Vec<ParsedRecord>> {
    let action = header.get(row, ACTION)?.to_lowercase();
    let time = header.get(row, TIME)?;
    let account_currency = header
        .get(row, TOTAL_CURRENCY)
        .map(str::to_uppercase)
        .unwrap_or_else(|| ctx.home_currency.clone());
    let total = header.number(row, TOTAL).unwrap_or_default();
    let ticker = header.get(row, TICKER).map(str::to_uppercase);
    let isin = header.get(row, ISIN).map(str::to_string);
    let name = header.get(row, NAME).map(str::to_string);
    let notes = header.get(row, NOTES).unwrap_or_default();

    let kind = if action.contains("buy") {
        TransactionKind::Buy
    } else if action.contains("sell") {
        TransactionKind::Sell
    } else if action.starts_with("dividend") {
        TransactionKind::Dividend
    } else if action == "deposit" {
        TransactionKind::Deposit
    } else if action == "withdrawal" {
        TransactionKind::Withdrawal
    } else if action.contains("interest") || action.contains("cashback") {
        TransactionKind::Revenue
    } else if action.contains("currency conversion") {
        TransactionKind::Other
    } else {
        return None;
    };

    let mut records = Vec::new();
    match kind {
        TransactionKind::Buy | TransactionKind::Sell => {
            let shares = header.number(row, SHARES)?.abs();
            let price = header.number(row, PRICE)?.abs();
            // Quote currency when present, else the account currency
            let currency = header
                .get(row, PRICE_CURRENCY)
                .map(str::to_uppercase)
                .unwrap_or_else(|| account_currency.clone());
            let gross = (shares * price).round_dp(8);
            let amount = if kind == TransactionKind::Buy { -gross } else { gross };

            let draft = DraftTransaction::new(time, ticker.clone()?, kind, ProductKind::Stock)
                .with_quantity(shares)
                .with_price(Some(price))
                .with_amount(amount, currency)
                .with_notes(notes)
                .with_isin(isin)
                .with_company_name(name);
            records.push(ParsedRecord::with_fee(
                draft,
                summed_fees(header, row, &account_currency),
            ));
        }
        TransactionKind::Dividend => {
            let instrument_currency = header
                .get(row, PRICE_CURRENCY)
                .map(str::to_uppercase)
                .unwrap_or_else(|| account_currency.clone());
            let rate = header
                .number(row, EXCHANGE_RATE)
                .filter(|r| *r > Decimal::ZERO);

            let (amount, currency) = match rate {
                Some(rate) if instrument_currency != account_currency => {
                    ((total * rate).round_dp(2), instrument_currency.clone())
                }
                _ => (total, account_currency.clone()),
            };
            let symbol = ticker.clone().unwrap_or_else(|| currency.clone());

            records.push(
                DraftTransaction::new(time, symbol.clone(), kind, ProductKind::Stock)
                    .with_quantity(header.number(row, SHARES).unwrap_or_default().abs())
                    .with_price(header.number(row, PRICE).map(|p| p.abs()))
                    .with_amount(amount, currency)
                    .with_notes(notes)
                    .with_isin(isin.clone())
                    .with_company_name(name.clone())
                    .into(),
            );

            if let Some(tax) = withholding(header, row, &account_currency, rate) {
                records.push(
                    DraftTransaction::new(time, symbol, TransactionKind::Tax, ProductKind::Tax)
                        .with_amount(-tax.0, tax.1)
                        .with_notes(format!("Withholding tax: {}", action))
                        .with_isin(isin)
                        .with_company_name(name)
                        .into(),
                );
            }
        }
        TransactionKind::Deposit | TransactionKind::Withdrawal | TransactionKind::Revenue => {
            let amount = if kind == TransactionKind::Withdrawal {
                -total.abs()
            } else {
                total.abs()
            };
            records.push(
                DraftTransaction::new(time, account_currency.clone(), kind, ProductKind::Cash)
                    .with_amount(amount, account_currency.clone())
                    .with_notes(if notes.is_empty() { action.as_str() } else { notes })
                    .into(),
            );
        }
        _ => {
            records.push(ParsedRecord::with_fee(
                DraftTransaction::new(time, account_currency.clone(), kind, ProductKind::Fx)
                    .with_amount(total, account_currency.clone())
                    .with_notes(notes),
                summed_fees(header, row, &account_currency),
            ));
        }
    }
    Some(records)
}

/// Withholding tax in account currency. A tax reported in another currency
/// is divided by the row's exchange rate.
fn withholding(
    header: &HeaderIndex,
    row: &[String],
    account_currency: &str,
    rate: Option<Decimal>,
) -> Option<(Decimal, String)> {
    let tax = header.number(row, WITHHOLDING)?.abs();
    if tax.is_zero() {
        return None;
    }
    let tax_currency = header
        .get(row, WITHHOLDING_CURRENCY)
        .map(str::to_uppercase)
        .unwrap_or_else(|| account_currency.to_string());

    match rate {
        Some(rate) if tax_currency != account_currency => {
            Some(((tax / rate).round_dp(2), account_currency.to_string()))
        }
        _ => Some((tax, tax_currency)),
    }
}

/// Sum of the fee columns as one fee.
///
/// Fees sharing one currency are summed as reported. Mixed currencies are
/// re-expressed in the account currency through the row's exchange rate; a
/// foreign fee without a rate cannot be converted and is left out.
fn summed_fees(header: &HeaderIndex, row: &[String], account_currency: &str) -> Option<FeeInKind> {
    let fees: Vec<(Decimal, String)> = FEE_COLUMNS
        .iter()
        .filter(|(c, _)| header.has(c))
        .take(MAX_FEE_COLUMNS)
        .filter_map(|(column, currency_column)| {
            let fee = header.number(row, &[*column])?.abs();
            let currency = header
                .get(row, &[*currency_column])
                .map(str::to_uppercase)
                .unwrap_or_else(|| account_currency.to_string());
            (!fee.is_zero()).then_some((fee, currency))
        })
        .collect();

    let (_, first_currency) = fees.first()?;
    if fees.iter().all(|(_, c)| c == first_currency) {
        let total: Decimal = fees.iter().map(|(f, _)| *f).sum();
        return Some(FeeInKind::new(total, first_currency.clone()));
    }

    let rate = header
        .number(row, EXCHANGE_RATE)
        .filter(|r| *r > Decimal::ZERO);
    let mut total = Decimal::ZERO;
    for (fee, currency) in &fees {
        if currency == account_currency {
            total += *fee;
        } else if let Some(rate) = rate {
            total += (*fee / rate).round_dp(2);
        } else {
            warn!(
                "Trading212: {} {} fee has no exchange rate to {}, left out",
                fee, currency, account_currency
            );
        }
    }
    (!total.is_zero()).then(|| FeeInKind::new(total, account_currency))
}
