//! eToro account statement workbook.
//!
//! A closed position describes the whole life of a trade. It is emitted as a
//! single synthetic Sell on the close date, with proceeds equal to the
//! invested amount plus realized profit. Cash movements and dividends come
//! from the account activity sheet.

use log::debug;
use rust_decimal::Decimal;

use super::common::HeaderIndex;
use super::{ensure_readable, ParseContext, StatementParser};
use crate::errors::Result;
use crate::import::{ImportContent, Provider, Sheet, Workbook};
use crate::transactions::{
    DraftTransaction, FeeInKind, ParsedRecord, ProductKind, TransactionKind,
};

/// eToro accounts are denominated in dollars.
const ACCOUNT_CURRENCY: &str = "USD";

const CLOSED_POSITIONS: &str = "Closed Positions";
const ACCOUNT_ACTIVITY: &str = "Account Activity";

const POSITION_ID: &[&str] = &["position id"];
const ACTION: &[&str] = &["action"];
const SYMBOL: &[&str] = &["ticker", "symbol", "instrument"];
const AMOUNT: &[&str] = &["amount", "invested"];
const UNITS: &[&str] = &["units"];
const CLOSE_DATE: &[&str] = &["close date"];
const CLOSE_RATE: &[&str] = &["close rate"];
const PROFIT: &[&str] = &["profit(usd)", "profit (usd)", "profit"];
const SPREAD: &[&str] = &["spread fees (usd)", "spread"];
const OVERNIGHT: &[&str] = &[
    "overnight fees and dividends",
    "rollover fees and dividends",
    "overnight fees",
];
const IS_REAL: &[&str] = &["is real", "real"];
const TYPE: &[&str] = &["type"];
const ISIN: &[&str] = &["isin"];

const DATE: &[&str] = &["date"];
const DETAILS: &[&str] = &["details"];
const ASSET_TYPE: &[&str] = &["asset type"];

pub struct EtoroParser;

impl StatementParser for EtoroParser {
    fn provider(&self) -> Provider {
        Provider::Etoro
    }

    fn parse(&self, content: &ImportContent, _ctx: &ParseContext) -> Result<Vec<ParsedRecord>> {
        ensure_readable(Provider::Etoro, content)?;
        let ImportContent::Sheets(book) = content else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        if let Some(sheet) = closed_positions_sheet(book) {
            records.extend(closed_positions(sheet));
        }
        if let Some(sheet) = account_activity_sheet(book) {
            records.extend(account_activity(sheet));
        }
        Ok(records)
    }
}

fn closed_positions_sheet(book: &Workbook) -> Option<&Sheet> {
    book.sheet(CLOSED_POSITIONS).or_else(|| {
        book.sheets.iter().find(|s| {
            s.header()
                .map(HeaderIndex::new)
                .is_some_and(|h| h.has("position id") && h.has("close rate"))
        })
    })
}

fn account_activity_sheet(book: &Workbook) -> Option<&Sheet> {
    book.sheet(ACCOUNT_ACTIVITY).or_else(|| {
        book.sheets.iter().find(|s| {
            s.header()
                .map(HeaderIndex::new)
                .is_some_and(|h| h.has("type") && h.has("details") && h.has("amount"))
        })
    })
}

/// Data rows under the sheet's first non-empty row.
fn table(sheet: &Sheet) -> Option<(HeaderIndex, &[Vec<String>])> {
    let at = sheet
        .rows
        .iter()
        .position(|r| r.iter().any(|c| !c.trim().is_empty()))?;
    Some((HeaderIndex::new(&sheet.rows[at]), &sheet.rows[at + 1..]))
}

fn is_virtual(flag: &str) -> bool {
    matches!(
        flag.trim().to_lowercase().as_str(),
        "virtual" | "demo" | "no" | "false" | "0"
    )
}

/// `Buy Apple` → `Apple`
fn instrument_from_action(action: &str) -> &str {
    action
        .strip_prefix("Buy ")
        .or_else(|| action.strip_prefix("Sell "))
        .unwrap_or(action)
        .trim()
}

fn closed_positions(sheet: &Sheet) -> Vec<ParsedRecord> {
    let Some((header, rows)) = table(sheet) else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            if header.get(row, IS_REAL).is_some_and(is_virtual) {
                debug!("eToro: virtual position skipped");
                return None;
            }
            let position_id = header.get(row, POSITION_ID)?;
            let close_date = header.get(row, CLOSE_DATE)?;
            let invested = header.number(row, AMOUNT)?;
            let profit = header.number(row, PROFIT).unwrap_or_default();
            let units = header.number(row, UNITS).unwrap_or_default().abs();
            let action = header.get(row, ACTION).unwrap_or_default();
            let name = instrument_from_action(action);
            let symbol = header
                .get(row, SYMBOL)
                .unwrap_or(name)
                .to_uppercase();
            if symbol.is_empty() {
                return None;
            }
            let product = match header.get(row, TYPE) {
                Some(t) if t.to_lowercase().contains("crypto") => ProductKind::Crypto,
                _ => ProductKind::Stock,
            };

            let spread = header.number(row, SPREAD).unwrap_or_default().abs();
            let overnight = header
                .number(row, OVERNIGHT)
                .filter(|v| v.is_sign_negative())
                .unwrap_or_default()
                .abs();
            let fee = spread + overnight;

            let draft = DraftTransaction::new(close_date, symbol, TransactionKind::Sell, product)
                .with_quantity(units)
                .with_price(header.number(row, CLOSE_RATE).map(|r| r.abs()))
                .with_amount(invested + profit, ACCOUNT_CURRENCY)
                .with_notes(format!("Closed position {}", position_id))
                .with_isin(header.get(row, ISIN).map(str::to_string))
                .with_company_name((!name.is_empty()).then(|| name.to_string()));

            Some(ParsedRecord::with_fee(
                draft,
                (fee > Decimal::ZERO).then(|| FeeInKind::new(fee, ACCOUNT_CURRENCY)),
            ))
        })
        .collect()
}

fn account_activity(sheet: &Sheet) -> Vec<ParsedRecord> {
    let Some((header, rows)) = table(sheet) else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let date = header.get(row, DATE)?;
            let kind = header.get(row, TYPE)?.to_lowercase();
            let amount = header.number(row, AMOUNT)?;
            let details = header.get(row, DETAILS).unwrap_or_default();

            let draft = match kind.as_str() {
                "deposit" => DraftTransaction::new(
                    date,
                    ACCOUNT_CURRENCY,
                    TransactionKind::Deposit,
                    ProductKind::Cash,
                )
                .with_amount(amount.abs(), ACCOUNT_CURRENCY),
                "withdraw request" | "withdrawal" => DraftTransaction::new(
                    date,
                    ACCOUNT_CURRENCY,
                    TransactionKind::Withdrawal,
                    ProductKind::Cash,
                )
                .with_amount(-amount.abs(), ACCOUNT_CURRENCY),
                "dividend" => {
                    // Details look like `AAPL/USD`
                    let symbol = details.split('/').next().unwrap_or(details).trim();
                    let product = match header.get(row, ASSET_TYPE) {
                        Some(t) if t.to_lowercase().contains("crypto") => ProductKind::Crypto,
                        _ => ProductKind::Stock,
                    };
                    DraftTransaction::new(
                        date,
                        symbol.to_uppercase(),
                        TransactionKind::Dividend,
                        product,
                    )
                    .with_amount(amount, ACCOUNT_CURRENCY)
                }
                _ => return None,
            };
            Some(draft.with_notes(details).into())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sheet(name: &str, rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            name,
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn parse(book: Workbook) -> Vec<ParsedRecord> {
        EtoroParser
            .parse(&ImportContent::Sheets(book), &ParseContext::default())
            .unwrap()
    }

    fn closed() -> Sheet {
        sheet(
            "Closed Positions",
            &[
                &["Position ID", "Action", "Amount", "Units", "Open Date", "Close Date", "Spread Fees (USD)", "Profit(USD)", "Open Rate", "Close Rate", "Overnight Fees and Dividends", "Type", "ISIN", "Is Real"],
                &["111", "Buy Apple", "1000.00", "5.5", "01/02/2024 10:00:00", "15/03/2024 14:22:11", "0.50", "120.00", "180.00", "201.82", "-1.25", "Stocks", "US0378331005", "Real"],
                &["222", "Buy Bitcoin", "500.00", "0.01", "01/02/2024 10:00:00", "16/03/2024 09:00:00", "0.00", "-50.00", "50000", "45000", "0.00", "Crypto", "", "Virtual"],
            ],
        )
    }

    #[test]
    fn test_closed_position_becomes_single_sell() {
        let records = parse(Workbook::new(vec![closed()]));
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.draft.kind, TransactionKind::Sell);
        assert_eq!(r.draft.date, "15/03/2024 14:22:11");
        assert_eq!(r.draft.amount, dec!(1120.00));
        assert_eq!(r.draft.price, Some(dec!(201.82)));
        assert_eq!(r.draft.symbol, "APPLE");
        assert_eq!(r.draft.currency, "USD");
        assert_eq!(r.fee_in_kind, Some(FeeInKind::new(dec!(1.75), "USD")));
    }

    #[test]
    fn test_account_activity_sheet() {
        let activity = sheet(
            "Account Activity",
            &[
                &["Date", "Type", "Details", "Amount", "Units", "Realized Equity Change", "Asset type"],
                &["01/02/2024 09:00:00", "Deposit", "", "2000.00", "", "2000.00", ""],
                &["20/03/2024 09:00:00", "Dividend", "AAPL/USD", "1.20", "", "1.20", "Stocks"],
                &["25/03/2024 09:00:00", "Withdraw Request", "", "-300.00", "", "-300.00", ""],
                &["26/03/2024 09:00:00", "Open Position", "TSLA/USD", "100.00", "0.5", "0", "Stocks"],
            ],
        );
        let records = parse(Workbook::new(vec![closed(), activity]));
        assert_eq!(records.len(), 4);
        assert_eq!(records[1].draft.kind, TransactionKind::Deposit);
        assert_eq!(records[2].draft.kind, TransactionKind::Dividend);
        assert_eq!(records[2].draft.symbol, "AAPL");
        assert_eq!(records[3].draft.kind, TransactionKind::Withdrawal);
        assert_eq!(records[3].draft.amount, dec!(-300.00));
    }

    #[test]
    fn test_positions_sheet_found_by_columns() {
        let mut renamed = closed();
        renamed.name = "Sheet1".to_string();
        assert_eq!(parse(Workbook::new(vec![renamed])).len(), 1);
    }
}
