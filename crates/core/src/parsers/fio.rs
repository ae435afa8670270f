//! Fio e-Broker trade export (semicolon separated, Czech locale).

use log::debug;
use rust_decimal::Decimal;

use super::common::{cell, find_header_row, parse_number, repair_mojibake, HeaderIndex};
use super::{ensure_readable, ParseContext, StatementParser};
use crate::constants::SHEET_SCAN_ROWS;
use crate::errors::Result;
use crate::import::{ImportContent, Provider};
use crate::transactions::{
    DraftTransaction, FeeInKind, ParsedRecord, ProductKind, TransactionKind,
};

const DATE: &[&str] = &["datum obchodu", "datum"];
const DIRECTION: &[&str] = &["směr", "smer"];
const SYMBOL: &[&str] = &["symbol"];
const PRICE: &[&str] = &["cena"];
const QUANTITY: &[&str] = &["počet", "pocet"];
const CURRENCY: &[&str] = &["měna", "mena"];
const TEXT: &[&str] = &["text fio", "text"];

const VOLUME_PREFIX: &str = "objem v ";
const FEES_PREFIX: &str = "poplatky v ";

pub struct FioParser;

impl StatementParser for FioParser {
    fn provider(&self) -> Provider {
        Provider::Fio
    }

    fn parse(&self, content: &ImportContent, _ctx: &ParseContext) -> Result<Vec<ParsedRecord>> {
        ensure_readable(Provider::Fio, content)?;
        let ImportContent::Rows(rows) = content else {
            return Ok(Vec::new());
        };

        // Exports open with a few lines of account metadata
        let Some(header_at) = find_header_row(rows, SHEET_SCAN_ROWS, |h| {
            h.find(DATE).is_some() && h.find_prefix(VOLUME_PREFIX).is_some()
        }) else {
            debug!("Fio: no header row found");
            return Ok(Vec::new());
        };
        let header = HeaderIndex::new(&rows[header_at]);
        let volumes = currency_columns(&header, VOLUME_PREFIX);
        let fees = currency_columns(&header, FEES_PREFIX);

        let records = rows[header_at + 1..]
            .iter()
            .filter_map(|row| {
                let parsed = parse_row(&header, &volumes, &fees, row);
                if parsed.is_none() {
                    debug!("Fio: skipped row {:?}", row);
                }
                parsed
            })
            .collect();
        Ok(records)
    }
}

/// `(column index, currency)` for every `Objem v USD`-style column.
fn currency_columns(header: &HeaderIndex, prefix: &str) -> Vec<(usize, String)> {
    header
        .all_with_prefix(prefix)
        .into_iter()
        .map(|(i, name)| (i, name[prefix.len()..].trim().to_uppercase()))
        .filter(|(_, cur)| cur.len() == 3)
        .collect()
}

/// Value of the column for `currency`, or the first non-zero column when no
/// currency is known yet.
fn pick(
    row: &[String],
    columns: &[(usize, String)],
    currency: Option<&str>,
) -> Option<(String, Decimal)> {
    let value = |i: usize| parse_number(cell(row, i)).filter(|v| !v.is_zero());
    match currency {
        Some(cur) => columns
            .iter()
            .find(|(_, c)| c == cur)
            .and_then(|(i, c)| value(*i).map(|v| (c.clone(), v))),
        None => columns
            .iter()
            .find_map(|(i, c)| value(*i).map(|v| (c.clone(), v))),
    }
}

fn classify(direction: &str, text: &str) -> Option<TransactionKind> {
    let direction = direction.to_lowercase();
    if direction.starts_with("nákup") || direction.starts_with("nakup") {
        return Some(TransactionKind::Buy);
    }
    if direction.starts_with("prodej") {
        return Some(TransactionKind::Sell);
    }

    // Tax before dividend: withholding lines mention both
    let text = text.to_lowercase();
    if text.contains("daň") || text.contains("dan z") {
        Some(TransactionKind::Tax)
    } else if text.contains("dividend") {
        Some(TransactionKind::Dividend)
    } else if text.contains("poplatek") {
        Some(TransactionKind::Fee)
    } else if text.contains("vklad") || text.contains("vloženo") {
        Some(TransactionKind::Deposit)
    } else if text.contains("výběr") || text.contains("vyber") {
        Some(TransactionKind::Withdrawal)
    } else {
        None
    }
}

fn parse_row(
    header: &HeaderIndex,
    volumes: &[(usize, String)],
    fees: &[(usize, String)],
    row: &[String],
) -> Option<ParsedRecord> {
    let date = header.get(row, DATE)?;
    let direction = repair_mojibake(header.get(row, DIRECTION).unwrap_or_default());
    let text = repair_mojibake(header.get(row, TEXT).unwrap_or_default());
    let kind = classify(&direction, &text)?;

    let declared = header.get(row, CURRENCY).map(str::to_uppercase);
    let (currency, volume) = pick(row, volumes, declared.as_deref())
        .or_else(|| pick(row, volumes, None))?;
    let magnitude = volume.abs();
    let amount = match kind {
        TransactionKind::Buy
        | TransactionKind::Withdrawal
        | TransactionKind::Tax
        | TransactionKind::Fee => -magnitude,
        _ => magnitude,
    };

    let symbol = header
        .get(row, SYMBOL)
        .map(str::to_uppercase)
        .unwrap_or_else(|| currency.clone());
    let product = match kind {
        TransactionKind::Buy | TransactionKind::Sell | TransactionKind::Dividend => {
            ProductKind::Stock
        }
        TransactionKind::Tax => ProductKind::Tax,
        TransactionKind::Fee => ProductKind::Fee,
        _ => ProductKind::Cash,
    };

    let mut draft = DraftTransaction::new(date, symbol, kind, product)
        .with_amount(amount, currency.clone())
        .with_notes(text);
    if kind.is_trade() {
        draft = draft
            .with_quantity(header.number(row, QUANTITY)?.abs())
            .with_price(header.number(row, PRICE).map(|p| p.abs()));
    }

    let fee = pick(row, fees, Some(&currency))
        .or_else(|| pick(row, fees, None))
        .map(|(cur, value)| FeeInKind::new(value, cur));

    Some(ParsedRecord::with_fee(draft, fee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rows(lines: &[&str]) -> ImportContent {
        ImportContent::Rows(
            lines
                .iter()
                .map(|l| l.split(';').map(str::to_string).collect())
                .collect(),
        )
    }

    fn parse(content: ImportContent) -> Vec<ParsedRecord> {
        FioParser.parse(&content, &ParseContext::default()).unwrap()
    }

    const HEADER: &str = "Datum obchodu;Směr;Symbol;Cena;Počet;Měna;Objem v CZK;Poplatky v CZK;Objem v USD;Poplatky v USD;Text FIO";

    #[test]
    fn test_trades_and_cash_rows() {
        let records = parse(rows(&[
            "Přehled obchodů;;;;;;;;;;",
            HEADER,
            "15.03.2024 10:20;Nákup;AAPL;172,50;10;USD;;;-1 725,00;15,00;Nákup AAPL",
            "18.03.2024 11:00;Prodej;CEZ;1 020,00;5;CZK;5 100,00;40,00;;;Prodej CEZ",
            "01.03.2024;;;;;CZK;10 000,00;;;;Vklad na účet",
            "20.03.2024;;AAPL;;;USD;;;-0,36;;Daň z dividendy AAPL",
            "20.03.2024;;AAPL;;;USD;;;2,40;;Dividenda AAPL",
            "21.03.2024;;;;;;;;;;Neznámý řádek",
        ]));
        assert_eq!(records.len(), 5);

        let buy = &records[0];
        assert_eq!(buy.draft.kind, TransactionKind::Buy);
        assert_eq!(buy.draft.amount, dec!(-1725.00));
        assert_eq!(buy.draft.currency, "USD");
        assert_eq!(buy.draft.quantity, dec!(10));
        assert_eq!(buy.fee_in_kind, Some(FeeInKind::new(dec!(15.00), "USD")));

        let sell = &records[1];
        assert_eq!(sell.draft.amount, dec!(5100.00));
        assert_eq!(sell.fee_in_kind, Some(FeeInKind::new(dec!(40.00), "CZK")));

        assert_eq!(records[2].draft.kind, TransactionKind::Deposit);
        assert_eq!(records[2].draft.symbol, "CZK");
        assert_eq!(records[3].draft.kind, TransactionKind::Tax);
        assert_eq!(records[3].draft.amount, dec!(-0.36));
        assert_eq!(records[4].draft.kind, TransactionKind::Dividend);
    }

    #[test]
    fn test_mojibake_header_and_direction() {
        let records = parse(rows(&[
            "Datum obchodu;SmÄ›r;Symbol;Cena;PoÄŤet;MÄ›na;Objem v CZK;Poplatky v CZK;Text FIO",
            "15.03.2024;NĂˇkup;CEZ;1 000,00;2;CZK;-2 000,00;0;NĂˇkup CEZ",
        ]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].draft.kind, TransactionKind::Buy);
        assert_eq!(records[0].draft.quantity, dec!(2));
        assert!(records[0].fee_in_kind.is_none());
    }
}
