//! Transaction models: parser drafts and normalized canonical records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::transactions_constants::*;

/// Fixed transaction vocabulary. Every record resolves to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Buy,
    Sell,
    Dividend,
    Deposit,
    Withdrawal,
    Revenue,
    Tax,
    Fee,
    #[serde(rename = "Corporate Action")]
    CorporateAction,
    Other,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => TRANS_TYPE_BUY,
            TransactionKind::Sell => TRANS_TYPE_SELL,
            TransactionKind::Dividend => TRANS_TYPE_DIVIDEND,
            TransactionKind::Deposit => TRANS_TYPE_DEPOSIT,
            TransactionKind::Withdrawal => TRANS_TYPE_WITHDRAWAL,
            TransactionKind::Revenue => TRANS_TYPE_REVENUE,
            TransactionKind::Tax => TRANS_TYPE_TAX,
            TransactionKind::Fee => TRANS_TYPE_FEE,
            TransactionKind::CorporateAction => TRANS_TYPE_CORPORATE_ACTION,
            TransactionKind::Other => TRANS_TYPE_OTHER,
        }
    }

    /// Buy or Sell.
    pub fn is_trade(&self) -> bool {
        matches!(self, TransactionKind::Buy | TransactionKind::Sell)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case(TRANS_TYPE_BUY) => Ok(TransactionKind::Buy),
            s if s.eq_ignore_ascii_case(TRANS_TYPE_SELL) => Ok(TransactionKind::Sell),
            s if s.eq_ignore_ascii_case(TRANS_TYPE_DIVIDEND) => Ok(TransactionKind::Dividend),
            s if s.eq_ignore_ascii_case(TRANS_TYPE_DEPOSIT) => Ok(TransactionKind::Deposit),
            s if s.eq_ignore_ascii_case(TRANS_TYPE_WITHDRAWAL) => Ok(TransactionKind::Withdrawal),
            s if s.eq_ignore_ascii_case(TRANS_TYPE_REVENUE) => Ok(TransactionKind::Revenue),
            s if s.eq_ignore_ascii_case(TRANS_TYPE_TAX) => Ok(TransactionKind::Tax),
            s if s.eq_ignore_ascii_case(TRANS_TYPE_FEE) => Ok(TransactionKind::Fee),
            s if s.eq_ignore_ascii_case(TRANS_TYPE_CORPORATE_ACTION) => {
                Ok(TransactionKind::CorporateAction)
            }
            s if s.eq_ignore_ascii_case(TRANS_TYPE_OTHER) => Ok(TransactionKind::Other),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

/// What was traded or moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    Stock,
    Crypto,
    Cash,
    #[serde(rename = "FX")]
    Fx,
    Tax,
    Fee,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Stock => PRODUCT_TYPE_STOCK,
            ProductKind::Crypto => PRODUCT_TYPE_CRYPTO,
            ProductKind::Cash => PRODUCT_TYPE_CASH,
            ProductKind::Fx => PRODUCT_TYPE_FX,
            ProductKind::Tax => PRODUCT_TYPE_TAX,
            ProductKind::Fee => PRODUCT_TYPE_FEE,
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-specific record produced by a parser.
///
/// `date` is kept as the raw text the parser found; the normalizer turns it
/// into a calendar date. `amount` is signed from the account's cash
/// perspective. `fees` is already expressed in the home currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftTransaction {
    pub date: String,
    pub symbol: String,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub amount: Decimal,
    pub currency: String,
    pub kind: TransactionKind,
    pub product: ProductKind,
    pub fees: Decimal,
    pub notes: String,
    pub isin: Option<String>,
    pub company_name: Option<String>,
}

impl DraftTransaction {
    pub fn new(
        date: impl Into<String>,
        symbol: impl Into<String>,
        kind: TransactionKind,
        product: ProductKind,
    ) -> Self {
        Self {
            date: date.into(),
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            price: None,
            amount: Decimal::ZERO,
            currency: String::new(),
            kind,
            product,
            fees: Decimal::ZERO,
            notes: String::new(),
            isin: None,
            company_name: None,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_price(mut self, price: Option<Decimal>) -> Self {
        self.price = price;
        self
    }

    pub fn with_amount(mut self, amount: Decimal, currency: impl Into<String>) -> Self {
        self.amount = amount;
        self.currency = currency.into();
        self
    }

    pub fn with_fees(mut self, fees: Decimal) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_isin(mut self, isin: Option<String>) -> Self {
        self.isin = isin.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_company_name(mut self, name: Option<String>) -> Self {
        self.company_name = name.filter(|s| !s.trim().is_empty());
        self
    }
}

/// A fee charged in kind, in its own currency. Converted by the normalizer
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeInKind {
    pub amount: Decimal,
    pub currency: String,
}

impl FeeInKind {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount: amount.abs(),
            currency: currency.into(),
        }
    }
}

/// Parser output: a draft plus its optional fee side-channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub draft: DraftTransaction,
    pub fee_in_kind: Option<FeeInKind>,
}

impl ParsedRecord {
    pub fn with_fee(draft: DraftTransaction, fee: Option<FeeInKind>) -> Self {
        Self {
            draft,
            fee_in_kind: fee.filter(|f| f.amount > Decimal::ZERO),
        }
    }
}

impl From<DraftTransaction> for ParsedRecord {
    fn from(draft: DraftTransaction) -> Self {
        Self {
            draft,
            fee_in_kind: None,
        }
    }
}

/// Normalized record handed to persistence.
///
/// Field names follow the persisted JSON shape; `amount_czk` holds the
/// home-currency amount whatever the configured home currency is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub date: NaiveDate,
    /// Instrument identifier, upper-cased
    pub id: String,
    /// Unsigned quantity
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub amount_cur: Decimal,
    pub currency: String,
    pub ex_rate: Decimal,
    pub amount_czk: Decimal,
    pub platform: String,
    pub product_type: ProductKind,
    pub trans_type: TransactionKind,
    pub fees: Decimal,
    pub notes: String,
    pub isin: Option<String>,
    pub company_name: Option<String>,
}

/// A canonical record with its per-batch import key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedTransaction {
    pub import_key: String,
    #[serde(flatten)]
    pub transaction: CanonicalTransaction,
}
