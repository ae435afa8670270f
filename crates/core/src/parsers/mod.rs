//! Parser family: one statement grammar per provider.
//!
//! Parsers are stateless unit types resolved through a static table keyed by
//! [`Provider`]. A parser skips malformed rows and only fails for content it
//! cannot read at all (wrong shape, empty).

pub mod common;
mod coinbase;
mod etoro;
mod fio;
mod ibkr;
mod revolut;
mod trading212;

pub use coinbase::CoinbaseParser;
pub use etoro::EtoroParser;
pub use fio::FioParser;
pub use ibkr::{reconstruct_lines, IbkrParser};
pub use revolut::RevolutParser;
pub use trading212::Trading212Parser;

use crate::constants::HOME_CURRENCY;
use crate::errors::Result;
use crate::import::{ContentError, ImportContent, Provider};
use crate::transactions::ParsedRecord;

/// Per-call parsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContext {
    pub home_currency: String,
}

impl ParseContext {
    pub fn new(home_currency: impl Into<String>) -> Self {
        Self {
            home_currency: home_currency.into().to_uppercase(),
        }
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new(HOME_CURRENCY)
    }
}

/// A provider statement grammar.
pub trait StatementParser: Send + Sync {
    fn provider(&self) -> Provider;

    /// Convert recognized content into draft records.
    fn parse(&self, content: &ImportContent, ctx: &ParseContext) -> Result<Vec<ParsedRecord>>;
}

static IBKR: IbkrParser = IbkrParser;
static COINBASE: CoinbaseParser = CoinbaseParser;
static TRADING212: Trading212Parser = Trading212Parser;
static ETORO: EtoroParser = EtoroParser;
static FIO: FioParser = FioParser;
static REVOLUT: RevolutParser = RevolutParser;

/// Static provider → parser table.
pub fn parser_for(provider: Provider) -> &'static dyn StatementParser {
    match provider {
        Provider::Ibkr => &IBKR,
        Provider::Coinbase => &COINBASE,
        Provider::Trading212 => &TRADING212,
        Provider::Etoro => &ETORO,
        Provider::Fio => &FIO,
        Provider::Revolut => &REVOLUT,
    }
}

/// Reject content this provider cannot read, or content with nothing in it.
pub(crate) fn ensure_readable(provider: Provider, content: &ImportContent) -> Result<()> {
    let shape = content.shape();
    if !provider.accepted_shapes().contains(&shape) {
        return Err(ContentError::UnsupportedShape { provider, shape }.into());
    }
    if content.is_empty() {
        return Err(ContentError::Empty(shape).into());
    }
    Ok(())
}
