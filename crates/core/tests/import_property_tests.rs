//! Property-based tests for number, date and rounding invariants.

use chrono::{Datelike, NaiveDate};
use ledgerly_core::normalizer::round_home;
use ledgerly_core::parsers::common::{normalize_date, parse_number};
use ledgerly_core::recognition::{identify, TRADING212_HEADER_PREFIX};
use ledgerly_core::{ImportContent, Provider};
use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

// =============================================================================
// Generators
// =============================================================================

/// Amounts with up to four decimals, both signs.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (-10_000_000_000i64..10_000_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Strictly positive rates with up to six decimals.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|units| Decimal::new(units, 6))
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
}

/// Group an integer with a thousands separator every three digits.
fn group(int: u64, sep: char) -> String {
    let digits = int.to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_home_amount_rounds_half_away_from_zero(amount in arb_amount(), rate in arb_rate()) {
        let home = round_home(amount * rate);
        prop_assert_eq!(
            home,
            (amount * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        );
        prop_assert!(home.scale() <= 2);
        prop_assert!((home - amount * rate).abs() <= Decimal::new(5, 3));
    }

    #[test]
    fn prop_number_parsing_is_locale_symmetric(int in 0u64..1_000_000_000, cents in 0u32..100) {
        let english = format!("{}.{:02}", group(int, ','), cents);
        let czech = format!("{},{:02}", group(int, '.'), cents);
        let spaced = format!("{},{:02}", group(int, ' '), cents);

        let expected = Decimal::from(int) + Decimal::new(i64::from(cents), 2);
        prop_assert_eq!(parse_number(&english), Some(expected));
        prop_assert_eq!(parse_number(&czech), Some(expected));
        prop_assert_eq!(parse_number(&spaced), Some(expected));
        prop_assert_eq!(parse_number(&format!("-{}", english)), Some(-expected));
    }

    #[test]
    fn prop_date_normalization_is_idempotent(date in arb_date()) {
        let iso = date.format("%Y-%m-%d").to_string();
        prop_assert_eq!(normalize_date(&iso), Some(iso.clone()));

        let czech = format!("{}.{}.{}", date.day(), date.month(), date.year());
        let spaced = format!("{}. {}. {}", date.day(), date.month(), date.year());
        prop_assert_eq!(normalize_date(&czech), Some(iso.clone()));
        prop_assert_eq!(normalize_date(&spaced), Some(iso.clone()));

        let once = normalize_date(&czech).unwrap_or_default();
        prop_assert_eq!(normalize_date(&once), Some(once.clone()));
    }

    #[test]
    fn prop_trading212_prefix_wins_regardless_of_tail(
        tail in proptest::collection::vec("[A-Za-z ()/]{1,20}", 0..6),
        filename in "[a-z]{1,10}\\.csv",
    ) {
        let mut header: Vec<String> = TRADING212_HEADER_PREFIX
            .split(',')
            .map(str::to_string)
            .collect();
        header.extend(tail);
        let content = ImportContent::Rows(vec![header]);
        prop_assert_eq!(identify(&content, &filename), Some(Provider::Trading212));
    }
}
