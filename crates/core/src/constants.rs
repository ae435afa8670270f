/// Default reporting currency
pub const HOME_CURRENCY: &str = "CZK";

/// Tag rendered when no provider matches
pub const UNKNOWN_PROVIDER: &str = "unknown";

/// Decimal places of home-currency amounts
pub const HOME_AMOUNT_DP: u32 = 2;

/// Rows inspected by structural sheet recognition
pub const SHEET_SCAN_ROWS: usize = 20;

/// Subtotal minus total above this is treated as a fee
pub const FEE_EPSILON: &str = "0.01";
