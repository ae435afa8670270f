/// Transaction kind display names, as persisted in `trans_type`.
pub const TRANS_TYPE_BUY: &str = "Buy";
pub const TRANS_TYPE_SELL: &str = "Sell";
pub const TRANS_TYPE_DIVIDEND: &str = "Dividend";
pub const TRANS_TYPE_DEPOSIT: &str = "Deposit";
pub const TRANS_TYPE_WITHDRAWAL: &str = "Withdrawal";
pub const TRANS_TYPE_REVENUE: &str = "Revenue";
pub const TRANS_TYPE_TAX: &str = "Tax";
pub const TRANS_TYPE_FEE: &str = "Fee";
pub const TRANS_TYPE_CORPORATE_ACTION: &str = "Corporate Action";
pub const TRANS_TYPE_OTHER: &str = "Other";

/// Product kind names, as persisted in `product_type`.
pub const PRODUCT_TYPE_STOCK: &str = "Stock";
pub const PRODUCT_TYPE_CRYPTO: &str = "Crypto";
pub const PRODUCT_TYPE_CASH: &str = "Cash";
pub const PRODUCT_TYPE_FX: &str = "FX";
pub const PRODUCT_TYPE_TAX: &str = "Tax";
pub const PRODUCT_TYPE_FEE: &str = "Fee";
