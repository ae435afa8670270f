//! Provider registry module.
//!
//! Orchestrates the external exchange-rate providers as an ordered fallback
//! chain, honoring each error's retry classification.

mod fx_registry;

pub use fx_registry::FxProviderRegistry;
