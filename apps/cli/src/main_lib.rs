use std::sync::Arc;

use ledgerly_core::fx::RateResolver;
use ledgerly_core::import::ImportSettings;
use ledgerly_core::{ImportService, TransactionSink};
use ledgerly_market_data::{
    CurrencyApiProvider, FrankfurterProvider, FxRateProvider, RateServiceClient,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::sink::JsonFileSink;

pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn build_resolver(config: &Config, settings: &ImportSettings) -> Arc<RateResolver> {
    let nearest = Arc::new(RateServiceClient::with_timeout(
        config.rate_api_url.clone(),
        config.http_timeout,
    ));
    let fallbacks: Vec<Arc<dyn FxRateProvider>> = vec![
        Arc::new(FrankfurterProvider::new()),
        Arc::new(CurrencyApiProvider::new()),
    ];
    tracing::info!(
        "Rates from {} with {} fallback providers, home currency {}",
        config.rate_api_url,
        fallbacks.len(),
        settings.home_currency
    );
    Arc::new(RateResolver::new(&settings.home_currency, nearest, fallbacks))
}

pub fn build_service(config: &Config) -> ImportService {
    let settings = config.import_settings();
    let sink: Arc<dyn TransactionSink> = Arc::new(JsonFileSink::new(&config.output));
    ImportService::new(build_resolver(config, &settings), sink)
}
