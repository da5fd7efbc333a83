pub mod cache;
mod client;
mod converter;
pub mod models;

pub use cache::BoundedCache;
pub use client::{HttpRateSource, RATES_PATH};
pub use converter::CurrencyConverter;
pub use models::{format_price, CurrencyCode, ExchangeRates};

use crate::error::AppResult;
use async_trait::async_trait;

/// Provider of exchange rates
#[async_trait]
pub trait RateSource: Send + Sync + 'static {
    async fn fetch_rates(&self, base: &CurrencyCode) -> AppResult<ExchangeRates>;
}
