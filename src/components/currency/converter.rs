use super::cache::BoundedCache;
use super::models::{CurrencyCode, ExchangeRates};
use super::RateSource;
use crate::error::{invalid_input, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Converts prices between currencies using cached backend rates
pub struct CurrencyConverter {
    source: Arc<dyn RateSource>,
    cache: Mutex<BoundedCache<CurrencyCode, ExchangeRates>>,
}

impl CurrencyConverter {
    pub fn new(source: Arc<dyn RateSource>, capacity: usize, ttl: Duration) -> Self {
        Self {
            source,
            cache: Mutex::new(BoundedCache::new(capacity, ttl)),
        }
    }

    /// Rates for a base currency, from cache while fresh
    pub async fn rates(&self, base: &CurrencyCode) -> AppResult<ExchangeRates> {
        if let Some(rates) = self.cache.lock().await.get(base).cloned() {
            debug!("Exchange rates for {} served from cache", base);
            return Ok(rates);
        }

        // Lock is not held across the fetch
        let rates = self.source.fetch_rates(base).await?;
        info!("Fetched {} exchange rates for {}", rates.rates.len(), base);

        self.cache.lock().await.insert(base.clone(), rates.clone());
        Ok(rates)
    }

    /// Convert an amount from one currency to another
    pub async fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode) -> AppResult<f64> {
        if !amount.is_finite() {
            return Err(invalid_input("Amount must be a finite number"));
        }
        if from == to {
            return Ok(amount);
        }

        let rates = self.rates(from).await?;
        let rate = rates
            .rate(to)
            .ok_or_else(|| invalid_input(&format!("No exchange rate from {} to {}", from, to)))?;

        Ok(amount * rate)
    }

    /// Drop cached rates, forcing the next lookup to fetch
    pub async fn invalidate(&self, base: &CurrencyCode) {
        self.cache.lock().await.invalidate(base);
    }
}
