use super::models::{CurrencyCode, ExchangeRates};
use super::RateSource;
use crate::error::{currency_error, AppResult};
use crate::utils::http::{build_client, endpoint};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Path of the exchange-rate endpoint under the API base URL
pub const RATES_PATH: &str = "exchange-rates";

/// Rate source backed by the marketplace REST API
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: Client,
    endpoint: Url,
}

impl HttpRateSource {
    pub fn new(api_base: &Url, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint(api_base, RATES_PATH)?,
        })
    }

    pub fn request_url(&self, base: &CurrencyCode) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("base", base.as_str());
        url
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_rates(&self, base: &CurrencyCode) -> AppResult<ExchangeRates> {
        let url = self.request_url(base);
        debug!("Fetching exchange rates from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| currency_error(&format!("Failed to fetch exchange rates: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(currency_error(&format!(
                "Failed to fetch exchange rates: HTTP {} - {}",
                status, error_body
            )));
        }

        let rates: ExchangeRates = response.json().await.map_err(|e| {
            currency_error(&format!("Failed to parse exchange rate response: {}", e))
        })?;

        if rates.base != *base {
            return Err(currency_error(&format!(
                "Exchange rates returned for {} instead of {}",
                rates.base, base
            )));
        }

        Ok(rates)
    }
}
