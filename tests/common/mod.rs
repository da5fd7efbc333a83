#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Datelike;
use rental_calendar::components::availability::{AvailabilityQuery, AvailabilitySource};
use rental_calendar::components::calendar::CalendarSnapshot;
use rental_calendar::components::currency::{CurrencyCode, ExchangeRates, RateSource};
use rental_calendar::error::{availability_error, currency_error, AppResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// Canned answer for one month
#[derive(Debug, Clone)]
enum MockResponse {
    Dates(Vec<String>),
    Fail(String),
    Delayed(Duration, Vec<String>),
}

/// Mock availability endpoint keyed by the month of the query start
#[derive(Debug, Default)]
pub struct MockAvailabilitySource {
    responses: HashMap<(i32, u32), MockResponse>,
    calls: Mutex<Vec<AvailabilityQuery>>,
}

impl MockAvailabilitySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries for a month with these booked dates
    pub fn with_month(mut self, year: i32, month: u32, dates: &[&str]) -> Self {
        self.responses
            .insert((year, month), MockResponse::Dates(to_strings(dates)));
        self
    }

    /// Fail queries for a month as a broken backend would
    pub fn failing_month(mut self, year: i32, month: u32) -> Self {
        self.responses.insert(
            (year, month),
            MockResponse::Fail("HTTP 503 Service Unavailable".to_string()),
        );
        self
    }

    /// Answer queries for a month after a delay
    pub fn delayed_month(mut self, year: i32, month: u32, delay: Duration, dates: &[&str]) -> Self {
        self.responses
            .insert((year, month), MockResponse::Delayed(delay, to_strings(dates)));
        self
    }

    /// Queries received so far
    pub fn calls(&self) -> Vec<AvailabilityQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AvailabilitySource for MockAvailabilitySource {
    async fn booked_dates(&self, query: &AvailabilityQuery) -> AppResult<Vec<String>> {
        self.calls.lock().unwrap().push(query.clone());

        let key = (query.start_date.year(), query.start_date.month());
        match self.responses.get(&key).cloned() {
            Some(MockResponse::Dates(dates)) => Ok(dates),
            Some(MockResponse::Fail(message)) => Err(availability_error(&message)),
            Some(MockResponse::Delayed(delay, dates)) => {
                tokio::time::sleep(delay).await;
                Ok(dates)
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Mock exchange-rate endpoint that counts its calls
#[derive(Debug, Default)]
pub struct MockRateSource {
    rates: HashMap<String, HashMap<String, f64>>,
    failing: bool,
    calls: AtomicUsize,
}

impl MockRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rates(mut self, base: &str, rates: &[(&str, f64)]) -> Self {
        self.rates.insert(
            base.to_string(),
            rates.iter().map(|(code, rate)| (code.to_string(), *rate)).collect(),
        );
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for MockRateSource {
    async fn fetch_rates(&self, base: &CurrencyCode) -> AppResult<ExchangeRates> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing {
            return Err(currency_error("Failed to fetch exchange rates: HTTP 500"));
        }

        let rates = self
            .rates
            .get(base.as_str())
            .cloned()
            .ok_or_else(|| currency_error(&format!("No rates for {}", base)))?;

        Ok(ExchangeRates {
            base: base.clone(),
            rates,
            fetched_at: chrono::Utc::now(),
        })
    }
}

/// Wait until a published snapshot satisfies `condition`
pub async fn wait_for_snapshot<F>(
    rx: &mut watch::Receiver<CalendarSnapshot>,
    condition: F,
) -> CalendarSnapshot
where
    F: FnMut(&CalendarSnapshot) -> bool,
{
    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(condition))
        .await
        .expect("timed out waiting for calendar snapshot")
        .expect("calendar actor stopped");
    CalendarSnapshot::clone(&snapshot)
}

fn to_strings(dates: &[&str]) -> Vec<String> {
    dates.iter().map(|d| d.to_string()).collect()
}
