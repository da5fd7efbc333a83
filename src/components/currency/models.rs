use crate::error::{invalid_input, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Three-letter ISO 4217 currency code, upper case
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display symbol for the common marketplace currencies
    pub fn symbol(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "EUR" => Some("€"),
            "USD" => Some("$"),
            "GBP" => Some("£"),
            _ => None,
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(invalid_input(&format!("Invalid currency code: {:?}", s)));
        }
        Ok(Self(code))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exchange rates relative to one base currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    pub base: CurrencyCode,
    /// Units of the keyed currency per one unit of `base`
    pub rates: HashMap<String, f64>,
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRates {
    /// Rate from the base currency to `to`
    pub fn rate(&self, to: &CurrencyCode) -> Option<f64> {
        if *to == self.base {
            return Some(1.0);
        }
        self.rates
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(to.as_str()))
            .map(|(_, rate)| *rate)
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }
}

/// Format an amount for display with two decimals
pub fn format_price(amount: f64, currency: &CurrencyCode) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let value = amount.abs();
    match currency.symbol() {
        Some(symbol) => format!("{}{}{:.2}", sign, symbol, value),
        None => format!("{}{:.2} {}", sign, value, currency),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_currency_code_parsing() {
        assert_eq!(code("eur").as_str(), "EUR");
        assert_eq!(code(" usd ").as_str(), "USD");
        assert!("EURO".parse::<CurrencyCode>().is_err());
        assert!("E1R".parse::<CurrencyCode>().is_err());
        assert!("".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_rate_lookup() {
        let body = r#"{"base":"EUR","rates":{"USD":1.08,"sek":11.5,"BAD":0.0}}"#;
        let rates: ExchangeRates = serde_json::from_str(body).unwrap();
        assert_eq!(rates.rate(&code("EUR")), Some(1.0));
        assert_eq!(rates.rate(&code("USD")), Some(1.08));
        assert_eq!(rates.rate(&code("SEK")), Some(11.5));
        assert_eq!(rates.rate(&code("BAD")), None);
        assert_eq!(rates.rate(&code("JPY")), None);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(12.5, &code("EUR")), "€12.50");
        assert_eq!(format_price(1234.567, &code("USD")), "$1234.57");
        assert_eq!(format_price(-5.0, &code("GBP")), "-£5.00");
        assert_eq!(format_price(99.0, &code("SEK")), "99.00 SEK");
    }
}
