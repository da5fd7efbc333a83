use crate::components::calendar::AvailabilityPolicy;
use crate::error::{config_error, env_error, AppResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::time::Duration;
use url::Url;

/// Default HTTP port for the calendar service
pub const DEFAULT_PORT: u16 = 3000;

/// Components that can be toggled from `config/components.toml`
pub const COMPONENTS: [&str; 2] = ["calendar", "currency"];

/// Main configuration structure for the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the marketplace REST backend
    pub api_base_url: String,
    /// IANA timezone used for "today" and month boundaries
    pub timezone: String,
    /// Port the HTTP service listens on
    pub port: u16,
    /// What to do with availability when the backend cannot be reached
    pub availability_policy: AvailabilityPolicy,
    /// Timeout for outbound requests in seconds
    pub request_timeout_secs: u64,
    /// How long fetched exchange rates stay fresh, in seconds
    pub rate_cache_ttl_secs: u64,
    /// How many base currencies the rate cache keeps
    pub rate_cache_capacity: usize,
    /// Most calendar sessions open at once
    pub max_calendars: usize,
    /// Seconds a calendar session may go unused before it is closed
    pub calendar_idle_secs: u64,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Self::from_vars(|key| env::var(key).ok())?;

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string("config/components.toml") {
            config.merge_components(&content)?;
        }

        Ok(config)
    }

    /// Build configuration from a variable lookup
    pub fn from_vars<F>(var: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = var("API_BASE_URL").ok_or_else(|| env_error("API_BASE_URL"))?;
        Url::parse(&api_base_url)
            .map_err(|e| config_error(&format!("Invalid API_BASE_URL: {}", e)))?;

        // Default timezone
        let timezone = var("TIMEZONE").unwrap_or_else(|| String::from("UTC"));
        timezone
            .parse::<Tz>()
            .map_err(|e| config_error(&format!("Invalid TIMEZONE: {}", e)))?;

        let port = parse_or(&var, "PORT", DEFAULT_PORT)?;

        let availability_policy = match var("AVAILABILITY_POLICY") {
            Some(value) => value.parse::<AvailabilityPolicy>()?,
            None => AvailabilityPolicy::default(),
        };

        let request_timeout_secs = parse_or(&var, "REQUEST_TIMEOUT_SECS", 10)?;
        let rate_cache_ttl_secs = parse_or(&var, "RATE_CACHE_TTL_SECS", 3600)?;
        let rate_cache_capacity = parse_or(&var, "RATE_CACHE_CAPACITY", 16usize)?;
        if rate_cache_capacity == 0 {
            return Err(config_error("RATE_CACHE_CAPACITY must be at least 1"));
        }

        let max_calendars = parse_or(&var, "MAX_CALENDARS", 1000usize)?;
        if max_calendars == 0 {
            return Err(config_error("MAX_CALENDARS must be at least 1"));
        }
        let calendar_idle_secs = parse_or(&var, "CALENDAR_IDLE_SECS", 1800)?;

        // Initialize default components
        let components = COMPONENTS
            .iter()
            .map(|name| (name.to_string(), true))
            .collect();

        Ok(Config {
            api_base_url,
            timezone,
            port,
            availability_policy,
            request_timeout_secs,
            rate_cache_ttl_secs,
            rate_cache_capacity,
            max_calendars,
            calendar_idle_secs,
            components,
        })
    }

    /// Merge component toggles from TOML content over the defaults
    pub fn merge_components(&mut self, content: &str) -> AppResult<()> {
        let file_components = toml::from_str::<HashMap<String, bool>>(content)?;
        for (key, value) in file_components {
            self.components.insert(key, value);
        }
        Ok(())
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }

    /// Parsed timezone
    pub fn tz(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| config_error(&format!("Invalid timezone {}: {}", self.timezone, e)))
    }

    /// Parsed backend base URL
    pub fn api_base(&self) -> AppResult<Url> {
        Url::parse(&self.api_base_url)
            .map_err(|e| config_error(&format!("Invalid API base URL: {}", e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.rate_cache_ttl_secs)
    }

    pub fn calendar_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.calendar_idle_secs)
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| config_error(&format!("Invalid {} format", key))),
        None => Ok(default),
    }
}
