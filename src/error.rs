use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(rental::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(rental::config))]
    Config(String),

    #[error("Availability API error: {0}")]
    #[diagnostic(code(rental::availability))]
    Availability(String),

    #[error("Currency error: {0}")]
    #[diagnostic(code(rental::currency))]
    Currency(String),

    #[error("Calendar error: {0}")]
    #[diagnostic(code(rental::calendar))]
    Calendar(String),

    #[error("Invalid input: {0}")]
    #[diagnostic(code(rental::invalid_input))]
    InvalidInput(String),

    #[error("Capacity reached: {0}")]
    #[diagnostic(code(rental::capacity))]
    Capacity(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(rental::not_found))]
    NotFound(String),

    #[error(transparent)]
    #[diagnostic(code(rental::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(rental::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(rental::other))]
    Other(String),
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create availability API errors
pub fn availability_error(message: &str) -> Error {
    Error::Availability(message.to_string())
}

/// Helper to create currency errors
pub fn currency_error(message: &str) -> Error {
    Error::Currency(message.to_string())
}

/// Helper to create invalid input errors
pub fn invalid_input(message: &str) -> Error {
    Error::InvalidInput(message.to_string())
}

/// Helper to create calendar errors
pub fn calendar_error(message: &str) -> Error {
    Error::Calendar(message.to_string())
}
