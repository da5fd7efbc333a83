// Export components
pub mod availability;
pub mod calendar;
pub mod currency;

// Re-export the calendar entry points
pub use calendar::{CalendarHandle, CalendarRegistry, CalendarSettings, RegistryLimits};
// Re-export the currency converter
pub use currency::CurrencyConverter;
