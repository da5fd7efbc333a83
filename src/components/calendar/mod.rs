mod actor;
pub mod booked;
mod handle;
pub mod models;
mod registry;
pub mod state;
pub mod validator;

pub use booked::BookedDaySet;
pub use handle::CalendarHandle;
pub use models::{
    AvailabilityPolicy, AvailabilityStatus, BookingSelection, CalendarSnapshot, ClickOutcome,
    Direction, DisplayedMonth, IgnoreReason, SelectedRange, Selection,
};
pub use registry::{CalendarRegistry, RegistryLimits};
pub use state::{CalendarState, RefreshTicket};
pub use validator::{validate_selection, Validation};

use crate::config::Config;
use crate::error::AppResult;
use chrono_tz::Tz;

/// Runtime settings shared by all calendars
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    /// Timezone that decides "today" and month boundaries
    pub timezone: Tz,
    pub policy: AvailabilityPolicy,
}

impl CalendarSettings {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(Self {
            timezone: config.tz()?,
            policy: config.availability_policy,
        })
    }
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            policy: AvailabilityPolicy::FailOpen,
        }
    }
}
