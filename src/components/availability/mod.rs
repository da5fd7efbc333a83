mod client;
pub mod models;

pub use client::{HttpAvailabilitySource, AVAILABILITY_PATH};
pub use models::{AvailabilityQuery, AvailabilityResponse, ItemType, ListingRef};

use crate::error::AppResult;
use async_trait::async_trait;

/// Provider of booked dates for a listing
#[async_trait]
pub trait AvailabilitySource: Send + Sync + 'static {
    /// ISO date strings that fall inside a booked period within the query window
    async fn booked_dates(&self, query: &AvailabilityQuery) -> AppResult<Vec<String>>;
}
