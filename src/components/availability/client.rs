use super::models::{AvailabilityQuery, AvailabilityResponse};
use super::AvailabilitySource;
use crate::error::{availability_error, AppResult};
use crate::utils::http::{build_client, endpoint};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Path of the availability endpoint under the API base URL
pub const AVAILABILITY_PATH: &str = "bookings/availability";

/// Availability source backed by the marketplace REST API
#[derive(Debug, Clone)]
pub struct HttpAvailabilitySource {
    client: Client,
    endpoint: Url,
}

impl HttpAvailabilitySource {
    /// Create a new source for the given API base URL
    pub fn new(api_base: &Url, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint(api_base, AVAILABILITY_PATH)?,
        })
    }

    /// Full request URL for a query
    pub fn request_url(&self, query: &AvailabilityQuery) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }
}

#[async_trait]
impl AvailabilitySource for HttpAvailabilitySource {
    async fn booked_dates(&self, query: &AvailabilityQuery) -> AppResult<Vec<String>> {
        let url = self.request_url(query);
        debug!("Fetching availability from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| availability_error(&format!("Failed to fetch availability: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(availability_error(&format!(
                "Failed to fetch availability: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: AvailabilityResponse = response.json().await.map_err(|e| {
            availability_error(&format!("Failed to parse availability response: {}", e))
        })?;

        Ok(body.booked_dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::availability::{ItemType, ListingRef};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_request_url() {
        let base = Url::parse("https://rentals.example.com/api").unwrap();
        let source = HttpAvailabilitySource::new(&base, Duration::from_secs(5)).unwrap();
        let query = AvailabilityQuery {
            listing: ListingRef::new("A 7", ItemType::Apartment),
            start_date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap(),
        };

        let url = source.request_url(&query);
        assert_eq!(url.path(), "/api/bookings/availability");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("listingId".to_string(), "A 7".to_string()));
        assert_eq!(pairs[1], ("itemType".to_string(), "apartment".to_string()));
        assert_eq!(
            pairs[2],
            ("startDate".to_string(), "2024-06-01T00:00:00.000Z".to_string())
        );
    }
}
