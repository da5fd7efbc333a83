use crate::error::{invalid_input, Error};
use crate::utils::time::format_instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of listing a calendar belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Vehicle,
    Apartment,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Vehicle => "vehicle",
            ItemType::Apartment => "apartment",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vehicle" => Ok(ItemType::Vehicle),
            "apartment" => Ok(ItemType::Apartment),
            other => Err(invalid_input(&format!("Unknown item type: {}", other))),
        }
    }
}

/// A vehicle or apartment offered for rental
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRef {
    pub id: String,
    pub item_type: ItemType,
}

impl ListingRef {
    pub fn new(id: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            id: id.into(),
            item_type,
        }
    }
}

impl fmt::Display for ListingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.item_type, self.id)
    }
}

/// Parameters of one availability request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub listing: ListingRef,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl AvailabilityQuery {
    /// Query string pairs in the order the backend documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("listingId", self.listing.id.clone()),
            ("itemType", self.listing.item_type.as_str().to_string()),
            ("startDate", format_instant(&self.start_date)),
            ("endDate", format_instant(&self.end_date)),
        ]
    }
}

/// Body returned by the availability endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub booked_dates: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_item_type_parsing() {
        assert_eq!("vehicle".parse::<ItemType>().unwrap(), ItemType::Vehicle);
        assert_eq!("Apartment".parse::<ItemType>().unwrap(), ItemType::Apartment);
        assert!("voucher".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_query_pairs() {
        let query = AvailabilityQuery {
            listing: ListingRef::new("V1", ItemType::Vehicle),
            start_date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap(),
        };
        let pairs = query.query_pairs();
        assert_eq!(pairs[0], ("listingId", "V1".to_string()));
        assert_eq!(pairs[1], ("itemType", "vehicle".to_string()));
        assert_eq!(pairs[2], ("startDate", "2024-06-01T00:00:00.000Z".to_string()));
        assert_eq!(pairs[3], ("endDate", "2024-06-30T23:59:59.000Z".to_string()));
    }

    #[test]
    fn test_response_shape() {
        let body = r#"{"bookedDates":["2024-06-10T00:00:00Z","2024-06-11T00:00:00Z"]}"#;
        let response: AvailabilityResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.booked_dates.len(), 2);

        // Missing field is a malformed body
        assert!(serde_json::from_str::<AvailabilityResponse>(r#"{"dates":[]}"#).is_err());
    }
}
