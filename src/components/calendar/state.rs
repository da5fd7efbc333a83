use super::booked::BookedDaySet;
use super::models::{
    AvailabilityPolicy, AvailabilityStatus, CalendarSnapshot, ClickOutcome, Direction,
    DisplayedMonth, IgnoreReason, SelectedRange, Selection,
};
use super::validator::{validate_selection, Validation};
use crate::components::availability::{AvailabilitySource, AvailabilityQuery, ListingRef};
use crate::error::AppResult;
use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use tracing::{debug, warn};

/// Identifies one availability fetch. Only the ticket of the latest refresh
/// may update the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    pub generation: u64,
    pub listing: ListingRef,
    pub month: DisplayedMonth,
}

/// Local state of one availability calendar
#[derive(Debug, Clone)]
pub struct CalendarState {
    listing: ListingRef,
    month: DisplayedMonth,
    booked: BookedDaySet,
    status: AvailabilityStatus,
    selection: Selection,
    hover: Option<NaiveDate>,
    generation: u64,
    policy: AvailabilityPolicy,
}

impl CalendarState {
    pub fn new(listing: ListingRef, month: DisplayedMonth, policy: AvailabilityPolicy) -> Self {
        Self {
            listing,
            month,
            booked: BookedDaySet::empty(),
            status: AvailabilityStatus::Loading,
            selection: Selection::Idle,
            hover: None,
            generation: 0,
            policy,
        }
    }

    pub fn listing(&self) -> &ListingRef {
        &self.listing
    }

    pub fn month(&self) -> DisplayedMonth {
        self.month
    }

    pub fn booked(&self) -> &BookedDaySet {
        &self.booked
    }

    pub fn status(&self) -> AvailabilityStatus {
        self.status
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn hover(&self) -> Option<NaiveDate> {
        self.hover
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Move the displayed month and start a refresh for it
    pub fn navigate(&mut self, direction: Direction) -> RefreshTicket {
        self.month = self.month.shifted(direction);
        self.begin_refresh()
    }

    /// Switch to another listing, dropping the selection
    pub fn set_listing(&mut self, listing: ListingRef) -> RefreshTicket {
        self.listing = listing;
        self.selection = Selection::Idle;
        self.hover = None;
        self.begin_refresh()
    }

    /// Invalidate earlier refreshes and issue a ticket for a new one
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        self.status = AvailabilityStatus::Loading;
        self.booked = BookedDaySet::empty();
        RefreshTicket {
            generation: self.generation,
            listing: self.listing.clone(),
            month: self.month,
        }
    }

    /// Apply a fetch result. Returns false when the ticket is stale.
    pub fn apply_availability(
        &mut self,
        ticket: &RefreshTicket,
        result: AppResult<Vec<String>>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale availability for {} {} (generation {}, current {})",
                ticket.listing, ticket.month, ticket.generation, self.generation
            );
            return false;
        }

        match result {
            Ok(dates) => {
                self.booked = BookedDaySet::from_iso_dates(&dates, &ticket.month);
                self.status = AvailabilityStatus::Loaded;
            }
            Err(e) => {
                warn!(
                    "Availability for {} {} unavailable, showing all days as free: {}",
                    ticket.listing, ticket.month, e
                );
                self.booked = BookedDaySet::empty();
                self.status = AvailabilityStatus::Unavailable;
            }
        }
        true
    }

    /// Fetch and apply availability for the displayed month in one step
    pub async fn refresh(&mut self, source: &dyn AvailabilitySource, tz: &Tz) -> bool {
        let ticket = self.begin_refresh();
        let result = refresh_availability(source, &ticket, tz).await;
        self.apply_availability(&ticket, result)
    }

    /// Handle a click on a day number of the displayed month
    pub fn on_day_click(&mut self, day: u32, today: NaiveDate) -> ClickOutcome {
        let Some(date) = self.month.date(day) else {
            return ignored(IgnoreReason::InvalidDay);
        };
        if self.booked.contains(day) {
            return ignored(IgnoreReason::Booked);
        }
        if date < today {
            return ignored(IgnoreReason::Past);
        }

        match self.selection {
            Selection::Selecting { start } if date > start && self.month.contains(&start) => {
                self.try_commit(start, date)
            }
            // Idle, complete range, earlier/equal day, or a start left in another month
            _ => {
                self.selection = Selection::Selecting { start: date };
                ClickOutcome::Started { start: date }
            }
        }
    }

    fn try_commit(&mut self, start: NaiveDate, end: NaiveDate) -> ClickOutcome {
        if self.policy == AvailabilityPolicy::FailClosed
            && self.status != AvailabilityStatus::Loaded
        {
            return ignored(IgnoreReason::AvailabilityUnknown);
        }

        match validate_selection(start.day(), end.day(), &self.booked) {
            Validation::Accept => {
                self.selection = Selection::Committed { start, end };
                ClickOutcome::Committed {
                    range: SelectedRange {
                        start_date: start,
                        end_date: end,
                    },
                }
            }
            Validation::Reject { booked_day } => {
                debug!("Range {} - {} crosses booked day {}", start, end, booked_day);
                ignored(IgnoreReason::RangeBlocked { booked_day })
            }
        }
    }

    pub fn on_day_hover(&mut self, day: u32) {
        if let Some(date) = self.month.date(day) {
            self.hover = Some(date);
        }
    }

    pub fn on_hover_clear(&mut self) {
        self.hover = None;
    }

    /// Range between the pending start and the hovered day
    pub fn preview_range(&self) -> Option<SelectedRange> {
        match (self.selection, self.hover) {
            (Selection::Selecting { start }, Some(hover)) if hover > start => Some(SelectedRange {
                start_date: start,
                end_date: hover,
            }),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> CalendarSnapshot {
        CalendarSnapshot {
            listing: self.listing.clone(),
            year: self.month.year(),
            month: self.month.month(),
            days_in_month: self.month.days(),
            status: self.status,
            booked_days: self.booked.days(),
            selection: self.selection,
            hover: self.hover,
            preview: self.preview_range(),
            generation: self.generation,
        }
    }
}

fn ignored(reason: IgnoreReason) -> ClickOutcome {
    ClickOutcome::Ignored { reason }
}

/// Query the source for the ticket's listing and month
pub async fn refresh_availability(
    source: &dyn AvailabilitySource,
    ticket: &RefreshTicket,
    tz: &Tz,
) -> AppResult<Vec<String>> {
    let (start_date, end_date) = ticket.month.bounds(tz)?;
    let query = AvailabilityQuery {
        listing: ticket.listing.clone(),
        start_date,
        end_date,
    };
    source.booked_dates(&query).await
}
