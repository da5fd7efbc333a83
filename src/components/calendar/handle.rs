use super::actor::{CalendarActor, CalendarActorHandle};
use super::models::{BookingSelection, CalendarSnapshot, ClickOutcome, Direction, DisplayedMonth};
use super::CalendarSettings;
use crate::components::availability::{AvailabilitySource, ListingRef};
use crate::error::AppResult;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Handle for interacting with a calendar actor
#[derive(Clone)]
pub struct CalendarHandle {
    actor_handle: CalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl CalendarHandle {
    /// Create a new CalendarHandle and spawn the actor.
    ///
    /// The actor fetches availability for `month` right away. Committed
    /// selections are sent to `booking_tx` when one is given.
    pub fn spawn(
        listing: ListingRef,
        month: DisplayedMonth,
        source: Arc<dyn AvailabilitySource>,
        settings: CalendarSettings,
        booking_tx: Option<mpsc::Sender<BookingSelection>>,
    ) -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = CalendarActor::new(listing, month, source, settings, booking_tx);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    pub async fn navigate(&self, direction: Direction) -> AppResult<CalendarSnapshot> {
        self.actor_handle.navigate(direction).await
    }

    pub async fn set_listing(&self, listing: ListingRef) -> AppResult<CalendarSnapshot> {
        self.actor_handle.set_listing(listing).await
    }

    pub async fn click_day(&self, day: u32) -> AppResult<ClickOutcome> {
        self.actor_handle.click_day(day).await
    }

    pub async fn hover_day(&self, day: u32) -> AppResult<()> {
        self.actor_handle.hover_day(day).await
    }

    pub async fn clear_hover(&self) -> AppResult<()> {
        self.actor_handle.clear_hover().await
    }

    pub async fn snapshot(&self) -> AppResult<CalendarSnapshot> {
        self.actor_handle.snapshot().await
    }

    pub fn subscribe(&self) -> watch::Receiver<CalendarSnapshot> {
        self.actor_handle.subscribe()
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        self.actor_handle.shutdown().await
    }
}
