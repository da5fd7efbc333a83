use super::models::{BookingSelection, CalendarSnapshot, ClickOutcome, Direction, DisplayedMonth};
use super::state::{refresh_availability, CalendarState, RefreshTicket};
use super::CalendarSettings;
use crate::components::availability::{AvailabilitySource, ListingRef};
use crate::error::{calendar_error, AppResult};
use crate::utils::time::today_in;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The calendar actor that processes UI events for one calendar
pub struct CalendarActor {
    state: CalendarState,
    settings: CalendarSettings,
    source: Arc<dyn AvailabilitySource>,
    command_rx: mpsc::Receiver<CalendarCommand>,
    loaded_tx: mpsc::Sender<AvailabilityLoaded>,
    loaded_rx: mpsc::Receiver<AvailabilityLoaded>,
    in_flight: Option<JoinHandle<()>>,
    booking_tx: Option<mpsc::Sender<BookingSelection>>,
    snapshot_tx: watch::Sender<CalendarSnapshot>,
}

/// Commands that can be sent to the calendar actor
pub enum CalendarCommand {
    Navigate(Direction, oneshot::Sender<CalendarSnapshot>),
    SetListing(ListingRef, oneshot::Sender<CalendarSnapshot>),
    ClickDay(u32, oneshot::Sender<ClickOutcome>),
    HoverDay(u32),
    ClearHover,
    Snapshot(oneshot::Sender<CalendarSnapshot>),
    Shutdown,
}

/// Result of a background availability fetch
struct AvailabilityLoaded {
    ticket: RefreshTicket,
    result: AppResult<Vec<String>>,
}

/// Handle for communicating with the calendar actor
#[derive(Clone)]
pub struct CalendarActorHandle {
    command_tx: mpsc::Sender<CalendarCommand>,
    snapshot_rx: watch::Receiver<CalendarSnapshot>,
}

impl CalendarActorHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> CalendarCommand,
    ) -> AppResult<T> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(build(response_tx))
            .await
            .map_err(|e| calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .await
            .map_err(|_| calendar_error("Response channel closed"))
    }

    async fn notify(&self, command: CalendarCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| calendar_error(&format!("Actor mailbox error: {}", e)))
    }

    /// Show the previous or next month
    pub async fn navigate(&self, direction: Direction) -> AppResult<CalendarSnapshot> {
        self.request(|tx| CalendarCommand::Navigate(direction, tx)).await
    }

    /// Switch the calendar to another listing
    pub async fn set_listing(&self, listing: ListingRef) -> AppResult<CalendarSnapshot> {
        self.request(|tx| CalendarCommand::SetListing(listing, tx)).await
    }

    /// Click a day of the displayed month
    pub async fn click_day(&self, day: u32) -> AppResult<ClickOutcome> {
        self.request(|tx| CalendarCommand::ClickDay(day, tx)).await
    }

    pub async fn hover_day(&self, day: u32) -> AppResult<()> {
        self.notify(CalendarCommand::HoverDay(day)).await
    }

    pub async fn clear_hover(&self) -> AppResult<()> {
        self.notify(CalendarCommand::ClearHover).await
    }

    /// Current state of the calendar
    pub async fn snapshot(&self) -> AppResult<CalendarSnapshot> {
        self.request(CalendarCommand::Snapshot).await
    }

    /// Watch every state change, including background availability loads
    pub fn subscribe(&self) -> watch::Receiver<CalendarSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(CalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl CalendarActor {
    /// Create a new actor and return its handle
    pub fn new(
        listing: ListingRef,
        month: DisplayedMonth,
        source: Arc<dyn AvailabilitySource>,
        settings: CalendarSettings,
        booking_tx: Option<mpsc::Sender<BookingSelection>>,
    ) -> (Self, CalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (loaded_tx, loaded_rx) = mpsc::channel(8);

        let state = CalendarState::new(listing, month, settings.policy);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

        let actor = Self {
            state,
            settings,
            source,
            command_rx,
            loaded_tx,
            loaded_rx,
            in_flight: None,
            booking_tx,
            snapshot_tx,
        };

        let handle = CalendarActorHandle {
            command_tx,
            snapshot_rx,
        };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!(
            "Calendar actor started for {} at {}",
            self.state.listing(),
            self.state.month()
        );

        let ticket = self.state.begin_refresh();
        self.start_fetch(ticket);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(CalendarCommand::Shutdown) | None => {
                        info!("Calendar actor shutting down");
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(loaded) = self.loaded_rx.recv() => {
                    if self.state.apply_availability(&loaded.ticket, loaded.result) {
                        self.publish();
                    }
                }
            }
        }

        if let Some(task) = self.in_flight.take() {
            task.abort();
        }

        info!("Calendar actor shut down");
    }

    fn handle_command(&mut self, cmd: CalendarCommand) {
        match cmd {
            CalendarCommand::Navigate(direction, response_tx) => {
                let ticket = self.state.navigate(direction);
                self.start_fetch(ticket);
                let _ = response_tx.send(self.state.snapshot());
            }
            CalendarCommand::SetListing(listing, response_tx) => {
                let ticket = self.state.set_listing(listing);
                self.start_fetch(ticket);
                let _ = response_tx.send(self.state.snapshot());
            }
            CalendarCommand::ClickDay(day, response_tx) => {
                let today = today_in(&self.settings.timezone);
                let outcome = self.state.on_day_click(day, today);
                if let ClickOutcome::Committed { range } = outcome {
                    self.emit_selection(BookingSelection {
                        listing: self.state.listing().clone(),
                        range,
                    });
                }
                self.publish();
                let _ = response_tx.send(outcome);
            }
            CalendarCommand::HoverDay(day) => {
                self.state.on_day_hover(day);
                self.publish();
            }
            CalendarCommand::ClearHover => {
                self.state.on_hover_clear();
                self.publish();
            }
            CalendarCommand::Snapshot(response_tx) => {
                let _ = response_tx.send(self.state.snapshot());
            }
            CalendarCommand::Shutdown => {}
        }
    }

    /// Spawn the fetch for a ticket, aborting the one it supersedes
    fn start_fetch(&mut self, ticket: RefreshTicket) {
        if let Some(previous) = self.in_flight.take() {
            if !previous.is_finished() {
                debug!("Aborting superseded availability fetch");
                previous.abort();
            }
        }

        let source = Arc::clone(&self.source);
        let loaded_tx = self.loaded_tx.clone();
        let tz = self.settings.timezone;

        self.in_flight = Some(tokio::spawn(async move {
            let result = refresh_availability(source.as_ref(), &ticket, &tz).await;
            let _ = loaded_tx.send(AvailabilityLoaded { ticket, result }).await;
        }));

        self.publish();
    }

    fn emit_selection(&self, selection: BookingSelection) {
        let Some(booking_tx) = &self.booking_tx else {
            return;
        };

        info!(
            "Booking range selected for {}: {} - {}",
            selection.listing, selection.range.start_date, selection.range.end_date
        );

        match booking_tx.try_send(selection) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Booking form channel full, selection dropped"),
            Err(TrySendError::Closed(_)) => warn!("Booking form channel closed, selection dropped"),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.snapshot());
    }
}
