use super::handle::CalendarHandle;
use super::models::{BookingSelection, DisplayedMonth};
use super::CalendarSettings;
use crate::components::availability::{AvailabilitySource, ListingRef};
use crate::config::Config;
use crate::error::{AppResult, Error};
use crate::utils::time::today_in;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Bounds on the number and lifetime of open calendar sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLimits {
    pub max_calendars: usize,
    /// Sessions unused for this long are closed
    pub idle_timeout: Duration,
}

impl RegistryLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_calendars: config.max_calendars,
            idle_timeout: config.calendar_idle_timeout(),
        }
    }
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            max_calendars: 1000,
            idle_timeout: Duration::from_secs(1800),
        }
    }
}

struct Session {
    handle: CalendarHandle,
    last_used: Instant,
}

/// Owner of all open calendar sessions
pub struct CalendarRegistry {
    calendars: RwLock<HashMap<Uuid, Session>>,
    source: Arc<dyn AvailabilitySource>,
    settings: CalendarSettings,
    limits: RegistryLimits,
    booking_tx: Option<mpsc::Sender<BookingSelection>>,
}

impl fmt::Debug for CalendarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarRegistry")
            .field("settings", &self.settings)
            .field("limits", &self.limits)
            .field("has_booking_sink", &self.booking_tx.is_some())
            .finish()
    }
}

impl CalendarRegistry {
    pub fn new(
        source: Arc<dyn AvailabilitySource>,
        settings: CalendarSettings,
        limits: RegistryLimits,
        booking_tx: Option<mpsc::Sender<BookingSelection>>,
    ) -> Self {
        Self {
            calendars: RwLock::new(HashMap::new()),
            source,
            settings,
            limits,
            booking_tx,
        }
    }

    pub fn limits(&self) -> RegistryLimits {
        self.limits
    }

    /// Open a calendar for a listing, showing the current month by default.
    ///
    /// When the registry is full, idle sessions are closed first. If it is
    /// still full the open is refused with [`Error::Capacity`].
    pub async fn open(
        &self,
        listing: ListingRef,
        month: Option<DisplayedMonth>,
    ) -> AppResult<(Uuid, CalendarHandle)> {
        if self.len().await >= self.limits.max_calendars {
            self.close_idle().await;
        }

        let mut calendars = self.calendars.write().await;
        if calendars.len() >= self.limits.max_calendars {
            warn!(
                "Refusing to open calendar for {}: {} sessions open",
                listing,
                calendars.len()
            );
            return Err(Error::Capacity(format!(
                "{} calendars already open",
                calendars.len()
            )));
        }

        let month =
            month.unwrap_or_else(|| DisplayedMonth::containing(today_in(&self.settings.timezone)));
        let id = Uuid::new_v4();

        info!("Opening calendar {} for {} at {}", id, listing, month);

        let handle = CalendarHandle::spawn(
            listing,
            month,
            Arc::clone(&self.source),
            self.settings.clone(),
            self.booking_tx.clone(),
        );

        calendars.insert(
            id,
            Session {
                handle: handle.clone(),
                last_used: Instant::now(),
            },
        );
        Ok((id, handle))
    }

    /// Get an open calendar, marking it as used
    pub async fn get(&self, id: &Uuid) -> AppResult<CalendarHandle> {
        let mut calendars = self.calendars.write().await;
        let session = calendars
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("Calendar {}", id)))?;

        session.last_used = Instant::now();
        Ok(session.handle.clone())
    }

    /// Close a calendar and stop its actor
    pub async fn close(&self, id: &Uuid) -> AppResult<()> {
        let session = self
            .calendars
            .write()
            .await
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("Calendar {}", id)))?;

        info!("Closing calendar {}", id);
        session.handle.shutdown().await
    }

    /// Close every session unused for longer than the idle timeout
    pub async fn close_idle(&self) -> usize {
        let now = Instant::now();
        let idle: Vec<(Uuid, Session)> = {
            let mut calendars = self.calendars.write().await;
            let ids: Vec<Uuid> = calendars
                .iter()
                .filter(|(_, session)| {
                    now.saturating_duration_since(session.last_used) >= self.limits.idle_timeout
                })
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| calendars.remove(&id).map(|session| (id, session)))
                .collect()
        };

        if !idle.is_empty() {
            info!("Closing {} idle calendars", idle.len());
        }

        let closed = idle.len();
        for (id, session) in idle {
            if let Err(e) = session.handle.shutdown().await {
                error!("Error shutting down idle calendar {}: {:?}", id, e);
            }
        }
        closed
    }

    pub async fn len(&self) -> usize {
        self.calendars.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.calendars.read().await.is_empty()
    }

    /// Shutdown all calendars
    pub async fn shutdown_all(&self) -> AppResult<()> {
        let calendars: Vec<(Uuid, Session)> = self.calendars.write().await.drain().collect();

        info!("Shutting down {} calendars", calendars.len());
        for (id, session) in calendars {
            if let Err(e) = session.handle.shutdown().await {
                error!("Error shutting down calendar {}: {:?}", id, e);
            }
        }

        Ok(())
    }
}
