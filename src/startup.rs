use crate::shutdown;
use rental_calendar::components::availability::{AvailabilitySource, HttpAvailabilitySource};
use rental_calendar::components::calendar::BookingSelection;
use rental_calendar::components::currency::{HttpRateSource, RateSource};
use rental_calendar::components::{
    CalendarRegistry, CalendarSettings, CurrencyConverter, RegistryLimits,
};
use rental_calendar::config::Config;
use rental_calendar::error::Error;
use rental_calendar::handlers::{build_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Capacity of the channel feeding committed selections to the booking form
const BOOKING_CHANNEL_CAPACITY: usize = 64;

/// How often idle calendar sessions are swept
const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub fn load_config() -> miette::Result<Arc<Config>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(config)),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Build the shared state, router and run the server until shutdown
pub async fn start_server(config: Arc<Config>) -> miette::Result<()> {
    let api_base = config.api_base()?;
    let settings = CalendarSettings::from_config(&config)?;
    info!(
        "Using backend {} with timezone {} and {:?} availability",
        api_base, settings.timezone, settings.policy
    );

    // Availability and exchange rates both come from the marketplace backend
    let availability: Arc<dyn AvailabilitySource> =
        Arc::new(HttpAvailabilitySource::new(&api_base, config.request_timeout())?);
    let rates: Arc<dyn RateSource> =
        Arc::new(HttpRateSource::new(&api_base, config.request_timeout())?);

    // Committed selections go to the booking form
    let (booking_tx, booking_rx) = mpsc::channel(BOOKING_CHANNEL_CAPACITY);
    tokio::spawn(run_booking_form(booking_rx));

    let calendars = Arc::new(CalendarRegistry::new(
        availability,
        settings,
        RegistryLimits::from_config(&config),
        Some(booking_tx),
    ));
    let currency = Arc::new(CurrencyConverter::new(
        rates,
        config.rate_cache_capacity,
        config.rate_cache_ttl(),
    ));

    let state = AppState {
        config: Arc::clone(&config),
        calendars: Arc::clone(&calendars),
        currency,
    };

    let app = build_router(&config, state);

    // Spawn signal handler task
    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    let sweep_token = shutdown_token.clone();
    tokio::spawn(sweep_idle_calendars(Arc::clone(&calendars), sweep_token));
    tokio::spawn(async move {
        shutdown::handle_signals(signal_token, calendars).await;
    });

    // Bind to address and run server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(Error::from)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
        .await
        .map_err(Error::from)?;

    info!("Server stopped");
    Ok(())
}

/// Periodically close calendars nobody has used within the idle timeout
async fn sweep_idle_calendars(calendars: Arc<CalendarRegistry>, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(IDLE_SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                let closed = calendars.close_idle().await;
                debug!("Idle sweep closed {} calendars", closed);
            }
        }
    }
}

/// Stand-in for the booking form: records every committed selection
async fn run_booking_form(mut booking_rx: mpsc::Receiver<BookingSelection>) {
    while let Some(selection) = booking_rx.recv().await {
        match serde_json::to_string(&selection) {
            Ok(payload) => info!("Booking form received selection: {}", payload),
            Err(e) => error!("Failed to serialize booking selection: {}", e),
        }
    }
    info!("Booking form channel closed");
}
