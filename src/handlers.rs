use crate::components::availability::{ItemType, ListingRef};
use crate::components::calendar::{CalendarSnapshot, ClickOutcome, Direction, DisplayedMonth};
use crate::components::currency::{format_price, CurrencyCode};
use crate::components::{CalendarRegistry, CurrencyConverter};
use crate::config::{Config, COMPONENTS};
use crate::error::{invalid_input, Error};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub calendars: Arc<CalendarRegistry>,
    pub currency: Arc<CurrencyConverter>,
}

/// Error returned from handlers
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Capacity(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Availability(_) | Error::Currency(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Mount the routes of every enabled component
pub fn build_router(config: &Config, state: AppState) -> Router {
    let mut app = Router::new().route("/health", get(health_handler));

    if config.is_component_enabled("calendar") {
        app = app
            .route("/calendars", post(open_calendar_handler))
            .route(
                "/calendars/{id}",
                get(get_calendar_handler).delete(close_calendar_handler),
            )
            .route("/calendars/{id}/navigate", post(navigate_handler))
            .route("/calendars/{id}/listing", post(set_listing_handler))
            .route("/calendars/{id}/click", post(click_handler))
            .route("/calendars/{id}/hover", post(hover_handler));
    } else {
        info!("Calendar component disabled");
    }

    if config.is_component_enabled("currency") {
        app = app.route("/currency/convert", get(convert_handler));
    } else {
        info!("Currency component disabled");
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for health checks
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let components: serde_json::Map<String, serde_json::Value> = COMPONENTS
        .iter()
        .map(|name| (name.to_string(), json!(state.config.is_component_enabled(name))))
        .collect();

    Json(json!({
        "status": "ok",
        "openCalendars": state.calendars.len().await,
        "components": components,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    pub listing_id: String,
    pub item_type: ItemType,
}

impl ListingRequest {
    fn into_listing(self) -> Result<ListingRef, Error> {
        let id = self.listing_id.trim();
        if id.is_empty() {
            return Err(invalid_input("listingId must not be empty"));
        }
        Ok(ListingRef::new(id, self.item_type))
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenCalendarRequest {
    #[serde(flatten)]
    pub listing: ListingRequest,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenCalendarResponse {
    pub calendar_id: Uuid,
    pub snapshot: CalendarSnapshot,
}

/// Open a calendar session for a listing
pub async fn open_calendar_handler(
    State(state): State<AppState>,
    Json(request): Json<OpenCalendarRequest>,
) -> ApiResult<(StatusCode, Json<OpenCalendarResponse>)> {
    let month = match (request.year, request.month) {
        (Some(year), Some(month)) => Some(DisplayedMonth::new(year, month)?),
        (None, None) => None,
        _ => return Err(invalid_input("year and month must be given together").into()),
    };
    let listing = request.listing.into_listing()?;

    let (calendar_id, handle) = state.calendars.open(listing, month).await?;
    let snapshot = handle.snapshot().await?;

    Ok((
        StatusCode::CREATED,
        Json(OpenCalendarResponse {
            calendar_id,
            snapshot,
        }),
    ))
}

/// Current state of a calendar
pub async fn get_calendar_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CalendarSnapshot>> {
    let handle = state.calendars.get(&id).await?;
    Ok(Json(handle.snapshot().await?))
}

/// Close a calendar session
pub async fn close_calendar_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.calendars.close(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub direction: Direction,
}

/// Move to the previous or next month
pub async fn navigate_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<NavigateRequest>,
) -> ApiResult<Json<CalendarSnapshot>> {
    let handle = state.calendars.get(&id).await?;
    Ok(Json(handle.navigate(request.direction).await?))
}

/// Point the calendar at another listing
pub async fn set_listing_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ListingRequest>,
) -> ApiResult<Json<CalendarSnapshot>> {
    let listing = request.into_listing()?;
    let handle = state.calendars.get(&id).await?;
    Ok(Json(handle.set_listing(listing).await?))
}

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub day: u32,
}

#[derive(Debug, Serialize)]
pub struct ClickResponse {
    pub outcome: ClickOutcome,
    pub snapshot: CalendarSnapshot,
}

/// Click a day of the displayed month
pub async fn click_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClickRequest>,
) -> ApiResult<Json<ClickResponse>> {
    let handle = state.calendars.get(&id).await?;
    let outcome = handle.click_day(request.day).await?;
    let snapshot = handle.snapshot().await?;
    Ok(Json(ClickResponse { outcome, snapshot }))
}

#[derive(Debug, Deserialize)]
pub struct HoverRequest {
    pub day: Option<u32>,
}

/// Hover a day, or clear the hover with `null`
pub async fn hover_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<HoverRequest>,
) -> ApiResult<Json<CalendarSnapshot>> {
    let handle = state.calendars.get(&id).await?;
    match request.day {
        Some(day) => handle.hover_day(day).await?,
        None => handle.clear_hover().await?,
    }
    Ok(Json(handle.snapshot().await?))
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub amount: f64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub converted: f64,
    pub formatted: String,
}

/// Convert a price between currencies
pub async fn convert_handler(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
) -> ApiResult<Json<ConvertResponse>> {
    let from: CurrencyCode = query.from.parse()?;
    let to: CurrencyCode = query.to.parse()?;

    let converted = state.currency.convert(query.amount, &from, &to).await?;
    let formatted = format_price(converted, &to);

    Ok(Json(ConvertResponse {
        amount: query.amount,
        from,
        to,
        converted,
        formatted,
    }))
}
