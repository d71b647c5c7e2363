// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather lookup routes (current conditions and daily forecast).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{BucketMode, CurrentConditions, DailyForecast};
use crate::services::forecast::{bucket_by_day_in, day_label, offset_from_secs, round_display};
use crate::services::history::validate_location;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::{FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Current-weather route; authentication is optional (see routes/mod.rs).
pub fn lookup_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/weather", get(get_weather))
}

/// Forecast-only route (public).
pub fn forecast_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/weather/forecast", get(get_forecast))
}

#[derive(Deserialize)]
struct WeatherQuery {
    location: Option<String>,
}

#[derive(Deserialize)]
struct ForecastQuery {
    location: Option<String>,
    /// `first` (default) or `mean`
    mode: Option<String>,
}

// ─── Response Types ──────────────────────────────────────────

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurrentWeather {
    pub location_name: String,
    pub temperature: f64,
    /// Rounded to a whole degree
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub display_temp: i64,
    pub feels_like: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl From<CurrentConditions> for CurrentWeather {
    fn from(c: CurrentConditions) -> Self {
        let (description, icon) = match c.condition {
            Some(cond) => (Some(cond.description), Some(cond.icon)),
            None => (None, None),
        };
        Self {
            location_name: c.location_name,
            temperature: c.temperature,
            display_temp: round_display(c.temperature),
            feels_like: c.feels_like,
            humidity: c.humidity,
            wind_speed: c.wind_speed,
            description,
            icon,
        }
    }
}

/// One forecast card.
#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyForecastView {
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    /// Weekday name, e.g. "Monday"
    pub day: String,
    /// Short date, e.g. "Jun 3"
    pub label: String,
    pub temperature: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub display_temp: i64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
}

impl DailyForecastView {
    fn new(daily: DailyForecast, offset: FixedOffset) -> Self {
        let label = day_label(Some(daily.timestamp), offset);
        Self {
            date: daily.date.format("%Y-%m-%d").to_string(),
            day: label.day,
            label: label.date,
            display_temp: daily.display_temp,
            temperature: daily.temperature,
            humidity: daily.humidity,
            wind_speed: daily.wind_speed,
            description: daily.condition.description,
            icon: daily.condition.icon,
        }
    }
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeatherResponse {
    pub location: String,
    pub current: CurrentWeather,
    pub forecast: Vec<DailyForecastView>,
    /// True when the lookup was saved to the caller's history
    pub recorded: bool,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ForecastResponse {
    pub location: String,
    pub city: Option<String>,
    pub mode: String,
    pub days: Vec<DailyForecastView>,
}

// ─── Handlers ────────────────────────────────────────────────

/// Current conditions plus a first-wins daily forecast.
///
/// Authenticated lookups are also written to the search log and history.
/// Those writes never fail the lookup.
async fn get_weather(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>> {
    let location = validate_location(params.location.as_deref().unwrap_or_default())?;

    let (current, feed) = tokio::try_join!(
        state.weather.current(&location),
        state.weather.forecast(&location)
    )?;

    let offset = offset_from_secs(feed.timezone_offset_secs);
    let forecast = bucket_by_day_in(&feed.samples, BucketMode::First, offset)
        .into_iter()
        .map(|d| DailyForecastView::new(d, offset))
        .collect();

    let recorded = match user {
        Some(Extension(user)) => record_lookup(&state, &user, &location, &current).await,
        None => false,
    };

    Ok(Json(WeatherResponse {
        location,
        current: current.into(),
        forecast,
        recorded,
    }))
}

async fn record_lookup(
    state: &AppState,
    user: &AuthUser,
    location: &str,
    current: &CurrentConditions,
) -> bool {
    let now = Utc::now();

    if let Err(e) = state.searches.record(&user.user_id, location, now).await {
        tracing::warn!(user_id = %user.user_id, error = %e, "Failed to record search");
    }

    match state
        .history
        .record_observation(&user.user_id, location, current, now.date_naive(), now)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(user_id = %user.user_id, error = %e, "Failed to record history");
            false
        }
    }
}

/// Forecast only, bucketed with the requested mode.
async fn get_forecast(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>> {
    let location = validate_location(params.location.as_deref().unwrap_or_default())?;
    let mode = parse_mode(params.mode.as_deref())?;

    let feed = state.weather.forecast(&location).await?;
    let offset = offset_from_secs(feed.timezone_offset_secs);

    let days = bucket_by_day_in(&feed.samples, mode, offset)
        .into_iter()
        .map(|d| DailyForecastView::new(d, offset))
        .collect();

    tracing::debug!(location = %location, ?mode, "Served forecast");

    Ok(Json(ForecastResponse {
        location,
        city: feed.city,
        mode: mode_name(mode).to_string(),
        days,
    }))
}

fn parse_mode(raw: Option<&str>) -> Result<BucketMode> {
    match raw.map(str::trim) {
        None | Some("") | Some("first") => Ok(BucketMode::First),
        Some("mean") => Ok(BucketMode::Mean),
        Some(other) => Err(AppError::Validation(format!(
            "mode must be \"first\" or \"mean\", got {:?}",
            other
        ))),
    }
}

fn mode_name(mode: BucketMode) -> &'static str {
    match mode {
        BucketMode::First => "first",
        BucketMode::Mean => "mean",
    }
}
