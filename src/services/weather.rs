// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External weather source (OpenWeatherMap).
//!
//! Handles:
//! - Current conditions lookup by free-text location
//! - 5-day / 3-hour forecast lookup by free-text location
//! - Mapping upstream failures onto [`UpstreamError`] (no retries)

use crate::error::{Upstream, UpstreamError};
use crate::models::{Condition, CurrentConditions, ForecastFeed, WeatherSample};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const SERVICE: Upstream = Upstream::OpenWeather;

/// Source of live weather data for a location.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current conditions; fails with `NoTemperature` when the reply has none.
    async fn current(&self, location: &str) -> Result<CurrentConditions, UpstreamError>;

    /// Raw 3-hourly forecast samples.
    async fn forecast(&self, location: &str) -> Result<ForecastFeed, UpstreamError>;
}

/// OpenWeatherMap API client.
#[derive(Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    /// Create a client. A missing key is reported on first use, not here.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// GET `{base_url}/{endpoint}?q={location}&units=metric` and parse the JSON reply.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        location: &str,
    ) -> Result<T, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::Misconfigured {
                service: SERVICE,
                reason: "missing API key".to_string(),
            })?;

        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, location, "Requesting OpenWeatherMap");

        // without_url(): the query string carries the API key.
        let response = self
            .http
            .get(&url)
            .query(&[("q", location), ("units", "metric"), ("appid", api_key)])
            .send()
            .await
            .map_err(|e| UpstreamError::Transient {
                service: SERVICE,
                detail: e.without_url().to_string(),
            })?;

        check_response_json(response, location).await
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, location: &str) -> Result<CurrentConditions, UpstreamError> {
        let body: CurrentResponse = self.get_json("weather", location).await?;
        body.into_conditions()
    }

    async fn forecast(&self, location: &str) -> Result<ForecastFeed, UpstreamError> {
        let body: ForecastResponse = self.get_json("forecast", location).await?;
        Ok(body.into_feed())
    }
}

/// Check response status and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
    location: &str,
) -> Result<T, UpstreamError> {
    let status = response.status();

    if status.is_success() {
        return response.json().await.map_err(|e| UpstreamError::Transient {
            service: SERVICE,
            detail: format!("invalid response body: {}", e.without_url()),
        });
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| format!("HTTP {}", status));

    match status.as_u16() {
        401 => Err(UpstreamError::Misconfigured {
            service: SERVICE,
            reason: format!("API key rejected: {}", message),
        }),
        404 => Err(UpstreamError::LocationNotFound(location.to_string())),
        429 => {
            tracing::warn!("OpenWeatherMap rate limit hit (429)");
            Err(UpstreamError::QuotaExceeded { service: SERVICE })
        }
        _ => Err(UpstreamError::Transient {
            service: SERVICE,
            detail: message,
        }),
    }
}

// ─── Wire Format ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    humidity: f64,
}

#[derive(Debug, Default, Deserialize)]
struct WindBlock {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    name: String,
    main: Option<MainBlock>,
    weather: Option<Vec<Condition>>,
    wind: Option<WindBlock>,
    dt: Option<i64>,
}

impl CurrentResponse {
    fn into_conditions(self) -> Result<CurrentConditions, UpstreamError> {
        let main = self.main.ok_or(UpstreamError::NoTemperature { service: SERVICE })?;
        let temperature = main
            .temp
            .filter(|t| t.is_finite())
            .ok_or(UpstreamError::NoTemperature { service: SERVICE })?;

        Ok(CurrentConditions {
            location_name: self.name,
            temperature,
            feels_like: main.feels_like,
            humidity: main.humidity,
            wind_speed: self.wind.unwrap_or_default().speed,
            condition: self.weather.into_iter().flatten().next(),
            observed_at: self.dt,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    /// Items are decoded one by one so a malformed entry only loses itself.
    #[serde(default)]
    list: Vec<serde_json::Value>,
    city: Option<CityBlock>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: Option<i64>,
    main: Option<MainBlock>,
    weather: Option<Vec<Condition>>,
    wind: Option<WindBlock>,
}

#[derive(Debug, Deserialize)]
struct CityBlock {
    #[serde(default)]
    name: String,
    /// Shift in seconds from UTC
    #[serde(default)]
    timezone: i32,
}

impl ForecastResponse {
    fn into_feed(self) -> ForecastFeed {
        let total = self.list.len();
        let samples: Vec<WeatherSample> = self
            .list
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<ForecastItem>(item) {
                Ok(item) => item.into_sample(),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed forecast item");
                    None
                }
            })
            .collect();

        if samples.len() < total {
            tracing::debug!(
                dropped = total - samples.len(),
                "Dropped unusable forecast samples"
            );
        }

        let (city, timezone_offset_secs) = match self.city {
            Some(c) => (Some(c.name).filter(|n| !n.is_empty()), c.timezone),
            None => (None, 0),
        };

        ForecastFeed {
            city,
            timezone_offset_secs,
            samples,
        }
    }
}

impl ForecastItem {
    /// Samples without a temperature carry nothing to bucket.
    fn into_sample(self) -> Option<WeatherSample> {
        let main = self.main?;
        let temperature = main.temp?;
        Some(WeatherSample {
            timestamp: self.dt,
            temperature,
            feels_like: main.feels_like,
            humidity: main.humidity,
            wind_speed: self.wind.unwrap_or_default().speed,
            conditions: self.weather.unwrap_or_default(),
        })
    }
}
