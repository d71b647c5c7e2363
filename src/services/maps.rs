// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Geocoding API client.

use crate::error::{Upstream, UpstreamError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const SERVICE: Upstream = Upstream::GoogleMaps;

/// Map position for a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
}

#[derive(Clone)]
pub struct GeocodingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeocodingClient {
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Resolve a free-text location to the first geocoding match.
    pub async fn geocode(&self, location: &str) -> Result<Coordinates, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::Misconfigured {
                service: SERVICE,
                reason: "missing API key".to_string(),
            })?;

        let response = self
            .http
            .get(format!("{}/geocode/json", self.base_url))
            .query(&[("address", location), ("key", api_key)])
            .send()
            .await
            .map_err(|e| transient(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(transient(format!("HTTP {}", response.status())));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| transient(format!("invalid response body: {}", e.without_url())))?;

        body.into_coordinates(location)
    }
}

fn transient(detail: String) -> UpstreamError {
    UpstreamError::Transient {
        service: SERVICE,
        detail,
    }
}

// ─── Wire Format ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GeocodeResponse {
    /// The API reports failures in `status`, usually with HTTP 200.
    fn into_coordinates(self, location: &str) -> Result<Coordinates, UpstreamError> {
        let message = self.error_message.unwrap_or_else(|| self.status.clone());
        match self.status.as_str() {
            "OK" => self
                .results
                .into_iter()
                .next()
                .map(|r| Coordinates {
                    lat: r.geometry.location.lat,
                    lng: r.geometry.location.lng,
                    formatted_address: r.formatted_address,
                })
                .ok_or_else(|| UpstreamError::LocationNotFound(location.to_string())),
            "ZERO_RESULTS" => Err(UpstreamError::LocationNotFound(location.to_string())),
            "REQUEST_DENIED" => Err(UpstreamError::Misconfigured {
                service: SERVICE,
                reason: message,
            }),
            "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => {
                tracing::warn!("Google Geocoding quota exceeded");
                Err(UpstreamError::QuotaExceeded { service: SERVICE })
            }
            _ => Err(transient(message)),
        }
    }
}
