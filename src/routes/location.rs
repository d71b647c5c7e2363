// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location details: map coordinates and related travel videos.

use crate::error::{Result, UpstreamError};
use crate::services::history::validate_location;
use crate::services::maps::Coordinates;
use crate::services::videos::Video;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/location", get(get_location))
}

#[derive(Deserialize)]
struct LocationQuery {
    location: Option<String>,
}

/// Each half fails independently; a failure is reported in its `*_error` slot.
#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LocationResponse {
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub map_error: Option<String>,
    pub videos: Vec<Video>,
    pub videos_error: Option<String>,
}

async fn get_location(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocationQuery>,
) -> Result<Json<LocationResponse>> {
    let location = validate_location(params.location.as_deref().unwrap_or_default())?;

    let (coordinates, videos) = tokio::join!(
        state.geocoder.geocode(&location),
        state.videos.travel_videos(&location)
    );

    let (coordinates, map_error) = split(coordinates);
    let (videos, videos_error) = split(videos);

    Ok(Json(LocationResponse {
        location,
        coordinates,
        map_error,
        videos: videos.unwrap_or_default(),
        videos_error,
    }))
}

fn split<T>(result: std::result::Result<T, UpstreamError>) -> (Option<T>, Option<String>) {
    match result {
        Ok(value) => (Some(value), None),
        Err(e) => {
            tracing::warn!(error = %e, "Location detail lookup failed");
            (None, Some(e.to_string()))
        }
    }
}
