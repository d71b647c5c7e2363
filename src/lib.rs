// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather-History: weather lookups with a per-user history of records
//!
//! This crate provides the backend API: current conditions and a 5-day
//! forecast for a location, map/video details, and create/read/update/delete
//! of the signed-in user's weather history.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{
    GeocodingClient, HistoryManager, IdentityVerifier, SearchService, VideoSearchClient,
    WeatherSource,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub weather: Arc<dyn WeatherSource>,
    pub history: HistoryManager,
    pub searches: SearchService,
    pub geocoder: GeocodingClient,
    pub videos: VideoSearchClient,
}
