// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather-History API Server
//!
//! Serves weather lookups and keeps a per-user history of looked-up
//! locations and temperatures.

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather_history::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, HistoryStore, MemoryStore, SearchLog},
    services::{
        FirebaseTokenVerifier, GeocodingClient, HistoryManager, OpenWeatherClient, SearchService,
        VideoSearchClient, WeatherSource,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Weather-History API");

    // Record store
    let history_store: Arc<dyn HistoryStore>;
    let search_log: Arc<dyn SearchLog>;
    match config.store_backend {
        StoreBackend::Firestore => {
            let db = FirestoreDb::new(&config.firebase_project_id)
                .await
                .context("Failed to connect to Firestore")?;
            history_store = Arc::new(db.clone());
            search_log = Arc::new(db);
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            let store = MemoryStore::new();
            history_store = Arc::new(store.clone());
            search_log = Arc::new(store);
        }
    }

    let weather: Arc<dyn WeatherSource> = Arc::new(
        OpenWeatherClient::new(
            config.openweather_base_url.clone(),
            config.openweather_api_key.clone(),
        )
        .context("Failed to build OpenWeatherMap client")?,
    );

    for (service, key) in [
        ("OpenWeatherMap", &config.openweather_api_key),
        ("Google Maps", &config.google_maps_api_key),
        ("YouTube", &config.youtube_api_key),
    ] {
        if key.is_none() {
            tracing::warn!(service, "API key not configured; calls will fail");
        }
    }

    let verifier = Arc::new(
        FirebaseTokenVerifier::from_config(&config)
            .context("Failed to initialize ID token verifier")?,
    );

    // Build shared state
    let state = Arc::new(AppState {
        history: HistoryManager::new(history_store, weather.clone()),
        searches: SearchService::new(search_log),
        geocoder: GeocodingClient::new(config.google_maps_api_key.clone())
            .context("Failed to build geocoding client")?,
        videos: VideoSearchClient::new(config.youtube_api_key.clone())
            .context("Failed to build video search client")?,
        verifier,
        weather,
        config: config.clone(),
    });

    // Build router
    let app = weather_history::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("weather_history=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
