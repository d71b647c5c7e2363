// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use tower::ServiceExt;
use weather_history::config::Config;
use weather_history::db::{FirestoreDb, MemoryStore};
use weather_history::error::UpstreamError;
use weather_history::models::{Condition, CurrentConditions, ForecastFeed, WeatherSample};
use weather_history::routes::create_router;
use weather_history::services::firebase_auth::FirebaseClaims;
use weather_history::services::{
    FirebaseTokenVerifier, GeocodingClient, HistoryManager, SearchService, VideoSearchClient,
    WeatherSource,
};
use weather_history::AppState;

/// 2024-06-01T00:00:00Z
#[allow(dead_code)]
pub const DAY1: i64 = 1_717_200_000;
#[allow(dead_code)]
pub const HOUR: i64 = 3600;

/// Location the stub weather source does not know.
#[allow(dead_code)]
pub const UNKNOWN_LOCATION: &str = "Atlantis";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Weather source with a fixed temperature and a small three-sample feed.
pub struct StubWeather {
    pub temperature: f64,
}

#[allow(dead_code)]
pub fn clear_sky() -> Condition {
    Condition {
        id: 800,
        main: "Clear".to_string(),
        description: "clear sky".to_string(),
        icon: "01d".to_string(),
    }
}

#[allow(dead_code)]
pub fn sample(timestamp: i64, temperature: f64) -> WeatherSample {
    WeatherSample {
        timestamp: Some(timestamp),
        temperature,
        feels_like: temperature,
        humidity: 60.0,
        wind_speed: 2.0,
        conditions: vec![clear_sky()],
    }
}

#[async_trait]
impl WeatherSource for StubWeather {
    async fn current(&self, location: &str) -> Result<CurrentConditions, UpstreamError> {
        if location.eq_ignore_ascii_case(UNKNOWN_LOCATION) {
            return Err(UpstreamError::LocationNotFound(location.to_string()));
        }
        Ok(CurrentConditions {
            location_name: location.to_string(),
            temperature: self.temperature,
            feels_like: self.temperature,
            humidity: 60.0,
            wind_speed: 2.0,
            condition: Some(clear_sky()),
            observed_at: Some(DAY1),
        })
    }

    async fn forecast(&self, location: &str) -> Result<ForecastFeed, UpstreamError> {
        if location.eq_ignore_ascii_case(UNKNOWN_LOCATION) {
            return Err(UpstreamError::LocationNotFound(location.to_string()));
        }
        Ok(ForecastFeed {
            city: Some(location.to_string()),
            timezone_offset_secs: 0,
            samples: vec![
                sample(DAY1, 10.0),
                sample(DAY1 + 3 * HOUR, 14.0),
                sample(DAY1 + 24 * HOUR, 8.0),
            ],
        })
    }
}

/// Create a test app with offline dependencies: in-memory store, stub
/// weather source at 20.3 °C, shared-secret token verification.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Arc::new(StubWeather { temperature: 20.3 }))
}

#[allow(dead_code)]
pub fn create_test_app_with(weather: Arc<dyn WeatherSource>) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let store = MemoryStore::new();

    let secret = config
        .auth_shared_secret
        .clone()
        .expect("test config has a shared secret");
    let verifier = FirebaseTokenVerifier::new_with_shared_secret(&config.firebase_project_id, &secret)
        .expect("verifier");

    let state = Arc::new(AppState {
        history: HistoryManager::new(Arc::new(store.clone()), weather.clone()),
        searches: SearchService::new(Arc::new(store)),
        geocoder: GeocodingClient::new(None).expect("geocoder"),
        videos: VideoSearchClient::new(None).expect("videos"),
        verifier: Arc::new(verifier),
        weather,
        config,
    });

    (create_router(state.clone()), state)
}

/// Sign an ID token for `uid` the way the test verifier expects.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str) -> String {
    let config = Config::test_default();
    let claims = FirebaseClaims::for_user(&config.firebase_project_id, uid, 3600);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&config.auth_shared_secret.expect("shared secret")),
    )
    .unwrap()
}

/// Build a request, optionally authenticated as `uid`, with an optional JSON body.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    uid: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(uid) = uid {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", create_test_jwt(uid)));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and decode the JSON response body (Null when empty).
#[allow(dead_code)]
pub async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
