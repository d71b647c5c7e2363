// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.
//!
//! Three auth tiers: public (health, forecast, location details), optional
//! (weather lookup, recorded when signed in) and protected (history, searches).

pub mod history;
pub mod location;
pub mod searches;
pub mod weather;

use crate::middleware::auth::{optional_auth, require_auth};
use crate::middleware::security::add_security_headers;
use crate::AppState;
use axum::http::{header, request::Parts, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Injected at build time by the deploy pipeline.
const BUILD_ID: Option<&str> = option_env!("BUILD_ID");

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Liveness probe.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id: BUILD_ID.unwrap_or("unknown").to_string(),
    })
}

/// The configured frontend, plus any local dev server.
fn is_allowed_origin(origin: &str, frontend_url: &str) -> bool {
    const DEV_ORIGINS: [&str; 2] = ["http://localhost", "http://127.0.0.1"];

    origin == frontend_url || DEV_ORIGINS.iter().any(|dev| origin.starts_with(dev))
}

fn cors_layer(frontend_url: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| is_allowed_origin(origin, &frontend_url))
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .merge(weather::forecast_routes())
        .merge(location::routes());

    let optional = weather::lookup_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let protected = history::routes()
        .merge(searches::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .merge(public)
        .merge(optional)
        .merge(protected)
        .layer(middleware::from_fn(add_security_headers))
        .layer(cors_layer(state.config.frontend_url.clone()))
        .layer(trace)
        .with_state(state)
}
