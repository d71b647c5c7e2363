// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Third-party services the application depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    OpenWeather,
    GoogleMaps,
    YouTube,
    FirebaseAuth,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Upstream::OpenWeather => "OpenWeatherMap",
            Upstream::GoogleMaps => "Google Maps",
            Upstream::YouTube => "YouTube",
            Upstream::FirebaseAuth => "Firebase Auth",
        };
        f.write_str(name)
    }
}

/// Failure of a third-party service.
///
/// The variants separate "service misconfigured" (missing or rejected
/// credentials) from "service degraded" (quota) from plain transient
/// failures, so callers can tell them apart.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpstreamError {
    #[error("{service} is not configured: {reason}")]
    Misconfigured { service: Upstream, reason: String },

    #[error("{service} quota exceeded")]
    QuotaExceeded { service: Upstream },

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("{service} returned no usable temperature")]
    NoTemperature { service: Upstream },

    #[error("{service} request failed: {detail}")]
    Transient { service: Upstream, detail: String },
}

impl UpstreamError {
    /// True when the failure says the location itself could not be resolved,
    /// as opposed to the service being unavailable.
    pub fn is_unresolvable_location(&self) -> bool {
        matches!(
            self,
            UpstreamError::LocationNotFound(_) | UpstreamError::NoTemperature { .. }
        )
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status and stable machine-readable code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Upstream(err) => match err {
                UpstreamError::Misconfigured { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "upstream_misconfigured")
                }
                UpstreamError::QuotaExceeded { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, "upstream_quota_exceeded")
                }
                UpstreamError::LocationNotFound(_) => (StatusCode::NOT_FOUND, "location_not_found"),
                UpstreamError::NoTemperature { .. } => (StatusCode::BAD_GATEWAY, "upstream_no_data"),
                UpstreamError::Transient { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
            },
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Detail safe to show the caller. Storage and internal failures stay in the logs.
    fn public_details(&self) -> Option<String> {
        match self {
            AppError::Forbidden(msg) | AppError::NotFound(msg) | AppError::Validation(msg) => {
                Some(msg.clone())
            }
            AppError::Upstream(err) => Some(err.to_string()),
            _ => None,
        }
    }

    fn log(&self) {
        match self {
            AppError::Database(msg) => tracing::error!(error = %msg, "Database error"),
            AppError::Internal(err) => tracing::error!(error = %err, "Internal server error"),
            AppError::Upstream(UpstreamError::Misconfigured { service, reason }) => {
                tracing::error!(service = %service, reason = %reason, "Upstream service misconfigured")
            }
            AppError::Upstream(UpstreamError::QuotaExceeded { service }) => {
                tracing::warn!(service = %service, "Upstream quota exceeded")
            }
            AppError::Upstream(UpstreamError::Transient { service, detail }) => {
                tracing::warn!(service = %service, detail = %detail, "Upstream request failed")
            }
            _ => {}
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let (status, error) = self.status_and_code();
        let body = ErrorBody {
            error,
            details: self.public_details(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
