// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token authentication middleware.

use crate::error::{AppError, Upstream, UpstreamError};
use crate::services::firebase_auth::{extract_bearer_token, AuthError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user extracted from a verified ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
}

/// Middleware that requires a valid bearer token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request.headers().get(header::AUTHORIZATION).cloned();
    let user = authenticate(&state, auth_header)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware that identifies the caller when a token is present.
///
/// No Authorization header means an anonymous request; a header that does
/// not verify is still rejected.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request.headers().get(header::AUTHORIZATION).cloned();
    if let Some(user) = authenticate(&state, auth_header).await? {
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

async fn authenticate(
    state: &AppState,
    auth_header: Option<HeaderValue>,
) -> Result<Option<AuthUser>, AppError> {
    let Some(auth_header) = auth_header else {
        return Ok(None);
    };

    let verified = match extract_bearer_token(&auth_header) {
        Ok(token) => state.verifier.verify(token).await,
        Err(e) => Err(e),
    };

    match verified {
        Ok(user) => Ok(Some(AuthUser { user_id: user.uid })),
        Err(AuthError::Invalid(reason)) => {
            tracing::debug!(reason = %reason, "Rejected bearer token");
            Err(AppError::InvalidToken)
        }
        Err(AuthError::Transient(detail)) => Err(UpstreamError::Transient {
            service: Upstream::FirebaseAuth,
            detail,
        }
        .into()),
    }
}
