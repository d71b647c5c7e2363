// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather history routes (authenticated).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::HistoryRecord;
use crate::services::history::HistoryUpdate;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// History routes. The auth middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/history", get(list_history).post(create_history))
        .route(
            "/api/history/{id}",
            get(get_history).put(update_history).delete(delete_history),
        )
}

// ─── Request / Response Types ────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateHistoryRequest {
    #[validate(length(min = 1, max = 100, message = "location must be 1-100 characters"))]
    pub location: String,
    /// YYYY-MM-DD or RFC3339
    pub start_date: String,
    pub end_date: String,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateHistoryRequest {
    #[validate(length(min = 1, max = 100, message = "location must be 1-100 characters"))]
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<UpdateHistoryRequest> for HistoryUpdate {
    fn from(req: UpdateHistoryRequest) -> Self {
        Self {
            location: req.location,
            start_date: req.start_date,
            end_date: req.end_date,
        }
    }
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryRecordResponse {
    pub id: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub average_temp: f64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<HistoryRecord> for HistoryRecordResponse {
    fn from(r: HistoryRecord) -> Self {
        Self {
            id: r.id,
            location: r.location,
            start_date: r.start_date.to_string(),
            end_date: r.end_date.to_string(),
            average_temp: r.average_temp,
            created_at: format_utc_rfc3339(r.created_at),
            updated_at: r.updated_at.map(format_utc_rfc3339),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteResponse {
    pub success: bool,
}

fn validate_body(body: &impl Validate) -> Result<()> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

// ─── Handlers ────────────────────────────────────────────────

async fn list_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<HistoryRecordResponse>>> {
    let records = state.history.list(&user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, count = records.len(), "Listed history");
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

async fn create_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateHistoryRequest>,
) -> Result<(StatusCode, Json<HistoryRecordResponse>)> {
    validate_body(&body)?;

    let now = Utc::now();
    let record = state
        .history
        .create(
            &user.user_id,
            &body.location,
            &body.start_date,
            &body.end_date,
            now.date_naive(),
            now,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<HistoryRecordResponse>> {
    let record = state.history.get(&user.user_id, &id).await?;
    Ok(Json(record.into()))
}

async fn update_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateHistoryRequest>,
) -> Result<Json<HistoryRecordResponse>> {
    validate_body(&body)?;

    let now = Utc::now();
    let record = state
        .history
        .update(&user.user_id, &id, body.into(), now.date_naive(), now)
        .await?;

    Ok(Json(record.into()))
}

async fn delete_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.history.delete(&user.user_id, &id).await?;
    Ok(Json(DeleteResponse { success: true }))
}
