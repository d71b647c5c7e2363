// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recent-search routes (authenticated).

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::SearchEntry;
use crate::routes::history::DeleteResponse;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/searches", get(recent_searches))
        .route("/api/searches/{id}", delete(delete_search))
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchEntryResponse {
    pub id: String,
    pub location: String,
    pub timestamp: String,
}

impl From<SearchEntry> for SearchEntryResponse {
    fn from(e: SearchEntry) -> Self {
        Self {
            id: e.id,
            location: e.location,
            timestamp: format_utc_rfc3339(e.timestamp),
        }
    }
}

async fn recent_searches(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SearchEntryResponse>>> {
    let entries = state.searches.recent(&user.user_id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

async fn delete_search(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.searches.delete(&user.user_id, &id).await?;
    Ok(Json(DeleteResponse { success: true }))
}
