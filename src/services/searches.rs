// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user log of searched locations.

use crate::db::SearchLog;
use crate::error::{AppError, Result};
use crate::models::{NewSearchEntry, SearchEntry};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Number of entries returned by [`SearchService::recent`].
pub const RECENT_SEARCH_LIMIT: u32 = 5;

#[derive(Clone)]
pub struct SearchService {
    log: Arc<dyn SearchLog>,
}

impl SearchService {
    pub fn new(log: Arc<dyn SearchLog>) -> Self {
        Self { log }
    }

    pub async fn record(
        &self,
        user_id: &str,
        location: &str,
        now: DateTime<Utc>,
    ) -> Result<SearchEntry> {
        let entry = self
            .log
            .insert_search(NewSearchEntry {
                user_id: user_id.to_string(),
                location: location.to_string(),
                timestamp: now,
            })
            .await?;

        tracing::debug!(user_id, search_id = %entry.id, "Recorded search");
        Ok(entry)
    }

    /// Most recent searches, newest first.
    pub async fn recent(&self, user_id: &str) -> Result<Vec<SearchEntry>> {
        self.log.recent_searches(user_id, RECENT_SEARCH_LIMIT).await
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let entry = self
            .log
            .get_search(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Search entry {}", id)))?;

        if entry.user_id != user_id {
            tracing::warn!(user_id, search_id = id, "Rejected deletion of another user's search");
            return Err(AppError::Forbidden(
                "Search entry belongs to another user".to_string(),
            ));
        }

        self.log.delete_search(id).await
    }
}
