// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory record store for local development and tests.

use crate::db::{HistoryStore, SearchLog};
use crate::error::AppError;
use crate::models::{HistoryRecord, NewHistoryRecord, NewSearchEntry, SearchEntry};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

/// Random bytes per generated ID (encodes to 20 characters, like Firestore IDs).
const ID_BYTES: usize = 15;

/// Concurrent in-memory store. Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    history: Arc<DashMap<String, HistoryRecord>>,
    searches: Arc<DashMap<String, SearchEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Generate an opaque, URL-safe document ID.
fn generate_id() -> Result<String, AppError> {
    let mut bytes = [0u8; ID_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn insert_history(&self, record: NewHistoryRecord) -> Result<HistoryRecord, AppError> {
        let record = record.with_id(generate_id()?);
        self.history.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_history(&self, id: &str) -> Result<Option<HistoryRecord>, AppError> {
        Ok(self.history.get(id).map(|r| r.value().clone()))
    }

    async fn list_history_for_user(&self, user_id: &str) -> Result<Vec<HistoryRecord>, AppError> {
        Ok(self
            .history
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn update_history(
        &self,
        record: &HistoryRecord,
        fields: &[&'static str],
    ) -> Result<HistoryRecord, AppError> {
        let mut stored = self
            .history
            .get_mut(&record.id)
            .ok_or_else(|| AppError::NotFound(format!("History record {}", record.id)))?;

        for field in fields {
            match *field {
                "location" => stored.location = record.location.clone(),
                "start_date" => stored.start_date = record.start_date,
                "end_date" => stored.end_date = record.end_date,
                "average_temp" => stored.average_temp = record.average_temp,
                "updated_at" => stored.updated_at = record.updated_at,
                other => {
                    return Err(AppError::Internal(anyhow::anyhow!(
                        "Unknown history field in update mask: {}",
                        other
                    )))
                }
            }
        }

        Ok(stored.clone())
    }

    async fn delete_history(&self, id: &str) -> Result<(), AppError> {
        self.history.remove(id);
        Ok(())
    }
}

#[async_trait]
impl SearchLog for MemoryStore {
    async fn insert_search(&self, entry: NewSearchEntry) -> Result<SearchEntry, AppError> {
        let entry = entry.with_id(generate_id()?);
        self.searches.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn get_search(&self, id: &str) -> Result<Option<SearchEntry>, AppError> {
        Ok(self.searches.get(id).map(|e| e.value().clone()))
    }

    async fn recent_searches(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<SearchEntry>, AppError> {
        let mut entries: Vec<SearchEntry> = self
            .searches
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.value().clone())
            .collect();

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn delete_search(&self, id: &str) -> Result<(), AppError> {
        self.searches.remove(id);
        Ok(())
    }
}
