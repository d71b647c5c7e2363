// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! The record store is a seam: Firestore in production, an in-memory map
//! for local development and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{HistoryRecord, NewHistoryRecord, NewSearchEntry, SearchEntry};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const WEATHER_HISTORY: &str = "weather_history";
    /// Per-user search log
    pub const SEARCH_HISTORY: &str = "search_history";
}

/// Persistent store for weather history records.
///
/// The store is the only authority on whether a record exists. Ownership is
/// enforced by callers, not here.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist a new record and return it with its generated ID.
    async fn insert_history(&self, record: NewHistoryRecord) -> Result<HistoryRecord, AppError>;

    async fn get_history(&self, id: &str) -> Result<Option<HistoryRecord>, AppError>;

    /// All records owned by `user_id`, in no particular order.
    async fn list_history_for_user(&self, user_id: &str) -> Result<Vec<HistoryRecord>, AppError>;

    /// Write the named fields of `record` onto the stored document.
    ///
    /// Fails with `NotFound` if the document no longer exists.
    async fn update_history(
        &self,
        record: &HistoryRecord,
        fields: &[&'static str],
    ) -> Result<HistoryRecord, AppError>;

    async fn delete_history(&self, id: &str) -> Result<(), AppError>;
}

/// Persistent per-user log of searched locations.
#[async_trait]
pub trait SearchLog: Send + Sync {
    async fn insert_search(&self, entry: NewSearchEntry) -> Result<SearchEntry, AppError>;

    async fn get_search(&self, id: &str) -> Result<Option<SearchEntry>, AppError>;

    /// Most recent entries for `user_id`, newest first.
    async fn recent_searches(&self, user_id: &str, limit: u32)
        -> Result<Vec<SearchEntry>, AppError>;

    async fn delete_search(&self, id: &str) -> Result<(), AppError>;
}
