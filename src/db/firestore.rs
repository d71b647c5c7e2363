// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed record store.
//!
//! Provides high-level operations for:
//! - Weather history records (per-user, server-generated IDs)
//! - Search log entries (per-user, newest first)

use crate::db::{collections, HistoryStore, SearchLog};
use crate::error::AppError;
use crate::models::{HistoryRecord, NewHistoryRecord, NewSearchEntry, SearchEntry};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{FirestoreQueryDirection, FirestoreWritePrecondition};

/// Unsigned placeholder; the emulator accepts any bearer token.
const EMULATOR_TOKEN: &str = "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ3ZWF0aGVyLWhpc3RvcnkifQ.";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Connect using application default credentials, or to the emulator
    /// when `FIRESTORE_EMULATOR_HOST` is set.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        let emulator_host = std::env::var("FIRESTORE_EMULATOR_HOST").ok();

        let client = match &emulator_host {
            Some(_) => connect_emulator(project_id).await,
            None => firestore::FirestoreDb::new(project_id).await,
        }
        .map_err(|e| AppError::Database(format!("Firestore connection failed: {e}")))?;

        tracing::info!(
            project = project_id,
            emulator = emulator_host.as_deref(),
            "Connected to Firestore"
        );
        Ok(Self {
            client: Some(client),
        })
    }

    /// A client with no connection; every operation fails with `Database`.
    pub fn disconnected() -> Self {
        Self { client: None }
    }

    fn client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Firestore client is not connected".to_string()))
    }
}

async fn connect_emulator(project_id: &str) -> Result<firestore::FirestoreDb, FirestoreError> {
    let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
        Ok(gcloud_sdk::Token {
            token_type: "Bearer".to_string(),
            token: gcloud_sdk::SecretValue::new(EMULATOR_TOKEN.to_string().into()),
            expiry: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    });

    firestore::FirestoreDb::with_options_token_source(
        firestore::FirestoreDbOptions::new(project_id.to_string()),
        gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
        gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
    )
    .await
}

fn db_error(e: FirestoreError) -> AppError {
    AppError::Database(e.to_string())
}

// ─── Weather History ─────────────────────────────────────────

#[async_trait]
impl HistoryStore for FirestoreDb {
    async fn insert_history(&self, record: NewHistoryRecord) -> Result<HistoryRecord, AppError> {
        let created: HistoryRecord = self
            .client()?
            .fluent()
            .insert()
            .into(collections::WEATHER_HISTORY)
            .generate_document_id()
            .object(&record)
            .execute()
            .await
            .map_err(db_error)?;

        tracing::debug!(id = %created.id, user_id = %created.user_id, "Inserted history record");
        Ok(created)
    }

    async fn get_history(&self, id: &str) -> Result<Option<HistoryRecord>, AppError> {
        self.client()?
            .fluent()
            .select()
            .by_id_in(collections::WEATHER_HISTORY)
            .obj()
            .one(id)
            .await
            .map_err(db_error)
    }

    async fn list_history_for_user(&self, user_id: &str) -> Result<Vec<HistoryRecord>, AppError> {
        // Single-field equality filter: served by Firestore's automatic index.
        self.client()?
            .fluent()
            .select()
            .from(collections::WEATHER_HISTORY)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    async fn update_history(
        &self,
        record: &HistoryRecord,
        fields: &[&'static str],
    ) -> Result<HistoryRecord, AppError> {
        // Without the precondition a field-mask write would recreate a
        // document deleted in the meantime.
        self.client()?
            .fluent()
            .update()
            .fields(fields.iter().copied())
            .in_col(collections::WEATHER_HISTORY)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(&record.id)
            .object(record)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataNotFoundError(_) => {
                    AppError::NotFound(format!("History record {}", record.id))
                }
                other => db_error(other),
            })
    }

    async fn delete_history(&self, id: &str) -> Result<(), AppError> {
        self.client()?
            .fluent()
            .delete()
            .from(collections::WEATHER_HISTORY)
            .document_id(id)
            .execute()
            .await
            .map_err(db_error)
    }
}

// ─── Search Log ──────────────────────────────────────────────

#[async_trait]
impl SearchLog for FirestoreDb {
    async fn insert_search(&self, entry: NewSearchEntry) -> Result<SearchEntry, AppError> {
        self.client()?
            .fluent()
            .insert()
            .into(collections::SEARCH_HISTORY)
            .generate_document_id()
            .object(&entry)
            .execute()
            .await
            .map_err(db_error)
    }

    async fn get_search(&self, id: &str) -> Result<Option<SearchEntry>, AppError> {
        self.client()?
            .fluent()
            .select()
            .by_id_in(collections::SEARCH_HISTORY)
            .obj()
            .one(id)
            .await
            .map_err(db_error)
    }

    /// Requires a composite index on (`user_id` ASC, `timestamp` DESC).
    async fn recent_searches(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<SearchEntry>, AppError> {
        self.client()?
            .fluent()
            .select()
            .from(collections::SEARCH_HISTORY)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("timestamp", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    async fn delete_search(&self, id: &str) -> Result<(), AppError> {
        self.client()?
            .fluent()
            .delete()
            .from(collections::SEARCH_HISTORY)
            .document_id(id)
            .execute()
            .await
            .map_err(db_error)
    }
}
