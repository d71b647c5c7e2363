// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! History record manager: validation, ownership and CRUD orchestration.
//!
//! Every operation takes the caller's verified user id explicitly. Mutating
//! operations also take `today`, the reference date for the "no future end
//! date" rule, so callers (and tests) control the clock.

use crate::db::HistoryStore;
use crate::error::{AppError, Result};
use crate::models::{CurrentConditions, HistoryPatch, HistoryRecord, NewHistoryRecord};
use crate::services::forecast::round_one_decimal;
use crate::services::weather::WeatherSource;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// Maximum length of a location string, in characters.
pub const MAX_LOCATION_LEN: usize = 100;

/// Raw update request. Dates are unparsed; only present slots are applied.
#[derive(Debug, Clone, Default)]
pub struct HistoryUpdate {
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Manages per-user weather history records.
#[derive(Clone)]
pub struct HistoryManager {
    store: Arc<dyn HistoryStore>,
    weather: Arc<dyn WeatherSource>,
}

impl HistoryManager {
    pub fn new(store: Arc<dyn HistoryStore>, weather: Arc<dyn WeatherSource>) -> Self {
        Self { store, weather }
    }

    /// Validate the range, attach a live temperature and persist a new record.
    pub async fn create(
        &self,
        user_id: &str,
        location: &str,
        start_date: &str,
        end_date: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord> {
        let location = validate_location(location)?;
        let start_date = parse_calendar_date("start_date", start_date)?;
        let end_date = parse_calendar_date("end_date", end_date)?;
        validate_order(start_date, end_date)?;
        validate_not_future(end_date, today)?;

        let conditions = self.weather.current(&location).await?;

        let record = self
            .store
            .insert_history(NewHistoryRecord {
                user_id: user_id.to_string(),
                location,
                start_date,
                end_date,
                average_temp: round_one_decimal(conditions.temperature),
                created_at: now,
            })
            .await?;

        tracing::info!(
            user_id,
            record_id = %record.id,
            location = %record.location,
            average_temp = record.average_temp,
            "Created history record"
        );

        Ok(record)
    }

    /// Persist a single-day record from conditions the caller already fetched.
    pub async fn record_observation(
        &self,
        user_id: &str,
        location: &str,
        conditions: &CurrentConditions,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord> {
        let record = self
            .store
            .insert_history(NewHistoryRecord {
                user_id: user_id.to_string(),
                location: validate_location(location)?,
                start_date: today,
                end_date: today,
                average_temp: round_one_decimal(conditions.temperature),
                created_at: now,
            })
            .await?;

        tracing::debug!(user_id, record_id = %record.id, "Recorded lookup in history");
        Ok(record)
    }

    /// All records owned by `user_id`, unordered.
    pub async fn list(&self, user_id: &str) -> Result<Vec<HistoryRecord>> {
        self.store.list_history_for_user(user_id).await
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<HistoryRecord> {
        self.load_owned(user_id, id).await
    }

    /// Apply a partial update.
    ///
    /// Existence and ownership are checked before the payload is looked at.
    /// A changed location must resolve upstream, but the stored average
    /// temperature is kept.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        update: HistoryUpdate,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<HistoryRecord> {
        let record = self.load_owned(user_id, id).await?;

        let patch = HistoryPatch {
            location: update
                .location
                .as_deref()
                .map(validate_location)
                .transpose()?,
            start_date: update
                .start_date
                .as_deref()
                .map(|raw| parse_calendar_date("start_date", raw))
                .transpose()?,
            end_date: update
                .end_date
                .as_deref()
                .map(|raw| parse_calendar_date("end_date", raw))
                .transpose()?,
        };

        if patch.is_empty() {
            return Err(AppError::Validation("nothing to update".to_string()));
        }

        if patch.start_date.is_some() || patch.end_date.is_some() {
            validate_order(
                patch.start_date.unwrap_or(record.start_date),
                patch.end_date.unwrap_or(record.end_date),
            )?;
        }
        if let Some(end_date) = patch.end_date {
            validate_not_future(end_date, today)?;
        }

        if let Some(location) = patch.location.as_deref().filter(|l| *l != record.location) {
            self.ensure_resolvable(location).await?;
        }

        let mut merged = record;
        patch.apply_to(&mut merged, now);
        let updated = self
            .store
            .update_history(&merged, &patch.field_mask())
            .await?;

        tracing::info!(user_id, record_id = id, "Updated history record");
        Ok(updated)
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        self.load_owned(user_id, id).await?;
        self.store.delete_history(id).await?;

        tracing::info!(user_id, record_id = id, "Deleted history record");
        Ok(())
    }

    async fn load_owned(&self, user_id: &str, id: &str) -> Result<HistoryRecord> {
        let record = self
            .store
            .get_history(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("History record {}", id)))?;

        if record.user_id != user_id {
            tracing::warn!(user_id, record_id = id, "Rejected access to another user's record");
            return Err(AppError::Forbidden(
                "History record belongs to another user".to_string(),
            ));
        }

        Ok(record)
    }

    async fn ensure_resolvable(&self, location: &str) -> Result<()> {
        match self.weather.current(location).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_unresolvable_location() => Err(AppError::Validation(format!(
                "location could not be resolved: {}",
                location
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Trim and bound a free-text location.
pub fn validate_location(raw: &str) -> Result<String> {
    let location = raw.trim();
    if location.is_empty() {
        return Err(AppError::Validation("location must not be empty".to_string()));
    }
    if location.chars().count() > MAX_LOCATION_LEN {
        return Err(AppError::Validation(format!(
            "location must be at most {} characters",
            MAX_LOCATION_LEN
        )));
    }
    Ok(location.to_string())
}

/// Parse `YYYY-MM-DD`, or an RFC3339 timestamp whose date part is used.
pub fn parse_calendar_date(field: &str, raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::Validation(format!("{} is not a valid date: {:?}", field, raw)))
}

fn validate_order(start_date: NaiveDate, end_date: NaiveDate) -> Result<()> {
    if start_date > end_date {
        return Err(AppError::Validation(format!(
            "start_date {} is after end_date {}",
            start_date, end_date
        )));
    }
    Ok(())
}

fn validate_not_future(end_date: NaiveDate, today: NaiveDate) -> Result<()> {
    if end_date > today {
        return Err(AppError::Validation(format!(
            "end_date {} is in the future",
            end_date
        )));
    }
    Ok(())
}
