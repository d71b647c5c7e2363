// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather history record model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stored weather history record.
///
/// A record is only ever visible to, and mutable by, `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Server-generated document ID
    #[serde(alias = "_firestore_id")]
    pub id: String,
    /// Owning user (immutable after creation)
    pub user_id: String,
    /// Free-text location as entered by the user
    pub location: String,
    /// First day of the range (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the range (inclusive)
    pub end_date: NaiveDate,
    /// Average temperature in °C, one decimal place
    pub average_temp: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A history record before the store has assigned it an ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    pub user_id: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub average_temp: f64,
    pub created_at: DateTime<Utc>,
}

impl NewHistoryRecord {
    /// Attach a store-generated ID.
    pub fn with_id(self, id: String) -> HistoryRecord {
        HistoryRecord {
            id,
            user_id: self.user_id,
            location: self.location,
            start_date: self.start_date,
            end_date: self.end_date,
            average_temp: self.average_temp,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

/// Partial update of a history record. Only present slots are applied.
///
/// The owner is not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryPatch {
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl HistoryPatch {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }

    /// Apply the present slots and stamp the update time.
    pub fn apply_to(&self, record: &mut HistoryRecord, updated_at: DateTime<Utc>) {
        if let Some(location) = &self.location {
            record.location = location.clone();
        }
        if let Some(start_date) = self.start_date {
            record.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            record.end_date = end_date;
        }
        record.updated_at = Some(updated_at);
    }

    /// Stored field names touched by this patch, including `updated_at`.
    pub fn field_mask(&self) -> Vec<&'static str> {
        let mut fields = Vec::with_capacity(4);
        if self.location.is_some() {
            fields.push("location");
        }
        if self.start_date.is_some() {
            fields.push("start_date");
        }
        if self.end_date.is_some() {
            fields.push("end_date");
        }
        fields.push("updated_at");
        fields
    }
}
