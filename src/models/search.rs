//! Search log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A location the user looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    #[serde(alias = "_firestore_id")]
    pub id: String,
    pub user_id: String,
    pub location: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// A search entry before the store has assigned it an ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSearchEntry {
    pub user_id: String,
    pub location: String,
    /// Stored as a native timestamp so queries can order by it
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl NewSearchEntry {
    pub fn with_id(self, id: String) -> SearchEntry {
        SearchEntry {
            id,
            user_id: self.user_id,
            location: self.location,
            timestamp: self.timestamp,
        }
    }
}
