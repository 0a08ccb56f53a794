use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Client-side copy of an event record as the server last reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub name: String,
    pub popularity: i64,
    pub completed: bool,
}

/// Partial update body. Absent fields are left alone by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// The record routes, as seen by the client.
#[async_trait]
pub trait RecordsApi: Send + Sync {
    /// Fetch the whole collection.
    async fn list(&self) -> Result<Vec<Record>, ClientError>;

    /// Create a record from user-supplied fields; returns the stored record.
    async fn create(&self, name: &str) -> Result<Record, ClientError>;

    /// Apply a partial update; returns the record's new state.
    async fn update(&self, id: &str, update: &RecordUpdate) -> Result<Record, ClientError>;

    /// Delete a record.
    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}
