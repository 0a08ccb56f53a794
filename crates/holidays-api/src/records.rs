//! Event record handlers.
//!
//! Every request body passes through a `validate` step that turns the decoded
//! JSON into a typed store input, or a `ValidationError`, before the store is
//! touched. Successful mutations echo the record's full current state.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use holidays_db::{EventRecord, NewRecord, RecordPatch};
use serde::{Deserialize, Serialize};

use crate::{ApiError, AppState, Authenticated};

// ============================================================================
// Types
// ============================================================================

/// Body of `POST /records`. Any other fields are ignored; the store assigns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordRequest {
    pub name: String,
}

impl CreateRecordRequest {
    fn validate(self) -> Result<NewRecord, ApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("name must not be empty".to_string()));
        }
        Ok(NewRecord {
            name: name.to_string(),
        })
    }
}

/// Body of `PUT /records/{id}`. At least one field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRecordRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateRecordRequest {
    fn validate(self) -> Result<RecordPatch, ApiError> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(ApiError::Validation("name must not be empty".to_string()))
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };

        if matches!(self.popularity, Some(p) if p < 0) {
            return Err(ApiError::Validation(
                "popularity must not be negative".to_string(),
            ));
        }

        let patch = RecordPatch {
            name,
            popularity: self.popularity,
            completed: self.completed,
        };
        if patch.is_empty() {
            return Err(ApiError::Validation(
                "expected at least one of name, popularity, completed".to_string(),
            ));
        }
        Ok(patch)
    }
}

/// Response of `DELETE /records/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub deleted: bool,
    pub id: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventRecord>>, ApiError> {
    let records = state.db.records().list()?;
    Ok(Json(records))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventRecord>, ApiError> {
    let record = state.db.records().get(&id)?;
    Ok(Json(record))
}

pub async fn create_record(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    body: Result<Json<CreateRecordRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventRecord>), ApiError> {
    let Json(req) = body?;
    let new = req.validate()?;

    let record = state.db.records().create(&new)?;
    tracing::info!(id = %record.id, username = %account.username, "Record created");

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_record(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    Path(id): Path<String>,
    body: Result<Json<UpdateRecordRequest>, JsonRejection>,
) -> Result<Json<EventRecord>, ApiError> {
    let Json(req) = body?;
    let patch = req.validate()?;

    let record = state.db.records().update(&id, &patch)?;
    tracing::info!(id = %record.id, username = %account.username, "Record updated");

    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, ApiError> {
    state.db.records().delete(&id)?;
    tracing::info!(%id, username = %account.username, "Record deleted");

    Ok(Json(DeleteAck { deleted: true, id }))
}
