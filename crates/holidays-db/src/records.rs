//! Event record store.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::MutexGuard;
use uuid::Uuid;

use crate::StoreError;

/// A stored event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub name: String,
    pub popularity: i64,
    pub completed: bool,
}

/// Caller-supplied fields for a new record. Everything else is store-assigned.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub name: String,
}

/// A partial update. Only the fields that are `Some` are written.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub popularity: Option<i64>,
    pub completed: Option<bool>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.popularity.is_none() && self.completed.is_none()
    }
}

/// Records store with a borrowed connection.
pub struct Records<'db> {
    conn: MutexGuard<'db, Connection>,
}

impl<'db> Records<'db> {
    /// Create a new Records store with a borrowed connection.
    pub(crate) fn new(conn: MutexGuard<'db, Connection>) -> Self {
        Self { conn }
    }

    /// Insert a new record with a fresh id, zero popularity and `completed = false`.
    pub fn create(&self, new: &NewRecord) -> Result<EventRecord, StoreError> {
        let name = normalize_name(&new.name)?;
        let record = EventRecord {
            id: Uuid::new_v4().to_string(),
            name,
            popularity: 0,
            completed: false,
        };

        self.conn.execute(
            "INSERT INTO records (id, name, popularity, completed, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.name,
                record.popularity,
                record.completed,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tracing::debug!(id = %record.id, name = %record.name, "Created record");
        Ok(record)
    }

    /// All records in insertion order.
    pub fn list(&self) -> Result<Vec<EventRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, popularity, completed FROM records ORDER BY rowid ASC")?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    /// Get a record by ID.
    pub fn get(&self, id: &str) -> Result<EventRecord, StoreError> {
        self.conn
            .query_row(
                "SELECT id, name, popularity, completed FROM records WHERE id = ?1",
                params![id],
                Self::row_to_record,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("record {}", id)))
    }

    /// Merge the present fields of `patch` into the record and return its new state.
    pub fn update(&self, id: &str, patch: &RecordPatch) -> Result<EventRecord, StoreError> {
        let name = patch.name.as_deref().map(normalize_name).transpose()?;
        if let Some(popularity) = patch.popularity {
            if popularity < 0 {
                return Err(StoreError::Validation(
                    "popularity must not be negative".to_string(),
                ));
            }
        }

        let rows_affected = self.conn.execute(
            r#"
            UPDATE records SET
                name = COALESCE(?2, name),
                popularity = COALESCE(?3, popularity),
                completed = COALESCE(?4, completed)
            WHERE id = ?1
            "#,
            params![id, name, patch.popularity, patch.completed],
        )?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }

        tracing::debug!(id, ?patch, "Updated record");
        self.get(id)
    }

    /// Delete a record by ID. Deleting an absent id is reported, not ignored.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM records WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }

        tracing::debug!(id, "Deleted record");
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<EventRecord, rusqlite::Error> {
        Ok(EventRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            popularity: row.get(2)?,
            completed: row.get(3)?,
        })
    }
}

fn normalize_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use crate::{Database, NewRecord, RecordPatch, StoreError};
    use std::collections::HashSet;

    fn new_record(name: &str) -> NewRecord {
        NewRecord {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_create_assigns_defaults() {
        let db = Database::open_in_memory().unwrap();

        let record = db.records().create(&new_record("  Diwali ")).unwrap();
        assert_eq!(record.name, "Diwali");
        assert_eq!(record.popularity, 0);
        assert!(!record.completed);
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let db = Database::open_in_memory().unwrap();

        for name in ["", "   ", "\t\n"] {
            let err = db.records().create(&new_record(name)).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)));
        }
        assert!(db.records().list().unwrap().is_empty());
    }

    #[test]
    fn test_list_in_insertion_order_with_unique_ids() {
        let db = Database::open_in_memory().unwrap();
        let names = ["Holi", "Eid", "Hanukkah", "Nowruz", "Lunar New Year"];

        for name in names {
            db.records().create(&new_record(name)).unwrap();
        }

        let all = db.records().list().unwrap();
        let listed: Vec<&str> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(listed, names);

        let ids: HashSet<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), names.len());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let db = Database::open_in_memory().unwrap();

        let first = db.records().create(&new_record("Holi")).unwrap();
        db.records().delete(&first.id).unwrap();
        let second = db.records().create(&new_record("Holi")).unwrap();

        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_update_merges_only_present_fields() {
        let db = Database::open_in_memory().unwrap();
        let record = db.records().create(&new_record("Diwali")).unwrap();

        let toggled = db
            .records()
            .update(
                &record.id,
                &RecordPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(toggled.completed);
        assert_eq!(toggled.name, "Diwali");
        assert_eq!(toggled.popularity, 0);

        let renamed = db
            .records()
            .update(
                &record.id,
                &RecordPatch {
                    name: Some("Deepavali".to_string()),
                    popularity: Some(7),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Deepavali");
        assert_eq!(renamed.popularity, 7);
        assert!(renamed.completed);
    }

    #[test]
    fn test_update_validates_fields() {
        let db = Database::open_in_memory().unwrap();
        let record = db.records().create(&new_record("Diwali")).unwrap();

        let err = db
            .records()
            .update(
                &record.id,
                &RecordPatch {
                    name: Some(" ".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = db
            .records()
            .update(
                &record.id,
                &RecordPatch {
                    popularity: Some(-1),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        assert_eq!(db.records().get(&record.id).unwrap(), record);
    }

    #[test]
    fn test_missing_id_is_not_found_and_has_no_effect() {
        let db = Database::open_in_memory().unwrap();
        db.records().create(&new_record("Holi")).unwrap();
        let before = db.records().list().unwrap();

        let err = db
            .records()
            .update(
                "missing",
                &RecordPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let err = db.records().delete("missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let err = db.records().get("missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        assert_eq!(db.records().list().unwrap(), before);
    }

    #[test]
    fn test_delete_twice_reports_not_found() {
        let db = Database::open_in_memory().unwrap();
        let record = db.records().create(&new_record("Holi")).unwrap();

        db.records().delete(&record.id).unwrap();
        let err = db.records().delete(&record.id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(db.records().list().unwrap().is_empty());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let db = Database::open_in_memory().unwrap();
        let record = db.records().create(&new_record("Holi")).unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], "Holi");
        assert_eq!(value["popularity"], 0);
        assert_eq!(value["completed"], false);
        assert_eq!(value["id"], record.id.as_str());
    }
}
