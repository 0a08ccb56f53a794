//! Account store. Holds usernames and credential hashes; never raw credentials.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::sync::MutexGuard;
use uuid::Uuid;

use crate::StoreError;

/// A registered account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub credential_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Accounts store with a borrowed connection.
pub struct Accounts<'db> {
    conn: MutexGuard<'db, Connection>,
}

impl<'db> Accounts<'db> {
    pub(crate) fn new(conn: MutexGuard<'db, Connection>) -> Self {
        Self { conn }
    }

    /// Insert a new account. Usernames are unique and compared case-sensitively.
    pub fn insert(&self, username: &str, credential_hash: &str) -> Result<Account, StoreError> {
        let account = Account {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            credential_hash: credential_hash.to_string(),
            created_at: Utc::now(),
        };

        self.conn
            .execute(
                "INSERT INTO accounts (id, username, credential_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    account.id,
                    account.username,
                    account.credential_hash,
                    account.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| {
                if StoreError::is_constraint_violation(&e) {
                    StoreError::Conflict(format!("username {}", username))
                } else {
                    StoreError::Database(e)
                }
            })?;

        Ok(account)
    }

    /// Look up an account by exact username.
    pub fn find(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let account = self
            .conn
            .query_row(
                "SELECT id, username, credential_hash, created_at FROM accounts WHERE username = ?1",
                params![username],
                Self::row_to_account,
            )
            .optional()?;
        Ok(account)
    }

    fn row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
        let created_at_str: String = row.get(3)?;

        Ok(Account {
            id: row.get(0)?,
            username: row.get(1)?,
            credential_hash: row.get(2)?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
