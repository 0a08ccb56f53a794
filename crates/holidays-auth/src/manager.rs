use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use holidays_db::{Account, Database};
use serde::Serialize;

use crate::credentials::{generate_token, hash_credential, token_digest, verify_credential};
use crate::AuthError;

/// Verified against when the username is unknown, so both failure paths cost one hash.
const DUMMY_CREDENTIAL: &str = "holidays-dummy-credential";

/// Public account fields. Never carries the credential or its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountProfile {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            created_at: account.created_at,
        }
    }
}

/// The account a session was created for. Does not own the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub id: String,
    pub username: String,
}

/// Returned once, on successful authentication.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Clone)]
struct Session {
    account: AccountRef,
    created_at: DateTime<Utc>,
}

/// Issues and checks bearer-token sessions for registered accounts.
pub struct SessionManager {
    db: Arc<Database>,
    // Keyed by SHA-256 digest of the token
    sessions: Mutex<HashMap<String, Session>>,
    dummy_hash: String,
}

impl SessionManager {
    pub fn new(db: Arc<Database>) -> Result<Self, AuthError> {
        Ok(Self {
            db,
            sessions: Mutex::new(HashMap::new()),
            dummy_hash: hash_credential(DUMMY_CREDENTIAL)?,
        })
    }

    /// Create an account. The raw credential is hashed and then dropped.
    ///
    /// Surrounding whitespace is not part of a username.
    pub fn register(&self, username: &str, credential: &str) -> Result<AccountProfile, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("username must not be empty".to_string()));
        }
        if credential.is_empty() {
            return Err(AuthError::Validation("credential must not be empty".to_string()));
        }

        let credential_hash = hash_credential(credential)?;
        let account = self.db.accounts().insert(username, &credential_hash)?;

        tracing::info!(username = %account.username, "Registered account");
        Ok(account.into())
    }

    /// Verify a credential and open a new session on success.
    pub fn authenticate(&self, username: &str, credential: &str) -> Result<IssuedSession, AuthError> {
        let username = username.trim();
        let account = self.db.accounts().find(username)?;

        let account = match account {
            Some(account) if verify_credential(credential, &account.credential_hash) => account,
            Some(_) => {
                tracing::warn!(username, "Credential mismatch");
                return Err(AuthError::Authentication);
            }
            None => {
                let _ = verify_credential(credential, &self.dummy_hash);
                tracing::warn!(username, "Unknown username");
                return Err(AuthError::Authentication);
            }
        };

        let token = generate_token();
        let session = Session {
            account: AccountRef {
                id: account.id,
                username: account.username.clone(),
            },
            created_at: Utc::now(),
        };
        self.sessions
            .lock()
            .expect("Session table lock poisoned")
            .insert(token_digest(&token), session);

        tracing::info!(username = %account.username, "Session started");
        Ok(IssuedSession {
            token,
            username: account.username,
        })
    }

    /// The account bound to a live session.
    pub fn validate(&self, token: &str) -> Result<AccountRef, AuthError> {
        self.sessions
            .lock()
            .expect("Session table lock poisoned")
            .get(&token_digest(token))
            .map(|session| session.account.clone())
            .ok_or(AuthError::Authentication)
    }

    /// End a session. Unknown tokens are ignored.
    pub fn invalidate(&self, token: &str) {
        let removed = self
            .sessions
            .lock()
            .expect("Session table lock poisoned")
            .remove(&token_digest(token));

        if let Some(session) = removed {
            let lifetime = Utc::now() - session.created_at;
            tracing::info!(
                username = %session.account.username,
                lifetime_secs = lifetime.num_seconds(),
                "Session ended"
            );
        }
    }

    /// Drop every live session.
    pub fn reset(&self) {
        let mut sessions = self.sessions.lock().expect("Session table lock poisoned");
        let count = sessions.len();
        sessions.clear();
        tracing::info!(count, "Session table reset");
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions
            .lock()
            .expect("Session table lock poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        let db = Arc::new(Database::open_in_memory().unwrap());
        SessionManager::new(db).unwrap()
    }

    #[test]
    fn test_register_returns_public_fields() {
        let manager = manager();

        let profile = manager.register("ann", "pw1").unwrap();
        assert_eq!(profile.username, "ann");

        let json = serde_json::to_value(&profile).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(json.get("credential").is_none());
        assert!(json.get("credentialHash").is_none());
    }

    #[test]
    fn test_register_duplicate_conflicts() {
        let manager = manager();

        manager.register("ann", "pw1").unwrap();
        let err = manager.register("ann", "other").unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[test]
    fn test_username_whitespace_is_trimmed() {
        let manager = manager();

        let profile = manager.register(" ann ", "pw1").unwrap();
        assert_eq!(profile.username, "ann");

        let err = manager.register("ann", "other").unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));

        let issued = manager.authenticate("ann ", "pw1").unwrap();
        assert_eq!(issued.username, "ann");
    }

    #[test]
    fn test_register_validates_input() {
        let manager = manager();

        assert!(matches!(
            manager.register("  ", "pw1").unwrap_err(),
            AuthError::Validation(_)
        ));
        assert!(matches!(
            manager.register("ann", "").unwrap_err(),
            AuthError::Validation(_)
        ));
    }

    #[test]
    fn test_authenticate_and_validate() {
        let manager = manager();
        manager.register("ann", "pw1").unwrap();

        let issued = manager.authenticate("ann", "pw1").unwrap();
        assert_eq!(issued.username, "ann");

        let account = manager.validate(&issued.token).unwrap();
        assert_eq!(account.username, "ann");
        assert_eq!(manager.active_sessions(), 1);
    }

    #[test]
    fn test_wrong_credential_creates_no_session() {
        let manager = manager();
        manager.register("ann", "pw1").unwrap();

        let err = manager.authenticate("ann", "wrong").unwrap_err();
        assert!(matches!(err, AuthError::Authentication));

        let err = manager.authenticate("bob", "pw1").unwrap_err();
        assert!(matches!(err, AuthError::Authentication));

        // Usernames are case-sensitive
        let err = manager.authenticate("ANN", "pw1").unwrap_err();
        assert!(matches!(err, AuthError::Authentication));

        assert_eq!(manager.active_sessions(), 0);
    }

    #[test]
    fn test_invalidated_token_stays_invalid() {
        let manager = manager();
        manager.register("ann", "pw1").unwrap();
        let issued = manager.authenticate("ann", "pw1").unwrap();

        manager.invalidate(&issued.token);
        for _ in 0..3 {
            assert!(matches!(
                manager.validate(&issued.token).unwrap_err(),
                AuthError::Authentication
            ));
        }

        // Idempotent
        manager.invalidate(&issued.token);
        manager.invalidate("never-issued");
    }

    #[test]
    fn test_sessions_are_independent() {
        let manager = manager();
        manager.register("ann", "pw1").unwrap();

        let first = manager.authenticate("ann", "pw1").unwrap();
        let second = manager.authenticate("ann", "pw1").unwrap();
        assert_ne!(first.token, second.token);

        manager.invalidate(&first.token);
        assert!(manager.validate(&first.token).is_err());
        assert!(manager.validate(&second.token).is_ok());
    }

    #[test]
    fn test_reset_drops_all_sessions() {
        let manager = manager();
        manager.register("ann", "pw1").unwrap();
        let issued = manager.authenticate("ann", "pw1").unwrap();

        manager.reset();
        assert!(manager.validate(&issued.token).is_err());
        assert_eq!(manager.active_sessions(), 0);

        // Accounts survive a reset
        assert!(manager.authenticate("ann", "pw1").is_ok());
    }

    #[test]
    fn test_unknown_token() {
        let manager = manager();
        assert!(matches!(
            manager.validate("").unwrap_err(),
            AuthError::Authentication
        ));
    }
}
