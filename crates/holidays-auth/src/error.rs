use holidays_db::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Authentication failed")]
    Authentication,

    #[error("Username already taken: {0}")]
    Conflict(String),

    #[error("Credential hashing failed: {0}")]
    Hashing(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => AuthError::Conflict(msg),
            StoreError::Validation(msg) => AuthError::Validation(msg),
            other => AuthError::Store(other),
        }
    }
}
