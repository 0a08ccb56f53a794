use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Rejected as invalid: {0}")]
    Validation(String),

    #[error("Not signed in or session expired")]
    Authentication,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server responded {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Record {0} is not in the local collection")]
    UnknownRecord(String),
}

impl ClientError {
    /// Classify a non-success response by status code.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 | 422 => ClientError::Validation(message),
            401 => ClientError::Authentication,
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            _ => ClientError::Rejected { status, message },
        }
    }

    /// Failures that never reached a server decision.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            ClientError::from_status(400, "bad".into()),
            ClientError::Validation(_)
        ));
        assert!(matches!(
            ClientError::from_status(401, String::new()),
            ClientError::Authentication
        ));
        assert!(matches!(
            ClientError::from_status(404, "gone".into()),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            ClientError::from_status(409, "taken".into()),
            ClientError::Conflict(_)
        ));
        assert!(matches!(
            ClientError::from_status(403, "origin".into()),
            ClientError::Rejected { status: 403, .. }
        ));
    }

    #[test]
    fn test_is_transport() {
        assert!(ClientError::Decode("eof".into()).is_transport());
        assert!(!ClientError::Authentication.is_transport());
    }
}
