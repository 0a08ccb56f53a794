use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use holidays_auth::AccountProfile;

use crate::sessions::CredentialsRequest;
use crate::{ApiError, AppState};

/// Register a new account. The response never includes the credential.
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountProfile>), ApiError> {
    let Json(req) = body?;

    let sessions = state.sessions.clone();
    let profile = tokio::task::spawn_blocking(move || {
        sessions.register(&req.username, &req.credential)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(profile)))
}
