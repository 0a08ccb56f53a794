use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use holidays_auth::IssuedSession;
use serde::{Deserialize, Serialize};

use crate::auth::bearer_token;
use crate::{ApiError, AppState, Authenticated};

/// Body of `POST /accounts` and `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    #[serde(alias = "password")]
    pub credential: String,
}

/// Response of `GET /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmI {
    pub username: String,
}

pub async fn sign_in(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<IssuedSession>, ApiError> {
    let Json(req) = body?;

    // Argon2 verification is CPU-bound; keep it off the async workers
    let sessions = state.sessions.clone();
    let issued = tokio::task::spawn_blocking(move || {
        sessions.authenticate(&req.username, &req.credential)
    })
    .await??;

    Ok(Json(issued))
}

pub async fn whoami(Authenticated(account): Authenticated) -> Json<WhoAmI> {
    Json(WhoAmI {
        username: account.username,
    })
}

pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Authentication)?;
    state.sessions.invalidate(token);
    Ok(StatusCode::NO_CONTENT)
}
