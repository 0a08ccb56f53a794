//! # holidays-api
//!
//! Stateless HTTP handlers over the record store and session manager.
//!
//! ## Endpoints
//!
//! - `GET /records` - List all records (no session needed)
//! - `GET /records/{id}` - Get one record (no session needed)
//! - `POST /records` - Create a record from `{name}`
//! - `PUT /records/{id}` - Merge any of `{name, popularity, completed}`
//! - `DELETE /records/{id}` - Delete a record
//! - `POST /accounts` - Register `{username, credential}`
//! - `POST /sessions` - Sign in, returns `{token, username}`
//! - `GET /sessions` - Who owns the presented token
//! - `DELETE /sessions` - Sign out
//!
//! Mutating record routes require `Authorization: Bearer <token>`. Requests
//! whose `Origin` is not allow-listed are refused before routing.

mod accounts;
mod auth;
mod error;
mod origin;
mod records;
mod sessions;

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use holidays_auth::{AuthError, SessionManager};
use holidays_db::Database;
use tower_http::trace::TraceLayer;

pub use auth::Authenticated;
pub use error::ApiError;
pub use origin::AllowedOrigins;
pub use records::{CreateRecordRequest, DeleteAck, UpdateRecordRequest};
pub use sessions::{CredentialsRequest, WhoAmI};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Result<Self, AuthError> {
        let sessions = Arc::new(SessionManager::new(db.clone())?);
        Ok(Self { db, sessions })
    }
}

/// Router configuration that is not part of the shared state.
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    pub allowed_origins: Vec<String>,
}

pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let origins = Arc::new(AllowedOrigins::new(&config.allowed_origins));
    let cors = origins.cors_layer();

    Router::new()
        .route(
            "/records",
            get(records::list_records).post(records::create_record),
        )
        .route(
            "/records/{id}",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route("/accounts", post(accounts::register))
        .route(
            "/sessions",
            get(sessions::whoami)
                .post(sessions::sign_in)
                .delete(sessions::sign_out),
        )
        .layer(cors)
        .layer(from_fn_with_state(origins, origin::origin_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
