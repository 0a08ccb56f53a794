//! # holidays-auth
//!
//! Account registration and session management for holidays.
//!
//! Accounts are persisted through [`holidays_db::Accounts`]; credentials are
//! stored only as salted Argon2id hashes. Sessions live in process memory and
//! are referenced by an opaque bearer token. They last until signed out or
//! until the whole table is reset; there is no expiry.
//!
//! ## Key Types
//!
//! - [`SessionManager`] - register / authenticate / validate / invalidate
//! - [`AccountProfile`] - Public account fields, safe to return to callers
//! - [`IssuedSession`] - Token handed out on successful authentication
//! - [`AuthError`] - Error taxonomy for all of the above

mod credentials;
mod error;
mod manager;

pub use error::AuthError;
pub use manager::{AccountProfile, AccountRef, IssuedSession, SessionManager};
