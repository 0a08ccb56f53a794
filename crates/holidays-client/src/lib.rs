//! # holidays-client
//!
//! Client side of holidays: a local mirror of the server's record collection.
//!
//! The mirror is loaded once with a full fetch, then kept in step by merging
//! each mutation response. The server's response is always authoritative; the
//! client never fabricates ids or trusts its own guess over the returned value.
//!
//! ## Key Types
//!
//! - [`RecordsApi`] - Transport abstraction over the record routes
//! - [`HttpClient`] - `reqwest` implementation, plus account and session calls
//! - [`SyncedRecords`] - The mirror itself (`Unloaded -> Loading -> Loaded`)
//! - [`ClientError`] - Server-reported and transport failures

mod error;
mod http;
mod sync;
mod traits;

pub use error::ClientError;
pub use http::{AccountInfo, HttpClient};
pub use sync::{LoadState, SyncedRecords};
pub use traits::{Record, RecordUpdate, RecordsApi};
