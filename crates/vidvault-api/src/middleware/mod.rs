//! Request middleware: access logging, API-key auth, share-token gate.

pub mod auth;
pub mod logging;

pub use auth::{require_api_key, require_share_token};
pub use logging::access_log;
