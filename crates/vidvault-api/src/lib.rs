//! Axum HTTP API server for VidVault.
//!
//! This crate provides:
//! - Upload, trim, merge and share endpoints behind an API key
//! - Public token-gated streaming of shared videos
//! - Access logging to a persistent log file

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::VideoService;
pub use state::AppState;
