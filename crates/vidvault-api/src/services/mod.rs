//! Orchestration services.

pub mod videos;

pub use videos::VideoService;
