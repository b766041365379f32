//! Shared data models for the VidVault backend.
//!
//! This crate holds the persisted `Video` record, the request/response
//! types exchanged over the API, and the random-name generators used for
//! stored files and share tokens.

pub mod naming;
pub mod requests;
pub mod video;

pub use naming::{generate_share_token, generate_stored_name};
pub use requests::{
    MergeRequest, ShareLinkResponse, ShareRequest, TrimRequest, VideoResponse,
};
pub use video::{now_ms, NewUpload, Video, VideoId};
