//! HTTP API for watch-progress telemetry
//!
//! This module provides the endpoint the progress sampler reports to:
//! - POST /api/video-tracking - Store a progress reading
//! - GET /api/video-tracking/:video_id - List the caller's readings for a video
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;
mod store;

pub use routes::create_router;
pub use state::AppState;
pub use store::{InMemoryTrackingStore, TrackingRecord, TrackingStore};
