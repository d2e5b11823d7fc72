//! Video-watch session management
//!
//! This module provides the `VideoSession` orchestrator that manages:
//! - Binding to one embedded player per open video dialog
//! - Camera gating before playback
//! - Progress and emotion sampling while playing
//! - The close-confirmation gate and teardown

mod config;
mod session;
mod stats;

pub use config::SessionConfig;
pub use session::{BindingId, SessionCallbacks, SessionDeps, VideoSession};
pub use stats::{CloseDecision, PlaybackState, SessionStats};
