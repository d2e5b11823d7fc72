use crate::camera::CameraState;
use crate::progress::PlaybackProgress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Player-side playback state of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
    Ended,
}

/// Answer to a close request from the UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum CloseDecision {
    /// Watched enough, close immediately
    Allowed,
    /// Ask the viewer to confirm, showing how far they got
    NeedsConfirmation { percent: f64 },
}

impl CloseDecision {
    pub fn for_progress(percent: f64, threshold: f64) -> Self {
        if percent >= threshold {
            CloseDecision::Allowed
        } else {
            CloseDecision::NeedsConfirmation { percent }
        }
    }
}

/// Snapshot of a watch session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Bound video, if any
    pub video_id: Option<String>,

    pub playback: PlaybackState,

    /// `None` when the attached video does not require the camera
    pub camera: Option<CameraState>,

    pub progress: PlaybackProgress,

    /// Progress sampler ticks for the current binding
    pub progress_ticks: u64,

    /// Emotion samples delivered for the current binding
    pub emotion_samples: u64,

    pub started_at: DateTime<Utc>,
}
