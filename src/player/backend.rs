use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Player state as reported by the embedded player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    /// Map a YouTube IFrame API state code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }
}

/// Event delivered by a bound player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The player finished loading and can accept commands
    Ready,
    StateChange(PlayerState),
}

/// Embedded video player
///
/// Implementations wrap whatever embed the host renders (YouTube IFrame,
/// native element, simulated clock in tests). Time readings are `None`
/// until the player has loaded the video.
pub trait VideoPlayer: Send + Sync {
    /// Elapsed playback time in seconds
    fn current_time(&self) -> Option<f64>;

    /// Total video length in seconds
    fn duration(&self) -> Option<f64>;

    fn pause(&self);

    /// Release the embed. Called exactly once per binding.
    fn destroy(&self) -> Result<()>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Creates players bound to an external video identifier
pub trait PlayerFactory: Send + Sync {
    fn create(&self, video_id: &str) -> Result<Arc<dyn VideoPlayer>>;
}
