use crate::camera::ModelFailurePolicy;
use crate::config::TrackerConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a video-watch session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How often playback progress is sampled and reported
    /// Default: 5 seconds
    pub progress_interval: Duration,

    /// How often a camera frame is classified while playing
    /// Default: 2 seconds
    pub emotion_interval: Duration,

    /// Progress at or above which the dialog closes without confirmation
    pub close_threshold_percent: f64,

    /// Whether a face-model load failure blocks playback
    pub model_failure_policy: ModelFailurePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_secs(5),
            emotion_interval: Duration::from_secs(2),
            close_threshold_percent: 90.0,
            model_failure_policy: ModelFailurePolicy::Block,
        }
    }
}

impl SessionConfig {
    /// Session settings from the `[tracker]` section. Fails on zero periods.
    pub fn from_tracker(tracker: &TrackerConfig) -> Result<Self> {
        tracker.validate()?;

        Ok(Self {
            progress_interval: Duration::from_secs(tracker.progress_interval_secs),
            emotion_interval: Duration::from_secs(tracker.emotion_interval_secs),
            close_threshold_percent: tracker.close_threshold_percent,
            model_failure_policy: tracker.model_failure_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(progress: u64, emotion: u64) -> TrackerConfig {
        TrackerConfig {
            tracking_endpoint: "http://localhost/api/video-tracking".to_string(),
            progress_interval_secs: progress,
            emotion_interval_secs: emotion,
            close_threshold_percent: 90.0,
            model_failure_policy: ModelFailurePolicy::Allow,
        }
    }

    #[test]
    fn test_from_tracker() {
        let config = SessionConfig::from_tracker(&tracker(10, 3)).unwrap();
        assert_eq!(config.progress_interval, Duration::from_secs(10));
        assert_eq!(config.emotion_interval, Duration::from_secs(3));
        assert_eq!(config.model_failure_policy, ModelFailurePolicy::Allow);
    }

    #[test]
    fn test_zero_periods_rejected() {
        assert!(SessionConfig::from_tracker(&tracker(0, 2)).is_err());
        assert!(SessionConfig::from_tracker(&tracker(5, 0)).is_err());
    }
}
