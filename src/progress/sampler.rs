use super::reporter::{ProgressReport, ProgressReporter};
use crate::player::VideoPlayer;
use crate::schedule::ScheduledTask;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Percentage of the video watched, clamped to [0, 100]
///
/// Unknown, zero or non-finite durations yield 0 rather than NaN/Infinity.
pub fn progress_percent(elapsed: Option<f64>, total: Option<f64>) -> f64 {
    let (Some(elapsed), Some(total)) = (elapsed, total) else {
        return 0.0;
    };

    if !elapsed.is_finite() || !total.is_finite() || total <= 0.0 {
        return 0.0;
    }

    (elapsed / total * 100.0).clamp(0.0, 100.0)
}

/// Latest progress reading for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackProgress {
    pub elapsed_seconds: f64,
    pub total_seconds: Option<f64>,
    pub percent: f64,
}

impl PlaybackProgress {
    pub fn from_readings(elapsed: Option<f64>, total: Option<f64>) -> Self {
        Self {
            elapsed_seconds: elapsed.filter(|e| e.is_finite()).unwrap_or(0.0),
            total_seconds: total.filter(|t| t.is_finite()),
            percent: progress_percent(elapsed, total),
        }
    }
}

/// Periodic progress sampler for one bound player
pub struct ProgressSampler {
    period: Duration,
    reporter: Arc<dyn ProgressReporter>,
    progress: Arc<Mutex<PlaybackProgress>>,
    ticks: Arc<AtomicU64>,
    task: Option<ScheduledTask>,
}

impl ProgressSampler {
    pub fn new(period: Duration, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            period,
            reporter,
            progress: Arc::new(Mutex::new(PlaybackProgress::default())),
            ticks: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Start sampling `player`, replacing any running loop
    pub fn start(&mut self, video_id: String, player: Arc<dyn VideoPlayer>) {
        self.stop();

        info!(
            "Tracking progress for {} every {:?}",
            video_id, self.period
        );

        let reporter = Arc::clone(&self.reporter);
        let progress = Arc::clone(&self.progress);
        let ticks = Arc::clone(&self.ticks);

        let task = ScheduledTask::spawn("progress sampler", self.period, move |live| {
            let elapsed = player.current_time();
            let total = player.duration();
            let reading = PlaybackProgress::from_readings(elapsed, total);

            let report = ProgressReport {
                video_id: video_id.clone(),
                current_time: reading.elapsed_seconds,
                duration: reading.total_seconds.unwrap_or(0.0),
            };
            let reporter = Arc::clone(&reporter);
            let progress = Arc::clone(&progress);
            let ticks = Arc::clone(&ticks);

            async move {
                live.run_if_live(|| {
                    *progress.lock().unwrap_or_else(|e| e.into_inner()) = reading;
                    ticks.fetch_add(1, Ordering::SeqCst);

                    debug!(
                        "Progress {:.1}% ({:.1}s) for {}",
                        reading.percent, reading.elapsed_seconds, report.video_id
                    );

                    // Fire-and-forget: a slow endpoint must not delay the next tick
                    tokio::spawn(async move {
                        if let Err(e) = reporter.report(&report).await {
                            warn!("Error saving video progress: {:#}", e);
                        }
                    });
                });
            }
            .boxed()
        });

        self.task = Some(task);
    }

    /// Stop sampling. Safe to call when not running.
    pub fn stop(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.cancel();
            debug!("Progress sampler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| t.is_running())
    }

    pub fn progress(&self) -> PlaybackProgress {
        *self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Forget the previous binding's reading
    pub fn reset(&mut self) {
        self.stop();
        *self.progress.lock().unwrap_or_else(|e| e.into_inner()) = PlaybackProgress::default();
        self.ticks.store(0, Ordering::SeqCst);
    }
}

impl Drop for ProgressSampler {
    fn drop(&mut self) {
        self.stop();
    }
}
