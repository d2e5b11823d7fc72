use super::analyzer::FaceAnalyzer;
use super::sample::{EmotionSample, EmotionSink};
use crate::camera::CaptureSurface;
use crate::schedule::ScheduledTask;
use futures::FutureExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Periodic expression classifier over a capture surface
pub struct EmotionSampler {
    period: Duration,
    samples: Arc<AtomicU64>,
    task: Option<ScheduledTask>,
}

impl EmotionSampler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            samples: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Start classifying frames from `surface`, replacing any running loop
    pub fn start(
        &mut self,
        surface: Arc<CaptureSurface>,
        analyzer: Arc<FaceAnalyzer>,
        sink: EmotionSink,
    ) {
        self.stop();

        info!("Emotion tracking started ({:?} period)", self.period);

        let samples = Arc::clone(&self.samples);

        let task = ScheduledTask::spawn("emotion sampler", self.period, move |live| {
            let surface = Arc::clone(&surface);
            let analyzer = Arc::clone(&analyzer);
            let sink = Arc::clone(&sink);
            let samples = Arc::clone(&samples);

            async move {
                let Some(frame) = surface.grab().await else {
                    return;
                };

                let Some(distribution) = analyzer.classify(&frame).await else {
                    debug!("No face in frame, skipping emotion sample");
                    return;
                };

                let sample = EmotionSample {
                    timestamp_seconds: surface.elapsed(),
                    distribution,
                };

                let delivered = live.run_if_live(|| {
                    samples.fetch_add(1, Ordering::SeqCst);
                    sink(sample);
                });

                if !delivered {
                    debug!("Discarded emotion sample resolved after stop");
                }
            }
            .boxed()
        });

        self.task = Some(task);
    }

    /// Stop sampling. Safe to call repeatedly and while a tick is in flight.
    pub fn stop(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.cancel();
            info!("Emotion tracking stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| t.is_running())
    }

    /// Samples delivered to the sink so far
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::SeqCst)
    }
}

impl Drop for EmotionSampler {
    fn drop(&mut self) {
        self.stop();
    }
}
