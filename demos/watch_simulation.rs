// Example: Simulate a camera-gated watch session
//
// This example drives a VideoSession end to end with simulated collaborators:
// 1. Attach a player for the given YouTube link
// 2. Deliver Ready and Playing events (camera prompt + face check)
// 3. Let progress and emotion sampling run for a while
// 4. Ask to close and print the session stats
//
// Progress reports are logged, or POSTed when --endpoint is given
// (run the `weesee` server first for that).
//
// Usage: cargo run --example watch_simulation -- --seconds 15 --endpoint http://127.0.0.1:3010/api/video-tracking

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn, Level};
use weesee::player::youtube::extract_video_id;
use weesee::{
    CloseDecision, EmotionDistribution, EmotionLabel, EmotionSample, FaceClassifier,
    HttpProgressReporter, MediaDevices, MediaError, MediaStream, PlaybackState, PlayerEvent,
    PlayerFactory, PlayerState, ProgressReport, ProgressReporter, SessionCallbacks,
    SessionConfig, SessionDeps, TracingNotifier, VideoFrame, VideoPlayer, VideoSession,
};

#[derive(Parser)]
#[command(name = "watch_simulation")]
#[command(about = "Simulate a camera-gated video watch session")]
struct Args {
    /// YouTube link or bare video id
    #[arg(short, long, default_value = "https://youtu.be/dQw4w9WgXcQ")]
    video: String,

    /// How long to keep the simulated video playing
    #[arg(short, long, default_value = "12")]
    seconds: u64,

    /// Length of the simulated video in seconds
    #[arg(short, long, default_value = "60")]
    duration: f64,

    /// Tracking endpoint; progress is only logged when omitted
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Viewer id sent with progress reports
    #[arg(short, long, default_value = "demo-viewer")]
    user: String,

    /// Play without the camera gate
    #[arg(long)]
    no_camera: bool,

    /// Simulate the viewer refusing the camera prompt
    #[arg(long)]
    deny_camera: bool,
}

// ============================================================================
// Simulated player: time advances while playing
// ============================================================================

struct SimPlayer {
    video_id: String,
    duration: f64,
    playing_since: Mutex<Option<Instant>>,
    banked: Mutex<f64>,
}

impl SimPlayer {
    fn play(&self) {
        let mut since = self.playing_since.lock().unwrap_or_else(|e| e.into_inner());
        since.get_or_insert_with(Instant::now);
    }
}

impl VideoPlayer for SimPlayer {
    fn current_time(&self) -> Option<f64> {
        let banked = *self.banked.lock().unwrap_or_else(|e| e.into_inner());
        let running = self
            .playing_since
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        Some((banked + running).min(self.duration))
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn pause(&self) {
        let mut since = self.playing_since.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(t) = since.take() {
            *self.banked.lock().unwrap_or_else(|e| e.into_inner()) += t.elapsed().as_secs_f64();
        }
        info!("Player {} paused", self.video_id);
    }

    fn destroy(&self) -> Result<()> {
        info!("Player {} destroyed", self.video_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

struct SimPlayers {
    duration: f64,
    last: Mutex<Option<Arc<SimPlayer>>>,
}

impl PlayerFactory for SimPlayers {
    fn create(&self, video_id: &str) -> Result<Arc<dyn VideoPlayer>> {
        let player = Arc::new(SimPlayer {
            video_id: video_id.to_string(),
            duration: self.duration,
            playing_since: Mutex::new(None),
            banked: Mutex::new(0.0),
        });
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&player));
        Ok(player)
    }
}

// ============================================================================
// Simulated camera and classifier
// ============================================================================

struct SimStream {
    live: AtomicBool,
}

#[async_trait::async_trait]
impl MediaStream for SimStream {
    fn id(&self) -> &str {
        "sim-camera"
    }

    fn active_tracks(&self) -> usize {
        usize::from(self.live.load(Ordering::SeqCst))
    }

    fn stop_tracks(&self) -> Result<()> {
        if self.live.swap(false, Ordering::SeqCst) {
            info!("Camera tracks stopped");
        }
        Ok(())
    }

    async fn capture_frame(&self) -> Result<VideoFrame> {
        anyhow::ensure!(self.live.load(Ordering::SeqCst), "camera stopped");
        Ok(VideoFrame {
            width: 640,
            height: 480,
            data: vec![0; 640 * 480 * 4],
        })
    }
}

struct SimDevices {
    deny: bool,
}

#[async_trait::async_trait]
impl MediaDevices for SimDevices {
    async fn request_video_stream(&self) -> std::result::Result<Arc<dyn MediaStream>, MediaError> {
        // Viewer takes a moment to answer the prompt
        sleep(Duration::from_millis(500)).await;
        if self.deny {
            return Err(MediaError::PermissionDenied);
        }
        Ok(Arc::new(SimStream {
            live: AtomicBool::new(true),
        }))
    }
}

/// Cycles through a few expressions so the samples are not all identical
#[derive(Default)]
struct SimClassifier {
    frames: AtomicU64,
}

#[async_trait::async_trait]
impl FaceClassifier for SimClassifier {
    async fn load_models(&self) -> Result<()> {
        sleep(Duration::from_millis(200)).await;
        Ok(())
    }

    async fn detect_face(&self, _frame: &VideoFrame) -> Result<bool> {
        Ok(true)
    }

    async fn classify_expressions(
        &self,
        _frame: &VideoFrame,
    ) -> Result<Option<EmotionDistribution>> {
        let n = self.frames.fetch_add(1, Ordering::SeqCst);
        let lead = EmotionLabel::ALL[(n as usize) % 3];
        Ok(Some(EmotionDistribution::from_scores(
            EmotionLabel::ALL
                .into_iter()
                .map(|label| (label, if label == lead { 0.7 } else { 0.05 })),
        )))
    }
}

/// Reporter used when no endpoint is configured
struct LoggingReporter;

#[async_trait::async_trait]
impl ProgressReporter for LoggingReporter {
    async fn report(&self, report: &ProgressReport) -> Result<()> {
        info!(
            "Progress {}: {:.1}s / {:.1}s",
            report.video_id, report.current_time, report.duration
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let args = Args::parse();

    let video_id = extract_video_id(&args.video).unwrap_or_else(|| args.video.clone());
    info!("WeeSee - Watch Session Simulation");
    info!("Video: {} ({:.0}s)", video_id, args.duration);
    info!("Playing for {} seconds", args.seconds);

    let reporter: Arc<dyn ProgressReporter> = match &args.endpoint {
        Some(endpoint) => {
            info!("Reporting progress to {}", endpoint);
            Arc::new(HttpProgressReporter::new(endpoint.as_str())?.with_user(&args.user))
        }
        None => Arc::new(LoggingReporter),
    };

    let players = Arc::new(SimPlayers {
        duration: args.duration,
        last: Mutex::new(None),
    });

    let session = VideoSession::new(
        SessionConfig::default(),
        SessionDeps {
            players: players.clone(),
            devices: Arc::new(SimDevices {
                deny: args.deny_camera,
            }),
            classifier: Arc::new(SimClassifier::default()),
            reporter,
            notifier: Arc::new(TracingNotifier),
        },
    );

    let callbacks = SessionCallbacks {
        on_ready: Some(Arc::new(|| info!("Player ready"))),
        on_play: Some(Arc::new(|| info!("Playback started"))),
        on_emotion: Some(Arc::new(|sample: EmotionSample| {
            let dominant = sample
                .distribution
                .dominant()
                .map(|l| l.as_str())
                .unwrap_or("none");
            info!("Emotion at {:.1}s: {}", sample.timestamp_seconds, dominant);
        })),
        on_close: Some(Arc::new(|| info!("Dialog closed"))),
    };

    let binding = session
        .attach(&video_id, !args.no_camera, callbacks)
        .context("Failed to attach player")?;

    session.handle_event(binding, PlayerEvent::Ready).await;
    session
        .handle_event(binding, PlayerEvent::StateChange(PlayerState::Playing))
        .await;

    // The host player keeps running even if gating paused it; mirror that
    if let Some(player) = players.last.lock().unwrap_or_else(|e| e.into_inner()).clone() {
        if session.playback_state() == PlaybackState::Playing {
            player.play();
        } else {
            warn!("Playback blocked: {:?}", session.playback_state());
        }
    }

    sleep(Duration::from_secs(args.seconds)).await;

    match session.request_close() {
        CloseDecision::Allowed => info!("Watched enough, closing"),
        CloseDecision::NeedsConfirmation { percent } => {
            info!("Only {:.1}% watched, confirming close anyway", percent)
        }
    }

    let stats = session.stats();
    session.confirm_close();

    // Let in-flight progress reports finish
    sleep(Duration::from_millis(500)).await;

    info!("Session {} summary:", stats.session_id);
    info!("  Progress: {:.1}%", stats.progress.percent);
    info!("  Progress reports: {}", stats.progress_ticks);
    info!("  Emotion samples: {}", stats.emotion_samples);
    info!("  Camera: {:?}", stats.camera);

    Ok(())
}
