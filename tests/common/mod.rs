// Fake collaborators shared by the integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use weesee::{
    EmotionDistribution, EmotionLabel, FaceClassifier, MediaDevices, MediaError, MediaStream,
    Notice, NoticeLevel, Notifier, PlayerFactory, ProgressReport, ProgressReporter, SessionConfig,
    SessionDeps, VideoFrame, VideoPlayer, VideoSession,
};

/// Let spawned tasks run after the clock moved
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

pub async fn advance(secs: u64) {
    tokio::time::advance(Duration::from_secs(secs)).await;
    settle().await;
}

/// Ordered record of side effects across fakes
#[derive(Default)]
pub struct EventLog {
    entries: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

// ============================================================================
// Player
// ============================================================================

pub struct FakePlayer {
    video_id: String,
    current: Mutex<Option<f64>>,
    duration: Mutex<Option<f64>>,
    pauses: AtomicUsize,
    destroyed: AtomicBool,
    log: Arc<EventLog>,
}

impl FakePlayer {
    pub fn set_time(&self, secs: f64) {
        *self.current.lock().unwrap() = Some(secs);
    }

    pub fn set_duration(&self, secs: Option<f64>) {
        *self.duration.lock().unwrap() = secs;
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl VideoPlayer for FakePlayer {
    fn current_time(&self) -> Option<f64> {
        *self.current.lock().unwrap()
    }

    fn duration(&self) -> Option<f64> {
        *self.duration.lock().unwrap()
    }

    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("pause:{}", self.video_id));
    }

    fn destroy(&self) -> Result<()> {
        self.destroyed.store(true, Ordering::SeqCst);
        self.log.push(format!("destroy:{}", self.video_id));
        Ok(())
    }

    fn name(&self) -> &str {
        &self.video_id
    }
}

pub struct FakePlayerFactory {
    players: Mutex<Vec<Arc<FakePlayer>>>,
    log: Arc<EventLog>,
    pub fail: AtomicBool,
}

impl FakePlayerFactory {
    pub fn last(&self) -> Arc<FakePlayer> {
        self.players.lock().unwrap().last().cloned().expect("no player created")
    }

    pub fn created(&self) -> usize {
        self.players.lock().unwrap().len()
    }
}

impl PlayerFactory for FakePlayerFactory {
    fn create(&self, video_id: &str) -> Result<Arc<dyn VideoPlayer>> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("embed script failed to load");
        }

        self.log.push(format!("create:{}", video_id));
        let player = Arc::new(FakePlayer {
            video_id: video_id.to_string(),
            current: Mutex::new(Some(0.0)),
            duration: Mutex::new(Some(100.0)),
            pauses: AtomicUsize::new(0),
            destroyed: AtomicBool::new(false),
            log: Arc::clone(&self.log),
        });
        self.players.lock().unwrap().push(Arc::clone(&player));
        Ok(player)
    }
}

// ============================================================================
// Camera
// ============================================================================

pub struct FakeStream {
    id: String,
    tracks: AtomicUsize,
    log: Arc<EventLog>,
}

#[async_trait::async_trait]
impl MediaStream for FakeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn active_tracks(&self) -> usize {
        self.tracks.load(Ordering::SeqCst)
    }

    fn stop_tracks(&self) -> Result<()> {
        if self.tracks.swap(0, Ordering::SeqCst) > 0 {
            self.log.push(format!("stop_tracks:{}", self.id));
        }
        Ok(())
    }

    async fn capture_frame(&self) -> Result<VideoFrame> {
        if self.active_tracks() == 0 {
            bail!("stream {} stopped", self.id);
        }
        Ok(VideoFrame {
            width: 2,
            height: 2,
            data: vec![0; 16],
        })
    }
}

pub struct FakeDevices {
    pub deny: AtomicBool,
    /// When set, requests wait for a permit (simulates an open permission prompt)
    pub hold: Option<Semaphore>,
    streams: Mutex<Vec<Arc<FakeStream>>>,
    requests: AtomicUsize,
    log: Arc<EventLog>,
}

impl FakeDevices {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn streams(&self) -> Vec<Arc<FakeStream>> {
        self.streams.lock().unwrap().clone()
    }

    pub fn live_tracks(&self) -> usize {
        self.streams().iter().map(|s| s.active_tracks()).sum()
    }

    pub fn answer_prompt(&self) {
        if let Some(hold) = &self.hold {
            hold.add_permits(1);
        }
    }
}

#[async_trait::async_trait]
impl MediaDevices for FakeDevices {
    async fn request_video_stream(&self) -> std::result::Result<Arc<dyn MediaStream>, MediaError> {
        let n = self.requests.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(hold) = &self.hold {
            let permit = hold.acquire().await.map_err(|_| MediaError::NotFound)?;
            permit.forget();
        }

        if self.deny.load(Ordering::SeqCst) {
            return Err(MediaError::PermissionDenied);
        }

        let stream = Arc::new(FakeStream {
            id: format!("stream-{}", n),
            tracks: AtomicUsize::new(1),
            log: Arc::clone(&self.log),
        });
        self.log.push(format!("acquire:{}", stream.id));
        self.streams.lock().unwrap().push(Arc::clone(&stream));
        Ok(stream)
    }
}

// ============================================================================
// Classifier
// ============================================================================

pub struct FakeClassifier {
    pub face: AtomicBool,
    pub fail_load: AtomicBool,
    /// When set, expression classification waits for a permit
    pub hold: Option<Semaphore>,
    loads: AtomicUsize,
}

impl FakeClassifier {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn happy() -> EmotionDistribution {
        EmotionDistribution::from_scores([
            (EmotionLabel::Neutral, 0.1),
            (EmotionLabel::Happy, 0.8),
            (EmotionLabel::Surprised, 0.1),
        ])
    }
}

#[async_trait::async_trait]
impl FaceClassifier for FakeClassifier {
    async fn load_models(&self) -> Result<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load.load(Ordering::SeqCst) {
            bail!("model weights not found at /models");
        }
        Ok(())
    }

    async fn detect_face(&self, _frame: &VideoFrame) -> Result<bool> {
        Ok(self.face.load(Ordering::SeqCst))
    }

    async fn classify_expressions(
        &self,
        _frame: &VideoFrame,
    ) -> Result<Option<EmotionDistribution>> {
        if let Some(hold) = &self.hold {
            let permit = hold.acquire().await?;
            permit.forget();
        }

        if self.face.load(Ordering::SeqCst) {
            Ok(Some(Self::happy()))
        } else {
            Ok(None)
        }
    }
}

// ============================================================================
// Reporter / notifier
// ============================================================================

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<ProgressReport>>,
    pub fail: AtomicBool,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<ProgressReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ProgressReporter for RecordingReporter {
    async fn report(&self, report: &ProgressReport) -> Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        if self.fail.load(Ordering::SeqCst) {
            bail!("tracking endpoint returned 500");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message)
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Success)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub log: Arc<EventLog>,
    pub players: Arc<FakePlayerFactory>,
    pub devices: Arc<FakeDevices>,
    pub classifier: Arc<FakeClassifier>,
    pub reporter: Arc<RecordingReporter>,
    pub notifier: Arc<RecordingNotifier>,
}

#[derive(Default)]
pub struct HarnessOptions {
    pub hold_prompt: bool,
    pub hold_classification: bool,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_options(HarnessOptions::default())
    }

    pub fn with_options(options: HarnessOptions) -> Self {
        let log = Arc::new(EventLog::default());

        Self {
            players: Arc::new(FakePlayerFactory {
                players: Mutex::new(Vec::new()),
                log: Arc::clone(&log),
                fail: AtomicBool::new(false),
            }),
            devices: Arc::new(FakeDevices {
                deny: AtomicBool::new(false),
                hold: options.hold_prompt.then(|| Semaphore::new(0)),
                streams: Mutex::new(Vec::new()),
                requests: AtomicUsize::new(0),
                log: Arc::clone(&log),
            }),
            classifier: Arc::new(FakeClassifier {
                face: AtomicBool::new(true),
                fail_load: AtomicBool::new(false),
                hold: options.hold_classification.then(|| Semaphore::new(0)),
                loads: AtomicUsize::new(0),
            }),
            reporter: Arc::new(RecordingReporter::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            log,
        }
    }

    pub fn deps(&self) -> SessionDeps {
        SessionDeps {
            players: self.players.clone(),
            devices: self.devices.clone(),
            classifier: self.classifier.clone(),
            reporter: self.reporter.clone(),
            notifier: self.notifier.clone(),
        }
    }

    pub fn session(&self) -> VideoSession {
        VideoSession::new(SessionConfig::default(), self.deps())
    }
}
