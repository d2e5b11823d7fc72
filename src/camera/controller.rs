use super::device::{CaptureSurface, MediaDevices};
use crate::emotion::{EmotionSampler, EmotionSink, FaceAnalyzer, FaceCheck};
use crate::notify::{Notice, Notifier};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Camera consent state for a session that requires the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraState {
    NotRequested,
    Requesting,
    /// Stream live and a face was verified
    Granted,
    Denied,
}

/// What to do when the face models cannot be loaded during verification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFailurePolicy {
    /// Treat as a failed verification: release the camera and keep playback paused
    #[default]
    Block,
    /// Grant access without a face check
    Allow,
}

/// Camera requirement fixed when a video is attached
pub enum CameraGate {
    NotRequired,
    Required(Arc<CameraController>),
}

impl CameraGate {
    pub fn state(&self) -> Option<CameraState> {
        match self {
            CameraGate::NotRequired => None,
            CameraGate::Required(camera) => Some(camera.state()),
        }
    }

    pub fn controller(&self) -> Option<&Arc<CameraController>> {
        match self {
            CameraGate::NotRequired => None,
            CameraGate::Required(camera) => Some(camera),
        }
    }
}

struct CameraInner {
    state: CameraState,
    /// Bumped on every release so a grant resolving afterwards is discarded
    epoch: u64,
    surface: Option<Arc<CaptureSurface>>,
    emotion: EmotionSampler,
}

/// Sole owner of the camera stream for one session
///
/// Access is granted only once a face is verified on the live stream. The
/// internal lock is never held across an await, so `release` can run while
/// a permission prompt is still pending.
pub struct CameraController {
    devices: Arc<dyn MediaDevices>,
    analyzer: Arc<FaceAnalyzer>,
    notifier: Arc<dyn Notifier>,
    policy: ModelFailurePolicy,
    inner: Mutex<CameraInner>,
}

impl CameraController {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        analyzer: Arc<FaceAnalyzer>,
        notifier: Arc<dyn Notifier>,
        policy: ModelFailurePolicy,
        emotion_period: Duration,
    ) -> Self {
        Self {
            devices,
            analyzer,
            notifier,
            policy,
            inner: Mutex::new(CameraInner {
                state: CameraState::NotRequested,
                epoch: 0,
                surface: None,
                emotion: EmotionSampler::new(emotion_period),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CameraInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> CameraState {
        self.lock().state
    }

    pub fn is_granted(&self) -> bool {
        self.state() == CameraState::Granted
    }

    /// Active tracks on the held stream, 0 when nothing is held
    pub fn active_tracks(&self) -> usize {
        self.lock()
            .surface
            .as_ref()
            .map(|s| s.stream().active_tracks())
            .unwrap_or(0)
    }

    pub fn emotion_samples(&self) -> u64 {
        self.lock().emotion.samples()
    }

    /// Ask for the camera and verify a face is visible
    ///
    /// Returns true only when a stream is held and a face was found (or the
    /// model-failure policy allows skipping the check). A call made while
    /// another request is outstanding returns false.
    pub async fn request_access(&self) -> bool {
        let epoch = {
            let mut inner = self.lock();
            match inner.state {
                CameraState::Granted => return true,
                CameraState::Requesting => {
                    warn!("Camera request already in progress, ignoring");
                    return false;
                }
                CameraState::NotRequested | CameraState::Denied => {}
            }
            inner.state = CameraState::Requesting;
            inner.epoch
        };

        info!("Requesting camera access");

        let stream = match self.devices.request_video_stream().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Camera access failed: {}", e);
                self.notifier.notify(Notice::error(
                    "Camera access denied or no camera available. Video playback is blocked.",
                ));
                self.settle(epoch, CameraState::Denied);
                return false;
            }
        };

        let surface = Arc::new(CaptureSurface::new(stream));

        let check = match surface.grab().await {
            Some(frame) => self.analyzer.has_face(&frame).await,
            None => FaceCheck::Absent,
        };

        let verified = match check {
            FaceCheck::Present => true,
            FaceCheck::Absent => {
                self.notifier.notify(Notice::error(
                    "No face detected. Please make sure your face is visible to the camera.",
                ));
                false
            }
            FaceCheck::ModelsUnavailable => match self.policy {
                ModelFailurePolicy::Block => {
                    self.notifier.notify(Notice::error(
                        "Face verification is unavailable. Video playback is blocked.",
                    ));
                    false
                }
                ModelFailurePolicy::Allow => {
                    warn!("Face models unavailable, granting camera without verification");
                    true
                }
            },
        };

        {
            let mut inner = self.lock();

            if inner.epoch != epoch {
                drop(inner);
                debug!("Camera released while request was pending, dropping new stream");
                Self::teardown(&surface);
                return false;
            }

            if !verified {
                inner.state = CameraState::Denied;
                drop(inner);
                Self::teardown(&surface);
                return false;
            }

            inner.state = CameraState::Granted;
            inner.surface = Some(Arc::clone(&surface));
        }

        info!("Camera granted on stream {}", surface.stream().id());
        self.notifier.notify(Notice::success(
            "Camera access granted. You can now watch the video.",
        ));

        true
    }

    /// Start the emotion sampler on the granted stream. False if no stream is held.
    pub fn start_emotion_sampling(&self, sink: EmotionSink) -> bool {
        let mut inner = self.lock();

        let Some(surface) = inner.surface.clone() else {
            debug!("No camera stream, emotion tracking not started");
            return false;
        };

        inner.emotion.start(surface, Arc::clone(&self.analyzer), sink);
        true
    }

    pub fn stop_emotion_sampling(&self) {
        self.lock().emotion.stop();
    }

    /// Release the stream: sampler first, then the surface, then the tracks
    ///
    /// Idempotent. Returns whether a stream was actually released.
    pub fn release(&self) -> bool {
        let surface = {
            let mut inner = self.lock();
            inner.epoch += 1;
            inner.emotion.stop();
            if matches!(inner.state, CameraState::Granted | CameraState::Requesting) {
                inner.state = CameraState::NotRequested;
            }
            inner.surface.take()
        };

        match surface {
            Some(surface) => {
                Self::teardown(&surface);
                info!("Camera released");
                true
            }
            None => false,
        }
    }

    fn settle(&self, epoch: u64, state: CameraState) {
        let mut inner = self.lock();
        if inner.epoch == epoch {
            inner.state = state;
        }
    }

    fn teardown(surface: &CaptureSurface) {
        surface.detach();
        if let Err(e) = surface.stream().stop_tracks() {
            error!("Failed to stop camera tracks: {:#}", e);
        }
    }
}

impl Drop for CameraController {
    fn drop(&mut self) {
        self.release();
    }
}
