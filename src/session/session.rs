use super::config::SessionConfig;
use super::stats::{CloseDecision, PlaybackState, SessionStats};
use crate::camera::{CameraController, CameraGate, MediaDevices};
use crate::emotion::{EmotionSink, FaceAnalyzer, FaceClassifier};
use crate::notify::Notifier;
use crate::player::{embed_video_id, PlayerEvent, PlayerFactory, PlayerState, VideoPlayer};
use crate::progress::{ProgressReporter, ProgressSampler};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Identifies one player binding; events from older bindings are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding-{}", self.0)
    }
}

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Hooks for the UI hosting the video dialog, scoped to one binding
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    /// Player finished loading
    pub on_ready: Option<Callback>,
    /// Playback actually started (after camera gating)
    pub on_play: Option<Callback>,
    /// Receives emotion samples while playing with a granted camera
    pub on_emotion: Option<EmotionSink>,
    /// Teardown after a confirmed close finished
    pub on_close: Option<Callback>,
}

/// External collaborators of a session
#[derive(Clone)]
pub struct SessionDeps {
    pub players: Arc<dyn PlayerFactory>,
    pub devices: Arc<dyn MediaDevices>,
    pub classifier: Arc<dyn FaceClassifier>,
    pub reporter: Arc<dyn ProgressReporter>,
    pub notifier: Arc<dyn Notifier>,
}

struct Binding {
    id: BindingId,
    video_id: String,
    player: Arc<dyn VideoPlayer>,
    gate: CameraGate,
    callbacks: SessionCallbacks,
    /// A play event is waiting on camera gating
    pending_play: bool,
}

struct SessionInner {
    binding: Option<Binding>,
    next_binding: u64,
    playback: PlaybackState,
    progress: ProgressSampler,
}

impl SessionInner {
    fn current(&mut self, id: BindingId) -> Option<&mut Binding> {
        self.binding.as_mut().filter(|b| b.id == id)
    }
}

/// Orchestrates one open video dialog
///
/// All methods take `&self`; the state lock is never held across an await,
/// so a close can interleave with a pending camera prompt.
pub struct VideoSession {
    session_id: String,
    config: SessionConfig,
    deps: SessionDeps,
    /// Shared across bindings so face models load once per session
    analyzer: Arc<FaceAnalyzer>,
    started_at: DateTime<Utc>,
    inner: Mutex<SessionInner>,
}

impl VideoSession {
    pub fn new(config: SessionConfig, deps: SessionDeps) -> Self {
        let session_id = format!("watch-{}", uuid::Uuid::new_v4());
        info!("Creating watch session: {}", session_id);

        let analyzer = Arc::new(FaceAnalyzer::new(
            Arc::clone(&deps.classifier),
            Arc::clone(&deps.notifier),
        ));
        let progress = ProgressSampler::new(config.progress_interval, Arc::clone(&deps.reporter));

        Self {
            session_id,
            config,
            deps,
            analyzer,
            started_at: Utc::now(),
            inner: Mutex::new(SessionInner {
                binding: None,
                next_binding: 0,
                playback: PlaybackState::Idle,
                progress,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Bind a new player for `video_id`, tearing down any previous binding first
    ///
    /// Returns `None` (after logging) if the id is empty or the player could
    /// not be created.
    pub fn attach(
        &self,
        video_id: &str,
        camera_required: bool,
        callbacks: SessionCallbacks,
    ) -> Option<BindingId> {
        self.teardown("re-attach");

        let video_id = video_id.trim();
        if video_id.is_empty() {
            warn!("No video id given, player not created");
            return None;
        }

        let player = match self.deps.players.create(video_id) {
            Ok(player) => player,
            Err(e) => {
                error!("Failed to create player for {}: {:#}", video_id, e);
                return None;
            }
        };

        let gate = if camera_required {
            CameraGate::Required(Arc::new(CameraController::new(
                Arc::clone(&self.deps.devices),
                Arc::clone(&self.analyzer),
                Arc::clone(&self.deps.notifier),
                self.config.model_failure_policy,
                self.config.emotion_interval,
            )))
        } else {
            CameraGate::NotRequired
        };

        let mut inner = self.lock();
        inner.next_binding += 1;
        let id = BindingId(inner.next_binding);

        inner.progress.reset();
        inner.playback = PlaybackState::Idle;
        inner.binding = Some(Binding {
            id,
            video_id: video_id.to_string(),
            player,
            gate,
            callbacks,
            pending_play: false,
        });

        info!(
            "Attached {} to video {} (camera required: {})",
            id, video_id, camera_required
        );

        Some(id)
    }

    /// Attach using an embed URL (`.../embed/<id>?...`) or any YouTube link
    pub fn attach_embed(
        &self,
        src: &str,
        camera_required: bool,
        callbacks: SessionCallbacks,
    ) -> Option<BindingId> {
        let video_id = embed_video_id(src).unwrap_or_default();
        self.attach(&video_id, camera_required, callbacks)
    }

    /// Feed an event from the player bound as `binding`
    pub async fn handle_event(&self, binding: BindingId, event: PlayerEvent) {
        match event {
            PlayerEvent::Ready => {
                let on_ready = {
                    let mut inner = self.lock();
                    let Some(b) = inner.current(binding) else {
                        return;
                    };
                    b.callbacks.on_ready.clone()
                };
                debug!("Player ready for {}", binding);
                if let Some(on_ready) = on_ready {
                    on_ready();
                }
            }
            PlayerEvent::StateChange(PlayerState::Playing) => self.on_playing(binding).await,
            PlayerEvent::StateChange(PlayerState::Paused) => {
                self.on_stopped(binding, PlaybackState::Paused)
            }
            PlayerEvent::StateChange(PlayerState::Ended) => {
                self.on_stopped(binding, PlaybackState::Ended)
            }
            PlayerEvent::StateChange(other) => {
                debug!("Ignoring player state {:?} on {}", other, binding);
            }
        }
    }

    async fn on_playing(&self, binding: BindingId) {
        let (camera, player) = {
            let mut inner = self.lock();
            let playing = inner.playback == PlaybackState::Playing;

            let Some(b) = inner.current(binding) else {
                debug!("Ignoring play event from stale {}", binding);
                return;
            };

            if playing || b.pending_play {
                debug!("Already playing on {}, ignoring duplicate play event", binding);
                return;
            }

            let camera = b.gate.controller().cloned();
            if camera.as_ref().is_some_and(|c| !c.is_granted()) {
                b.pending_play = true;
            }

            (camera, Arc::clone(&b.player))
        };

        if let Some(camera) = camera.as_ref().filter(|c| !c.is_granted()) {
            let granted = camera.request_access().await;

            let superseded = {
                let mut inner = self.lock();
                let still_pending = match inner.current(binding) {
                    Some(b) if b.pending_play => {
                        b.pending_play = false;
                        true
                    }
                    _ => false,
                };
                !still_pending
            };

            if superseded {
                debug!("Play on {} superseded while waiting for camera", binding);
                return;
            }

            if !granted {
                info!("Camera gating not satisfied, pausing {}", player.name());
                player.pause();
                return;
            }
        }

        let on_play = {
            let mut inner = self.lock();

            let Some(b) = inner.current(binding) else {
                return;
            };
            let video_id = b.video_id.clone();
            let on_play = b.callbacks.on_play.clone();
            let on_emotion = b.callbacks.on_emotion.clone();

            inner.playback = PlaybackState::Playing;
            inner.progress.start(video_id.clone(), player);

            if let (Some(camera), Some(sink)) = (camera.as_ref(), on_emotion) {
                camera.start_emotion_sampling(sink);
            }

            info!("Playback started for {}", video_id);
            on_play
        };

        if let Some(on_play) = on_play {
            on_play();
        }
    }

    fn on_stopped(&self, binding: BindingId, state: PlaybackState) {
        let mut inner = self.lock();

        let camera = match inner.current(binding) {
            Some(b) => {
                b.pending_play = false;
                b.gate.controller().cloned()
            }
            None => {
                debug!("Ignoring {:?} from stale {}", state, binding);
                return;
            }
        };

        inner.progress.stop();
        if let Some(camera) = camera {
            camera.stop_emotion_sampling();
        }
        inner.playback = state;

        debug!("Playback {:?} on {}, sampling stopped", state, binding);
    }

    /// Whether the dialog may close without confirmation. No side effects.
    pub fn request_close(&self) -> CloseDecision {
        let percent = self.lock().progress.progress().percent;
        CloseDecision::for_progress(percent, self.config.close_threshold_percent)
    }

    /// Close after the viewer confirmed: full teardown, then `on_close`
    pub fn confirm_close(&self) {
        info!("Close confirmed for {}", self.session_id);

        if let Some(callbacks) = self.teardown("confirmed close") {
            if let Some(on_close) = callbacks.on_close {
                on_close();
            }
        }
    }

    /// Viewer backed out of closing; nothing changes
    pub fn cancel_close(&self) {
        let percent = self.lock().progress.progress().percent;
        info!("Close cancelled at {:.1}%", percent);
    }

    /// Unmount: stop samplers, release the camera, destroy the player
    pub fn detach(&self) {
        self.teardown("detach");
    }

    /// Best-effort teardown of the current binding. Each step runs even if
    /// an earlier one failed.
    fn teardown(&self, reason: &str) -> Option<SessionCallbacks> {
        let binding = {
            let mut inner = self.lock();
            inner.progress.stop();
            inner.playback = PlaybackState::Idle;
            inner.binding.take()
        }?;

        if let Some(camera) = binding.gate.controller() {
            camera.stop_emotion_sampling();
            camera.release();
        }

        if let Err(e) = binding.player.destroy() {
            error!("Failed to destroy player for {}: {:#}", binding.video_id, e);
        }

        info!(
            "Tore down {} for video {} ({})",
            binding.id, binding.video_id, reason
        );

        Some(binding.callbacks)
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.lock().playback
    }

    pub fn stats(&self) -> SessionStats {
        let inner = self.lock();
        let binding = inner.binding.as_ref();

        SessionStats {
            session_id: self.session_id.clone(),
            video_id: binding.map(|b| b.video_id.clone()),
            playback: inner.playback,
            camera: binding.and_then(|b| b.gate.state()),
            progress: inner.progress.progress(),
            progress_ticks: inner.progress.ticks(),
            emotion_samples: binding
                .and_then(|b| b.gate.controller())
                .map(|c| c.emotion_samples())
                .unwrap_or(0),
            started_at: self.started_at,
        }
    }
}

impl Drop for VideoSession {
    fn drop(&mut self) {
        self.teardown("drop");
    }
}
