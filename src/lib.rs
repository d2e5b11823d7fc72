pub mod camera;
pub mod config;
pub mod emotion;
pub mod http;
pub mod notify;
pub mod player;
pub mod progress;
pub mod schedule;
pub mod session;

pub use camera::{
    CameraController, CameraGate, CameraState, CaptureSurface, MediaDevices, MediaError,
    MediaStream, ModelFailurePolicy, VideoFrame,
};
pub use config::Config;
pub use emotion::{
    EmotionDistribution, EmotionLabel, EmotionSample, EmotionSink, FaceAnalyzer, FaceCheck,
    FaceClassifier,
};
pub use http::{create_router, AppState, InMemoryTrackingStore, TrackingRecord, TrackingStore};
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use player::{PlayerEvent, PlayerFactory, PlayerState, VideoPlayer};
pub use progress::{
    progress_percent, HttpProgressReporter, PlaybackProgress, ProgressReport, ProgressReporter,
};
pub use session::{
    BindingId, CloseDecision, PlaybackState, SessionCallbacks, SessionConfig, SessionDeps,
    SessionStats, VideoSession,
};
