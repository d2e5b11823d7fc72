use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

/// Errors from the host's media device layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("Camera permission denied")]
    PermissionDenied,
    #[error("No camera available")]
    NotFound,
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
}

/// A single captured video frame (RGBA, row-major)
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Live camera stream handed out by the host
#[async_trait::async_trait]
pub trait MediaStream: Send + Sync {
    fn id(&self) -> &str;

    /// Number of tracks still producing frames
    fn active_tracks(&self) -> usize;

    /// Stop every track. Stopping an already-stopped stream is a no-op.
    fn stop_tracks(&self) -> Result<()>;

    async fn capture_frame(&self) -> Result<VideoFrame>;
}

/// Permission-gated access to the host camera
#[async_trait::async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request a video-only stream, prompting the viewer if needed
    async fn request_video_stream(&self) -> std::result::Result<Arc<dyn MediaStream>, MediaError>;
}

/// Hidden playback surface bound to a camera stream
///
/// Frames are grabbed from here for face checks and emotion sampling.
/// After [`CaptureSurface::detach`] no further frames are produced.
pub struct CaptureSurface {
    stream: Arc<dyn MediaStream>,
    attached: AtomicBool,
    started: Instant,
}

impl CaptureSurface {
    pub fn new(stream: Arc<dyn MediaStream>) -> Self {
        debug!("Capture surface attached to stream {}", stream.id());
        Self {
            stream,
            attached: AtomicBool::new(true),
            started: Instant::now(),
        }
    }

    pub async fn grab(&self) -> Option<VideoFrame> {
        if !self.is_attached() {
            return None;
        }

        match self.stream.capture_frame().await {
            Ok(frame) => Some(frame),
            Err(e) => {
                debug!("Frame capture failed on {}: {:#}", self.stream.id(), e);
                None
            }
        }
    }

    /// Detach from the stream. Returns false if already detached.
    pub fn detach(&self) -> bool {
        self.attached.swap(false, Ordering::SeqCst)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Seconds since the surface started playing the stream
    pub fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn stream(&self) -> &Arc<dyn MediaStream> {
        &self.stream
    }
}
