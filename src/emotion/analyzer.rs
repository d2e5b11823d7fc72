use super::sample::EmotionDistribution;
use crate::camera::VideoFrame;
use crate::notify::{Notice, Notifier};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

const MODELS_NOTICE_ID: &str = "models-loading";

/// External face detection and expression model
#[async_trait::async_trait]
pub trait FaceClassifier: Send + Sync {
    /// Load the detector and expression networks
    async fn load_models(&self) -> Result<()>;

    /// Whether a single face is present in the frame
    async fn detect_face(&self, frame: &VideoFrame) -> Result<bool>;

    /// Expression probabilities for the face in the frame, `None` if no face
    async fn classify_expressions(&self, frame: &VideoFrame)
        -> Result<Option<EmotionDistribution>>;
}

/// Outcome of a face-presence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceCheck {
    Present,
    Absent,
    /// The models could not be loaded, so no check was possible
    ModelsUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelState {
    Unloaded,
    Ready,
    Failed,
}

/// Classifier wrapper that loads models on first use
///
/// A failed load is remembered: later calls report the models as unavailable
/// instead of retrying.
pub struct FaceAnalyzer {
    classifier: Arc<dyn FaceClassifier>,
    notifier: Arc<dyn Notifier>,
    models: Mutex<ModelState>,
}

impl FaceAnalyzer {
    pub fn new(classifier: Arc<dyn FaceClassifier>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            classifier,
            notifier,
            models: Mutex::new(ModelState::Unloaded),
        }
    }

    /// Load models if not already attempted. Returns whether they are usable.
    pub async fn ensure_models(&self) -> bool {
        let mut state = self.models.lock().await;

        match *state {
            ModelState::Ready => true,
            ModelState::Failed => false,
            ModelState::Unloaded => {
                self.notifier.notify(
                    Notice::loading("Loading face detection models...").with_id(MODELS_NOTICE_ID),
                );

                match self.classifier.load_models().await {
                    Ok(()) => {
                        info!("Face detection models loaded");
                        self.notifier.notify(
                            Notice::success("Face detection models loaded!")
                                .with_id(MODELS_NOTICE_ID),
                        );
                        *state = ModelState::Ready;
                        true
                    }
                    Err(e) => {
                        error!("Error loading face detection models: {:#}", e);
                        self.notifier.notify(
                            Notice::error("Failed to load face detection models")
                                .with_id(MODELS_NOTICE_ID),
                        );
                        *state = ModelState::Failed;
                        false
                    }
                }
            }
        }
    }

    /// Single face-presence check on one frame
    pub async fn has_face(&self, frame: &VideoFrame) -> FaceCheck {
        if !self.ensure_models().await {
            return FaceCheck::ModelsUnavailable;
        }

        match self.classifier.detect_face(frame).await {
            Ok(true) => FaceCheck::Present,
            Ok(false) => FaceCheck::Absent,
            Err(e) => {
                error!("Error detecting face: {:#}", e);
                FaceCheck::Absent
            }
        }
    }

    /// Classify one frame. `None` when no face is found or models are unavailable.
    pub async fn classify(&self, frame: &VideoFrame) -> Option<EmotionDistribution> {
        if !self.ensure_models().await {
            return None;
        }

        match self.classifier.classify_expressions(frame).await {
            Ok(dist) => dist,
            Err(e) => {
                debug!("Error analyzing emotions: {:#}", e);
                None
            }
        }
    }
}
