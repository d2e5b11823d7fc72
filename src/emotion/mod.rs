//! Facial-expression sampling from the camera feed
//!
//! - [`FaceClassifier`]: the external face/expression model
//! - [`FaceAnalyzer`]: lazy model loading and the face-presence check
//! - [`EmotionSampler`]: the periodic classification loop feeding a sink

mod analyzer;
mod sample;
mod sampler;

pub use analyzer::{FaceAnalyzer, FaceCheck, FaceClassifier};
pub use sample::{EmotionDistribution, EmotionLabel, EmotionSample, EmotionSink};
pub use sampler::EmotionSampler;
