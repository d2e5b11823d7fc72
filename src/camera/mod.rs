pub mod controller;
pub mod device;

pub use controller::{CameraController, CameraGate, CameraState, ModelFailurePolicy};
pub use device::{CaptureSurface, MediaDevices, MediaError, MediaStream, VideoFrame};
