//! Playback progress sampling
//!
//! The sampler polls the bound player on a fixed period, keeps the latest
//! [`PlaybackProgress`] for the close gate, and forwards each reading to a
//! [`ProgressReporter`] as fire-and-forget telemetry.

mod reporter;
mod sampler;

pub use reporter::{HttpProgressReporter, ProgressReport, ProgressReporter};
pub use sampler::{progress_percent, PlaybackProgress, ProgressSampler};
