pub mod backend;
pub mod youtube;

pub use backend::{PlayerEvent, PlayerFactory, PlayerState, VideoPlayer};
pub use youtube::{embed_video_id, extract_video_id};
