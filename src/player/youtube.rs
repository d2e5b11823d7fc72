// YouTube link parsing for the gallery upload form and the video dialog

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref YOUTUBE_ID: Regex = Regex::new(
        r"(?:https?://)?(?:www\.)?(?:youtube\.com/(?:[^/\n\s]+/\S+/|(?:v|e(?:mbed)?)/|\S*?[?&]v=)|youtu\.be/)([a-zA-Z0-9_-]{11})"
    )
    .expect("YouTube id pattern is valid");
}

/// Extract the 11-character video id from a YouTube URL
///
/// Accepts watch (`?v=`), embed, `v/`, `e/` and `youtu.be` short links.
pub fn extract_video_id(url: &str) -> Option<String> {
    YOUTUBE_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Video id from an embed source (`.../embed/<id>?params`)
///
/// Falls back to [`extract_video_id`] for any other URL shape.
pub fn embed_video_id(src: &str) -> Option<String> {
    let from_embed = src
        .split("/embed/")
        .nth(1)
        .and_then(|rest| rest.split('?').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    from_embed.or_else(|| extract_video_id(src))
}
