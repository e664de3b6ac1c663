//! Video-id extraction from the URL shapes users actually paste.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref VIDEO_ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([0-9A-Za-z_-]{11})").unwrap(),
        Regex::new(r"youtube\.com/embed/([0-9A-Za-z_-]{11})").unwrap(),
        Regex::new(r"youtube\.com/v/([0-9A-Za-z_-]{11})").unwrap(),
    ];
}

/// Extracts the 11-character video id from a YouTube URL.
///
/// Returns `None` when no known URL shape matches.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_owned())
}
