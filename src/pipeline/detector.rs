// Platform classification from URL substrings

use super::models::PlatformKind;

const TIKTOK_MARKERS: &[&str] = &["tiktok.com"];
const INSTAGRAM_MARKERS: &[&str] = &["instagram.com", "instagr.am"];
const SHORTS_MARKERS: &[&str] = &["/shorts/", "youtu.be/"];

/// Classify a post URL. First match wins; anything unrecognised is `Unknown`.
pub fn detect(url: &str) -> PlatformKind {
    let lower = url.to_lowercase();

    if TIKTOK_MARKERS.iter().any(|m| lower.contains(m)) {
        PlatformKind::TikTok
    } else if INSTAGRAM_MARKERS.iter().any(|m| lower.contains(m)) {
        PlatformKind::Instagram
    } else if SHORTS_MARKERS.iter().any(|m| lower.contains(m)) {
        PlatformKind::YouTubeShorts
    } else {
        PlatformKind::Unknown
    }
}
