use crate::models::Lesson;
use tracing::debug;
use url::Url;

/// What kind of playback surface a lesson's media reference calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    /// Direct media file, playable on a controllable surface.
    Direct(String),
    /// Third-party embed with a restricted control API.
    Embed(String),
    /// Document lesson; no playback surface.
    Document(String),
    /// Nothing playable or viewable; rendered as a neutral empty state.
    None,
}

const DIRECT_EXTENSIONS: &[&str] = &[
    "mp4", "webm", "m4v", "mov", "mkv", "mp3", "m4a", "ogg", "wav",
];

/// Classify a lesson's media reference.
///
/// A video URL wins over a document; an unrecognized video URL is still
/// treated as an embeddable reference (fail-open) rather than rejected.
pub fn classify(lesson: &Lesson) -> MediaKind {
    if let Some(url) = lesson.video_url.as_deref().filter(|u| !u.trim().is_empty()) {
        if is_direct_media(url) {
            return MediaKind::Direct(url.to_string());
        }
        return MediaKind::Embed(normalize_embed_url(url));
    }

    if let Some(doc) = lesson
        .document_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
    {
        return MediaKind::Document(doc.to_string());
    }

    debug!("Lesson {} has no playable media reference", lesson.id);
    MediaKind::None
}

fn is_direct_media(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    let path = url.path().to_ascii_lowercase();
    DIRECT_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{ext}")))
}

/// Normalize recognized share-link shapes into a canonical embed URL.
///
/// Handles the long-form (`watch?v=`), short-form (`youtu.be/`), shorts and
/// already-embedded YouTube variants. Anything else passes through unchanged.
pub fn normalize_embed_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => match youtube_video_id(&url) {
            Some(id) => format!("https://www.youtube.com/embed/{id}"),
            None => raw.to_string(),
        },
        Err(_) => raw.to_string(),
    }
}

fn youtube_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_start_matches("www.").to_lowercase();

    match host.as_str() {
        "youtube.com" | "m.youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                Some("shorts") | Some("embed") | Some("live") => {
                    segments.next().map(|s| s.to_string())
                }
                _ => None,
            }
        }
        "youtu.be" => url.path_segments()?.next().map(|s| s.to_string()),
        _ => None,
    }
    .filter(|id| !id.is_empty())
}
