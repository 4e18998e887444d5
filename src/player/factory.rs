use super::direct::DirectSource;
use super::embed::{EmbedReporter, EmbedSource};
use super::media::{self, MediaKind};
use super::traits::{MediaSource, PlayerHandle};
use crate::config::PlaybackConfig;
use crate::models::Lesson;
use crate::progress::PositionStore;
use std::time::Duration;
use tracing::{debug, info};

/// A playable source bound to a lesson, with the resume seek already applied.
pub struct PlayableSource {
    pub source: Box<dyn MediaSource>,
    /// Position the session resumed from, when a stored position qualified.
    pub resumed_from: Option<Duration>,
    /// Present for embeds: lets the host push whatever state the third-party
    /// surface reports.
    pub embed: Option<EmbedReporter>,
    /// Embed URL for the host to mount, for the embed case.
    pub embed_url: Option<String>,
}

/// Outcome of attaching a lesson's media reference.
pub enum AttachedMedia {
    Playable(PlayableSource),
    Document { url: String },
    /// No recognized media and no document. The UI shows a neutral empty
    /// state; this is not an error.
    NoContent,
}

/// Attach a media source for a lesson.
///
/// Classifies the media reference, builds the matching source, and applies
/// the one-shot resume seek from the position store.
pub fn attach(
    lesson: &Lesson,
    make_player: impl FnOnce(&str) -> Box<dyn PlayerHandle>,
    positions: &dyn PositionStore,
    config: &PlaybackConfig,
) -> AttachedMedia {
    match media::classify(lesson) {
        MediaKind::Direct(url) => {
            debug!("Attaching direct source for lesson {}", lesson.id);
            let mut source = DirectSource::new(make_player(&url));
            let resumed_from = apply_resume_seek(lesson, &mut source, positions, config);
            AttachedMedia::Playable(PlayableSource {
                source: Box::new(source),
                resumed_from,
                embed: None,
                embed_url: None,
            })
        }
        MediaKind::Embed(embed_url) => {
            debug!("Attaching embed source for lesson {}", lesson.id);
            let (source, reporter) = EmbedSource::new(embed_url.clone());
            AttachedMedia::Playable(PlayableSource {
                source: Box::new(source),
                resumed_from: None,
                embed: Some(reporter),
                embed_url: Some(embed_url),
            })
        }
        MediaKind::Document(url) => AttachedMedia::Document { url },
        MediaKind::None => AttachedMedia::NoContent,
    }
}

/// Seek once to the stored position, iff `0 < stored < duration`.
///
/// A stored position at or past the duration is stale from a previous
/// completed watch; the session starts from zero instead of resuming past
/// the end. With no known duration no seek is attempted.
fn apply_resume_seek(
    lesson: &Lesson,
    source: &mut dyn MediaSource,
    positions: &dyn PositionStore,
    config: &PlaybackConfig,
) -> Option<Duration> {
    if !config.auto_resume || !source.is_seekable() {
        return None;
    }

    let stored = positions.get(&lesson.id);
    if stored < Duration::from_secs(config.resume_threshold_secs) {
        return None;
    }

    let duration = source
        .poll()
        .and_then(|s| s.duration)
        .or_else(|| lesson.nominal_duration())?;
    if stored >= duration {
        debug!(
            "Stored position {:?} past duration {:?} for lesson {}, starting from zero",
            stored, duration, lesson.id
        );
        return None;
    }

    info!("Resuming lesson {} from {:?}", lesson.id, stored);
    source.seek(stored);
    Some(stored)
}
