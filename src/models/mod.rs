mod identifiers;

pub use identifiers::{CourseId, LessonId, SectionId};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// Course summary as returned by the course-list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub subtitle: Option<String>,
    pub level: CourseLevel,
    pub category: Option<String>,
    pub price: Option<String>,
    pub is_published: bool,
}

/// A unit of course content: video/audio media, a document, or inline text.
///
/// Immutable from the playback layer's point of view within one viewing
/// session; `is_completed` reflects the server's opinion at fetch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub video_url: Option<String>,
    pub document_url: Option<String>,
    pub content: Option<String>,
    /// Nominal duration in seconds; 0 means unknown.
    pub duration_secs: u32,
    pub sort_order: u32,
    pub is_completed: bool,
}

impl Lesson {
    /// Nominal duration, when the author provided one.
    pub fn nominal_duration(&self) -> Option<Duration> {
        if self.duration_secs > 0 {
            Some(Duration::from_secs(u64::from(self.duration_secs)))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub sort_order: u32,
    pub lessons: Vec<Lesson>,
}

/// The ordered section→lesson tree for one course, as authored.
///
/// Section and lesson ordering is taken verbatim from the server response;
/// nothing here re-sorts by any other key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curriculum {
    pub course_id: CourseId,
    pub title: String,
    pub subtitle: Option<String>,
    pub level: CourseLevel,
    pub sections: Vec<Section>,
}

impl Curriculum {
    /// All lessons in authored document order: section order, then lesson
    /// order within the section.
    pub fn flattened(&self) -> impl Iterator<Item = &Lesson> {
        self.sections.iter().flat_map(|s| s.lessons.iter())
    }

    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.flattened().find(|l| &l.id == id)
    }

    pub fn lesson_count(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum()
    }

    /// Lesson ids the server reports as completed in this snapshot.
    pub fn completed_lesson_ids(&self) -> HashSet<LessonId> {
        self.flattened()
            .filter(|l| l.is_completed)
            .map(|l| l.id.clone())
            .collect()
    }
}

/// One poll tick's worth of playback state, produced by a media source.
///
/// Not persisted beyond the tick. `duration` stays `None` until the backing
/// surface has reported media metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSample {
    pub position: Duration,
    pub duration: Option<Duration>,
    pub is_playing: bool,
}

impl PlaybackSample {
    pub fn new(position: Duration, duration: Option<Duration>, is_playing: bool) -> Self {
        Self {
            position,
            duration,
            is_playing,
        }
    }
}
