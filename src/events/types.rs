use crate::models::LessonId;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Progress event published by the reconciler and observed by the UI layer.
///
/// The UI only ever sees state through these; reconciler failures never
/// propagate as panics or errors into a render path.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub kind: ProgressEventKind,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(kind: ProgressEventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProgressEventKind {
    /// A lesson session attached its media source.
    SessionAttached {
        lesson_id: LessonId,
        resumed_from: Option<Duration>,
    },
    /// A poll tick produced a sample for the active lesson.
    PositionSampled {
        lesson_id: LessonId,
        position: Duration,
        duration: Option<Duration>,
    },
    /// The lesson entered the completed set. `confirmed` distinguishes the
    /// optimistic transition from the server-acknowledged one.
    LessonCompleted {
        lesson_id: LessonId,
        confirmed: bool,
    },
    /// The completion call failed; optimistic state is kept and the attempt
    /// is retryable by explicit user action only.
    CompletionFailed {
        lesson_id: LessonId,
        error: String,
    },
    CurriculumRefreshed {
        completed_count: usize,
    },
    RefreshFailed {
        error: String,
    },
}
