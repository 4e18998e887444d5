use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Course, CourseId, Curriculum, Lesson, LessonId};

/// The LMS backend boundary, as consumed by this layer.
///
/// Grading, payment and access control all live behind this seam; the client
/// only reads curriculum state and reports lesson completion.
#[async_trait]
pub trait LearningBackend: Send + Sync + std::fmt::Debug {
    /// Published courses visible to the current learner.
    async fn get_courses(&self) -> Result<Vec<Course>>;

    /// The nested section→lesson tree for a course, with per-lesson
    /// completion flags for the current learner.
    async fn get_curriculum(&self, course_id: &CourseId) -> Result<Curriculum>;

    /// Lesson detail, including the media reference fields.
    async fn get_lesson(&self, lesson_id: &LessonId) -> Result<Lesson>;

    /// Mark a lesson completed. Assumed idempotent server-side; the response
    /// body is ignored beyond success/failure.
    async fn complete_lesson(&self, lesson_id: &LessonId) -> Result<()>;
}
