mod api;

pub use api::LmsApi;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::traits::LearningBackend;
use crate::models::{Course, CourseId, Curriculum, Lesson, LessonId};

/// `LearningBackend` over the LMS REST API.
#[derive(Debug, Clone)]
pub struct RestBackend {
    api: LmsApi,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            api: LmsApi::new(base_url, api_token),
        }
    }
}

#[async_trait]
impl LearningBackend for RestBackend {
    async fn get_courses(&self) -> Result<Vec<Course>> {
        self.api
            .get_courses()
            .await
            .context("Failed to fetch course list")
    }

    async fn get_curriculum(&self, course_id: &CourseId) -> Result<Curriculum> {
        self.api
            .get_curriculum(course_id)
            .await
            .with_context(|| format!("Failed to fetch curriculum for course {course_id}"))
    }

    async fn get_lesson(&self, lesson_id: &LessonId) -> Result<Lesson> {
        self.api
            .get_lesson(lesson_id)
            .await
            .with_context(|| format!("Failed to fetch lesson {lesson_id}"))
    }

    async fn complete_lesson(&self, lesson_id: &LessonId) -> Result<()> {
        self.api
            .complete_lesson(lesson_id)
            .await
            .with_context(|| format!("Failed to mark lesson {lesson_id} complete"))
    }
}
