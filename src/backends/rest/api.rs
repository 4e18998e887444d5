use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::models::{Course, CourseId, CourseLevel, Curriculum, Lesson, LessonId, Section};
use crate::utils::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin client over the LMS REST API.
#[derive(Debug, Clone)]
pub struct LmsApi {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl LmsApi {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, message))
    }

    pub async fn get_courses(&self) -> Result<Vec<Course>, ApiError> {
        let response = Self::check(self.get("/api/courses/").send().await?).await?;
        let courses: Vec<CourseDto> = response.json().await?;
        Ok(courses.into_iter().map(Course::from).collect())
    }

    pub async fn get_curriculum(&self, course_id: &CourseId) -> Result<Curriculum, ApiError> {
        let path = format!("/api/courses/{course_id}/curriculum/");
        let response = Self::check(self.get(&path).send().await?).await?;
        let dto: CurriculumDto = response.json().await?;
        debug!(
            "Fetched curriculum for course {} ({} sections)",
            course_id,
            dto.sections.len()
        );
        Ok(dto.into())
    }

    pub async fn get_lesson(&self, lesson_id: &LessonId) -> Result<Lesson, ApiError> {
        let path = format!("/api/lessons/{lesson_id}/");
        let response = Self::check(self.get(&path).send().await?).await?;
        let dto: LessonDto = response.json().await?;
        Ok(dto.into())
    }

    /// POST the completion call. The response body is ignored beyond
    /// success/failure; the server treats repeats as no-ops.
    pub async fn complete_lesson(&self, lesson_id: &LessonId) -> Result<(), ApiError> {
        let path = format!("/api/lessons/{lesson_id}/complete/");
        Self::check(self.post(&path).send().await?).await?;
        debug!("Completion recorded for lesson {}", lesson_id);
        Ok(())
    }
}

// Wire shapes, following the server's serializers. Unknown fields are
// ignored; identifiers arrive as JSON numbers.

#[derive(Debug, Deserialize)]
struct CourseDto {
    id: i64,
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    level: CourseLevel,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    is_published: bool,
}

impl From<CourseDto> for Course {
    fn from(dto: CourseDto) -> Self {
        Course {
            id: dto.id.into(),
            title: dto.title,
            subtitle: dto.subtitle.filter(|s| !s.is_empty()),
            level: dto.level,
            category: dto.category.filter(|s| !s.is_empty()),
            price: dto.price,
            is_published: dto.is_published,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurriculumDto {
    id: i64,
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    level: CourseLevel,
    #[serde(default)]
    sections: Vec<SectionDto>,
}

impl From<CurriculumDto> for Curriculum {
    fn from(dto: CurriculumDto) -> Self {
        Curriculum {
            course_id: dto.id.into(),
            title: dto.title,
            subtitle: dto.subtitle.filter(|s| !s.is_empty()),
            level: dto.level,
            sections: dto.sections.into_iter().map(Section::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SectionDto {
    id: i64,
    title: String,
    #[serde(default)]
    sort_order: u32,
    #[serde(default)]
    lessons: Vec<LessonDto>,
}

impl From<SectionDto> for Section {
    fn from(dto: SectionDto) -> Self {
        Section {
            id: dto.id.into(),
            title: dto.title,
            sort_order: dto.sort_order,
            lessons: dto.lessons.into_iter().map(Lesson::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LessonDto {
    id: i64,
    title: String,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    document_file_url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    /// Nominal duration in seconds; 0 when unknown.
    #[serde(default)]
    duration: u32,
    #[serde(default)]
    sort_order: u32,
    /// Absent on the lesson-detail endpoint, present in curriculum trees.
    #[serde(default)]
    is_completed: bool,
}

impl From<LessonDto> for Lesson {
    fn from(dto: LessonDto) -> Self {
        Lesson {
            id: dto.id.into(),
            title: dto.title,
            video_url: dto.video_url.filter(|s| !s.is_empty()),
            document_url: dto.document_file_url.filter(|s| !s.is_empty()),
            content: dto.content.filter(|s| !s.is_empty()),
            duration_secs: dto.duration,
            sort_order: dto.sort_order,
            is_completed: dto.is_completed,
        }
    }
}
