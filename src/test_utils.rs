//! Shared fixtures for unit tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::backends::LearningBackend;
use crate::models::{
    Course, CourseId, CourseLevel, Curriculum, Lesson, LessonId, PlaybackSample, Section,
    SectionId,
};
use crate::player::MediaSource;

pub fn lesson(id: &str, sort_order: u32, completed: bool) -> Lesson {
    Lesson {
        id: LessonId::new(id),
        title: format!("Lesson {id}"),
        video_url: Some(format!("https://cdn.example.com/{id}.mp4")),
        document_url: None,
        content: None,
        duration_secs: 100,
        sort_order,
        is_completed: completed,
    }
}

/// Two sections, three lessons: [s1: l1, l2] [s2: l3].
pub fn curriculum() -> Curriculum {
    Curriculum {
        course_id: CourseId::new("c1"),
        title: "Fixture Course".to_string(),
        subtitle: None,
        level: CourseLevel::Beginner,
        sections: vec![
            Section {
                id: SectionId::new("s1"),
                title: "First".to_string(),
                sort_order: 0,
                lessons: vec![lesson("l1", 0, false), lesson("l2", 1, false)],
            },
            Section {
                id: SectionId::new("s2"),
                title: "Second".to_string(),
                sort_order: 1,
                lessons: vec![lesson("l3", 0, false)],
            },
        ],
    }
}

/// Scripted backend: serves a fixed curriculum, counts completion calls, and
/// can be switched into a failing mode.
#[derive(Debug)]
pub struct MockBackend {
    curriculum: Mutex<Curriculum>,
    pub complete_calls: AtomicUsize,
    pub fail_completions: AtomicBool,
    pub fail_curriculum: AtomicBool,
}

impl MockBackend {
    pub fn new(curriculum: Curriculum) -> Self {
        Self {
            curriculum: Mutex::new(curriculum),
            complete_calls: AtomicUsize::new(0),
            fail_completions: AtomicBool::new(false),
            fail_curriculum: AtomicBool::new(false),
        }
    }

    /// Replace the curriculum served to subsequent fetches.
    pub fn set_curriculum(&self, curriculum: Curriculum) {
        *self.curriculum.lock().unwrap() = curriculum;
    }

    pub fn completion_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LearningBackend for MockBackend {
    async fn get_courses(&self) -> Result<Vec<Course>> {
        Ok(Vec::new())
    }

    async fn get_curriculum(&self, _course_id: &CourseId) -> Result<Curriculum> {
        if self.fail_curriculum.load(Ordering::SeqCst) {
            return Err(anyhow!("curriculum fetch refused by fixture"));
        }
        Ok(self.curriculum.lock().unwrap().clone())
    }

    async fn get_lesson(&self, lesson_id: &LessonId) -> Result<Lesson> {
        self.curriculum
            .lock()
            .unwrap()
            .lesson(lesson_id)
            .cloned()
            .ok_or_else(|| anyhow!("no such lesson in fixture"))
    }

    async fn complete_lesson(&self, _lesson_id: &LessonId) -> Result<()> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_completions.load(Ordering::SeqCst) {
            return Err(anyhow!("completion refused by fixture"));
        }
        Ok(())
    }
}

/// One scripted step of a `ScriptedSource`.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Sample(PlaybackSample),
    NotReady,
    Ended,
}

impl Step {
    pub fn playing(position_secs: u64, duration_secs: u64) -> Self {
        Step::Sample(PlaybackSample::new(
            Duration::from_secs(position_secs),
            Some(Duration::from_secs(duration_secs)),
            true,
        ))
    }

    pub fn paused(position_secs: u64, duration_secs: u64) -> Self {
        Step::Sample(PlaybackSample::new(
            Duration::from_secs(position_secs),
            Some(Duration::from_secs(duration_secs)),
            false,
        ))
    }
}

/// Media source that replays a fixed script, one step per poll. Polls past
/// the end of the script repeat the final sample.
pub struct ScriptedSource {
    script: VecDeque<Step>,
    last: Option<PlaybackSample>,
    ended: bool,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: None,
            ended: false,
        }
    }

    pub fn boxed(script: impl IntoIterator<Item = Step>) -> Box<dyn MediaSource> {
        Box::new(Self::new(script))
    }
}

impl MediaSource for ScriptedSource {
    fn poll(&mut self) -> Option<PlaybackSample> {
        match self.script.pop_front() {
            Some(Step::Sample(sample)) => {
                self.last = Some(sample);
                Some(sample)
            }
            Some(Step::NotReady) => None,
            Some(Step::Ended) => {
                self.ended = true;
                self.last
            }
            None => self.last,
        }
    }

    fn take_ended(&mut self) -> bool {
        std::mem::take(&mut self.ended)
    }

    fn seek(&mut self, _position: Duration) {}

    fn set_rate(&mut self, _rate: f64) {}

    fn toggle_play(&mut self) {}
}
