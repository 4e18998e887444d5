use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lessonsync::backends::{LearningBackend, RestBackend};
use lessonsync::config::Config;
use lessonsync::models::{CourseId, LessonId};
use lessonsync::progress::{FilePositionStore, PositionStore};
use lessonsync::reconciler::ProgressReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lessonsync=info")),
        )
        .init();

    let config = Config::load()?;
    if config.server.base_url.is_empty() {
        bail!("No server configured. Set server.base_url in the config file.");
    }
    info!("Using server {}", config.server.base_url);

    let backend: Arc<dyn LearningBackend> = Arc::new(RestBackend::new(
        config.server.base_url.clone(),
        config.server.api_token.clone(),
    ));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [cmd] if cmd == "courses" => list_courses(backend.as_ref()).await,
        [cmd, course_id] if cmd == "curriculum" => {
            show_curriculum(&config, backend, course_id).await
        }
        [cmd, lesson_id] if cmd == "complete" => {
            complete_lesson(backend.as_ref(), lesson_id).await
        }
        _ => {
            eprintln!("Usage: lessonsync <courses | curriculum COURSE_ID | complete LESSON_ID>");
            std::process::exit(2);
        }
    }
}

async fn list_courses(backend: &dyn LearningBackend) -> Result<()> {
    let courses = backend.get_courses().await?;
    for course in courses {
        println!("{}  {}  [{:?}]", course.id, course.title, course.level);
    }
    Ok(())
}

async fn show_curriculum(
    config: &Config,
    backend: Arc<dyn LearningBackend>,
    course_id: &str,
) -> Result<()> {
    let positions = Arc::new(FilePositionStore::open().context("Failed to open position store")?);
    let reconciler = ProgressReconciler::open(
        backend,
        positions.clone(),
        config.playback.clone(),
        &CourseId::new(course_id),
    )
    .await?;

    let curriculum = reconciler.curriculum();
    println!("{}", curriculum.title);
    for section in &curriculum.sections {
        println!("  {}", section.title);
        for lesson in &section.lessons {
            let marker = if reconciler.is_completed(&lesson.id) {
                "x"
            } else {
                " "
            };
            let resume = positions.get(&lesson.id);
            if resume.is_zero() {
                println!("    [{marker}] {}  {}", lesson.id, lesson.title);
            } else {
                println!(
                    "    [{marker}] {}  {}  (at {}s)",
                    lesson.id,
                    lesson.title,
                    resume.as_secs()
                );
            }
        }
    }
    Ok(())
}

async fn complete_lesson(backend: &dyn LearningBackend, lesson_id: &str) -> Result<()> {
    let lesson_id = LessonId::new(lesson_id);
    backend.complete_lesson(&lesson_id).await?;
    println!("Lesson {lesson_id} marked complete");
    Ok(())
}
