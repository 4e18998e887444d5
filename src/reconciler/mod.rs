mod poll_loop;

pub use poll_loop::ReconcilerHandle;

use anyhow::{Context, Result, anyhow};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::backends::LearningBackend;
use crate::config::PlaybackConfig;
use crate::events::{EventBus, ProgressEvent, ProgressEventKind};
use crate::models::{Curriculum, Lesson, LessonId};
use crate::player::{self, AttachedMedia, EmbedReporter, MediaSource, PlayerHandle};
use crate::progress::{CompletionPolicy, PositionStore};

/// Lesson-viewing session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session attached.
    Idle,
    /// Source attached, resume seek applied, not yet sampling playback.
    Attached,
    /// Poll loop observing active playback.
    Polling,
    /// Playback suspended; resumes on play.
    Paused,
    /// Completion trigger fired, server call in flight.
    Completing,
    /// Completion confirmed. Polling may continue for position persistence,
    /// but completion logic is latched off.
    Completed,
}

/// What the UI should render for an opened lesson.
pub enum LessonContent {
    /// Playable media; the session is attached and the poll loop applies.
    Player {
        resumed_from: Option<Duration>,
        /// Present for third-party embeds: the URL to mount and the handle
        /// the host uses to push reported state.
        embed_url: Option<String>,
        embed: Option<EmbedReporter>,
    },
    /// Document lesson; no playback session.
    Document { url: String },
    /// Neutral empty state: no recognized media and no document.
    Empty,
}

struct LessonSession {
    lesson: Lesson,
    source: Box<dyn MediaSource>,
    policy: CompletionPolicy,
    phase: SessionPhase,
    completion_issued: bool,
    completion_confirmed: bool,
}

/// Result of a completion call issued on a spawned task, merged back into
/// reconciler state on the next tick.
struct CompletionOutcome {
    lesson_id: LessonId,
    result: Result<()>,
}

/// Coordinates the poll loop, the completion policy, the position store and
/// the server's curriculum state for one course.
///
/// Local optimistic completions and server-confirmed completions are merged
/// by union, never overwritten: once a lesson is completed locally, a lagging
/// server snapshot cannot revert it within the session.
pub struct ProgressReconciler {
    backend: Arc<dyn LearningBackend>,
    positions: Arc<dyn PositionStore>,
    events: EventBus,
    config: PlaybackConfig,
    curriculum: Curriculum,
    completed: HashSet<LessonId>,
    session: Option<LessonSession>,
    completion_tx: mpsc::UnboundedSender<CompletionOutcome>,
    completion_rx: mpsc::UnboundedReceiver<CompletionOutcome>,
}

impl ProgressReconciler {
    /// Fetch the curriculum and build a reconciler for the course.
    pub async fn open(
        backend: Arc<dyn LearningBackend>,
        positions: Arc<dyn PositionStore>,
        config: PlaybackConfig,
        course_id: &crate::models::CourseId,
    ) -> Result<Self> {
        let curriculum = backend
            .get_curriculum(course_id)
            .await
            .context("Failed to load initial curriculum")?;
        Ok(Self::with_curriculum(backend, positions, config, curriculum))
    }

    /// Build a reconciler from an already-fetched curriculum snapshot.
    pub fn with_curriculum(
        backend: Arc<dyn LearningBackend>,
        positions: Arc<dyn PositionStore>,
        config: PlaybackConfig,
        curriculum: Curriculum,
    ) -> Self {
        let completed = curriculum.completed_lesson_ids();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            positions,
            events: EventBus::new(),
            config,
            curriculum,
            completed,
            session: None,
            completion_tx,
            completion_rx,
        }
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// The set of lesson ids known completed, optimistic or confirmed.
    pub fn completed_lessons(&self) -> &HashSet<LessonId> {
        &self.completed
    }

    pub fn is_completed(&self, lesson_id: &LessonId) -> bool {
        self.completed.contains(lesson_id)
    }

    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map(|s| s.phase)
            .unwrap_or(SessionPhase::Idle)
    }

    pub fn active_lesson(&self) -> Option<&LessonId> {
        self.session.as_ref().map(|s| &s.lesson.id)
    }

    /// Open a viewing session for a lesson, tearing down any previous
    /// session first. The previous source is detached synchronously before
    /// the new one attaches, so at no point do two sessions race to persist
    /// two different lessons' positions.
    pub fn open_lesson(
        &mut self,
        lesson_id: &LessonId,
        make_player: impl FnOnce(&str) -> Box<dyn PlayerHandle>,
    ) -> Result<LessonContent> {
        self.detach();

        let lesson = self
            .curriculum
            .lesson(lesson_id)
            .cloned()
            .ok_or_else(|| anyhow!("Lesson {lesson_id} is not in the curriculum"))?;

        match player::attach(&lesson, make_player, self.positions.as_ref(), &self.config) {
            AttachedMedia::Playable(playable) => {
                let resumed_from = playable.resumed_from;
                let embed = playable.embed;
                let embed_url = playable.embed_url;
                self.attach_session(lesson, playable.source);
                self.events
                    .publish(ProgressEvent::new(ProgressEventKind::SessionAttached {
                        lesson_id: lesson_id.clone(),
                        resumed_from,
                    }));
                Ok(LessonContent::Player {
                    resumed_from,
                    embed_url,
                    embed,
                })
            }
            AttachedMedia::Document { url } => Ok(LessonContent::Document { url }),
            AttachedMedia::NoContent => Ok(LessonContent::Empty),
        }
    }

    /// Attach a prepared source for a lesson. Embedders with custom playback
    /// surfaces use this directly instead of `open_lesson`.
    pub fn attach_session(&mut self, lesson: Lesson, source: Box<dyn MediaSource>) {
        self.detach();
        debug!("Attaching session for lesson {}", lesson.id);
        self.session = Some(LessonSession {
            lesson,
            source,
            policy: CompletionPolicy::new(self.config.completion_threshold),
            phase: SessionPhase::Attached,
            completion_issued: false,
            completion_confirmed: false,
        });
    }

    /// Drop the active session and its source. Idempotent.
    pub fn detach(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Detached session for lesson {}", session.lesson.id);
        }
    }

    /// One poll tick: merge finished completion calls, sample the source,
    /// persist position, evaluate the completion policy, and start the
    /// completion call when it triggers.
    ///
    /// Never awaits the backend: completion calls run on spawned tasks and
    /// their outcomes are merged here, so ticks keep their cadence while a
    /// call is in flight. Every failure path is non-fatal; the loop keeps
    /// ticking.
    pub async fn tick(&mut self) {
        self.drain_completion_outcomes();

        let Some(session) = self.session.as_mut() else {
            return;
        };

        let sample = session.source.poll();
        let ended = session.source.take_ended();
        let lesson_id = session.lesson.id.clone();

        if sample.is_none() && !ended {
            // Adapter cannot report yet (embed not ready, metadata not
            // loaded). Skip this tick.
            return;
        }

        if let Some(sample) = &sample {
            if sample.is_playing {
                // At most one write per tick; last write wins.
                self.positions.set(&lesson_id, sample.position);
            }
            session.phase = match session.phase {
                SessionPhase::Completing | SessionPhase::Completed => session.phase,
                _ if sample.is_playing => SessionPhase::Polling,
                _ => SessionPhase::Paused,
            };
        }

        let already = self.completed.contains(&lesson_id);
        let trigger = if ended {
            session.policy.ended(already)
        } else if let Some(sample) = &sample {
            session.policy.evaluate(sample, already)
        } else {
            false
        };

        if let Some(sample) = sample {
            self.events
                .publish(ProgressEvent::new(ProgressEventKind::PositionSampled {
                    lesson_id: lesson_id.clone(),
                    position: sample.position,
                    duration: sample.duration,
                }));
        }

        if trigger {
            // Failures are surfaced on the event bus; the poll loop goes on.
            self.begin_completion(&lesson_id);
        }
    }

    /// Explicitly mark a lesson complete (the "mark as completed" button).
    ///
    /// Idempotent from the caller's perspective: when the lesson is already
    /// in the completed set, optimistic or confirmed, no network call is
    /// made.
    pub async fn mark_complete(&mut self, lesson_id: &LessonId) -> Result<()> {
        if self.completed.contains(lesson_id) {
            debug!("Lesson {} already completed, skipping call", lesson_id);
            return Ok(());
        }
        self.submit_completion(lesson_id).await
    }

    /// Re-issue a completion call that previously failed for the active
    /// lesson. Only ever driven by explicit user action; nothing retries
    /// automatically.
    pub async fn retry_completion(&mut self) -> Result<()> {
        let pending = self.session.as_ref().and_then(|s| {
            (s.completion_issued && !s.completion_confirmed).then(|| s.lesson.id.clone())
        });
        match pending {
            Some(lesson_id) => self.submit_completion(&lesson_id).await,
            None => Ok(()),
        }
    }

    /// Explicit completion path: start the call and await its result.
    async fn submit_completion(&mut self, lesson_id: &LessonId) -> Result<()> {
        self.note_completion_started(lesson_id);
        let result = self.backend.complete_lesson(lesson_id).await;
        self.apply_completion_outcome(lesson_id, result)
    }

    /// Poll-loop completion path: record the optimistic transition now and
    /// run the network call on a spawned task, so the tick returns without
    /// awaiting the backend. The outcome lands via the completion channel.
    fn begin_completion(&mut self, lesson_id: &LessonId) {
        self.note_completion_started(lesson_id);

        let backend = self.backend.clone();
        let tx = self.completion_tx.clone();
        let lesson_id = lesson_id.clone();
        tokio::spawn(async move {
            let result = backend.complete_lesson(&lesson_id).await;
            let _ = tx.send(CompletionOutcome { lesson_id, result });
        });
    }

    fn drain_completion_outcomes(&mut self) {
        while let Ok(outcome) = self.completion_rx.try_recv() {
            let _ = self.apply_completion_outcome(&outcome.lesson_id, outcome.result);
        }
    }

    /// Optimistic transition: visible immediately and never rolled back,
    /// even if the call fails.
    fn note_completion_started(&mut self, lesson_id: &LessonId) {
        if self.completed.insert(lesson_id.clone()) {
            self.events
                .publish(ProgressEvent::new(ProgressEventKind::LessonCompleted {
                    lesson_id: lesson_id.clone(),
                    confirmed: false,
                }));
        }
        if let Some(session) = self.session.as_mut() {
            if session.lesson.id == *lesson_id {
                session.phase = SessionPhase::Completing;
                session.completion_issued = true;
            }
        }
    }

    fn apply_completion_outcome(&mut self, lesson_id: &LessonId, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                info!("Lesson {} completion confirmed", lesson_id);
                if let Some(session) = self.session.as_mut() {
                    if session.lesson.id == *lesson_id {
                        session.phase = SessionPhase::Completed;
                        session.completion_confirmed = true;
                    }
                }
                self.events
                    .publish(ProgressEvent::new(ProgressEventKind::LessonCompleted {
                        lesson_id: lesson_id.clone(),
                        confirmed: true,
                    }));
                Ok(())
            }
            Err(e) => {
                warn!("Completion call failed for lesson {}: {:#}", lesson_id, e);
                if let Some(session) = self.session.as_mut() {
                    if session.lesson.id == *lesson_id {
                        // Back to Attached: completion unconfirmed, retryable
                        // by explicit user action only.
                        session.phase = SessionPhase::Attached;
                    }
                }
                self.events
                    .publish(ProgressEvent::new(ProgressEventKind::CompletionFailed {
                        lesson_id: lesson_id.clone(),
                        error: format!("{e:#}"),
                    }));
                Err(e)
            }
        }
    }

    /// Fetch a fresh curriculum snapshot and merge it in. A failed fetch
    /// leaves the previous state untouched: stale-but-consistent beats
    /// discarding known-good state.
    pub async fn refresh_curriculum(&mut self) {
        let course_id = self.curriculum.course_id.clone();
        match self.backend.get_curriculum(&course_id).await {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(e) => {
                warn!("Curriculum refresh failed, keeping previous state: {e:#}");
                self.events
                    .publish(ProgressEvent::new(ProgressEventKind::RefreshFailed {
                        error: format!("{e:#}"),
                    }));
            }
        }
    }

    /// Merge a server snapshot into local state.
    ///
    /// The completed set becomes server-reported ∪ locally-known: a snapshot
    /// that lags behind a just-issued completion call must not make the
    /// lesson flicker back to not-completed.
    pub fn apply_snapshot(&mut self, snapshot: Curriculum) {
        let server_completed = snapshot.completed_lesson_ids();
        self.completed.extend(server_completed);
        self.curriculum = snapshot;
        self.events
            .publish(ProgressEvent::new(ProgressEventKind::CurriculumRefreshed {
                completed_count: self.completed.len(),
            }));
    }

    /// The lesson immediately following `current` in authored document
    /// order, or `None` at the end or for an unknown id.
    pub fn advance_to_next(&self, current: &LessonId) -> Option<LessonId> {
        let mut lessons = self.curriculum.flattened();
        lessons
            .by_ref()
            .find(|l| &l.id == current)
            .and_then(|_| lessons.next())
            .map(|l| l.id.clone())
    }

    /// The lesson immediately preceding `current`, or `None` for the first
    /// lesson or an unknown id.
    pub fn advance_to_previous(&self, current: &LessonId) -> Option<LessonId> {
        let mut previous: Option<&Lesson> = None;
        for lesson in self.curriculum.flattened() {
            if &lesson.id == current {
                return previous.map(|l| l.id.clone());
            }
            previous = Some(lesson);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Lesson;
    use crate::progress::MemoryPositionStore;
    use crate::test_utils::{MockBackend, ScriptedSource, Step, curriculum};
    use std::sync::atomic::Ordering;

    struct Fixture {
        backend: Arc<MockBackend>,
        positions: Arc<MemoryPositionStore>,
        reconciler: ProgressReconciler,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(MockBackend::new(curriculum()));
        let positions = Arc::new(MemoryPositionStore::new());
        let reconciler = ProgressReconciler::with_curriculum(
            backend.clone(),
            positions.clone(),
            PlaybackConfig::default(),
            curriculum(),
        );
        Fixture {
            backend,
            positions,
            reconciler,
        }
    }

    fn fixture_lesson(id: &str) -> Lesson {
        curriculum()
            .lesson(&LessonId::new(id))
            .cloned()
            .expect("fixture lesson")
    }

    // Yields between ticks so spawned completion tasks get to run, the way
    // an interval-driven loop would let them.
    async fn tick_n(reconciler: &mut ProgressReconciler, n: usize) {
        for _ in 0..n {
            reconciler.tick().await;
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn threshold_crossing_completes_exactly_once() {
        let mut f = fixture();
        let l1 = LessonId::new("l1");
        f.reconciler.attach_session(
            fixture_lesson("l1"),
            ScriptedSource::boxed([
                Step::playing(50, 100),
                Step::playing(91, 100),
                // Backward seek and a second crossing stay quiet.
                Step::playing(10, 100),
                Step::playing(95, 100),
            ]),
        );

        tick_n(&mut f.reconciler, 6).await;

        assert!(f.reconciler.is_completed(&l1));
        assert_eq!(f.backend.completion_calls(), 1);
        assert_eq!(f.reconciler.phase(), SessionPhase::Completed);
    }

    /// Backend that parks completion calls until released, to observe
    /// reconciler behavior while a call is in flight.
    #[derive(Debug)]
    struct GatedBackend {
        gate: Arc<tokio::sync::Notify>,
        started: Arc<std::sync::atomic::AtomicBool>,
        finished: Arc<std::sync::atomic::AtomicBool>,
    }

    impl GatedBackend {
        fn new() -> Self {
            Self {
                gate: Arc::new(tokio::sync::Notify::new()),
                started: Arc::new(std::sync::atomic::AtomicBool::new(false)),
                finished: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            }
        }
    }

    #[async_trait::async_trait]
    impl crate::backends::LearningBackend for GatedBackend {
        async fn get_courses(&self) -> Result<Vec<crate::models::Course>> {
            Ok(Vec::new())
        }

        async fn get_curriculum(
            &self,
            _course_id: &crate::models::CourseId,
        ) -> Result<Curriculum> {
            Ok(curriculum())
        }

        async fn get_lesson(&self, lesson_id: &LessonId) -> Result<Lesson> {
            curriculum()
                .lesson(lesson_id)
                .cloned()
                .ok_or_else(|| anyhow!("no such lesson"))
        }

        async fn complete_lesson(&self, _lesson_id: &LessonId) -> Result<()> {
            self.started.store(true, Ordering::SeqCst);
            self.gate.notified().await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn ticks_continue_while_completion_call_is_in_flight() {
        let backend = Arc::new(GatedBackend::new());
        let positions = Arc::new(MemoryPositionStore::new());
        let mut reconciler = ProgressReconciler::with_curriculum(
            backend.clone(),
            positions.clone(),
            PlaybackConfig::default(),
            curriculum(),
        );
        let l1 = LessonId::new("l1");
        reconciler.attach_session(
            fixture_lesson("l1"),
            ScriptedSource::boxed([
                Step::playing(95, 100),
                Step::playing(96, 100),
                Step::playing(97, 100),
            ]),
        );

        // First tick crosses the threshold; the call parks on the gate.
        tick_n(&mut reconciler, 1).await;
        assert!(backend.started.load(Ordering::SeqCst));
        assert!(reconciler.is_completed(&l1));
        assert_eq!(reconciler.phase(), SessionPhase::Completing);

        // Later ticks keep sampling and persisting while the call is
        // still in flight.
        tick_n(&mut reconciler, 2).await;
        assert!(!backend.finished.load(Ordering::SeqCst));
        assert_eq!(positions.get(&l1), Duration::from_secs(97));
        assert_eq!(reconciler.phase(), SessionPhase::Completing);

        // Releasing the gate lets the call finish; the tick after that
        // merges the confirmation.
        backend.gate.notify_one();
        tick_n(&mut reconciler, 2).await;
        assert!(backend.finished.load(Ordering::SeqCst));
        assert_eq!(reconciler.phase(), SessionPhase::Completed);
    }

    #[tokio::test]
    async fn ended_signal_completes_without_threshold_sample() {
        let mut f = fixture();
        f.reconciler.attach_session(
            fixture_lesson("l1"),
            ScriptedSource::boxed([Step::playing(40, 100), Step::Ended]),
        );

        tick_n(&mut f.reconciler, 3).await;

        assert!(f.reconciler.is_completed(&LessonId::new("l1")));
        assert_eq!(f.backend.completion_calls(), 1);
    }

    #[tokio::test]
    async fn failed_completion_keeps_optimistic_state_without_auto_retry() {
        let mut f = fixture();
        f.backend.fail_completions.store(true, Ordering::SeqCst);
        let l1 = LessonId::new("l1");
        f.reconciler.attach_session(
            fixture_lesson("l1"),
            ScriptedSource::boxed([Step::playing(95, 100)]),
        );

        tick_n(&mut f.reconciler, 5).await;

        // Optimistic completion survives the failure and nothing retries on
        // its own.
        assert!(f.reconciler.is_completed(&l1));
        assert_eq!(f.backend.completion_calls(), 1);
        assert_ne!(f.reconciler.phase(), SessionPhase::Completed);

        f.backend.fail_completions.store(false, Ordering::SeqCst);
        f.reconciler.retry_completion().await.expect("retry");
        assert_eq!(f.backend.completion_calls(), 2);
        assert_eq!(f.reconciler.phase(), SessionPhase::Completed);
    }

    #[tokio::test]
    async fn mark_complete_skips_network_when_already_completed() {
        let mut f = fixture();
        let l2 = LessonId::new("l2");

        f.reconciler.mark_complete(&l2).await.expect("first call");
        f.reconciler.mark_complete(&l2).await.expect("second call");

        assert!(f.reconciler.is_completed(&l2));
        assert_eq!(f.backend.completion_calls(), 1);
    }

    #[tokio::test]
    async fn lagging_snapshot_merges_by_union() {
        let mut f = fixture();
        let l1 = LessonId::new("l1");
        f.reconciler.mark_complete(&l1).await.expect("complete");

        // Server snapshot lags: it reports nothing completed.
        f.reconciler.refresh_curriculum().await;
        assert!(f.reconciler.is_completed(&l1));

        // A later snapshot adds l3; the union keeps both.
        let mut updated = curriculum();
        updated.sections[1].lessons[0].is_completed = true;
        f.backend.set_curriculum(updated);
        f.reconciler.refresh_curriculum().await;
        assert!(f.reconciler.is_completed(&l1));
        assert!(f.reconciler.is_completed(&LessonId::new("l3")));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_curriculum() {
        let mut f = fixture();
        f.backend.fail_curriculum.store(true, Ordering::SeqCst);
        let mut rx = f.reconciler.events().subscribe();

        f.reconciler.refresh_curriculum().await;

        assert_eq!(f.reconciler.curriculum().lesson_count(), 3);
        let event = rx.try_recv().expect("event");
        assert!(matches!(event.kind, ProgressEventKind::RefreshFailed { .. }));
    }

    #[tokio::test]
    async fn playing_ticks_persist_position_paused_ticks_do_not() {
        let mut f = fixture();
        let l1 = LessonId::new("l1");
        f.reconciler.attach_session(
            fixture_lesson("l1"),
            ScriptedSource::boxed([
                Step::NotReady,
                Step::playing(30, 100),
                Step::paused(42, 100),
            ]),
        );

        f.reconciler.tick().await;
        assert_eq!(f.positions.get(&l1), Duration::ZERO);

        f.reconciler.tick().await;
        assert_eq!(f.positions.get(&l1), Duration::from_secs(30));
        assert_eq!(f.reconciler.phase(), SessionPhase::Polling);

        f.reconciler.tick().await;
        // Paused sample does not overwrite the last playing position.
        assert_eq!(f.positions.get(&l1), Duration::from_secs(30));
        assert_eq!(f.reconciler.phase(), SessionPhase::Paused);
    }

    #[tokio::test]
    async fn detach_stops_position_writes_and_completion_evaluation() {
        let mut f = fixture();
        let l1 = LessonId::new("l1");
        f.reconciler.attach_session(
            fixture_lesson("l1"),
            ScriptedSource::boxed([Step::playing(30, 100), Step::playing(95, 100)]),
        );

        f.reconciler.tick().await;
        f.reconciler.detach();
        assert_eq!(f.reconciler.phase(), SessionPhase::Idle);

        tick_n(&mut f.reconciler, 3).await;

        // The detached source's later samples never reach the store or the
        // completion policy.
        assert_eq!(f.positions.get(&l1), Duration::from_secs(30));
        assert!(!f.reconciler.is_completed(&l1));
        assert_eq!(f.backend.completion_calls(), 0);
        assert_eq!(f.positions.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn reattach_tears_down_previous_session_first() {
        let mut f = fixture();
        f.reconciler.attach_session(
            fixture_lesson("l1"),
            ScriptedSource::boxed([Step::playing(30, 100)]),
        );
        f.reconciler.tick().await;

        f.reconciler.attach_session(
            fixture_lesson("l2"),
            ScriptedSource::boxed([Step::playing(12, 100)]),
        );
        f.reconciler.tick().await;

        // Each position landed under its own lesson's key.
        assert_eq!(f.positions.get(&LessonId::new("l1")), Duration::from_secs(30));
        assert_eq!(f.positions.get(&LessonId::new("l2")), Duration::from_secs(12));
        assert_eq!(f.reconciler.active_lesson(), Some(&LessonId::new("l2")));
    }

    #[tokio::test]
    async fn already_completed_lesson_never_reissues_call() {
        let mut f = fixture();
        let mut completed = curriculum();
        completed.sections[0].lessons[0].is_completed = true;
        f.reconciler.apply_snapshot(completed);

        f.reconciler.attach_session(
            fixture_lesson("l1"),
            ScriptedSource::boxed([Step::playing(95, 100), Step::Ended]),
        );
        tick_n(&mut f.reconciler, 3).await;

        assert_eq!(f.backend.completion_calls(), 0);
    }

    #[tokio::test]
    async fn navigation_walks_authored_order() {
        let f = fixture();
        let (l1, l2, l3) = (
            LessonId::new("l1"),
            LessonId::new("l2"),
            LessonId::new("l3"),
        );

        // Section boundary is invisible to navigation.
        assert_eq!(f.reconciler.advance_to_next(&l1), Some(l2.clone()));
        assert_eq!(f.reconciler.advance_to_next(&l2), Some(l3.clone()));
        assert_eq!(f.reconciler.advance_to_next(&l3), None);

        assert_eq!(f.reconciler.advance_to_previous(&l3), Some(l2.clone()));
        assert_eq!(f.reconciler.advance_to_previous(&l2), Some(l1.clone()));
        assert_eq!(f.reconciler.advance_to_previous(&l1), None);

        let unknown = LessonId::new("nope");
        assert_eq!(f.reconciler.advance_to_next(&unknown), None);
        assert_eq!(f.reconciler.advance_to_previous(&unknown), None);
    }

    #[tokio::test]
    async fn completion_events_distinguish_optimistic_from_confirmed() {
        let mut f = fixture();
        let mut rx = f.reconciler.events().subscribe();
        let l1 = LessonId::new("l1");

        f.reconciler.mark_complete(&l1).await.expect("complete");

        let first = rx.try_recv().expect("optimistic event");
        assert!(matches!(
            first.kind,
            ProgressEventKind::LessonCompleted {
                confirmed: false,
                ..
            }
        ));
        let second = rx.try_recv().expect("confirmed event");
        assert!(matches!(
            second.kind,
            ProgressEventKind::LessonCompleted {
                confirmed: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn poll_loop_handle_starts_and_stops() {
        let f = fixture();
        let mut handle = ReconcilerHandle::new(f.reconciler);
        assert!(!handle.is_running());

        handle.start();
        assert!(handle.is_running());

        handle.stop();
        tokio::task::yield_now().await;
        assert!(!handle.is_running());
    }
}
