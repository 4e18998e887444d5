use crate::models::PlaybackSample;

pub const DEFAULT_COMPLETION_THRESHOLD: f64 = 0.90;

/// Decides, once per lesson-viewing session, whether the lesson transitions
/// to completed.
///
/// The latch is internal: after the first trigger the policy stays quiet for
/// the rest of the session, even if the learner seeks backward below the
/// threshold and crosses it again.
#[derive(Debug)]
pub struct CompletionPolicy {
    threshold: f64,
    triggered: bool,
}

impl CompletionPolicy {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            triggered: false,
        }
    }

    /// Evaluate one playback sample. Unknown duration never triggers; the
    /// position is clamped to `[0, duration]` before the ratio is computed.
    pub fn evaluate(&mut self, sample: &PlaybackSample, already_completed: bool) -> bool {
        if self.triggered || already_completed {
            return false;
        }
        let Some(duration) = sample.duration else {
            return false;
        };
        if duration.is_zero() {
            return false;
        }

        let position = sample.position.min(duration);
        let ratio = position.as_secs_f64() / duration.as_secs_f64();
        if ratio >= self.threshold {
            self.triggered = true;
            return true;
        }
        false
    }

    /// An explicit ended signal triggers unconditionally. Covers sources that
    /// reach the end without ever producing a sample at or past the
    /// threshold, e.g. due to polling granularity.
    pub fn ended(&mut self, already_completed: bool) -> bool {
        if self.triggered || already_completed {
            return false;
        }
        self.triggered = true;
        true
    }

    pub fn has_triggered(&self) -> bool {
        self.triggered
    }
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_THRESHOLD)
    }
}
