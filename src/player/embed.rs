use super::traits::MediaSource;
use crate::models::PlaybackSample;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct EmbedState {
    reported: Option<PlaybackSample>,
    ended: bool,
}

/// Host-side handle for pushing whatever state a third-party embed surface
/// chooses to report. Many embeds report nothing at all; the source then
/// answers `None` on every poll.
#[derive(Clone)]
pub struct EmbedReporter {
    state: Arc<Mutex<EmbedState>>,
}

impl EmbedReporter {
    pub fn report(&self, sample: PlaybackSample) {
        if let Ok(mut state) = self.state.lock() {
            state.reported = Some(sample);
        }
    }

    pub fn report_ended(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.ended = true;
        }
    }
}

/// Adapter over an opaque third-party embed.
///
/// The control surface is restricted: seek, rate and play/pause requests are
/// silently dropped rather than raised as errors.
pub struct EmbedSource {
    embed_url: String,
    state: Arc<Mutex<EmbedState>>,
}

impl EmbedSource {
    pub fn new(embed_url: impl Into<String>) -> (Self, EmbedReporter) {
        let state = Arc::new(Mutex::new(EmbedState::default()));
        let reporter = EmbedReporter {
            state: state.clone(),
        };
        (
            Self {
                embed_url: embed_url.into(),
                state,
            },
            reporter,
        )
    }

    pub fn embed_url(&self) -> &str {
        &self.embed_url
    }
}

impl MediaSource for EmbedSource {
    fn poll(&mut self) -> Option<PlaybackSample> {
        self.state.lock().ok()?.reported
    }

    fn take_ended(&mut self) -> bool {
        match self.state.lock() {
            Ok(mut state) => std::mem::take(&mut state.ended),
            Err(_) => false,
        }
    }

    fn seek(&mut self, _position: Duration) {}

    fn set_rate(&mut self, _rate: f64) {}

    fn toggle_play(&mut self) {}

    fn is_seekable(&self) -> bool {
        false
    }
}
