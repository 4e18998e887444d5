use super::traits::{MediaSource, PlayerEvent, PlayerHandle, PlayerState};
use crate::models::PlaybackSample;
use std::time::Duration;
use tracing::trace;

/// Adapter over a directly controllable playback surface.
///
/// Native lifecycle events (metadata-ready, time-advanced, play, pause,
/// ended) are folded into a snapshot between polls, so downstream consumers
/// see samples at the caller's fixed cadence rather than once per event.
pub struct DirectSource {
    handle: Box<dyn PlayerHandle>,
    known_duration: Option<Duration>,
    last_position: Option<Duration>,
    ended: bool,
}

impl DirectSource {
    pub fn new(handle: Box<dyn PlayerHandle>) -> Self {
        Self {
            handle,
            known_duration: None,
            last_position: None,
            ended: false,
        }
    }

    fn absorb_events(&mut self) {
        for event in self.handle.drain_events() {
            match event {
                PlayerEvent::MetadataReady { duration } => {
                    self.known_duration = Some(duration);
                }
                PlayerEvent::TimeAdvanced { position } => {
                    self.last_position = Some(position);
                }
                PlayerEvent::Ended => {
                    self.ended = true;
                }
                PlayerEvent::Played | PlayerEvent::Paused => {}
            }
        }
    }
}

impl MediaSource for DirectSource {
    fn poll(&mut self) -> Option<PlaybackSample> {
        self.absorb_events();

        // Until metadata has loaded the surface cannot report a position;
        // that tick is skipped rather than reported as an error.
        let position = self.handle.position().or(self.last_position)?;
        let duration = self.handle.duration().or(self.known_duration);
        let is_playing = self.handle.state() == PlayerState::Playing;

        trace!(?position, ?duration, is_playing, "direct source sample");
        Some(PlaybackSample::new(position, duration, is_playing))
    }

    fn take_ended(&mut self) -> bool {
        self.absorb_events();
        std::mem::take(&mut self.ended)
    }

    fn seek(&mut self, position: Duration) {
        self.handle.seek(position);
    }

    fn set_rate(&mut self, rate: f64) {
        self.handle.set_rate(rate);
    }

    fn toggle_play(&mut self) {
        match self.handle.state() {
            PlayerState::Playing => self.handle.pause(),
            _ => self.handle.play(),
        }
    }
}
