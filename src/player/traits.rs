use crate::models::PlaybackSample;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
}

/// Lifecycle events a controllable playback surface reports between polls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    MetadataReady { duration: Duration },
    TimeAdvanced { position: Duration },
    Played,
    Paused,
    Ended,
}

/// A directly controllable playback surface, implemented by the embedding
/// application over whatever media stack it uses.
pub trait PlayerHandle: Send {
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn state(&self) -> PlayerState;
    fn seek(&mut self, position: Duration);
    fn set_rate(&mut self, rate: f64);
    fn play(&mut self);
    fn pause(&mut self);
    /// Drain lifecycle events observed since the previous call.
    fn drain_events(&mut self) -> Vec<PlayerEvent>;
}

/// Uniform polling interface over heterogeneous playback surfaces.
///
/// Sources never error on transient unavailability; they answer `None` from
/// `poll` and the caller skips that tick. Control methods are best-effort and
/// no-ops on surfaces with a restricted control API.
pub trait MediaSource: Send {
    fn poll(&mut self) -> Option<PlaybackSample>;

    /// Consume the ended signal, if one fired since the last call.
    fn take_ended(&mut self) -> bool;

    fn seek(&mut self, position: Duration);

    fn set_rate(&mut self, rate: f64);

    fn toggle_play(&mut self);

    /// Whether `seek` actually reaches the surface. Used to decide if a
    /// resume seek is worth attempting.
    fn is_seekable(&self) -> bool {
        true
    }
}
