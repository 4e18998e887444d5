//! Headless playback-progress engine for LMS course content.
//!
//! Fetches a course curriculum, attaches a media source per lesson, polls it
//! for playback state, persists last-watched positions, and reconciles the
//! 90%-watched completion rule against the server.

pub mod backends;
pub mod config;
pub mod events;
pub mod models;
pub mod player;
pub mod progress;
pub mod reconciler;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
