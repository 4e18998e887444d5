mod event_bus;
mod types;

pub use event_bus::EventBus;
pub use types::{ProgressEvent, ProgressEventKind};
