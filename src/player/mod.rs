mod direct;
mod embed;
mod factory;
mod media;
mod traits;

pub use direct::DirectSource;
pub use embed::{EmbedReporter, EmbedSource};
pub use factory::{AttachedMedia, PlayableSource, attach};
pub use media::{MediaKind, classify, normalize_embed_url};
pub use traits::{MediaSource, PlayerEvent, PlayerHandle, PlayerState};
