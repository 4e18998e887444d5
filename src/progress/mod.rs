mod completion;
mod position_store;

pub use completion::CompletionPolicy;
pub use position_store::{FilePositionStore, MemoryPositionStore, POSITION_KEY_PREFIX, PositionStore};
