use crate::models::LessonId;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Stable key prefix; one entry per lesson, last write wins.
pub const POSITION_KEY_PREFIX: &str = "lesson-position:";

/// Durable per-lesson last-watched position, scoped to this device.
///
/// Best-effort storage: reads never fail (absent or unparsable entries read
/// as zero) and writes are fire-and-forget.
pub trait PositionStore: Send + Sync {
    /// Last stored position for a lesson, or zero when absent/unparsable.
    fn get(&self, lesson: &LessonId) -> Duration;

    /// Overwrite the stored position. Called at most once per poll tick.
    fn set(&self, lesson: &LessonId, position: Duration);
}

fn entry_key(lesson: &LessonId) -> String {
    format!("{POSITION_KEY_PREFIX}{lesson}")
}

fn parse_seconds(value: &str) -> Duration {
    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Duration::from_secs_f64(secs),
        _ => Duration::ZERO,
    }
}

fn encode_seconds(position: Duration) -> String {
    format!("{:.3}", position.as_secs_f64())
}

/// Key-value position file under the user data directory.
///
/// Values are string-encoded seconds offsets, mirroring the storage layout a
/// browser profile would use.
#[derive(Debug)]
pub struct FilePositionStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FilePositionStore {
    pub fn open() -> Result<Self> {
        let data_dir = dirs::data_dir().context("Failed to get data directory")?;
        Self::with_path(data_dir.join("lessonsync").join("positions.json"))
    }

    pub fn with_path(path: PathBuf) -> Result<Self> {
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Discarding unreadable position file {:?}: {}", path, e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        debug!("Opened position store at {:?} ({} entries)", path, entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create position store directory: {}", e);
                return;
            }
        }
        match serde_json::to_string(entries) {
            Ok(contents) => {
                if let Err(e) = fs::write(&self.path, contents) {
                    warn!("Failed to write position store: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize position store: {}", e),
        }
    }
}

impl PositionStore for FilePositionStore {
    fn get(&self, lesson: &LessonId) -> Duration {
        let Ok(entries) = self.entries.lock() else {
            return Duration::ZERO;
        };
        entries
            .get(&entry_key(lesson))
            .map(|v| parse_seconds(v))
            .unwrap_or(Duration::ZERO)
    }

    fn set(&self, lesson: &LessonId, position: Duration) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.insert(entry_key(lesson), encode_seconds(position));
        self.persist(&entries);
    }
}

/// In-memory store for tests and embedders with their own persistence.
#[derive(Debug, Default)]
pub struct MemoryPositionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored entries, keyed by the prefixed lesson key.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl PositionStore for MemoryPositionStore {
    fn get(&self, lesson: &LessonId) -> Duration {
        let Ok(entries) = self.entries.lock() else {
            return Duration::ZERO;
        };
        entries
            .get(&entry_key(lesson))
            .map(|v| parse_seconds(v))
            .unwrap_or(Duration::ZERO)
    }

    fn set(&self, lesson: &LessonId, position: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(entry_key(lesson), encode_seconds(position));
        }
    }
}
