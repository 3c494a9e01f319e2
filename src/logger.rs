use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub prompt: String,
    pub response: String,
}

/// Appends one record per generate call to a per-day JSON file.
///
/// The file holds a single pretty-printed JSON array and is rewritten whole
/// on every append. The read-append-write sequence is guarded by a mutex so
/// same-day appends from concurrent requests cannot drop each other's
/// entries.
pub struct InteractionLogger {
    dir: PathBuf,
    guard: Mutex<()>,
}

impl InteractionLogger {
    /// Creates the log directory if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            guard: Mutex::new(()),
        })
    }

    pub fn append(&self, prompt: &str, response: &str) -> Result<(), ServiceError> {
        let now = Local::now();
        let entry = LogEntry {
            timestamp: now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
        };
        let path = self.dir.join(format!("{}.json", now.format("%Y-%m-%d")));

        let _guard = self.guard.lock();
        let mut entries = read_entries(&path)?;
        entries.push(entry);
        let rendered = serde_json::to_string_pretty(&entries)
            .map_err(|e| ServiceError::LogFormat(e.to_string()))?;
        fs::write(&path, rendered)?;

        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<Vec<LogEntry>, ServiceError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| ServiceError::LogFormat(e.to_string()))
}
