use crate::Result;
use chrono::{DateTime, Utc};
use core_types::Signal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// One delivered alert as persisted in the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAlert {
    pub signal: Signal,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

/// JSON-file alert history, newest first, capped at `max_entries`.
///
/// Writes go through a `.tmp` sibling and an atomic rename so a crash
/// mid-write never corrupts the history. A missing or unreadable file
/// loads as an empty history.
pub struct AlertStore {
    path: PathBuf,
    max_entries: usize,
}

impl AlertStore {
    pub fn new(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            path: path.into(),
            max_entries,
        }
    }

    /// Loads up to `limit` most recent alerts. Errors are logged and yield
    /// an empty list; history is best-effort data.
    pub fn load(&self, limit: usize) -> Vec<StoredAlert> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "Failed to read alert history.");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<StoredAlert>>(&raw) {
            Ok(mut alerts) => {
                alerts.truncate(limit);
                alerts
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "Alert history is not valid JSON.");
                Vec::new()
            }
        }
    }

    /// Prepends one alert and rewrites the capped history file.
    pub fn append(&self, alert: StoredAlert) -> Result<()> {
        let mut alerts = self.load(self.max_entries);
        alerts.insert(0, alert);
        alerts.truncate(self.max_entries);
        self.write_all(&alerts)
    }

    fn write_all(&self, alerts: &[StoredAlert]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(alerts)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Removes the history file entirely.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
