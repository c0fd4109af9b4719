//! Destination key layout.
//!
//! ```text
//! disks/<volume label>-<timestamp>/<volume-relative path>
//! metadata/metadata-<timestamp>.json
//! logs/logs-<timestamp>.txt
//! ```
//!
//! All keys are lower-case and use forward slashes. The functions here work
//! on strings rather than `Path`s so Windows-style paths are handled the
//! same on every host.

use std::fmt;

use chrono::{DateTime, Local};

use crate::constants::{DISKS_PREFIX, LOGS_PREFIX, METADATA_PREFIX, RUN_TIMESTAMP_FORMAT};

/// Point in time shared by every object uploaded in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTimestamp(String);

impl RunTimestamp {
    pub fn now() -> Self {
        Self::from_datetime(Local::now())
    }

    pub fn from_datetime(at: DateTime<Local>) -> Self {
        RunTimestamp(at.format(RUN_TIMESTAMP_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short label for a volume: the drive letter for `X:` identifiers,
/// otherwise the mount path with separators turned into hyphens.
pub fn volume_label(volume_id: &str) -> String {
    let bytes = volume_id.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return (bytes[0] as char).to_ascii_lowercase().to_string();
    }

    let label = volume_id
        .split(|c| c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();

    if label.is_empty() {
        "root".to_string()
    } else {
        label
    }
}

/// Path of `file_path` relative to its volume root, forward-slashed and
/// lower-cased.
pub fn relative_key_path(volume_id: &str, file_path: &str) -> String {
    let relative = file_path.strip_prefix(volume_id).unwrap_or(file_path);

    relative
        .split(|c| c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
        .to_lowercase()
}

/// Key prefix for every file uploaded from one volume
pub fn disk_prefix(volume_id: &str, timestamp: &RunTimestamp) -> String {
    format!("{}/{}-{}", DISKS_PREFIX, volume_label(volume_id), timestamp).to_lowercase()
}

/// Destination key of a file uploaded from `volume_id`
pub fn file_key(volume_id: &str, file_path: &str, timestamp: &RunTimestamp) -> String {
    format!(
        "{}/{}",
        disk_prefix(volume_id, timestamp),
        relative_key_path(volume_id, file_path)
    )
}

pub fn metadata_key(timestamp: &RunTimestamp) -> String {
    format!("{}/metadata-{}.json", METADATA_PREFIX, timestamp).to_lowercase()
}

pub fn log_key(timestamp: &RunTimestamp) -> String {
    format!("{}/logs-{}.txt", LOGS_PREFIX, timestamp).to_lowercase()
}
