use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a disk volume reported by the operating system.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    Fixed,
    Removable,
    Network,
    Optical,
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeKind::Fixed => write!(f, "fixed"),
            VolumeKind::Removable => write!(f, "removable"),
            VolumeKind::Network => write!(f, "network"),
            VolumeKind::Optical => write!(f, "optical"),
        }
    }
}

/// A local storage volume as reported by the OS.
///
/// `id` is the volume root exactly as the enumerator reports it (`C:\` on
/// Windows, a mount path elsewhere). Inclusion matching and destination key
/// derivation are both done against this string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub file_system: String,
    pub total_capacity: u64,
    pub kind: VolumeKind,
}

impl Volume {
    /// Create a fixed volume with no name or file system information
    pub fn fixed(id: &str, total_capacity: u64) -> Self {
        Volume {
            id: id.to_string(),
            name: String::new(),
            file_system: String::new(),
            total_capacity,
            kind: VolumeKind::Fixed,
        }
    }
}

/// Kind of filesystem entry recorded in the metadata inventory.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of the metadata inventory uploaded at the end of a run.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    pub creation_time: Option<DateTime<Utc>>,
    pub last_write_time: Option<DateTime<Utc>>,
    pub last_access_time: Option<DateTime<Utc>>,
}
