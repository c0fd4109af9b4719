//! Local disk enumeration and selection.
//!
//! The enumerator asks the OS for its disks through `sysinfo`, classifies
//! each one and keeps only local fixed storage. [`selection`] then narrows
//! the fixed set down to the volumes a run will process.

use anyhow::Result;
use log::{debug, warn};
use sysinfo::{DiskExt, System, SystemExt};

use crate::constants::{NETWORK_FILE_SYSTEMS, OPTICAL_FILE_SYSTEMS};
use crate::models::{Volume, VolumeKind};

/// Disk selection strategies
pub mod selection;

pub use selection::{select_volumes, SelectedVolume, Selection};

/// Source of the fixed volumes a run considers.
pub trait VolumeSource {
    /// List local fixed volumes, sorted by identifier
    fn fixed_volumes(&self) -> Result<Vec<Volume>>;
}

/// Volumes reported by the running operating system.
#[derive(Debug, Default)]
pub struct SystemVolumes;

impl SystemVolumes {
    /// Every disk the OS reports, fixed or not
    pub fn all_volumes(&self) -> Vec<Volume> {
        let mut system = System::new();
        system.refresh_disks_list();

        system
            .disks()
            .iter()
            .map(|disk| {
                let file_system = String::from_utf8_lossy(disk.file_system()).to_string();
                Volume {
                    id: disk.mount_point().to_string_lossy().to_string(),
                    name: disk.name().to_string_lossy().to_string(),
                    kind: classify_volume(&file_system, disk.is_removable()),
                    file_system,
                    total_capacity: disk.total_space(),
                }
            })
            .collect()
    }
}

impl VolumeSource for SystemVolumes {
    fn fixed_volumes(&self) -> Result<Vec<Volume>> {
        let mut volumes: Vec<Volume> = self
            .all_volumes()
            .into_iter()
            .filter(|volume| {
                if volume.kind != VolumeKind::Fixed {
                    debug!(
                        "Skipping {} volume {} ({})",
                        volume.kind, volume.id, volume.file_system
                    );
                    return false;
                }
                true
            })
            .collect();

        volumes.sort_by(|a, b| a.id.cmp(&b.id));
        volumes.dedup_by(|a, b| a.id == b.id);

        if volumes.is_empty() {
            warn!("No local fixed disks found");
        } else {
            debug!("Found {} fixed disks", volumes.len());
        }

        Ok(volumes)
    }
}

/// Classify a disk from its file system name and removable flag
pub fn classify_volume(file_system: &str, is_removable: bool) -> VolumeKind {
    let fs = file_system.to_lowercase();

    if OPTICAL_FILE_SYSTEMS.contains(&fs.as_str()) {
        VolumeKind::Optical
    } else if NETWORK_FILE_SYSTEMS.contains(&fs.as_str()) || fs.starts_with("fuse.sshfs") {
        VolumeKind::Network
    } else if is_removable {
        VolumeKind::Removable
    } else {
        VolumeKind::Fixed
    }
}
