use std::io::{BufWriter, Write};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use walkdir::DirEntry;

use crate::disks::SelectedVolume;
use crate::models::{EntryKind, MetadataRecord};
use crate::pipeline::keys::metadata_key;
use crate::pipeline::run_log::RunLog;
use crate::pipeline::{walk_entries, RunContext};

/// Result of the metadata stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSummary {
    pub records: usize,
    pub key: String,
    pub uploaded: bool,
}

/// Build one record per file and directory under the selected roots.
///
/// Hidden and system entries are included. Directory roots themselves are
/// not; a root that names a file gets its own record.
pub fn collect_metadata(volumes: &[SelectedVolume]) -> Vec<MetadataRecord> {
    let mut records = Vec::new();

    for selected in volumes {
        for root in &selected.roots {
            debug!("Collecting metadata under {}", root.display());

            // A root naming a single file is recorded itself
            let min_depth = if root.is_dir() { 1 } else { 0 };
            for entry in walk_entries(root, min_depth) {
                match entry {
                    Ok(entry) => records.push(metadata_record(&entry)),
                    Err(e) => warn!("Skipping unreadable entry: {}", e),
                }
            }
        }
    }

    records
}

fn metadata_record(entry: &DirEntry) -> MetadataRecord {
    let kind = if entry.file_type().is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    let metadata = match entry.metadata() {
        Ok(m) => Some(m),
        Err(e) => {
            debug!("Cannot access metadata for {}: {}", entry.path().display(), e);
            None
        }
    };

    let size = match (&metadata, kind) {
        (Some(m), EntryKind::File) => m.len(),
        _ => 0,
    };

    MetadataRecord {
        path: entry.path().to_string_lossy().to_string(),
        kind,
        size,
        creation_time: metadata.as_ref().and_then(|m| to_utc(m.created())),
        last_write_time: metadata.as_ref().and_then(|m| to_utc(m.modified())),
        last_access_time: metadata.as_ref().and_then(|m| to_utc(m.accessed())),
    }
}

fn to_utc(time: std::io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

/// Collect metadata for the selected volumes and upload it as one JSON
/// document.
///
/// Upload problems are recorded in the run log and never abort the run. The
/// staging file is removed before this returns.
pub async fn publish_metadata(
    ctx: &RunContext<'_>,
    volumes: &[SelectedVolume],
    log: &mut RunLog,
) -> MetadataSummary {
    let records = collect_metadata(volumes);
    let key = metadata_key(&ctx.timestamp);
    info!("Collected {} metadata records", records.len());

    let uploaded = match stage_and_upload(ctx, &records, &key).await {
        Ok(bytes) => {
            log.success(format!(
                "Uploaded metadata for {} entries to {} ({} bytes)",
                records.len(),
                key,
                bytes
            ));
            true
        }
        Err(e) => {
            log.failure(format!("Failed to upload metadata to {}: {:#}", key, e));
            false
        }
    };

    MetadataSummary {
        records: records.len(),
        key,
        uploaded,
    }
}

async fn stage_and_upload(
    ctx: &RunContext<'_>,
    records: &[MetadataRecord],
    key: &str,
) -> Result<u64> {
    let mut scratch = tempfile::Builder::new()
        .prefix("metadata-")
        .suffix(".json")
        .tempfile_in(&ctx.scratch_dir)
        .context(format!(
            "Failed to create metadata staging file in {}",
            ctx.scratch_dir.display()
        ))?;

    {
        let mut writer = BufWriter::new(scratch.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, records).context("Failed to serialize metadata")?;
        writer.flush().context("Failed to write metadata staging file")?;
    }

    ctx.store.put_file(&ctx.container, key, scratch.path()).await
}
