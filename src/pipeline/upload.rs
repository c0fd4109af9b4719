use log::info;

use crate::disks::SelectedVolume;
use crate::pipeline::keys::file_key;
use crate::pipeline::run_log::RunLog;
use crate::pipeline::{walk_entries, RunContext};

/// Counts from the upload stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub attempted: usize,
    pub uploaded: usize,
    pub failed: usize,
    /// Special files (FIFOs, sockets, devices, symlinks) and unreadable
    /// entries, recorded but never opened
    pub skipped: usize,
    pub bytes: u64,
}

/// Upload every regular file under the selected roots.
///
/// Each file is attempted once and produces exactly one log entry. A failed
/// upload is recorded and the stage moves on to the next file. Entries that
/// are not regular files, and directories the walk cannot read, get a single
/// failure entry each.
pub async fn upload_selected_files(
    ctx: &RunContext<'_>,
    volumes: &[SelectedVolume],
    log: &mut RunLog,
) -> UploadSummary {
    let mut summary = UploadSummary::default();

    for selected in volumes {
        for root in &selected.roots {
            info!("Uploading files under {}", root.display());

            for entry in walk_entries(root, 0) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        summary.skipped += 1;
                        log.failure(format!("Skipped unreadable entry: {}", e));
                        continue;
                    }
                };

                let file_type = entry.file_type();
                if file_type.is_dir() {
                    continue;
                }

                let path = entry.path().to_string_lossy().to_string();
                if !file_type.is_file() {
                    summary.skipped += 1;
                    log.failure(format!("Skipped special file {}", path));
                    continue;
                }

                let key = file_key(&selected.volume.id, &path, &ctx.timestamp);
                summary.attempted += 1;

                match ctx.store.put_file(&ctx.container, &key, entry.path()).await {
                    Ok(bytes) => {
                        summary.uploaded += 1;
                        summary.bytes += bytes;
                        log.success(format!("Uploaded {} to {}", path, key));
                    }
                    Err(e) => {
                        summary.failed += 1;
                        log.failure(format!("Failed to upload {} to {}: {:#}", path, key, e));
                    }
                }
            }
        }
    }

    info!(
        "Upload stage finished: {} of {} files uploaded ({} bytes), {} failed, {} skipped",
        summary.uploaded, summary.attempted, summary.bytes, summary.failed, summary.skipped
    );
    summary
}
