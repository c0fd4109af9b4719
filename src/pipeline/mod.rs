//! The upload run.
//!
//! A run is one linear pass over seven stages:
//!
//! ```text
//! fetch token → provision container → enumerate disks → select
//!     → upload files → upload metadata → upload log
//! ```
//!
//! Setup and selection failures abort before anything is uploaded. Per-file
//! and metadata failures are written to the [`run_log::RunLog`] and the run
//! carries on. Losing the log itself aborts the run.

use std::path::{Path, PathBuf};

use log::{info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::cloud::container::ensure_container;
use crate::cloud::credentials::fetch_token;
use crate::cloud::store::{BlobStore, StoreConnector};
use crate::disks::{select_volumes, Selection, VolumeSource};
use crate::errors::RunError;
use crate::security::redact_sas;

/// Destination key layout and run timestamps
pub mod keys;

/// Metadata inventory collection and upload
pub mod metadata;

/// Final run log upload
pub mod publish;

/// Append-only outcome log
pub mod run_log;

/// Per-file upload stage
pub mod upload;

use keys::RunTimestamp;
use run_log::RunLog;

/// Everything the upload, metadata and log stages need to reach the
/// destination.
pub struct RunContext<'a> {
    pub store: &'a dyn BlobStore,
    pub container: String,
    pub timestamp: RunTimestamp,
    pub scratch_dir: PathBuf,
}

/// Inputs of one run, resolved from configuration.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub token_container: String,
    pub token_blob: String,
    pub container: String,
    pub selection: Selection,
    pub scratch_dir: PathBuf,
    pub timestamp: RunTimestamp,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub container: String,
    pub timestamp: RunTimestamp,
    pub volumes: Vec<String>,
    pub files_attempted: usize,
    pub files_uploaded: usize,
    pub files_failed: usize,
    pub entries_skipped: usize,
    pub bytes_uploaded: u64,
    pub metadata_records: usize,
    pub metadata_uploaded: bool,
    pub log_entries: usize,
    pub log_key: String,
}

/// Execute a full run.
///
/// `Ok` means every stage ran (some files may still have failed; see the
/// report counts). `Err` means the run was aborted.
pub async fn run(
    settings: &RunSettings,
    connector: &dyn StoreConnector,
    volume_source: &dyn VolumeSource,
) -> Result<RunReport, RunError> {
    let credential_failure = |e: anyhow::Error| RunError::CredentialRetrieval {
        container: settings.token_container.clone(),
        blob: settings.token_blob.clone(),
        reason: redact_sas(&format!("{:#}", e)),
    };

    let anonymous = connector.anonymous().map_err(credential_failure)?;
    let token = fetch_token(
        anonymous.as_ref(),
        &settings.token_container,
        &settings.token_blob,
    )
    .await?;
    let store = connector.with_token(&token).map_err(credential_failure)?;

    ensure_container(store.as_ref(), &settings.container).await?;

    let volumes = volume_source
        .fixed_volumes()
        .map_err(|e| RunError::DiskEnumeration(format!("{:#}", e)))?;
    let selected = select_volumes(&volumes, &settings.selection)?;

    let ctx = RunContext {
        store: store.as_ref(),
        container: settings.container.clone(),
        timestamp: settings.timestamp.clone(),
        scratch_dir: settings.scratch_dir.clone(),
    };
    let mut log = RunLog::new();

    let uploads = upload::upload_selected_files(&ctx, &selected, &mut log).await;
    let metadata = metadata::publish_metadata(&ctx, &selected, &mut log).await;
    let log_key = publish::publish_log(&ctx, &log).await?;

    Ok(RunReport {
        container: settings.container.clone(),
        timestamp: settings.timestamp.clone(),
        volumes: selected.iter().map(|s| s.volume.id.clone()).collect(),
        files_attempted: uploads.attempted,
        files_uploaded: uploads.uploaded,
        files_failed: uploads.failed,
        entries_skipped: uploads.skipped,
        bytes_uploaded: uploads.bytes,
        metadata_records: metadata.records,
        metadata_uploaded: metadata.uploaded,
        log_entries: log.len(),
        log_key,
    })
}

/// Walk `root` recursively without following links or leaving its file
/// system, in file name order. Errors are yielded for the caller to record.
pub(crate) fn walk_entries(
    root: &Path,
    min_depth: usize,
) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(root)
        .min_depth(min_depth)
        .follow_links(false)
        .same_file_system(true)
        .sort_by_file_name()
        .into_iter()
}

impl RunReport {
    /// Log a one-paragraph summary of the run
    pub fn log_summary(&self) {
        info!("Run {} finished for container {}", self.timestamp, self.container);
        info!("Volumes processed: {}", self.volumes.join(", "));
        info!(
            "Files: {} attempted, {} uploaded, {} failed ({} bytes), {} entries skipped",
            self.files_attempted,
            self.files_uploaded,
            self.files_failed,
            self.bytes_uploaded,
            self.entries_skipped
        );
        info!(
            "Metadata: {} records, {}",
            self.metadata_records,
            if self.metadata_uploaded { "uploaded" } else { "upload failed" }
        );
        info!("Run log: {} entries at {}", self.log_entries, self.log_key);

        if self.files_failed > 0 || !self.metadata_uploaded {
            warn!(
                "Run completed with {} failed file uploads{}; see {}",
                self.files_failed,
                if self.metadata_uploaded { "" } else { " and a failed metadata upload" },
                self.log_key
            );
        }
    }
}
