use thiserror::Error;

/// Failures that abort a run.
///
/// Per-file upload failures and metadata upload failures are not represented
/// here; they are recorded in the run log and the run carries on.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to retrieve access token from {container}/{blob}: {reason}")]
    CredentialRetrieval {
        container: String,
        blob: String,
        reason: String,
    },

    #[error("failed to provision container '{container}': {reason}")]
    Provisioning { container: String, reason: String },

    #[error("failed to enumerate local disks: {0}")]
    DiskEnumeration(String),

    #[error("no local disks match the inclusion list {inclusions:?}")]
    NoMatchingDisks { inclusions: Vec<String> },

    #[error("failed to publish run log to '{key}': {reason}")]
    LogPublish { key: String, reason: String },
}
