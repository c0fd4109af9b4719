//! Global constants for the disk uploader.
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make configuration changes easier.

// Storage layout constants
/// Container holding the SAS token blobs, readable anonymously
pub const TOKEN_CONTAINER: &str = "sas-token";

/// Key prefix for uploaded disk contents
pub const DISKS_PREFIX: &str = "disks";

/// Key prefix for the metadata inventory document
pub const METADATA_PREFIX: &str = "metadata";

/// Key prefix for the run log
pub const LOGS_PREFIX: &str = "logs";

/// Run timestamp format (day-month-year-hour-minute-second)
pub const RUN_TIMESTAMP_FORMAT: &str = "%d-%m-%Y-%H-%M-%S";

// Azure Blob REST constants
/// Blob service host suffix appended to the account name
pub const BLOB_ENDPOINT_SUFFIX: &str = "blob.core.windows.net";

/// REST API version sent with every request
pub const AZURE_API_VERSION: &str = "2021-08-06";

/// Files larger than this are sent as a block list instead of a single Put Blob (256MB)
pub const LARGE_FILE_THRESHOLD: u64 = 256 * 1024 * 1024;

/// Block size for block list uploads (8MB)
pub const BLOCK_SIZE: usize = 8 * 1024 * 1024;

/// Azure allows at most this many committed blocks per blob
pub const MAX_BLOCKS: u64 = 50_000;

/// Default connection timeout in seconds
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

// Disk classification
/// File systems reported for network shares
pub const NETWORK_FILE_SYSTEMS: &[&str] = &[
    "nfs", "nfs4", "cifs", "smbfs", "smb3", "sshfs", "fuse.sshfs", "9p", "afpfs", "webdav",
    "davfs", "ncpfs",
];

/// File systems reported for optical media
pub const OPTICAL_FILE_SYSTEMS: &[&str] = &["iso9660", "udf", "cdfs"];

// Default file names
pub const DEFAULT_CONFIG_NAME: &str = "uploader.yaml";
