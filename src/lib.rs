//! # disk-uploader
//!
//! Uploads the contents of a workstation's local fixed disks, an inventory
//! of their metadata and a run log to Azure Blob Storage.
//!
//! ## Overview
//!
//! A run authenticates with a SAS token read anonymously from a well-known
//! container, makes sure a container named after the host exists, then walks
//! the selected disks and uploads every file it finds, one at a time. All
//! objects of one run share a single timestamp:
//!
//! ```text
//! <hostname>/
//!   disks/<volume>-<timestamp>/<relative/path>
//!   metadata/metadata-<timestamp>.json
//!   logs/logs-<timestamp>.txt
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use disk_uploader::cloud::azure::AzureConnector;
//! use disk_uploader::disks::{Selection, SystemVolumes};
//! use disk_uploader::pipeline::keys::RunTimestamp;
//! use disk_uploader::pipeline::{run, RunSettings};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = RunSettings {
//!     token_container: "sas-token".to_string(),
//!     token_blob: "ws01.txt".to_string(),
//!     container: "ws01".to_string(),
//!     selection: Selection::Filtered(vec!["C:\\Users\\x\\Downloads".to_string()]),
//!     scratch_dir: std::env::temp_dir(),
//!     timestamp: RunTimestamp::now(),
//! };
//!
//! let connector = AzureConnector::new("https://mystorageaccount.blob.core.windows.net");
//! let report = run(&settings, &connector, &SystemVolumes).await?;
//! println!("Uploaded {} of {} files", report.files_uploaded, report.files_attempted);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`config`]: YAML configuration and environment variable expansion
//! - [`cloud`]: Azure Blob Storage access, token retrieval, container setup
//! - [`disks`]: Fixed disk enumeration and selection
//! - [`pipeline`]: The run itself: uploads, metadata, run log
//! - [`models`]: Volumes and metadata records
//! - [`errors`]: Errors that abort a run
//! - [`security`]: SAS token redaction
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models
pub mod models;

/// Errors that abort a run
pub mod errors;

/// Fixed disk enumeration and selection
pub mod disks;

/// The upload run and its stages
pub mod pipeline;

/// Cloud storage integration (Azure Blob Storage)
pub mod cloud;

/// Configuration management
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Security utilities for credential protection
pub mod security;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
