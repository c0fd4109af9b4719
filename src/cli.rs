use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::constants::DEFAULT_CONFIG_NAME;

/// Command-line arguments for the disk uploader.
///
/// Every option can also be set in the YAML configuration file; values given
/// on the command line take precedence, and `--include` entries are added to
/// the configured inclusions.
#[derive(Parser, Debug)]
#[clap(
    name = "disk-uploader",
    about = "Upload local disk contents, metadata and a run log to Azure Blob Storage"
)]
pub struct Args {
    /// Storage account name
    #[clap(short, long)]
    pub account: Option<String>,

    /// Blob endpoint URL (default: https://<account>.blob.core.windows.net)
    #[clap(long)]
    pub endpoint: Option<String>,

    /// Name of the blob holding the SAS token
    #[clap(short = 't', long)]
    pub token_blob: Option<String>,

    /// Container holding the SAS token blob (default: sas-token)
    #[clap(long)]
    pub token_container: Option<String>,

    /// Path prefix to upload; may be given multiple times
    #[clap(short, long = "include", value_name = "PATH")]
    pub inclusions: Vec<String>,

    /// Upload every fixed disk, ignoring inclusions
    #[clap(long)]
    pub all_disks: bool,

    /// Directory for metadata and log staging files (default: system temp dir)
    #[clap(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Path to configuration YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the uploader.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a sample configuration file
    InitConfig {
        /// Path to output configuration file
        #[clap(default_value = DEFAULT_CONFIG_NAME)]
        path: PathBuf,
    },

    /// List the fixed disks that would be considered for upload
    ListDisks,
}
