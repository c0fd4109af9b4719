use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tokio::runtime::Runtime;

use disk_uploader::cli::{Args, Commands};
use disk_uploader::cloud::azure::AzureConnector;
use disk_uploader::cloud::container::container_name_for_host;
use disk_uploader::config::{load_config, UploaderConfig};
use disk_uploader::disks::{SystemVolumes, VolumeSource};
use disk_uploader::pipeline::keys::RunTimestamp;
use disk_uploader::pipeline::{self, RunSettings};
use disk_uploader::security::safe_error_message;

fn main() -> Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    initialize_logging(args.verbose)?;

    // Handle subcommands
    if let Some(cmd) = &args.command {
        return handle_subcommand(cmd);
    }

    info!("Starting disk upload");

    let config = load_config(&args)?;
    let settings = build_run_settings(&config)?;
    let connector = AzureConnector::new(&config.blob_endpoint()?);

    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
    match runtime.block_on(pipeline::run(&settings, &connector, &SystemVolumes)) {
        Ok(report) => {
            report.log_summary();
            info!("Disk upload completed");
            Ok(())
        }
        Err(e) => {
            error!("{}", safe_error_message("Run aborted", &e));
            Err(e.into())
        }
    }
}

/// Initialize logging with the specified verbosity level.
///
/// Without `--verbose` only warnings and errors are printed, so failures are
/// always visible while progress narration is not.
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ).context("Failed to initialize logger")?;
    Ok(())
}

/// Handle subcommands (init-config and list-disks)
fn handle_subcommand(cmd: &Commands) -> Result<()> {
    match cmd {
        Commands::InitConfig { path } => {
            UploaderConfig::create_sample_config_file(path)?;
            println!("Configuration written to {}", path.display());
            Ok(())
        }
        Commands::ListDisks => {
            let volumes = SystemVolumes.fixed_volumes()?;
            if volumes.is_empty() {
                println!("No fixed disks found");
            }
            for volume in volumes {
                println!(
                    "{:<24} {:<10} {:>8} GB  {}",
                    volume.id,
                    volume.file_system,
                    volume.total_capacity / (1024 * 1024 * 1024),
                    volume.name
                );
            }
            Ok(())
        }
    }
}

/// Resolve the destination container and run parameters
fn build_run_settings(config: &UploaderConfig) -> Result<RunSettings> {
    let hostname = hostname::get()
        .map_err(|e| anyhow!("Failed to get hostname: {}", e))?
        .to_string_lossy()
        .to_string();

    let container = container_name_for_host(&hostname);
    let timestamp = RunTimestamp::now();
    info!("Uploading to container {} with run timestamp {}", container, timestamp);

    Ok(RunSettings {
        token_container: config.token_container.clone(),
        token_blob: config.token_blob()?.to_string(),
        container,
        selection: config.selection(),
        scratch_dir: config.scratch_dir(),
        timestamp,
    })
}
