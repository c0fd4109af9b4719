use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::config::env_vars::expand_env_vars;
use crate::constants::{BLOB_ENDPOINT_SUFFIX, TOKEN_CONTAINER};
use crate::disks::selection::Selection;

/// Settings for one upload run, loaded from YAML and overridden by the CLI.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct UploaderConfig {
    /// Storage account name
    pub account: Option<String>,
    /// Explicit blob endpoint; overrides the one derived from `account`
    pub endpoint: Option<String>,
    /// Container holding the SAS token blobs
    pub token_container: String,
    /// Blob holding this host's SAS token
    pub token_blob: Option<String>,
    /// Path prefixes to upload
    pub inclusions: Vec<String>,
    /// Upload every fixed disk
    pub include_all: bool,
    /// Where staging files are created
    pub scratch_dir: Option<PathBuf>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        UploaderConfig {
            account: None,
            endpoint: None,
            token_container: TOKEN_CONTAINER.to_string(),
            token_blob: None,
            inclusions: Vec::new(),
            include_all: false,
            scratch_dir: None,
        }
    }
}

impl UploaderConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: UploaderConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML config")?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Write a sample configuration for the current OS to `path`
    pub fn create_sample_config_file(path: &Path) -> Result<()> {
        Self::sample().save_to_yaml_file(path)
    }

    /// A commented-by-example configuration with placeholder values
    pub fn sample() -> Self {
        let inclusion = if cfg!(windows) {
            "%USERPROFILE%\\Downloads"
        } else {
            "$HOME/Downloads"
        };

        UploaderConfig {
            account: Some("mystorageaccount".to_string()),
            token_blob: Some("workstation-token.txt".to_string()),
            inclusions: vec![inclusion.to_string()],
            ..Default::default()
        }
    }

    /// Apply command-line overrides. Inclusions from the CLI are appended.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(account) = &args.account {
            self.account = Some(account.clone());
        }
        if let Some(endpoint) = &args.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
        if let Some(container) = &args.token_container {
            self.token_container = container.clone();
        }
        if let Some(blob) = &args.token_blob {
            self.token_blob = Some(blob.clone());
        }
        if let Some(dir) = &args.scratch_dir {
            self.scratch_dir = Some(dir.clone());
        }
        self.inclusions.extend(args.inclusions.iter().cloned());
        self.include_all |= args.all_disks;
    }

    /// Expand `%VAR%`, `$VAR` and `${VAR}` in every inclusion
    pub fn process_environment_variables(&mut self) {
        for inclusion in &mut self.inclusions {
            let expanded = expand_env_vars(inclusion);
            if expanded != *inclusion {
                debug!("Expanded inclusion {} to {}", inclusion, expanded);
                *inclusion = expanded;
            }
        }
    }

    /// Selection strategy described by this configuration
    pub fn selection(&self) -> Selection {
        if self.include_all {
            Selection::IncludeAll
        } else {
            Selection::Filtered(self.inclusions.clone())
        }
    }

    /// Blob service endpoint, without a trailing slash
    pub fn blob_endpoint(&self) -> Result<String> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.trim_end_matches('/').to_string());
        }

        let account = self
            .account
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                anyhow!("Storage account not provided (use --account or set 'account' in the config)")
            })?;

        Ok(format!("https://{}.{}", account.trim(), BLOB_ENDPOINT_SUFFIX))
    }

    /// Name of the token blob, required for a run
    pub fn token_blob(&self) -> Result<&str> {
        self.token_blob
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| {
                anyhow!("Token blob not provided (use --token-blob or set 'token_blob' in the config)")
            })
    }

    /// Scratch directory for staging files
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Load the config file if one was given, otherwise start from defaults,
/// then apply command-line overrides and expand environment variables.
pub fn load_config(args: &Args) -> Result<UploaderConfig> {
    let mut config = match &args.config {
        Some(path) => UploaderConfig::from_yaml_file(path)?,
        None => UploaderConfig::default(),
    };

    config.apply_args(args);
    config.process_environment_variables();
    Ok(config)
}
