use std::io::Write;

use anyhow::{Context, Result};
use log::info;

use crate::errors::RunError;
use crate::pipeline::keys::log_key;
use crate::pipeline::run_log::RunLog;
use crate::pipeline::RunContext;
use crate::security::redact_sas;

/// Upload the run log as the final object of the run.
///
/// This is the only failure after processing that aborts the run, since
/// without it there is no record of what was uploaded. The staging file is
/// removed on every path.
pub async fn publish_log(ctx: &RunContext<'_>, log: &RunLog) -> Result<String, RunError> {
    let key = log_key(&ctx.timestamp);

    match stage_and_upload(ctx, log, &key).await {
        Ok(bytes) => {
            info!("Uploaded run log ({} entries, {} bytes) to {}", log.len(), bytes, key);
            Ok(key)
        }
        Err(e) => Err(RunError::LogPublish {
            reason: redact_sas(&format!("{:#}", e)),
            key,
        }),
    }
}

async fn stage_and_upload(ctx: &RunContext<'_>, log: &RunLog, key: &str) -> Result<u64> {
    let mut scratch = tempfile::Builder::new()
        .prefix("logs-")
        .suffix(".txt")
        .tempfile_in(&ctx.scratch_dir)
        .context(format!("Failed to create log staging file in {}", ctx.scratch_dir.display()))?;

    scratch
        .write_all(log.render().as_bytes())
        .context("Failed to write log staging file")?;
    scratch.flush().context("Failed to write log staging file")?;

    ctx.store.put_file(&ctx.container, key, scratch.path()).await
}
