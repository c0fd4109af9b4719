use log::{debug, info};

use crate::cloud::store::BlobStore;
use crate::errors::RunError;
use crate::security::redact_sas;

/// Read the SAS token for this host from `container/blob`.
///
/// `store` must be an anonymous handle; the token container is expected to
/// allow public blob reads. Surrounding whitespace and a leading `?` are
/// stripped. An empty or unreadable blob aborts the run.
pub async fn fetch_token(
    store: &dyn BlobStore,
    container: &str,
    blob: &str,
) -> Result<String, RunError> {
    info!("Fetching access token from {}/{}/{}", store.store_name(), container, blob);

    let failure = |reason: String| RunError::CredentialRetrieval {
        container: container.to_string(),
        blob: blob.to_string(),
        reason,
    };

    let text = store
        .read_blob_text(container, blob)
        .await
        .map_err(|e| failure(redact_sas(&format!("{:#}", e))))?;

    let token = text.trim().trim_start_matches('?').trim();
    if token.is_empty() {
        return Err(failure("token blob is empty".to_string()));
    }

    debug!("Retrieved access token ({} characters)", token.len());
    Ok(token.to_string())
}
