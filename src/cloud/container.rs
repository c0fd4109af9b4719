use log::info;

use crate::cloud::store::{BlobStore, ContainerCreation};
use crate::errors::RunError;
use crate::security::redact_sas;

/// Derive the destination container name from a host name.
///
/// Container names are 3-63 characters of lower-case letters, digits and
/// single hyphens, starting and ending with a letter or digit. Anything else
/// in the host name becomes a hyphen; short names are padded.
pub fn container_name_for_host(hostname: &str) -> String {
    let mut name = String::with_capacity(hostname.len());
    for c in hostname.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' };
        if c == '-' && name.ends_with('-') {
            continue;
        }
        name.push(c);
    }

    let mut name = name.trim_matches('-').to_string();
    name.truncate(63);
    let mut name = name.trim_end_matches('-').to_string();

    while name.len() < 3 {
        name.push('0');
    }
    name
}

/// Make sure `container` exists, creating it if needed.
///
/// Re-running against an existing container is a no-op, and losing a
/// create race to another run counts as success.
pub async fn ensure_container(
    store: &dyn BlobStore,
    container: &str,
) -> Result<ContainerCreation, RunError> {
    let failure = |e: anyhow::Error| RunError::Provisioning {
        container: container.to_string(),
        reason: redact_sas(&format!("{:#}", e)),
    };

    if store.container_exists(container).await.map_err(failure)? {
        info!("Container {} already exists", container);
        return Ok(ContainerCreation::AlreadyExists);
    }

    let outcome = store.create_container(container).await.map_err(failure)?;
    match outcome {
        ContainerCreation::Created => info!("Created container {}", container),
        ContainerCreation::AlreadyExists => {
            info!("Container {} was created concurrently", container)
        }
    }
    Ok(outcome)
}
