use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::errors::RunError;
use crate::models::Volume;

/// How the volumes and paths of a run are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every fixed volume, walked from its root
    IncludeAll,
    /// Only volumes that own at least one of these path prefixes, walked
    /// from those prefixes
    Filtered(Vec<String>),
}

impl Selection {
    /// Inclusions in effect; empty for `IncludeAll`
    pub fn inclusions(&self) -> &[String] {
        match self {
            Selection::IncludeAll => &[],
            Selection::Filtered(inclusions) => inclusions,
        }
    }
}

/// A volume chosen for processing, with the roots to walk on it.
///
/// The upload and metadata stages both take the same `&[SelectedVolume]`,
/// so they always see the same set of disks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedVolume {
    pub volume: Volume,
    pub roots: Vec<PathBuf>,
}

/// Narrow the enumerated volumes down according to `selection`.
///
/// Matching is a plain string prefix test of each inclusion against the
/// volume identifier, so inclusions must use the same drive-letter casing
/// and separator style as the enumerator. An empty result is an error in
/// both modes.
pub fn select_volumes(
    volumes: &[Volume],
    selection: &Selection,
) -> Result<Vec<SelectedVolume>, RunError> {
    let selected: Vec<SelectedVolume> = match selection {
        Selection::IncludeAll => volumes
            .iter()
            .map(|volume| SelectedVolume {
                volume: volume.clone(),
                roots: vec![PathBuf::from(&volume.id)],
            })
            .collect(),
        Selection::Filtered(inclusions) => volumes
            .iter()
            .filter_map(|volume| {
                let matching: Vec<&String> = inclusions
                    .iter()
                    .filter(|inclusion| inclusion.starts_with(&volume.id))
                    .collect();

                if matching.is_empty() {
                    debug!("Volume {} has no matching inclusions", volume.id);
                    return None;
                }

                Some(SelectedVolume {
                    volume: volume.clone(),
                    roots: collapse_roots(&matching),
                })
            })
            .collect(),
    };

    if selected.is_empty() {
        return Err(RunError::NoMatchingDisks {
            inclusions: selection.inclusions().to_vec(),
        });
    }

    for entry in &selected {
        info!("Selected volume {} ({} root(s))", entry.volume.id, entry.roots.len());
    }

    Ok(selected)
}

/// Drop duplicate inclusions and inclusions nested under another one, so no
/// file is walked twice.
fn collapse_roots(inclusions: &[&String]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();

    for inclusion in inclusions {
        let candidate = PathBuf::from(inclusion.as_str());
        if roots.iter().any(|root| is_within(&candidate, root)) {
            debug!("Inclusion {} is already covered", inclusion);
            continue;
        }
        roots.retain(|root| !is_within(root, &candidate));
        roots.push(candidate);
    }

    roots
}

fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}
