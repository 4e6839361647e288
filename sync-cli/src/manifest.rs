//! Release manifest check.
//!
//! A site may publish a `releases.json` listing its audio releases. Before
//! deploying, every referenced audio file must exist locally; files sitting
//! next to referenced audio that no release mentions are orphans.

use anyhow::{Context, Result};
use neosync_types::{normalize_path, Inventory};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    audio: String,
}

/// Outcome of checking a manifest against the local inventory.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ManifestReport {
    /// Releases in the manifest.
    pub releases: usize,
    /// Referenced audio not found locally.
    pub missing: Vec<String>,
    /// Local audio that no release references.
    pub orphans: Vec<String>,
}

impl ManifestReport {
    /// Whether every referenced file is present.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Read and check a manifest file.
pub fn check_file(path: &Path, local: &Inventory, scope: Option<&str>) -> Result<ManifestReport> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    check(&contents, local, scope)
        .with_context(|| format!("Invalid manifest {}", path.display()))
}

/// Check manifest JSON against the local inventory.
///
/// With a scope, releases outside it are ignored since the inventory
/// does not cover them.
pub fn check(contents: &str, local: &Inventory, scope: Option<&str>) -> Result<ManifestReport> {
    let manifest: Manifest = serde_json::from_str(contents)?;

    let mut referenced = BTreeSet::new();
    for release in &manifest.releases {
        let path = normalize_path(&release.audio)
            .with_context(|| format!("Invalid audio path '{}'", release.audio))?;
        referenced.insert(path);
    }

    let in_scope = |path: &str| scope.map_or(true, |s| path.starts_with(s));

    let missing = referenced
        .iter()
        .filter(|p| in_scope(p) && !local.contains(p))
        .cloned()
        .collect();

    // Orphans: same directory and extension as some referenced audio
    let shapes: BTreeSet<(&str, Option<&str>)> = referenced.iter().map(|p| shape(p)).collect();
    let orphans = local
        .paths()
        .filter(|p| !referenced.contains(*p) && shapes.contains(&shape(p)))
        .map(str::to_string)
        .collect();

    Ok(ManifestReport {
        releases: manifest.releases.len(),
        missing,
        orphans,
    })
}

/// Parent directory and extension of a path.
fn shape(path: &str) -> (&str, Option<&str>) {
    let (dir, name) = path.rsplit_once('/').unwrap_or(("", path));
    (dir, name.rsplit_once('.').map(|(_, ext)| ext))
}
