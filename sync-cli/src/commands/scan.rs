//! Print the local inventory.

use anyhow::{Context, Result};
use neosync_client::{scan, ScanOptions};

use super::{format_bytes, scope_prefix};
use crate::config::SiteConfig;

/// Run the scan command. Never touches the network.
pub fn run(config: &SiteConfig, scope: Option<&str>) -> Result<()> {
    let options = ScanOptions {
        scope: scope_prefix(scope)?,
        skip_hidden: config.sync.skip_hidden,
    };
    let local = scan(&config.source, &options)
        .with_context(|| format!("Failed to scan {}", config.source.display()))?;

    for record in local.records() {
        println!(
            "{}  {:>10}  {}",
            record.content_hash.short(),
            format_bytes(record.size_bytes),
            record.relative_path
        );
    }
    println!(
        "{} file(s), {}",
        local.len(),
        format_bytes(local.total_bytes())
    );
    Ok(())
}
