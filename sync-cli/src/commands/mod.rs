//! CLI command implementations.

pub mod deploy;
pub mod list;
pub mod scan;

use anyhow::{Context, Result};
use neosync_client::ApiKey;
use neosync_types::normalize_scope;

use crate::config::API_KEY_VAR;

/// Read the API key from the environment.
pub fn api_key() -> Result<ApiKey> {
    let raw = std::env::var(API_KEY_VAR)
        .with_context(|| format!("{} environment variable not set", API_KEY_VAR))?;
    ApiKey::new(&raw).with_context(|| format!("{} is empty", API_KEY_VAR))
}

/// Whether we run non-interactively (`CI=true`).
pub fn is_ci() -> bool {
    std::env::var("CI")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

/// Normalize a `--scope` argument to a `dir/` prefix.
pub fn scope_prefix(scope: Option<&str>) -> Result<Option<String>> {
    scope
        .map(|s| normalize_scope(s).with_context(|| format!("Invalid scope '{}'", s)))
        .transpose()
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
