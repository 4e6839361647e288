//! Configuration management for neosync.
//!
//! Everything is optional: a missing `neosync.toml` yields the built-in
//! defaults, and every field of a present file falls back to its default.

use anyhow::{bail, Context, Result};
use neosync_client::DEFAULT_API_URL;
use neosync_core::{SyncOptions, DEFAULT_BATCH_SIZE, DEFAULT_MAX_RETRIES};
use neosync_types::RuleSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "neosync.toml";

/// API key environment variable.
pub const API_KEY_VAR: &str = "NEOCITIES_API_KEY";

/// Optional site name environment variable (log output only).
pub const SITENAME_VAR: &str = "NEOCITIES_SITENAME";

/// Site configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Content root to publish.
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Neocities API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Release manifest to verify before deploying.
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// Transfer tuning and deletion protection.
    #[serde(default)]
    pub sync: SyncSection,

    /// Named pattern sets excluded unless `--include`d.
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
}

/// `[sync]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSection {
    /// Retries after a failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Paths per delete request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Milliseconds between API calls.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Milliseconds before the first retry.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Cap on any retry delay, in milliseconds.
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// Remote paths never deleted.
    #[serde(default)]
    pub protect: Vec<String>,

    /// Skip dot-files and dot-directories.
    #[serde(default = "default_skip_hidden")]
    pub skip_hidden: bool,
}

/// `[categories.<name>]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Paths belonging to the category.
    #[serde(default)]
    pub patterns: Vec<String>,
}

fn default_source() -> PathBuf {
    PathBuf::from("public")
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_rate_limit_ms() -> u64 {
    1000
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_max_retry_delay_ms() -> u64 {
    30_000
}

fn default_skip_hidden() -> bool {
    true
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            api_url: default_api_url(),
            manifest: None,
            sync: SyncSection::default(),
            categories: BTreeMap::new(),
        }
    }
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            batch_size: default_batch_size(),
            rate_limit_ms: default_rate_limit_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            protect: Vec::new(),
            skip_hidden: default_skip_hidden(),
        }
    }
}

impl SiteConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `neosync.toml` in the
    /// working directory is used when present, else the defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse a TOML document.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Transfer options from the `[sync]` table.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            dry_run: false,
            max_retries: self.sync.max_retries,
            batch_size: self.sync.batch_size,
            rate_limit: Duration::from_millis(self.sync.rate_limit_ms),
            retry_delay: Duration::from_millis(self.sync.retry_delay_ms),
            max_retry_delay: Duration::from_millis(self.sync.max_retry_delay_ms),
            protected_patterns: self.sync.protect.clone(),
        }
    }

    /// Rules for every category not listed in `include`.
    ///
    /// Naming a category that is not configured is an error.
    pub fn excluded_rules(&self, include: &[String]) -> Result<RuleSet> {
        for name in include {
            if !self.categories.contains_key(name) {
                let known: Vec<&str> = self.categories.keys().map(String::as_str).collect();
                if known.is_empty() {
                    bail!("Unknown category '{}': no categories are configured", name);
                }
                bail!(
                    "Unknown category '{}' (configured: {})",
                    name,
                    known.join(", ")
                );
            }
        }

        let mut rules = RuleSet::new();
        for (name, category) in &self.categories {
            if include.contains(name) {
                continue;
            }
            let parsed = RuleSet::parse_all(&category.patterns)
                .with_context(|| format!("Invalid pattern in category '{}'", name))?;
            rules.extend(parsed);
        }
        Ok(rules)
    }
}
