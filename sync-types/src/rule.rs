//! Protection rules: path predicates that shield entries from deletion.

use globset::{GlobBuilder, GlobMatcher};
use std::fmt;

use crate::SyncError;

/// A predicate over relative paths.
#[derive(Debug, Clone)]
pub enum ProtectionRule {
    /// Path starts with the given prefix (`music/`)
    Prefix(String),
    /// Final extension matches, case-insensitive (`*.mp3`)
    Extension(String),
    /// Path equals a fixed name (`index.html`)
    Exact(String),
    /// Shell-style glob (`assets/**/*.psd`)
    Glob {
        /// The pattern as written
        pattern: String,
        /// Compiled matcher
        matcher: GlobMatcher,
    },
}

impl ProtectionRule {
    /// Parse a pattern.
    ///
    /// - `dir/` is a prefix rule
    /// - `*.ext` is an extension rule
    /// - anything else containing `*`, `?`, `[` or `{` is a glob, where `*`
    ///   stays inside one path segment and `**` crosses segments
    /// - everything else is an exact path
    pub fn parse(pattern: &str) -> Result<Self, SyncError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(SyncError::InvalidPath(pattern.to_string()));
        }
        let pattern = pattern.trim_start_matches('/');

        if let Some(ext) = pattern.strip_prefix("*.") {
            if !ext.is_empty() && !ext.contains('/') && !has_glob_meta(ext) {
                return Ok(Self::Extension(ext.to_ascii_lowercase()));
            }
        }

        if has_glob_meta(pattern) {
            let matcher = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| SyncError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })?
                .compile_matcher();
            return Ok(Self::Glob {
                pattern: pattern.to_string(),
                matcher,
            });
        }

        if pattern.ends_with('/') {
            return Ok(Self::Prefix(pattern.to_string()));
        }

        Ok(Self::Exact(pattern.to_string()))
    }

    /// Check a normalized relative path against this rule.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Self::Extension(ext) => {
                let lower = path.to_ascii_lowercase();
                lower.len() > ext.len() + 1
                    && lower.ends_with(ext.as_str())
                    && lower.as_bytes()[lower.len() - ext.len() - 1] == b'.'
            }
            Self::Exact(name) => path == name,
            Self::Glob { matcher, .. } => matcher.is_match(path),
        }
    }
}

impl fmt::Display for ProtectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => f.write_str(prefix),
            Self::Extension(ext) => write!(f, "*.{}", ext),
            Self::Exact(name) => f.write_str(name),
            Self::Glob { pattern, .. } => f.write_str(pattern),
        }
    }
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

/// An ordered collection of rules; a path matches if any rule does.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<ProtectionRule>,
}

impl RuleSet {
    /// Create an empty set (matches nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every pattern, failing on the first invalid one.
    pub fn parse_all<I, S>(patterns: I) -> Result<Self, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .map(|p| ProtectionRule::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Add a rule.
    pub fn push(&mut self, rule: ProtectionRule) {
        self.rules.push(rule);
    }

    /// Append all rules from another set.
    pub fn extend(&mut self, other: RuleSet) {
        self.rules.extend(other.rules);
    }

    /// First rule matching the path, if any.
    pub fn first_match(&self, path: &str) -> Option<&ProtectionRule> {
        self.rules.iter().find(|r| r.matches(path))
    }

    /// Whether any rule matches the path.
    pub fn matches(&self, path: &str) -> bool {
        self.first_match(path).is_some()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over the rules.
    pub fn iter(&self) -> impl Iterator<Item = &ProtectionRule> {
        self.rules.iter()
    }
}
