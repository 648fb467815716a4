//! Engine configuration.
//!
//! Defaults match the dialect. A YAML file can override any subset of fields;
//! unknown fields are rejected so typos don't silently fall back to defaults.

use crate::error::{Result, RulemarkError};
use crate::loader::DEFAULT_MAX_FILE_BYTES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do with bare YAML aliases (`*name` without quotes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AliasPolicy {
    /// Rewrite into a quoted `'*name'` reference.
    #[default]
    Convert,
    /// Report every alias as an error.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub alias_policy: AliasPolicy,
    /// Containers whose flow rendering fits in this many characters are inlined.
    pub layout_threshold: usize,
    pub literal_max_length: usize,
    /// Compound camelCase words allowed in a single literal segment.
    pub literal_max_words: usize,
    pub max_domains: usize,
    pub max_domain_depth: usize,
    /// Directories (relative to a project root) that hold rule files.
    /// References from files inside them resolve against the project root.
    pub rules_dirs: Vec<String>,
    pub max_file_bytes: u64,
    /// When false, external references are format-checked but never loaded.
    pub external_refs: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alias_policy: AliasPolicy::Convert,
            layout_threshold: 50,
            literal_max_length: 50,
            literal_max_words: 5,
            max_domains: 3,
            max_domain_depth: 4,
            rules_dirs: vec![".cursor/rules".to_string(), ".rules".to_string()],
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            external_refs: true,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            RulemarkError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&text).map_err(|e| {
            RulemarkError::config(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.layout_threshold == 0 {
            return Err(RulemarkError::config("layout_threshold must be greater than 0"));
        }
        if self.max_domains == 0 {
            return Err(RulemarkError::config("max_domains must be greater than 0"));
        }
        if self.max_domain_depth == 0 {
            return Err(RulemarkError::config("max_domain_depth must be greater than 0"));
        }
        if self.max_file_bytes == 0 {
            return Err(RulemarkError::config("max_file_bytes must be greater than 0"));
        }
        Ok(())
    }
}
