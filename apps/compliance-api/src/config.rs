//! Service configuration loaded from an optional TOML file
//!
//! ```toml
//! [access]
//! ledger_writer_role = "compliance_officer"
//! unredacted_reader_role = "auditor"
//! redacted_event_fields = ["action", "object_type", "object_id", "hash"]
//!
//! [navigation]
//! neighbor_limit = 3
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shared_types::AccessPolicy;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Role gates and redaction projections
    pub access: AccessPolicy,
    /// Evidence navigation settings
    pub navigation: NavigationConfig,
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Maximum neighboring snippets attached to a navigation payload (default: 3)
    pub neighbor_limit: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self { neighbor_limit: 3 }
    }
}
