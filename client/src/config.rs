//! # Client Configuration
//!
//! Runtime knobs for the Mini-App core, stored as YAML:
//!
//! ```yaml
//! api_base: ""
//! access_poll_interval_ms: 250
//! access_max_attempts: 20
//! debug: false
//! storage_namespace_prefix: "manik"
//! ```
//!
//! Every field has a default, so an empty document is a valid configuration.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration shared by the API client, access gate and local stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix prepended to every `/api/...` path; empty means same origin
    pub api_base: String,
    /// Delay between init-data polls
    pub access_poll_interval_ms: u32,
    /// Number of init-data polls before giving up with `NoInit`
    pub access_max_attempts: u32,
    /// Reveals raw init data and denial reasons in the UI
    pub debug: bool,
    /// Prefix of local storage namespaces (`{prefix}-settings`, ...)
    pub storage_namespace_prefix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            access_poll_interval_ms: 250,
            access_max_attempts: 20,
            debug: false,
            storage_namespace_prefix: "manik".to_string(),
        }
    }
}

impl ClientConfig {
    /// Parse configuration from YAML text; missing fields take defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ClientConfig =
            serde_yaml::from_str(yaml).context("Failed to parse client config YAML")?;
        Ok(config.normalized())
    }

    /// Load configuration from a YAML file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No client config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read client config {:?}", path))?;
        let config = Self::from_yaml_str(&yaml)?;
        debug!("Loaded client config from {:?}", path);
        Ok(config)
    }

    /// Save configuration using a temp file and rename
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory {:?}", parent))?;
            }
        }
        let yaml = serde_yaml::to_string(self).context("Failed to serialize client config")?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml)?;
        fs::rename(&temp_path, path)?;
        debug!("Saved client config to {:?}", path);
        Ok(())
    }

    /// Storage namespace for a given store name, e.g. `manik-settings`
    pub fn namespace(&self, store: &str) -> String {
        if self.storage_namespace_prefix.is_empty() {
            store.to_string()
        } else {
            format!("{}-{}", self.storage_namespace_prefix, store)
        }
    }

    /// Join `api_base` with an absolute API path
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn normalized(mut self) -> Self {
        self.api_base = self.api_base.trim_end_matches('/').to_string();
        if self.access_max_attempts == 0 {
            self.access_max_attempts = 1;
        }
        self
    }
}
