// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{self, APP_NAME, CONFIG_FILE};
use crate::errors::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// User configuration
///
/// Persisted as JSON under the platform config directory
/// (e.g. `~/.config/scanview/config.json`). Unknown fields are ignored and
/// missing fields fall back to defaults, so older config files keep loading
/// after upgrades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the lookup endpoint (no default — must be configured)
    pub endpoint_url: String,
    /// Optional action discriminator for multi-purpose endpoints
    /// (sent as `action=<value>` before the barcode parameter)
    pub action: Option<String>,
    /// Lookup request timeout in seconds
    pub request_timeout_secs: u64,
    /// Live-stream decode sampling rate in Hz (clamped to 5..=15)
    pub sample_rate_hz: u32,
    /// Template turning an opaque image id into a fetchable URL,
    /// with `{id}` as the placeholder (e.g.
    /// `https://photos.example.com/thumb/{id}`)
    pub thumbnail_url_template: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            action: None,
            request_timeout_secs: constants::DEFAULT_LOOKUP_TIMEOUT.as_secs(),
            sample_rate_hz: constants::DEFAULT_SAMPLE_RATE_HZ,
            thumbnail_url_template: None,
        }
    }
}

impl Config {
    /// Path of the config file, if a config directory exists on this platform
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load the config file, falling back to defaults when absent
    ///
    /// A present-but-broken file is an error; silently replacing an endpoint
    /// the operator configured would send lookups nowhere.
    pub fn load() -> ScanResult<Self> {
        let Some(path) = Self::path() else {
            warn!("No config directory on this platform, using defaults");
            return Ok(Self::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let config = serde_json::from_str(&raw).map_err(|e| {
                    ScanError::Config(format!("{} is not valid: {}", path.display(), e))
                })?;
                debug!(path = %path.display(), "Loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ScanError::Config(format!(
                "could not read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Write the config file, creating the directory if needed
    pub fn save(&self) -> ScanResult<()> {
        let Some(path) = Self::path() else {
            return Err(ScanError::Config(
                "no config directory on this platform".to_string(),
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ScanError::Config(format!("could not create config dir: {}", e)))?;
        }

        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| ScanError::Config(format!("could not serialize config: {}", e)))?;
        std::fs::write(&path, raw)
            .map_err(|e| ScanError::Config(format!("could not write {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Endpoint URL, or a config error when unset
    pub fn require_endpoint(&self) -> ScanResult<&str> {
        if self.endpoint_url.is_empty() {
            Err(ScanError::Config(
                "No lookup endpoint configured. Pass --endpoint or set \
                 endpoint_url in the config file."
                    .to_string(),
            ))
        } else {
            Ok(&self.endpoint_url)
        }
    }
}
