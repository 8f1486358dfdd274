//! # Client Configuration
//!
//! JSON configuration for the label client. Every field has a default, so an
//! empty object is a valid configuration.
//!
//! ```json
//! {
//!   "api_base_url": "https://inventory.example.com/api",
//!   "print_api_url": "https://print.example.com",
//!   "channel": "auto",
//!   "poll": { "interval": 2000, "max_attempts": 30 },
//!   "label": { "width_in": 4.0, "height_in": 2.0, "dpi": 203, "layout": "standard" }
//! }
//! ```
//!
//! Without `api_base_url` the client runs offline: entries are kept in
//! memory and SKUs come from the `skus` table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::PollPolicy;
use crate::error::WarelabelError;
use crate::label::LabelSpec;
use crate::printer::MediaSpec;

/// Longest wait allowed between two job status checks.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(3600);
/// Largest growth factor allowed between two job status checks.
pub const MAX_POLL_BACKOFF: f64 = 10.0;

/// Which print channel to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ChannelPreference {
    /// Local spooler when one answers, otherwise the remote backend.
    #[default]
    Auto,
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Inventory backend; `None` runs offline.
    pub api_base_url: Option<String>,
    /// HTTP print backend used by the remote channel.
    pub print_api_url: String,
    pub channel: ChannelPreference,
    pub request_timeout_secs: u64,
    pub discovery_timeout_secs: u64,
    pub poll: PollPolicy,
    /// Pause between jobs of a batch.
    pub batch_delay_ms: u64,
    pub label: LabelSpec,
    /// Refuse to print while box weights disagree with article totals.
    pub enforce_weight_reconciliation: bool,
    /// Scratch directory for the local spooler; defaults to the temp dir.
    pub spool_dir: Option<PathBuf>,
    /// Offline SKU table, item description → SKU id.
    pub skus: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            print_api_url: "http://localhost:8631".to_string(),
            channel: ChannelPreference::Auto,
            request_timeout_secs: 10,
            discovery_timeout_secs: 3,
            poll: PollPolicy::default(),
            batch_delay_ms: 500,
            label: LabelSpec::default(),
            enforce_weight_reconciliation: false,
            spool_dir: None,
            skus: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Read and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WarelabelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WarelabelError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, WarelabelError> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| WarelabelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WarelabelError> {
        self.label
            .check()
            .map_err(|e| WarelabelError::Config(format!("label: {}", e)))?;
        if self.poll.max_attempts == 0 {
            return Err(WarelabelError::Config("poll.max_attempts must be at least 1".to_string()));
        }
        if self.poll.interval.is_zero() {
            return Err(WarelabelError::Config("poll.interval must be positive".to_string()));
        }
        if self.poll.interval > MAX_POLL_INTERVAL || self.poll.max_interval > MAX_POLL_INTERVAL {
            return Err(WarelabelError::Config(format!(
                "poll intervals must not exceed {} ms",
                MAX_POLL_INTERVAL.as_millis()
            )));
        }
        if !(1.0..=MAX_POLL_BACKOFF).contains(&self.poll.backoff) {
            return Err(WarelabelError::Config(format!(
                "poll.backoff must be between 1 and {}",
                MAX_POLL_BACKOFF
            )));
        }
        if self.request_timeout_secs == 0 || self.discovery_timeout_secs == 0 {
            return Err(WarelabelError::Config("timeouts must be positive".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn spool_dir(&self) -> PathBuf {
        self.spool_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("warelabel"))
    }

    pub fn media(&self) -> MediaSpec {
        MediaSpec::from(&self.label)
    }

    /// Whether entries and SKUs come from a remote backend.
    pub fn is_online(&self) -> bool {
        self.api_base_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelLayout;

    #[test]
    fn test_empty_object_is_default() {
        let config = ClientConfig::from_json("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert!(!config.is_online());
        assert_eq!(config.discovery_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_override() {
        let config = ClientConfig::from_json(
            r#"{
                "api_base_url": "http://inventory.local/api",
                "channel": "remote",
                "label": {"dpi": 300, "layout": "barcoded"},
                "enforce_weight_reconciliation": true
            }"#,
        )
        .unwrap();
        assert!(config.is_online());
        assert_eq!(config.channel, ChannelPreference::Remote);
        assert_eq!(config.label.dpi, 300);
        assert_eq!(config.label.width_in, 4.0);
        assert_eq!(config.label.layout, LabelLayout::Barcoded);
        assert!(config.enforce_weight_reconciliation);
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let err = ClientConfig::from_json(r#"{"poll": {"max_attempts": 0}}"#).unwrap_err();
        assert!(matches!(err, WarelabelError::Config(_)));
    }

    #[test]
    fn test_rejects_unbounded_poll_policy() {
        for json in [
            r#"{"poll": {"interval": 18446744073709551615}}"#,
            r#"{"poll": {"max_interval": 3600001}}"#,
            r#"{"poll": {"backoff": 1e300}}"#,
            r#"{"poll": {"backoff": 0.5}}"#,
        ] {
            let err = ClientConfig::from_json(json).unwrap_err();
            assert!(matches!(err, WarelabelError::Config(_)), "{}", json);
        }

        let config = ClientConfig::from_json(r#"{"poll": {"interval": 3600000, "backoff": 2.0}}"#).unwrap();
        assert_eq!(config.poll.delay(5), MAX_POLL_INTERVAL);
    }

    #[test]
    fn test_rejects_unknown_channel() {
        assert!(ClientConfig::from_json(r#"{"channel": "carrier-pigeon"}"#).is_err());
    }
}
