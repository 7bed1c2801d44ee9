//! raftwatch.toml configuration.
//!
//! Every field is optional; missing pauses fall back to the
//! [`MonitorConfig`] defaults and missing endpoints fall back to the
//! local default seed.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fetch::DEFAULT_PROBE_TIMEOUT;
use crate::locator::LeaderPolicy;
use crate::monitor::MonitorConfig;
use crate::tls::TlsFiles;

/// Seed used when neither endpoints nor seeds are configured.
pub const DEFAULT_SEED: &str = "http://127.0.0.1:2379";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaftwatchConfig {
    /// Static client URLs, probed in order.
    pub endpoints: Vec<String>,
    /// Members-API seeds, used when `endpoints` is empty.
    pub seeds: Vec<String>,
    pub monitor: MonitorSection,
    pub tls: TlsFiles,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    pub interval: Option<String>,
    pub backoff: Option<String>,
    pub repeat: Option<String>,
    pub probe_timeout: Option<String>,
    pub leader_policy: Option<LeaderPolicy>,
}

impl RaftwatchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve pauses and leader policy, applying defaults.
    pub fn monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        let defaults = MonitorConfig::default();
        let section = &self.monitor;
        Ok(MonitorConfig {
            interval: duration_field("interval", section.interval.as_deref(), defaults.interval)?,
            backoff: duration_field("backoff", section.backoff.as_deref(), defaults.backoff)?,
            repeat: duration_field("repeat", section.repeat.as_deref(), defaults.repeat)?,
            leader_policy: section.leader_policy.unwrap_or(defaults.leader_policy),
        })
    }

    pub fn probe_timeout(&self) -> Result<Duration, ConfigError> {
        duration_field(
            "probe_timeout",
            self.monitor.probe_timeout.as_deref(),
            DEFAULT_PROBE_TIMEOUT,
        )
    }

    /// Seeds to list members from, or the local default.
    pub fn seeds_or_default(&self) -> Vec<String> {
        if self.seeds.is_empty() {
            vec![DEFAULT_SEED.to_string()]
        } else {
            self.seeds.clone()
        }
    }
}

fn duration_field(
    field: &'static str,
    value: Option<&str>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(default),
        Some(s) => parse_duration(s).ok_or_else(|| ConfigError::InvalidDuration {
            field,
            value: s.to_string(),
        }),
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
