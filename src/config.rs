//! ShieldGate configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main ShieldGate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShieldGateConfig {
    /// Audit recorder configuration
    #[serde(default)]
    pub audit: AuditConfig,

    /// Liveness monitor configuration
    #[serde(default)]
    pub liveness: LivenessConfig,

    /// Evidence ring buffer configuration
    #[serde(default)]
    pub evidence: EvidenceConfig,

    /// Session link handshake configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Audit recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Base directory for audit record files
    pub base_dir: PathBuf,

    /// Upper bound on a single record write before it is abandoned
    pub write_timeout_ms: u64,

    /// Default number of records returned by queries
    pub default_query_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            base_dir: default_data_dir().join("audit"),
            write_timeout_ms: 2_000,
            default_query_limit: 15,
        }
    }
}

/// Liveness monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessConfig {
    /// Drift check interval in seconds
    pub check_interval_secs: u64,

    /// Maximum heartbeat drift in seconds before an agent is TAMPERED
    pub drift_threshold_secs: u64,

    /// Re-emit the alert on every check cycle while the drift persists.
    /// When false, one alert fires per outage until the next heartbeat.
    pub re_alert: bool,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 10,
            drift_threshold_secs: 45,
            re_alert: true,
        }
    }
}

/// Evidence ring buffer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// Maximum retained forensic entries (most recent kept)
    pub capacity: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self { capacity: 10 }
    }
}

/// Session link handshake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Countdown advertised to requesters, in seconds. Cosmetic: the server
    /// does not expire pending links unless `pending_ttl_secs` is set.
    pub advertised_ttl_secs: u64,

    /// Server-side TTL for pending links in seconds. 0 disables expiry,
    /// preserving the unbounded pending set of the observed design.
    pub pending_ttl_secs: u64,

    /// Sweep interval for expired pending links, in seconds
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            advertised_ttl_secs: 300,
            pending_ttl_secs: 0,
            sweep_interval_secs: 60,
        }
    }
}

/// Default base directory for ShieldGate state
pub fn default_data_dir() -> PathBuf {
    data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shieldgate")
}

fn data_local_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_DATA_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".local/share"))
            })
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShieldGateConfig::default();
        assert_eq!(config.liveness.check_interval_secs, 10);
        assert_eq!(config.liveness.drift_threshold_secs, 45);
        assert!(config.liveness.re_alert);
        assert_eq!(config.evidence.capacity, 10);
        assert_eq!(config.session.pending_ttl_secs, 0);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = ShieldGateConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: ShieldGateConfig = toml::from_str(&toml).unwrap();
        assert_eq!(
            parsed.audit.write_timeout_ms,
            config.audit.write_timeout_ms
        );
        assert_eq!(parsed.session.advertised_ttl_secs, 300);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: ShieldGateConfig =
            toml::from_str("[liveness]\ncheck_interval_secs = 5\ndrift_threshold_secs = 20\nre_alert = false\n").unwrap();
        assert_eq!(parsed.liveness.check_interval_secs, 5);
        assert!(!parsed.liveness.re_alert);
        assert_eq!(parsed.evidence.capacity, 10);
    }
}
