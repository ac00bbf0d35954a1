//! Configuration for the `snmpcopy` command.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use snmpcopy_core::snmp::transport::{DEFAULT_COMMUNITY, DEFAULT_PORT, DEFAULT_RETRIES};
use snmpcopy_core::{CopyError, PollPolicy, SnmpTarget};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    /// Which device to talk to.
    pub device: DeviceConfig,
    /// Per-request SNMP settings.
    pub snmp: SnmpConfig,
    /// How long to wait for a copy to finish.
    pub poll: PollPolicy,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Device address and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Hostname or address of the device. Empty means "must be given
    /// on the command line".
    pub host: String,
    /// SNMPv2c community with write access to `ccCopyTable`.
    pub community: String,
    pub port: u16,
    /// Local address the request sockets bind to.
    pub source_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpConfig {
    /// Per-attempt response timeout in milliseconds.
    pub timeout_ms: u64,
    /// Re-sends after the first attempt.
    pub retries: u32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

/// Values given on the command line; each one that is set wins over
/// the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub community: Option<String>,
    pub port: Option<u16>,
    pub source_address: Option<String>,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            community: DEFAULT_COMMUNITY.into(),
            port: DEFAULT_PORT,
            source_address: "0.0.0.0".into(),
        }
    }
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            retries: DEFAULT_RETRIES,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl CopyConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(host) = overrides.host {
            self.device.host = host;
        }
        if let Some(community) = overrides.community {
            self.device.community = community;
        }
        if let Some(port) = overrides.port {
            self.device.port = port;
        }
        if let Some(source) = overrides.source_address {
            self.device.source_address = source;
        }
    }

    /// Build the SNMP target described by the `[device]` and `[snmp]`
    /// sections.
    pub fn to_target(&self) -> Result<SnmpTarget, CopyError> {
        let host = self.device.host.trim();
        if host.is_empty() {
            return Err(CopyError::InvalidArgument(
                "no device host configured (use --host)".into(),
            ));
        }
        let source: IpAddr = self.device.source_address.parse().map_err(|_| {
            CopyError::InvalidArgument(format!(
                "invalid source address {:?}",
                self.device.source_address
            ))
        })?;
        Ok(SnmpTarget::new(host, self.device.community.as_str())
            .with_port(self.device.port)
            .with_source_address(source)
            .with_timeout(Duration::from_millis(self.snmp.timeout_ms.max(1)))
            .with_retries(self.snmp.retries))
    }
}

// ── Tests ────────────────────────────────────────────────────────
