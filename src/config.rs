//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `proximity.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ScanConfig: how often and how long to listen, and store capacities.
//!     - ProximityConfig: dBm cut-offs for the three tiers.
//!     - ClockConfig: utc offset and display format for timestamps.
//!     - ServerConfig: where the dashboard listens.
//!     - LoggingConfig: log level and per-device logging toggle.
//!
//! every section and field is optional; missing values take the stock
//! defaults (30s interval, 5s scan, 100 slots).
//!
//! ==============================================================================

use anyhow::{bail, Context};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::clock::{format_is_valid, DEFAULT_FORMAT};
use crate::proximity::{Thresholds, DEFAULT_FAR_AT_OR_BELOW_DBM, DEFAULT_PRESENT_ABOVE_DBM};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HostConfig {
    pub scan: ScanConfig,
    pub proximity: ProximityConfig,
    pub clock: ClockConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScanConfig {
    pub interval_seconds: u64,
    pub duration_seconds: u64,
    pub max_devices: usize,
    pub max_history: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProximityConfig {
    pub present_above_dbm: i32,
    pub far_at_or_below_dbm: i32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClockConfig {
    pub utc_offset_seconds: i32,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_devices: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { interval_seconds: 30, duration_seconds: 5, max_devices: 100, max_history: 100 }
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            present_above_dbm: DEFAULT_PRESENT_ABOVE_DBM,
            far_at_or_below_dbm: DEFAULT_FAR_AT_OR_BELOW_DBM,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        // utc+8, adjust for your site
        Self { utc_offset_seconds: 28_800, format: DEFAULT_FORMAT.to_string() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:3000".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_devices: false }
    }
}

impl ScanConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }
}

impl ProximityConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            present_above_dbm: self.present_above_dbm,
            far_at_or_below_dbm: self.far_at_or_below_dbm,
        }
    }
}

impl HostConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a toml document
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: HostConfig = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load with default fallback
    pub fn load_or_default() -> Self {
        let paths = [
            std::path::PathBuf::from("config").join("proximity.toml"),
            std::path::PathBuf::from("..").join("config").join("proximity.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        println!("[CONFIG] Warning: No config file found - using defaults");
        Self::default()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scan.interval_seconds == 0 {
            bail!("scan.interval_seconds must be > 0");
        }
        if self.scan.max_devices == 0 || self.scan.max_history == 0 {
            bail!("scan.max_devices and scan.max_history must be > 0");
        }
        if self.proximity.present_above_dbm <= self.proximity.far_at_or_below_dbm {
            bail!(
                "proximity.present_above_dbm ({}) must be above far_at_or_below_dbm ({})",
                self.proximity.present_above_dbm,
                self.proximity.far_at_or_below_dbm
            );
        }
        if chrono::FixedOffset::east_opt(self.clock.utc_offset_seconds).is_none() {
            bail!("clock.utc_offset_seconds out of range: {}", self.clock.utc_offset_seconds);
        }
        if !format_is_valid(&self.clock.format) {
            bail!("clock.format has an unknown specifier: {:?}", self.clock.format);
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("server.bind is not a socket address: {}", self.server.bind))
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│          PROXIMITY CONFIGURATION        │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Scan: every {}s for {}s", self.scan.interval_seconds, self.scan.duration_seconds);
        println!("│ Capacity: {} devices / {} records", self.scan.max_devices, self.scan.max_history);
        println!(
            "│ Tiers: > {} dBm present, <= {} dBm far",
            self.proximity.present_above_dbm, self.proximity.far_at_or_below_dbm
        );
        println!("│ Clock: UTC{:+}s", self.clock.utc_offset_seconds);
        println!("│ Bind: {}", self.server.bind);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_device() {
        let c = HostConfig::default();
        assert_eq!(c.scan.interval(), Duration::from_secs(30));
        assert_eq!(c.scan.duration(), Duration::from_secs(5));
        assert_eq!(c.scan.max_devices, 100);
        assert_eq!(c.scan.max_history, 100);
        assert_eq!(c.proximity.thresholds(), Thresholds::default());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let c = HostConfig::from_toml(
            r#"
            [scan]
            interval_seconds = 10

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(c.scan.interval_seconds, 10);
        assert_eq!(c.scan.duration_seconds, 5);
        assert_eq!(c.logging.level, "debug");
        assert_eq!(c.server.bind, "0.0.0.0:3000");
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let err = HostConfig::from_toml(
            r#"
            [proximity]
            present_above_dbm = -90
            far_at_or_below_dbm = -60
            "#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("present_above_dbm"));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        assert!(HostConfig::from_toml("[scan]\nmax_history = 0\n").is_err());
        assert!(HostConfig::from_toml("[scan]\ninterval_seconds = 0\n").is_err());
        assert!(HostConfig::from_toml("[clock]\nutc_offset_seconds = 100000\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_time_specifier() {
        let err = HostConfig::from_toml("[clock]\nformat = \"%Y-%Q\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("clock.format"));
        assert!(HostConfig::from_toml("[clock]\nformat = \"%H:%M\"\n").is_ok());
    }

    #[test]
    fn test_rejects_bad_bind() {
        assert!(HostConfig::from_toml("[server]\nbind = \"nowhere\"\n").is_err());
    }

    #[test]
    fn test_shipped_config_parses() {
        let c = HostConfig::from_toml(include_str!("../config/proximity.toml")).unwrap();
        assert_eq!(c.scan.interval_seconds, 30);
        assert_eq!(c.clock.utc_offset_seconds, 28_800);
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(HostConfig::load("does/not/exist.toml").is_err());
    }
}
