//! Controller configuration
//!
//! Defaults reproduce the standard bench setup; a TOML file can override any
//! field:
//!
//! ```toml
//! port = "/dev/ttyUSB0"
//! device_address = 1
//! response_timeout_ms = 2000
//! settle_delay_ms = 500
//!
//! [[phases]]
//! name = "burst"
//! speed = 1200
//! duration_secs = 5
//! repetitions = 10
//! pause_between_secs = 2
//! pause_after_secs = 5
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use teleshake_core::constants::{
    BROADCAST_ADDRESS, DEFAULT_ADDRESS, DEFAULT_INIT_WINDOW_MS, DEFAULT_PORT,
    DEFAULT_PROBE_INTERVAL_MS, DEFAULT_RESPONSE_TIMEOUT_MS, DEFAULT_SETTLE_DELAY_MS,
};

use crate::error::{Error, Result};
use crate::phase::{Phase, PhaseSpec};

/// Device controller configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Serial port identifier
    pub port: String,

    /// Device address (1-15)
    pub device_address: u8,

    /// Deadline for a complete six-byte response
    pub response_timeout: Duration,

    /// Pause between transmission and the first read
    pub settle_delay: Duration,

    /// Idle time between buffer probes
    pub probe_interval: Duration,

    /// Collection window for broadcast (initialization) responses
    pub init_window: Duration,

    /// Shake program
    pub phases: Vec<Phase>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            device_address: DEFAULT_ADDRESS,
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            probe_interval: Duration::from_millis(DEFAULT_PROBE_INTERVAL_MS),
            init_window: Duration::from_millis(DEFAULT_INIT_WINDOW_MS),
            phases: Phase::default_program(),
        }
    }
}

impl DeviceConfig {
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.device_address = address;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    pub fn with_init_window(mut self, window: Duration) -> Self {
        self.init_window = window;
        self
    }

    pub fn with_phases(mut self, phases: Vec<Phase>) -> Self {
        self.phases = phases;
        self
    }

    /// Check field ranges
    pub fn validate(&self) -> Result<()> {
        if self.device_address == 0 || self.device_address > BROADCAST_ADDRESS {
            return Err(Error::Validation(format!(
                "device_address {} out of range 1-15",
                self.device_address
            )));
        }
        if self.response_timeout.is_zero() {
            return Err(Error::Validation("response_timeout must be positive".into()));
        }
        if self.probe_interval.is_zero() {
            return Err(Error::Validation("probe_interval must be positive".into()));
        }
        self.phases.iter().try_for_each(Phase::validate)
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let defaults = Self::default();

        let phases = match file.phases {
            Some(specs) => specs
                .into_iter()
                .map(Phase::try_from)
                .collect::<Result<Vec<_>>>()?,
            None => defaults.phases,
        };

        let config = Self {
            port: file.port.unwrap_or(defaults.port),
            device_address: file.device_address.unwrap_or(defaults.device_address),
            response_timeout: file
                .response_timeout_ms
                .map_or(defaults.response_timeout, Duration::from_millis),
            settle_delay: file
                .settle_delay_ms
                .map_or(defaults.settle_delay, Duration::from_millis),
            probe_interval: file
                .probe_interval_ms
                .map_or(defaults.probe_interval, Duration::from_millis),
            init_window: file
                .init_window_ms
                .map_or(defaults.init_window, Duration::from_millis),
            phases,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    port: Option<String>,
    device_address: Option<u8>,
    response_timeout_ms: Option<u64>,
    settle_delay_ms: Option<u64>,
    probe_interval_ms: Option<u64>,
    init_window_ms: Option<u64>,
    phases: Option<Vec<PhaseSpec>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::default();

        assert_eq!(config.port, "COM6");
        assert_eq!(config.device_address, 1);
        assert_eq!(config.response_timeout, Duration::from_secs(2));
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_keeps_defaults() {
        assert_eq!(DeviceConfig::from_toml_str("").unwrap(), DeviceConfig::default());
    }

    #[test]
    fn test_overrides_and_phases() {
        let config = DeviceConfig::from_toml_str(
            r#"
            port = "/dev/ttyUSB0"
            device_address = 3
            response_timeout_ms = 1500

            [[phases]]
            speed = 1500
            duration_secs = 2.5
            repetitions = 3
            pause_between_secs = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.port, "/dev/ttyUSB0");
        assert_eq!(config.device_address, 3);
        assert_eq!(config.response_timeout, Duration::from_millis(1500));
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.phases.len(), 1);
        assert_eq!(config.phases[0].duration, Duration::from_millis(2500));
        assert_eq!(config.phases[0].repetitions, 3);
        assert_eq!(config.phases[0].name, "1500 spm");
    }

    #[test]
    fn test_address_out_of_range() {
        let result = DeviceConfig::from_toml_str("device_address = 16");
        assert!(matches!(result, Err(Error::Validation(_))));

        assert!(DeviceConfig::default().with_address(0).validate().is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            DeviceConfig::from_toml_str("baud = 115200"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "settle_delay_ms = 100").unwrap();

        let config = DeviceConfig::load(file.path()).unwrap();
        assert_eq!(config.settle_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_load_missing_file() {
        let result = DeviceConfig::load("/nonexistent/teleshake.toml");
        assert!(matches!(result, Err(Error::Read { .. })));
    }
}
