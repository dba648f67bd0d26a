//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SimpitError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub outbound: OutboundConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,
}

/// Outbound publisher configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutboundConfig {
    #[serde(default = "default_sas_poll_interval_ms")]
    pub sas_poll_interval_ms: u64,

    #[serde(default)]
    pub command_echo: bool,

    #[serde(default = "default_echo_interval_ms")]
    pub echo_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily log files; empty logs to stdout only
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_timeout_ms() -> u64 { 100 }

fn default_tick_rate_hz() -> u32 { 50 }

fn default_sas_poll_interval_ms() -> u64 { 100 }
fn default_echo_interval_ms() -> u64 { 100 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
        }
    }
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            sas_poll_interval_ms: default_sas_poll_interval_ms(),
            command_echo: false,
            echo_interval_ms: default_echo_interval_ms(),
        }
    }
}

fn invalid(msg: &str) -> SimpitError {
    SimpitError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use simpit_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Control cycle period
    pub fn tick_period(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.control.tick_rate_hz))
    }

    /// SAS status polling period
    pub fn sas_poll_period(&self) -> Duration {
        Duration::from_millis(self.outbound.sas_poll_interval_ms)
    }

    /// Command echo polling period
    pub fn echo_period(&self) -> Duration {
        Duration::from_millis(self.outbound.echo_interval_ms)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![9600, 19200, 38400, 57600, 115200].contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200",
            ));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        if self.control.tick_rate_hz == 0 || self.control.tick_rate_hz > 500 {
            return Err(invalid("tick_rate_hz must be between 1 and 500"));
        }

        if self.outbound.sas_poll_interval_ms == 0 || self.outbound.sas_poll_interval_ms > 60000 {
            return Err(invalid("sas_poll_interval_ms must be between 1 and 60000"));
        }

        if self.outbound.echo_interval_ms == 0 || self.outbound.echo_interval_ms > 60000 {
            return Err(invalid("echo_interval_ms must be between 1 and 60000"));
        }

        Ok(())
    }
}
