//! TOML configuration for the device runtime.
//!
//! Every field has a default, so an empty or missing file yields a working
//! device.  Example:
//!
//! ```toml
//! [link]
//! mode = "tcp"
//! bind_address = "127.0.0.1:9600"
//! announce_on_connect = true
//!
//! [keyboard]
//! min_key_events_delay_ms = 20
//!
//! [gpio]
//! hid_switch_pin = 11
//! mass_storage_switch_pin = 32
//! hid_attached_at_boot = true
//! mass_storage_attached_at_boot = false
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use usbkvm_core::DeviceOptions;

use crate::link::LinkOptions;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level device configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceConfig {
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub gpio: GpioConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which byte link stands in for the serial line.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// Accept one controller at a time on a TCP socket.
    #[default]
    Tcp,
    /// Serve stdin/stdout once; logs go to stderr.
    Stdio,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkConfig {
    #[serde(default)]
    pub mode: LinkMode,
    /// Address the TCP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Write an info message when a controller connects.
    #[serde(default = "default_true")]
    pub announce_on_connect: bool,
    /// Text of the connect announcement.
    #[serde(default = "default_banner")]
    pub banner: String,
    /// Frames buffered between the reader and the engine worker.
    #[serde(default = "default_frame_queue_depth")]
    pub frame_queue_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyboardConfig {
    /// Minimum spacing between keyboard reports, in milliseconds.
    #[serde(default = "default_key_delay_ms")]
    pub min_key_events_delay_ms: u64,
}

/// Switch line wiring and power-on levels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GpioConfig {
    #[serde(default = "default_hid_switch_pin")]
    pub hid_switch_pin: u8,
    #[serde(default = "default_mass_storage_switch_pin")]
    pub mass_storage_switch_pin: u8,
    #[serde(default = "default_true")]
    pub hid_attached_at_boot: bool,
    #[serde(default)]
    pub mass_storage_attached_at_boot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "127.0.0.1:9600".to_string()
}
fn default_true() -> bool {
    true
}
fn default_banner() -> String {
    "usbkvm ready".to_string()
}
fn default_frame_queue_depth() -> usize {
    64
}
fn default_key_delay_ms() -> u64 {
    20
}
fn default_hid_switch_pin() -> u8 {
    11
}
fn default_mass_storage_switch_pin() -> u8 {
    32
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            mode: LinkMode::default(),
            bind_address: default_bind_address(),
            announce_on_connect: default_true(),
            banner: default_banner(),
            frame_queue_depth: default_frame_queue_depth(),
        }
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            min_key_events_delay_ms: default_key_delay_ms(),
        }
    }
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            hid_switch_pin: default_hid_switch_pin(),
            mass_storage_switch_pin: default_mass_storage_switch_pin(),
            hid_attached_at_boot: default_true(),
            mass_storage_attached_at_boot: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DeviceConfig {
    /// Power-on settings for the core device.
    pub fn device_options(&self) -> DeviceOptions {
        DeviceOptions {
            usb_hid_attached: self.gpio.hid_attached_at_boot,
            usb_mass_storage_attached: self.gpio.mass_storage_attached_at_boot,
            min_key_events_delay: Duration::from_millis(self.keyboard.min_key_events_delay_ms),
        }
    }

    /// Per-link runtime options.
    pub fn link_options(&self) -> LinkOptions {
        LinkOptions {
            banner: self
                .link
                .announce_on_connect
                .then(|| self.link.banner.clone()),
            frame_queue_depth: self.link.frame_queue_depth.max(1),
        }
    }
}

// ── Loading and saving ────────────────────────────────────────────────────────

/// Loads `DeviceConfig` from `path`, returning the defaults if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<DeviceConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeviceConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path` as pretty TOML.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &DeviceConfig) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
