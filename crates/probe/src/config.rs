//! Probe configuration management

use anyhow::{Context, Result, anyhow};
use descriptor::DeviceIdentifier;
use rusb::LogLevel;
use serde::{Deserialize, Serialize};
use session::{DEFAULT_CONFIGURATION, DEFAULT_INTERFACE};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub probe: ProbeSettings,
    pub device: DeviceSettings,
    /// libusb settings
    #[serde(default)]
    pub usb: UsbSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSettings {
    pub log_level: String,
}

/// Which device to probe and how to prepare it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Device identifier as VID:PID in hex (e.g. "046d:0a45")
    pub id: String,
    /// Interface to claim
    #[serde(default = "DeviceSettings::default_interface")]
    pub interface: u8,
    /// Configuration to select
    #[serde(default = "DeviceSettings::default_configuration")]
    pub configuration: u8,
    /// Re-attach a detached kernel driver when the session closes
    #[serde(default)]
    pub reattach_kernel_driver: bool,
}

impl DeviceSettings {
    fn default_interface() -> u8 {
        DEFAULT_INTERFACE
    }

    fn default_configuration() -> u8 {
        DEFAULT_CONFIGURATION
    }

    /// Parsed device identifier
    pub fn identifier(&self) -> Result<DeviceIdentifier> {
        self.id
            .parse::<DeviceIdentifier>()
            .with_context(|| format!("Invalid device id '{}' in configuration", self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsbSettings {
    /// libusb's internal log level (none, error, warning, info, debug)
    #[serde(default = "UsbSettings::default_libusb_log_level")]
    pub libusb_log_level: String,
}

impl Default for UsbSettings {
    fn default() -> Self {
        Self {
            libusb_log_level: Self::default_libusb_log_level(),
        }
    }
}

impl UsbSettings {
    fn default_libusb_log_level() -> String {
        "info".to_string()
    }

    /// libusb log level, or None if the name is not recognised
    pub fn log_level(&self) -> Option<LogLevel> {
        match self.libusb_log_level.to_lowercase().as_str() {
            "none" => Some(LogLevel::None),
            "error" => Some(LogLevel::Error),
            "warning" | "warn" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe: ProbeSettings {
                log_level: "warn".to_string(),
            },
            device: DeviceSettings {
                id: "046d:0a45".to_string(),
                interface: DEFAULT_INTERFACE,
                configuration: DEFAULT_CONFIGURATION,
                reattach_kernel_driver: false,
            },
            usb: UsbSettings::default(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            // Try standard locations in order
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/usb-probe/probe.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: ProbeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("usb-probe").join("probe.toml")
        } else {
            PathBuf::from(".config/usb-probe/probe.toml")
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.probe.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.probe.log_level,
                valid_levels.join(", ")
            ));
        }

        self.device.identifier()?;

        if self.usb.log_level().is_none() {
            return Err(anyhow!(
                "Invalid libusb log level '{}', must be one of: none, error, warning, info, debug",
                self.usb.libusb_log_level
            ));
        }

        Ok(())
    }
}

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}
