//! Device identity and bus location types
//!
//! These are the values a caller supplies to select a device and the values
//! the host stack reports back about where the device was found.

use crate::error::DescriptorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vendor/product pair used to select a device on the bus
///
/// Displays and parses as `vvvv:pppp` in hex. A `0x` prefix on either half is
/// accepted when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
}

impl DeviceIdentifier {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

impl FromStr for DeviceIdentifier {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DescriptorError::InvalidIdentifier(s.to_string());

        let (vid, pid) = s.trim().split_once(':').ok_or_else(invalid)?;
        let vendor_id = parse_hex_id(vid).ok_or_else(invalid)?;
        let product_id = parse_hex_id(pid).ok_or_else(invalid)?;

        Ok(Self::new(vendor_id, product_id))
    }
}

/// Parse a 1-4 digit hex ID, with or without a `0x` prefix
fn parse_hex_id(s: &str) -> Option<u16> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    if hex.is_empty() || hex.len() > 4 {
        return None;
    }

    u16::from_str_radix(hex, 16).ok()
}

/// USB device speed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSpeed {
    /// The host stack could not tell
    #[default]
    Unknown,
    /// Low speed - 1.5 Mbps (USB 1.0)
    Low,
    /// Full speed - 12 Mbps (USB 1.1)
    Full,
    /// High speed - 480 Mbps (USB 2.0)
    High,
    /// SuperSpeed - 5 Gbps (USB 3.0)
    Super,
    /// SuperSpeed+ - 10 Gbps (USB 3.1)
    SuperPlus,
}

impl DeviceSpeed {
    /// Signalling rate as shown to a human
    pub fn label(&self) -> &'static str {
        match self {
            DeviceSpeed::Unknown => "unknown speed",
            DeviceSpeed::Low => "1.5 Mbps",
            DeviceSpeed::Full => "12 Mbps",
            DeviceSpeed::High => "480 Mbps",
            DeviceSpeed::Super => "5 Gbps",
            DeviceSpeed::SuperPlus => "10 Gbps",
        }
    }
}

impl fmt::Display for DeviceSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a device sits on the host bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLocation {
    /// Bus number
    pub bus_number: u8,
    /// Device address on the bus
    pub address: u8,
    /// Negotiated speed
    pub speed: DeviceSpeed,
}

impl fmt::Display for DeviceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bus {:03} Device {:03}", self.bus_number, self.address)
    }
}

/// One entry of a bus listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub identifier: DeviceIdentifier,
    pub location: DeviceLocation,
}
