//! Test utilities for usb-probe
//!
//! Provides fixture builders shared by the crates' tests.
//!
//! # Example
//!
//! ```
//! use common::test_utils::create_mock_descriptor_bytes;
//! use descriptor::DeviceDescriptor;
//!
//! let bytes = create_mock_descriptor_bytes(0x1234, 0x5678);
//! let desc = DeviceDescriptor::parse(&bytes).unwrap();
//! assert_eq!(desc.vendor_id, 0x1234);
//! ```

use descriptor::{DeviceIdentifier, DeviceLocation, DeviceSpeed, DeviceSummary};

/// Raw descriptor of the Logitech C270 webcam (046d:0a45)
pub const LOGITECH_C270_DESCRIPTOR: [u8; 18] = [
    0x12, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x40, 0x6d, 0x04, 0x45, 0x0a, 0x00, 0x01, 0x01, 0x02,
    0x03, 0x01,
];

/// Create raw device descriptor bytes for a vendor/product pair
///
/// Everything but the IDs matches [`LOGITECH_C270_DESCRIPTOR`].
pub fn create_mock_descriptor_bytes(vendor_id: u16, product_id: u16) -> [u8; 18] {
    MockDescriptor::new(vendor_id, product_id).build()
}

/// Builder for raw device descriptor bytes
#[derive(Debug, Clone)]
pub struct MockDescriptor {
    bytes: [u8; 18],
}

impl MockDescriptor {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        let mut bytes = LOGITECH_C270_DESCRIPTOR;
        bytes[8..10].copy_from_slice(&vendor_id.to_le_bytes());
        bytes[10..12].copy_from_slice(&product_id.to_le_bytes());
        Self { bytes }
    }

    pub fn usb_version(mut self, bcd: u16) -> Self {
        self.bytes[2..4].copy_from_slice(&bcd.to_le_bytes());
        self
    }

    pub fn class(mut self, class: u8, subclass: u8, protocol: u8) -> Self {
        self.bytes[4] = class;
        self.bytes[5] = subclass;
        self.bytes[6] = protocol;
        self
    }

    pub fn device_version(mut self, bcd: u16) -> Self {
        self.bytes[12..14].copy_from_slice(&bcd.to_le_bytes());
        self
    }

    pub fn num_configurations(mut self, count: u8) -> Self {
        self.bytes[17] = count;
        self
    }

    pub fn build(self) -> [u8; 18] {
        self.bytes
    }
}

/// Create a mock bus location
pub fn create_mock_location(bus_number: u8, address: u8) -> DeviceLocation {
    DeviceLocation {
        bus_number,
        address,
        speed: DeviceSpeed::High,
    }
}

/// Create a mock bus listing entry
pub fn create_mock_summary(
    vendor_id: u16,
    product_id: u16,
    bus_number: u8,
    address: u8,
) -> DeviceSummary {
    DeviceSummary {
        identifier: DeviceIdentifier::new(vendor_id, product_id),
        location: create_mock_location(bus_number, address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use descriptor::DeviceDescriptor;

    #[test]
    fn test_mock_descriptor_ids() {
        let bytes = create_mock_descriptor_bytes(0xabcd, 0x0123);
        let desc = DeviceDescriptor::parse(&bytes).unwrap();
        assert_eq!(desc.identifier(), DeviceIdentifier::new(0xabcd, 0x0123));
    }

    #[test]
    fn test_mock_descriptor_builder() {
        let bytes = MockDescriptor::new(0x1a86, 0x7523)
            .usb_version(0x0110)
            .class(0xff, 0x00, 0x00)
            .device_version(0x0264)
            .num_configurations(2)
            .build();
        let desc = DeviceDescriptor::parse(&bytes).unwrap();

        assert_eq!(desc.usb_version.to_string(), "1.10");
        assert_eq!(desc.device_class, 0xff);
        assert_eq!(desc.device_version.to_string(), "2.64");
        assert_eq!(desc.num_configurations, 2);
    }

    #[test]
    fn test_mock_summary() {
        let summary = create_mock_summary(0x046d, 0x0a45, 1, 4);
        assert_eq!(summary.location.to_string(), "Bus 001 Device 004");
    }
}
