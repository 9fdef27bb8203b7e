//! USB 2.0 device descriptor
//!
//! The device descriptor is always 18 bytes with fields at fixed offsets, so
//! decoding is a matter of reading them out of the buffer. Multi-byte fields
//! are little-endian.

use crate::error::{DescriptorError, Result};
use crate::types::DeviceIdentifier;
use byteorder::{ByteOrder, LittleEndian};
use serde::{Serialize, Serializer};
use std::fmt;

/// bDescriptorType of a device descriptor
pub const DESCRIPTOR_TYPE_DEVICE: u8 = 0x01;

/// bLength of a device descriptor
pub const DESCRIPTOR_LEN_DEVICE: u8 = 18;

/// Binary-coded decimal version (bcdUSB, bcdDevice)
///
/// The high byte is the major version and the low byte the minor version,
/// so `0x0210` displays as `2.10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BcdVersion(pub u16);

impl BcdVersion {
    pub fn major(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn minor(&self) -> u8 {
        (self.0 & 0xff) as u8
    }
}

impl fmt::Display for BcdVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}.{:02x}", self.major(), self.minor())
    }
}

impl Serialize for BcdVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Decoded standard device descriptor
///
/// A read-only snapshot of what the device reported. The raw bytes are kept
/// alongside the decoded fields for hex dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    /// bLength
    pub length: u8,
    /// bDescriptorType
    pub descriptor_type: u8,
    /// bcdUSB
    pub usb_version: BcdVersion,
    /// bDeviceClass
    pub device_class: u8,
    /// bDeviceSubClass
    pub device_sub_class: u8,
    /// bDeviceProtocol
    pub device_protocol: u8,
    /// bMaxPacketSize0
    pub max_packet_size_0: u8,
    /// idVendor
    pub vendor_id: u16,
    /// idProduct
    pub product_id: u16,
    /// bcdDevice
    pub device_version: BcdVersion,
    /// iManufacturer
    pub manufacturer_index: u8,
    /// iProduct
    pub product_index: u8,
    /// iSerialNumber
    pub serial_number_index: u8,
    /// bNumConfigurations
    pub num_configurations: u8,
    #[serde(skip)]
    raw: [u8; DESCRIPTOR_LEN_DEVICE as usize],
}

impl DeviceDescriptor {
    /// Decode a device descriptor from the start of `buf`
    ///
    /// The buffer must hold at least 18 bytes, with `bLength == 18` and
    /// `bDescriptorType == 1`. Trailing bytes are ignored.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let needed = DESCRIPTOR_LEN_DEVICE as usize;
        if buf.len() < needed {
            return Err(DescriptorError::TooShort {
                needed,
                actual: buf.len(),
            });
        }

        if buf[0] != DESCRIPTOR_LEN_DEVICE {
            return Err(DescriptorError::BadLength {
                length: buf[0],
                expected: DESCRIPTOR_LEN_DEVICE,
            });
        }

        if buf[1] != DESCRIPTOR_TYPE_DEVICE {
            return Err(DescriptorError::WrongType {
                actual: buf[1],
                expected: DESCRIPTOR_TYPE_DEVICE,
            });
        }

        let mut raw = [0u8; DESCRIPTOR_LEN_DEVICE as usize];
        raw.copy_from_slice(&buf[..needed]);

        Ok(Self {
            length: raw[0],
            descriptor_type: raw[1],
            usb_version: BcdVersion(LittleEndian::read_u16(&raw[2..4])),
            device_class: raw[4],
            device_sub_class: raw[5],
            device_protocol: raw[6],
            max_packet_size_0: raw[7],
            vendor_id: LittleEndian::read_u16(&raw[8..10]),
            product_id: LittleEndian::read_u16(&raw[10..12]),
            device_version: BcdVersion(LittleEndian::read_u16(&raw[12..14])),
            manufacturer_index: raw[14],
            product_index: raw[15],
            serial_number_index: raw[16],
            num_configurations: raw[17],
            raw,
        })
    }

    /// Vendor/product pair reported by the device
    pub fn identifier(&self) -> DeviceIdentifier {
        DeviceIdentifier::new(self.vendor_id, self.product_id)
    }

    /// The 18 bytes the device returned
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Space-separated lowercase hex of the raw descriptor
    pub fn hex_dump(&self) -> String {
        self.raw
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn manufacturer_string_index(&self) -> Option<u8> {
        non_zero(self.manufacturer_index)
    }

    pub fn product_string_index(&self) -> Option<u8> {
        non_zero(self.product_index)
    }

    pub fn serial_number_string_index(&self) -> Option<u8> {
        non_zero(self.serial_number_index)
    }
}

/// String index 0 means the device has no such string
fn non_zero(index: u8) -> Option<u8> {
    (index != 0).then_some(index)
}

/// Human name for a USB base class code
///
/// Class 0 means the class is defined per interface.
pub fn class_name(code: u8) -> &'static str {
    match code {
        0x00 => "Defined at Interface level",
        0x01 => "Audio",
        0x02 => "Communications",
        0x03 => "Human Interface Device",
        0x05 => "Physical",
        0x06 => "Image",
        0x07 => "Printer",
        0x08 => "Mass Storage",
        0x09 => "Hub",
        0x0a => "CDC Data",
        0x0b => "Smart Card",
        0x0d => "Content Security",
        0x0e => "Video",
        0x0f => "Personal Healthcare",
        0x10 => "Audio/Video",
        0x11 => "Billboard",
        0xdc => "Diagnostic",
        0xe0 => "Wireless Controller",
        0xef => "Miscellaneous",
        0xfe => "Application Specific",
        0xff => "Vendor Specific",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEBCAM: [u8; 18] = [
        0x12, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x40, 0x6d, 0x04, 0x45, 0x0a, 0x00, 0x01, 0x01,
        0x02, 0x03, 0x01,
    ];

    #[test]
    fn test_parse_fields() {
        let desc = DeviceDescriptor::parse(&WEBCAM).unwrap();

        assert_eq!(desc.length, 18);
        assert_eq!(desc.descriptor_type, DESCRIPTOR_TYPE_DEVICE);
        assert_eq!(desc.usb_version, BcdVersion(0x0200));
        assert_eq!(desc.max_packet_size_0, 64);
        assert_eq!(desc.vendor_id, 0x046d);
        assert_eq!(desc.product_id, 0x0a45);
        assert_eq!(desc.device_version.to_string(), "1.00");
        assert_eq!(desc.manufacturer_string_index(), Some(1));
        assert_eq!(desc.product_string_index(), Some(2));
        assert_eq!(desc.serial_number_string_index(), Some(3));
        assert_eq!(desc.num_configurations, 1);
    }

    #[test]
    fn test_bcd_display() {
        assert_eq!(BcdVersion(0x0100).to_string(), "1.00");
        assert_eq!(BcdVersion(0x0210).to_string(), "2.10");
        assert_eq!(BcdVersion(0x0320).to_string(), "3.20");
        assert_eq!(BcdVersion(0x1234).major(), 0x12);
        assert_eq!(BcdVersion(0x1234).minor(), 0x34);
    }

    #[test]
    fn test_parse_too_short() {
        let err = DeviceDescriptor::parse(&WEBCAM[..8]).unwrap_err();
        assert_eq!(
            err,
            DescriptorError::TooShort {
                needed: 18,
                actual: 8
            }
        );
    }

    #[test]
    fn test_parse_wrong_type() {
        let mut buf = WEBCAM;
        buf[1] = 0x02;
        assert!(matches!(
            DeviceDescriptor::parse(&buf),
            Err(DescriptorError::WrongType { actual: 0x02, .. })
        ));
    }

    #[test]
    fn test_parse_bad_length() {
        let mut buf = WEBCAM;
        buf[0] = 0x09;
        assert!(matches!(
            DeviceDescriptor::parse(&buf),
            Err(DescriptorError::BadLength { length: 9, .. })
        ));
    }

    #[test]
    fn test_hex_dump() {
        let desc = DeviceDescriptor::parse(&WEBCAM).unwrap();
        assert_eq!(
            desc.hex_dump(),
            "12 01 00 02 00 00 00 40 6d 04 45 0a 00 01 01 02 03 01"
        );
        assert_eq!(desc.as_bytes(), &WEBCAM);
    }

    #[test]
    fn test_zero_string_index_is_none() {
        let mut buf = WEBCAM;
        buf[16] = 0;
        let desc = DeviceDescriptor::parse(&buf).unwrap();
        assert_eq!(desc.serial_number_string_index(), None);
    }

    #[test]
    fn test_class_name() {
        assert_eq!(class_name(0x03), "Human Interface Device");
        assert_eq!(class_name(0xff), "Vendor Specific");
        assert_eq!(class_name(0x42), "Unknown");
    }
}
