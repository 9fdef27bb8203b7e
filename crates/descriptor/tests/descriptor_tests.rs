//! Integration tests for descriptor decoding
//!
//! Tests the public decoding surface including:
//! - Known device descriptors captured from real hardware
//! - Rejection of truncated and mistyped buffers
//! - JSON rendering used by the CLI report

use descriptor::{
    BcdVersion, DESCRIPTOR_TYPE_DEVICE, DescriptorError, DeviceDescriptor, DeviceIdentifier,
};

/// Logitech C270 webcam
const LOGITECH_C270: [u8; 18] = [
    0x12, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x40, 0x6d, 0x04, 0x45, 0x0a, 0x00, 0x01, 0x01, 0x02,
    0x03, 0x01,
];

/// CH341 USB-serial bridge (vendor specific class, no serial string)
const CH341: [u8; 18] = [
    0x12, 0x01, 0x10, 0x01, 0xff, 0x00, 0x00, 0x08, 0x86, 0x1a, 0x23, 0x75, 0x64, 0x02, 0x00, 0x02,
    0x00, 0x01,
];

mod decoding {
    use super::*;

    #[test]
    fn test_logitech_identity() {
        let desc = DeviceDescriptor::parse(&LOGITECH_C270).unwrap();

        assert_eq!(desc.length, 18);
        assert_eq!(desc.descriptor_type, DESCRIPTOR_TYPE_DEVICE);
        assert_eq!(desc.vendor_id, 0x046d);
        assert_eq!(desc.product_id, 0x0a45);
        assert_eq!(desc.device_version.to_string(), "1.00");
        assert_eq!(desc.identifier(), DeviceIdentifier::new(0x046d, 0x0a45));
    }

    #[test]
    fn test_ch341_fields() {
        let desc = DeviceDescriptor::parse(&CH341).unwrap();

        assert_eq!(desc.usb_version, BcdVersion(0x0110));
        assert_eq!(desc.usb_version.to_string(), "1.10");
        assert_eq!(desc.device_class, 0xff);
        assert_eq!(desc.max_packet_size_0, 8);
        assert_eq!(desc.identifier().to_string(), "1a86:7523");
        assert_eq!(desc.device_version.to_string(), "2.64");
        assert_eq!(desc.manufacturer_string_index(), None);
        assert_eq!(desc.product_string_index(), Some(2));
        assert_eq!(desc.serial_number_string_index(), None);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut buf = LOGITECH_C270.to_vec();
        buf.extend_from_slice(&[0xde, 0xad]);

        let desc = DeviceDescriptor::parse(&buf).unwrap();
        assert_eq!(desc.as_bytes().len(), 18);
    }

    #[test]
    fn test_every_truncation_rejected() {
        for len in 0..18 {
            assert!(matches!(
                DeviceDescriptor::parse(&LOGITECH_C270[..len]),
                Err(DescriptorError::TooShort { needed: 18, .. })
            ));
        }
    }

    #[test]
    fn test_configuration_descriptor_rejected() {
        let mut buf = LOGITECH_C270;
        buf[1] = 0x02;

        let err = DeviceDescriptor::parse(&buf).unwrap_err();
        assert!(err.to_string().contains("Unexpected descriptor type"));
    }
}

mod rendering {
    use super::*;

    #[test]
    fn test_json_versions_are_strings() {
        let desc = DeviceDescriptor::parse(&LOGITECH_C270).unwrap();
        let json = serde_json::to_value(&desc).unwrap();

        assert_eq!(json["device_version"], "1.00");
        assert_eq!(json["usb_version"], "2.00");
        assert_eq!(json["vendor_id"], 0x046d);
        assert!(json.get("raw").is_none());
    }
}
