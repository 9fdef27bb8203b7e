//! USB descriptor types for usb-probe
//!
//! This crate defines the plain data shared by the session core and the CLI:
//! device identifiers, bus locations and speeds, and the fixed-layout USB 2.0
//! device descriptor together with its decoder.
//!
//! # Example
//!
//! ```
//! use descriptor::{DeviceDescriptor, DeviceIdentifier};
//!
//! let bytes = [
//!     0x12, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x40, 0x6d, 0x04, 0x45, 0x0a, 0x00, 0x01, 0x01,
//!     0x02, 0x03, 0x01,
//! ];
//! let descriptor = DeviceDescriptor::parse(&bytes).unwrap();
//!
//! assert_eq!(descriptor.identifier(), DeviceIdentifier::new(0x046d, 0x0a45));
//! assert_eq!(descriptor.device_version.to_string(), "1.00");
//! ```

pub mod device;
pub mod error;
pub mod types;

pub use device::{
    BcdVersion, DESCRIPTOR_LEN_DEVICE, DESCRIPTOR_TYPE_DEVICE, DeviceDescriptor, class_name,
};
pub use error::{DescriptorError, Result};
pub use types::{DeviceIdentifier, DeviceLocation, DeviceSpeed, DeviceSummary};
