//! Host USB stack boundary
//!
//! The session core never talks to libusb directly. It drives a [`UsbHost`]
//! to find and open devices, and a [`UsbHandle`] for everything done on an
//! opened device. [`crate::RusbHost`] implements these over rusb and
//! [`crate::mock::FakeHost`] implements them in memory.

use descriptor::{DeviceIdentifier, DeviceLocation, DeviceSummary};
use thiserror::Error;

/// libusb error codes, as returned by the C API
pub mod codes {
    pub const IO: i32 = -1;
    pub const INVALID_PARAM: i32 = -2;
    pub const ACCESS: i32 = -3;
    pub const NO_DEVICE: i32 = -4;
    pub const NOT_FOUND: i32 = -5;
    pub const BUSY: i32 = -6;
    pub const TIMEOUT: i32 = -7;
    pub const OVERFLOW: i32 = -8;
    pub const PIPE: i32 = -9;
    pub const INTERRUPTED: i32 = -10;
    pub const NO_MEM: i32 = -11;
    pub const NOT_SUPPORTED: i32 = -12;
    pub const OTHER: i32 = -99;
}

/// Failure reported by the host USB stack
///
/// Carries the host's numeric error code next to a readable reason so both
/// can be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (code {code})")]
pub struct HostError {
    /// Host-stack error code (libusb numbering)
    pub code: i32,
    /// Human-readable reason
    pub reason: String,
}

impl HostError {
    pub fn new(code: i32, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    pub fn access() -> Self {
        Self::new(codes::ACCESS, "Access denied (insufficient permissions)")
    }

    pub fn busy() -> Self {
        Self::new(codes::BUSY, "Resource busy")
    }

    pub fn no_device() -> Self {
        Self::new(codes::NO_DEVICE, "No such device (it may have been disconnected)")
    }

    pub fn not_found() -> Self {
        Self::new(codes::NOT_FOUND, "Entity not found")
    }

    pub fn not_supported() -> Self {
        Self::new(
            codes::NOT_SUPPORTED,
            "Operation not supported or unimplemented on this platform",
        )
    }

    pub fn pipe() -> Self {
        Self::new(codes::PIPE, "Pipe error")
    }

    pub fn timeout() -> Self {
        Self::new(codes::TIMEOUT, "Operation timed out")
    }

    pub fn is_not_supported(&self) -> bool {
        self.code == codes::NOT_SUPPORTED
    }
}

/// Device enumeration and opening
pub trait UsbHost {
    /// Handle to an opened device
    type Handle: UsbHandle;

    /// List every device currently attached to the host
    fn list_devices(&self) -> Result<Vec<DeviceSummary>, HostError>;

    /// Open the first attached device matching `identifier`
    ///
    /// Returns `Ok(None)` when nothing on the bus matches.
    fn open(
        &self,
        identifier: DeviceIdentifier,
    ) -> Result<Option<(Self::Handle, DeviceLocation)>, HostError>;
}

/// Operations on an opened device
///
/// Every call blocks until the host responds or its internal timeout fires.
pub trait UsbHandle {
    fn kernel_driver_active(&self, interface: u8) -> Result<bool, HostError>;

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), HostError>;

    fn attach_kernel_driver(&mut self, interface: u8) -> Result<(), HostError>;

    /// bConfigurationValue of the active configuration (0 when unconfigured)
    fn active_configuration(&self) -> Result<u8, HostError>;

    fn set_configuration(&mut self, configuration: u8) -> Result<(), HostError>;

    fn claim_interface(&mut self, interface: u8) -> Result<(), HostError>;

    fn release_interface(&mut self, interface: u8) -> Result<(), HostError>;

    /// Standard GET_DESCRIPTOR control read into `buf`
    ///
    /// Returns the number of bytes the device sent.
    fn read_descriptor(
        &self,
        descriptor_type: u8,
        index: u8,
        buf: &mut [u8],
    ) -> Result<usize, HostError>;

    /// Read a string descriptor in the device's first language, as ASCII
    fn read_string(&self, index: u8) -> Result<String, HostError>;

    /// Close the handle
    fn close(self) -> Result<(), HostError>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_error_display() {
        let err = HostError::busy();
        assert_eq!(err.to_string(), "Resource busy (code -6)");
    }

    #[test]
    fn test_not_supported_check() {
        assert!(HostError::not_supported().is_not_supported());
        assert!(!HostError::access().is_not_supported());
    }
}
