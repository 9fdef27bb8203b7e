//! rusb-backed host stack
//!
//! Implements [`UsbHost`] and [`UsbHandle`] on top of a libusb context, mapping
//! rusb errors back to libusb's numeric codes.

use crate::error::OpenError;
use crate::host::{HostError, UsbHandle, UsbHost, codes};
use descriptor::{DeviceIdentifier, DeviceLocation, DeviceSpeed, DeviceSummary};
use rusb::{
    Context, Device, DeviceHandle, Direction, LogLevel, Recipient, RequestType, UsbContext,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout libusb uses for its own descriptor requests
const DESCRIPTOR_TIMEOUT: Duration = Duration::from_secs(1);

/// bRequest of a standard GET_DESCRIPTOR request
const REQUEST_GET_DESCRIPTOR: u8 = 0x06;

/// Host stack backed by a dedicated libusb context
pub struct RusbHost {
    context: Context,
}

impl RusbHost {
    /// Initialise a libusb context
    pub fn new() -> Result<Self, OpenError> {
        Self::with_log_level(None)
    }

    /// Initialise a libusb context, optionally setting libusb's own log level
    pub fn with_log_level(level: Option<LogLevel>) -> Result<Self, OpenError> {
        let mut context =
            Context::new().map_err(|e| OpenError::HostStackInitFailed(HostError::from(e)))?;

        if let Some(level) = level {
            context.set_log_level(level);
        }

        Ok(Self { context })
    }
}

impl UsbHost for RusbHost {
    type Handle = RusbHandle;

    fn list_devices(&self) -> Result<Vec<DeviceSummary>, HostError> {
        let devices = self.context.devices()?;
        let mut summaries = Vec::with_capacity(devices.len());

        for device in devices.iter() {
            match device.device_descriptor() {
                Ok(desc) => summaries.push(DeviceSummary {
                    identifier: DeviceIdentifier::new(desc.vendor_id(), desc.product_id()),
                    location: location_of(&device),
                }),
                Err(e) => warn!(
                    "Skipping device bus={}, addr={}: {}",
                    device.bus_number(),
                    device.address(),
                    e
                ),
            }
        }

        debug!("Enumerated {} devices", summaries.len());
        Ok(summaries)
    }

    fn open(
        &self,
        identifier: DeviceIdentifier,
    ) -> Result<Option<(RusbHandle, DeviceLocation)>, HostError> {
        for device in self.context.devices()?.iter() {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            if desc.vendor_id() != identifier.vendor_id
                || desc.product_id() != identifier.product_id
            {
                continue;
            }

            let handle = device.open()?;
            return Ok(Some((RusbHandle { handle }, location_of(&device))));
        }

        Ok(None)
    }
}

/// Opened rusb device
pub struct RusbHandle {
    handle: DeviceHandle<Context>,
}

impl UsbHandle for RusbHandle {
    fn kernel_driver_active(&self, interface: u8) -> Result<bool, HostError> {
        Ok(self.handle.kernel_driver_active(interface)?)
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), HostError> {
        Ok(self.handle.detach_kernel_driver(interface)?)
    }

    fn attach_kernel_driver(&mut self, interface: u8) -> Result<(), HostError> {
        Ok(self.handle.attach_kernel_driver(interface)?)
    }

    fn active_configuration(&self) -> Result<u8, HostError> {
        Ok(self.handle.active_configuration()?)
    }

    fn set_configuration(&mut self, configuration: u8) -> Result<(), HostError> {
        Ok(self.handle.set_active_configuration(configuration)?)
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), HostError> {
        Ok(self.handle.claim_interface(interface)?)
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), HostError> {
        Ok(self.handle.release_interface(interface)?)
    }

    fn read_descriptor(
        &self,
        descriptor_type: u8,
        index: u8,
        buf: &mut [u8],
    ) -> Result<usize, HostError> {
        let request_type =
            rusb::request_type(Direction::In, RequestType::Standard, Recipient::Device);
        let value = (u16::from(descriptor_type) << 8) | u16::from(index);

        debug!(
            "GET_DESCRIPTOR: type={:#04x}, index={}, len={}",
            descriptor_type,
            index,
            buf.len()
        );

        Ok(self.handle.read_control(
            request_type,
            REQUEST_GET_DESCRIPTOR,
            value,
            0,
            buf,
            DESCRIPTOR_TIMEOUT,
        )?)
    }

    fn read_string(&self, index: u8) -> Result<String, HostError> {
        Ok(self.handle.read_string_descriptor_ascii(index)?)
    }

    fn close(self) -> Result<(), HostError> {
        // libusb_close runs when the handle drops
        drop(self.handle);
        Ok(())
    }
}

impl From<rusb::Error> for HostError {
    fn from(e: rusb::Error) -> Self {
        HostError::new(map_rusb_error(&e), e.to_string())
    }
}

/// Map a rusb error to its libusb error code
fn map_rusb_error(e: &rusb::Error) -> i32 {
    match e {
        rusb::Error::Io => codes::IO,
        rusb::Error::InvalidParam => codes::INVALID_PARAM,
        rusb::Error::Access => codes::ACCESS,
        rusb::Error::NoDevice => codes::NO_DEVICE,
        rusb::Error::NotFound => codes::NOT_FOUND,
        rusb::Error::Busy => codes::BUSY,
        rusb::Error::Timeout => codes::TIMEOUT,
        rusb::Error::Overflow => codes::OVERFLOW,
        rusb::Error::Pipe => codes::PIPE,
        rusb::Error::Interrupted => codes::INTERRUPTED,
        rusb::Error::NoMem => codes::NO_MEM,
        rusb::Error::NotSupported => codes::NOT_SUPPORTED,
        _ => codes::OTHER,
    }
}

fn location_of(device: &Device<Context>) -> DeviceLocation {
    DeviceLocation {
        bus_number: device.bus_number(),
        address: device.address(),
        speed: map_device_speed(device.speed()),
    }
}

/// Map rusb device speed to DeviceSpeed
fn map_device_speed(speed: rusb::Speed) -> DeviceSpeed {
    match speed {
        rusb::Speed::Low => DeviceSpeed::Low,
        rusb::Speed::Full => DeviceSpeed::Full,
        rusb::Speed::High => DeviceSpeed::High,
        rusb::Speed::Super => DeviceSpeed::Super,
        rusb::Speed::SuperPlus => DeviceSpeed::SuperPlus,
        _ => DeviceSpeed::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_device_speed() {
        assert_eq!(map_device_speed(rusb::Speed::Low), DeviceSpeed::Low);
        assert_eq!(map_device_speed(rusb::Speed::Full), DeviceSpeed::Full);
        assert_eq!(map_device_speed(rusb::Speed::High), DeviceSpeed::High);
        assert_eq!(map_device_speed(rusb::Speed::Super), DeviceSpeed::Super);
        assert_eq!(
            map_device_speed(rusb::Speed::SuperPlus),
            DeviceSpeed::SuperPlus
        );
        assert_eq!(map_device_speed(rusb::Speed::Unknown), DeviceSpeed::Unknown);
    }

    #[test]
    fn test_map_rusb_error_codes() {
        assert_eq!(map_rusb_error(&rusb::Error::Busy), codes::BUSY);
        assert_eq!(map_rusb_error(&rusb::Error::Access), codes::ACCESS);
        assert_eq!(map_rusb_error(&rusb::Error::NotSupported), codes::NOT_SUPPORTED);
        assert_eq!(map_rusb_error(&rusb::Error::Other), codes::OTHER);
    }

    #[test]
    fn test_host_error_from_rusb() {
        let err = HostError::from(rusb::Error::Pipe);
        assert_eq!(err.code, codes::PIPE);
        assert!(!err.reason.is_empty());
    }
}
