//! In-memory host stack for tests
//!
//! [`FakeHost`] simulates a bus of [`FakeDevice`]s. Every host and handle
//! call is counted so tests can assert exactly what a session did, and each
//! step can be made to fail with a chosen [`HostError`].
//!
//! # Example
//!
//! ```
//! use descriptor::DeviceIdentifier;
//! use session::DeviceSession;
//! use session::mock::{FakeDevice, FakeHost};
//!
//! let host = FakeHost::new().with_device(FakeDevice::new(0x046d, 0x0a45).with_configuration(1));
//! let mut session = DeviceSession::open(&host, DeviceIdentifier::new(0x046d, 0x0a45)).unwrap();
//! session.prepare(0, 1).unwrap();
//! session.close();
//!
//! assert_eq!(host.calls().set_configuration, 0);
//! assert_eq!(host.calls().release_interface, 1);
//! ```

use crate::host::{HostError, UsbHandle, UsbHost};
use common::test_utils::{create_mock_descriptor_bytes, create_mock_location};
use descriptor::{DESCRIPTOR_TYPE_DEVICE, DeviceIdentifier, DeviceLocation, DeviceSummary};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Number of times each host-stack call was made
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_devices: usize,
    pub open: usize,
    pub kernel_driver_active: usize,
    pub detach_kernel_driver: usize,
    pub attach_kernel_driver: usize,
    pub active_configuration: usize,
    pub set_configuration: usize,
    pub claim_interface: usize,
    pub release_interface: usize,
    pub read_descriptor: usize,
    pub read_string: usize,
    pub close: usize,
}

/// Injected failures, one per step
#[derive(Debug, Clone, Default)]
pub struct Failures {
    pub open: Option<HostError>,
    pub kernel_driver_query: Option<HostError>,
    pub detach: Option<HostError>,
    pub attach: Option<HostError>,
    pub get_configuration: Option<HostError>,
    pub set_configuration: Option<HostError>,
    pub claim: Option<HostError>,
    pub release: Option<HostError>,
    pub read_descriptor: Option<HostError>,
    pub close: Option<HostError>,
}

/// A simulated device on the fake bus
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub identifier: DeviceIdentifier,
    pub location: DeviceLocation,
    /// Bytes returned for a device descriptor request
    pub descriptor: Vec<u8>,
    /// Interfaces a kernel driver is bound to
    pub kernel_drivers: BTreeSet<u8>,
    pub configuration: u8,
    pub claimed: Option<u8>,
    pub strings: HashMap<u8, String>,
    pub failures: Failures,
}

impl FakeDevice {
    /// Device on bus 1 with a descriptor matching its IDs, configuration 1 active
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            identifier: DeviceIdentifier::new(vendor_id, product_id),
            location: create_mock_location(1, 2),
            descriptor: create_mock_descriptor_bytes(vendor_id, product_id).to_vec(),
            kernel_drivers: BTreeSet::new(),
            configuration: 1,
            claimed: None,
            strings: HashMap::new(),
            failures: Failures::default(),
        }
    }

    pub fn at(mut self, bus_number: u8, address: u8) -> Self {
        self.location = create_mock_location(bus_number, address);
        self
    }

    /// Kernel driver bound to interface 0
    pub fn with_kernel_driver(self) -> Self {
        self.with_kernel_driver_on(0)
    }

    pub fn with_kernel_driver_on(mut self, interface: u8) -> Self {
        self.kernel_drivers.insert(interface);
        self
    }

    pub fn with_configuration(mut self, configuration: u8) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn with_descriptor(mut self, bytes: &[u8]) -> Self {
        self.descriptor = bytes.to_vec();
        self
    }

    pub fn with_string(mut self, index: u8, value: &str) -> Self {
        self.strings.insert(index, value.to_string());
        self
    }

    /// Interface already held by another process or driver
    pub fn held_elsewhere(mut self) -> Self {
        self.failures.claim = Some(HostError::busy());
        self
    }

    pub fn with_failures(mut self, failures: Failures) -> Self {
        self.failures = failures;
        self
    }
}

#[derive(Debug, Default)]
struct FakeBus {
    devices: Vec<FakeDevice>,
    calls: CallCounts,
    enumeration_error: Option<HostError>,
}

/// Simulated host USB stack
#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    bus: Arc<Mutex<FakeBus>>,
}

impl FakeHost {
    /// Empty bus
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, device: FakeDevice) -> Self {
        lock(&self.bus).devices.push(device);
        self
    }

    /// Make enumeration itself fail
    pub fn with_enumeration_error(self, error: HostError) -> Self {
        lock(&self.bus).enumeration_error = Some(error);
        self
    }

    /// Snapshot of the call counters
    pub fn calls(&self) -> CallCounts {
        lock(&self.bus).calls.clone()
    }

    /// Current simulated state of the first device matching `identifier`
    pub fn device(&self, identifier: DeviceIdentifier) -> Option<FakeDevice> {
        lock(&self.bus)
            .devices
            .iter()
            .find(|d| d.identifier == identifier)
            .cloned()
    }
}

impl UsbHost for FakeHost {
    type Handle = FakeHandle;

    fn list_devices(&self) -> Result<Vec<DeviceSummary>, HostError> {
        let mut bus = lock(&self.bus);
        bus.calls.list_devices += 1;

        if let Some(e) = bus.enumeration_error.clone() {
            return Err(e);
        }

        Ok(bus
            .devices
            .iter()
            .map(|d| DeviceSummary {
                identifier: d.identifier,
                location: d.location,
            })
            .collect())
    }

    fn open(
        &self,
        identifier: DeviceIdentifier,
    ) -> Result<Option<(FakeHandle, DeviceLocation)>, HostError> {
        let mut bus = lock(&self.bus);
        bus.calls.open += 1;

        if let Some(e) = bus.enumeration_error.clone() {
            return Err(e);
        }

        let Some(index) = bus.devices.iter().position(|d| d.identifier == identifier) else {
            return Ok(None);
        };

        let device = &bus.devices[index];
        if let Some(e) = device.failures.open.clone() {
            return Err(e);
        }
        let location = device.location;

        let handle = FakeHandle {
            bus: Arc::clone(&self.bus),
            index,
        };
        Ok(Some((handle, location)))
    }
}

/// Handle to a device on the fake bus
#[derive(Debug)]
pub struct FakeHandle {
    bus: Arc<Mutex<FakeBus>>,
    index: usize,
}

impl FakeHandle {
    /// Count the call, then run `f` against the device
    fn with_device<T>(
        &self,
        count: impl FnOnce(&mut CallCounts),
        f: impl FnOnce(&mut FakeDevice) -> Result<T, HostError>,
    ) -> Result<T, HostError> {
        let mut bus = lock(&self.bus);
        count(&mut bus.calls);
        let device = bus.devices.get_mut(self.index).ok_or_else(HostError::no_device)?;
        f(device)
    }
}

impl UsbHandle for FakeHandle {
    fn kernel_driver_active(&self, interface: u8) -> Result<bool, HostError> {
        self.with_device(
            |c| c.kernel_driver_active += 1,
            |d| match d.failures.kernel_driver_query.clone() {
                Some(e) => Err(e),
                None => Ok(d.kernel_drivers.contains(&interface)),
            },
        )
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), HostError> {
        self.with_device(
            |c| c.detach_kernel_driver += 1,
            |d| {
                if let Some(e) = d.failures.detach.clone() {
                    return Err(e);
                }
                if !d.kernel_drivers.remove(&interface) {
                    return Err(HostError::not_found());
                }
                Ok(())
            },
        )
    }

    fn attach_kernel_driver(&mut self, interface: u8) -> Result<(), HostError> {
        self.with_device(
            |c| c.attach_kernel_driver += 1,
            |d| {
                if let Some(e) = d.failures.attach.clone() {
                    return Err(e);
                }
                if d.claimed == Some(interface) {
                    return Err(HostError::busy());
                }
                d.kernel_drivers.insert(interface);
                Ok(())
            },
        )
    }

    fn active_configuration(&self) -> Result<u8, HostError> {
        self.with_device(
            |c| c.active_configuration += 1,
            |d| match d.failures.get_configuration.clone() {
                Some(e) => Err(e),
                None => Ok(d.configuration),
            },
        )
    }

    fn set_configuration(&mut self, configuration: u8) -> Result<(), HostError> {
        self.with_device(
            |c| c.set_configuration += 1,
            |d| {
                if let Some(e) = d.failures.set_configuration.clone() {
                    return Err(e);
                }
                d.configuration = configuration;
                Ok(())
            },
        )
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), HostError> {
        self.with_device(
            |c| c.claim_interface += 1,
            |d| {
                if let Some(e) = d.failures.claim.clone() {
                    return Err(e);
                }
                if d.claimed.is_some() {
                    return Err(HostError::busy());
                }
                d.claimed = Some(interface);
                Ok(())
            },
        )
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), HostError> {
        self.with_device(
            |c| c.release_interface += 1,
            |d| {
                if let Some(e) = d.failures.release.clone() {
                    return Err(e);
                }
                if d.claimed != Some(interface) {
                    return Err(HostError::not_found());
                }
                d.claimed = None;
                Ok(())
            },
        )
    }

    fn read_descriptor(
        &self,
        descriptor_type: u8,
        _index: u8,
        buf: &mut [u8],
    ) -> Result<usize, HostError> {
        self.with_device(
            |c| c.read_descriptor += 1,
            |d| {
                if let Some(e) = d.failures.read_descriptor.clone() {
                    return Err(e);
                }
                if descriptor_type != DESCRIPTOR_TYPE_DEVICE {
                    return Err(HostError::pipe());
                }
                let len = buf.len().min(d.descriptor.len());
                buf[..len].copy_from_slice(&d.descriptor[..len]);
                Ok(len)
            },
        )
    }

    fn read_string(&self, index: u8) -> Result<String, HostError> {
        self.with_device(
            |c| c.read_string += 1,
            |d| d.strings.get(&index).cloned().ok_or_else(HostError::pipe),
        )
    }

    fn close(self) -> Result<(), HostError> {
        self.with_device(
            |c| c.close += 1,
            |d| match d.failures.close.clone() {
                Some(e) => Err(e),
                None => Ok(()),
            },
        )
    }
}

/// Lock the bus, recovering from a panicked test thread
fn lock(bus: &Mutex<FakeBus>) -> MutexGuard<'_, FakeBus> {
    bus.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_unknown_device() {
        let host = FakeHost::new().with_device(FakeDevice::new(0x046d, 0x0a45));
        let opened = host.open(DeviceIdentifier::new(0x1234, 0x5678)).unwrap();
        assert!(opened.is_none());
        assert_eq!(host.calls().open, 1);
    }

    #[test]
    fn test_claim_is_exclusive() {
        let host = FakeHost::new().with_device(FakeDevice::new(0x046d, 0x0a45));
        let id = DeviceIdentifier::new(0x046d, 0x0a45);
        let (mut first, _) = host.open(id).unwrap().unwrap();
        let (mut second, _) = host.open(id).unwrap().unwrap();

        assert!(first.claim_interface(0).is_ok());
        assert_eq!(second.claim_interface(0), Err(HostError::busy()));
    }

    #[test]
    fn test_short_descriptor_reports_actual_length() {
        let host = FakeHost::new()
            .with_device(FakeDevice::new(0x046d, 0x0a45).with_descriptor(&[0x12, 0x01, 0x00]));
        let (handle, _) = host.open(DeviceIdentifier::new(0x046d, 0x0a45)).unwrap().unwrap();

        let mut buf = [0u8; 18];
        assert_eq!(handle.read_descriptor(DESCRIPTOR_TYPE_DEVICE, 0, &mut buf), Ok(3));
    }

    #[test]
    fn test_listing_preserves_locations() {
        let host = FakeHost::new()
            .with_device(FakeDevice::new(0x046d, 0x0a45).at(1, 4))
            .with_device(FakeDevice::new(0x1a86, 0x7523).at(3, 9));

        let listed = host.list_devices().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].location.bus_number, 3);
        assert_eq!(listed[1].location.address, 9);
    }
}
