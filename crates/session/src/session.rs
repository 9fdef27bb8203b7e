//! USB device session
//!
//! A [`DeviceSession`] owns one opened device handle for its whole life:
//! open, prepare (detach kernel driver, select configuration, claim
//! interface), read descriptors, close. Transitions only move forward and
//! `Closed` is terminal.

use crate::error::{DescriptorReadError, OpenError, PrepareError};
use crate::host::{UsbHandle, UsbHost};
use descriptor::{
    DESCRIPTOR_LEN_DEVICE, DESCRIPTOR_TYPE_DEVICE, DeviceDescriptor, DeviceIdentifier,
    DeviceLocation,
};
use std::fmt;
use tracing::{Span, debug, debug_span, info, warn};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handle open, nothing claimed yet
    Opened,
    /// Kernel driver detached if needed, configuration set, interface claimed
    Prepared,
    /// Device descriptor read from a prepared session
    DescriptorRead,
    /// Interface released and handle closed
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Opened => "opened",
            SessionState::Prepared => "prepared",
            SessionState::DescriptorRead => "descriptor-read",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Options fixed when a session is opened
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Re-attach a kernel driver this session detached when it closes
    pub restore_kernel_driver: bool,
    /// Span every session event is recorded in
    ///
    /// Defaults to a `session` span tagged with the device identifier.
    pub span: Option<Span>,
}

impl SessionOptions {
    pub fn restore_kernel_driver(mut self, restore: bool) -> Self {
        self.restore_kernel_driver = restore;
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// One opened USB device
///
/// Dropping a session closes it.
pub struct DeviceSession<H: UsbHandle> {
    identifier: DeviceIdentifier,
    location: DeviceLocation,
    /// None once closed
    handle: Option<H>,
    /// Set iff the claim succeeded and no release has happened since
    claimed_interface: Option<u8>,
    /// Interfaces whose kernel driver this session detached, in detach order
    detached_interfaces: Vec<u8>,
    restore_kernel_driver: bool,
    state: SessionState,
    span: Span,
}

impl<H: UsbHandle> DeviceSession<H> {
    /// Open the first attached device matching `identifier`
    pub fn open<T>(host: &T, identifier: DeviceIdentifier) -> Result<Self, OpenError>
    where
        T: UsbHost<Handle = H> + ?Sized,
    {
        Self::open_with(host, identifier, SessionOptions::default())
    }

    /// Open the first attached device matching `identifier` with explicit options
    pub fn open_with<T>(
        host: &T,
        identifier: DeviceIdentifier,
        options: SessionOptions,
    ) -> Result<Self, OpenError>
    where
        T: UsbHost<Handle = H> + ?Sized,
    {
        let span = options
            .span
            .unwrap_or_else(|| debug_span!("session", device = %identifier));

        let (handle, location) = span.in_scope(|| {
            debug!("Searching USB buses for [{}]", identifier);

            let (handle, location) = host
                .open(identifier)
                .map_err(|source| OpenError::OpenFailed { identifier, source })?
                .ok_or(OpenError::NotFound(identifier))?;

            info!(
                "Found [{}] as device [{}] on USB bus [{}] ({})",
                identifier, location.address, location.bus_number, location.speed
            );
            Ok::<_, OpenError>((handle, location))
        })?;

        Ok(Self {
            identifier,
            location,
            handle: Some(handle),
            claimed_interface: None,
            detached_interfaces: Vec::new(),
            restore_kernel_driver: options.restore_kernel_driver,
            state: SessionState::Opened,
            span,
        })
    }

    /// Make `interface` usable under `configuration`
    ///
    /// Detaches a bound kernel driver, switches configuration only when the
    /// active one differs, then claims the interface. On failure the session
    /// stays closable.
    pub fn prepare(&mut self, interface: u8, configuration: u8) -> Result<(), PrepareError> {
        let span = self.span.clone();
        span.in_scope(|| self.prepare_inner(interface, configuration))
    }

    fn prepare_inner(&mut self, interface: u8, configuration: u8) -> Result<(), PrepareError> {
        if self.state != SessionState::Opened {
            return Err(PrepareError::InvalidState(self.state));
        }
        let handle = self
            .handle
            .as_mut()
            .ok_or(PrepareError::InvalidState(SessionState::Closed))?;

        match handle.kernel_driver_active(interface) {
            Ok(true) => {
                handle
                    .detach_kernel_driver(interface)
                    .map_err(|source| PrepareError::DetachFailed { interface, source })?;
                if !self.detached_interfaces.contains(&interface) {
                    self.detached_interfaces.push(interface);
                }
                info!("Detached kernel driver from interface {}", interface);
            }
            Ok(false) => {
                debug!("No kernel driver active on interface {}", interface);
            }
            // Platforms without kernel driver support have nothing to detach
            Err(e) if e.is_not_supported() => {
                debug!(
                    "Kernel driver status unavailable for interface {}: {}",
                    interface, e
                );
            }
            Err(source) => return Err(PrepareError::DetachFailed { interface, source }),
        }

        let current = handle
            .active_configuration()
            .map_err(|source| PrepareError::ConfigurationFailed {
                configuration,
                source,
            })?;

        // Setting the configuration resets endpoints, so leave an active one alone
        if current != configuration {
            handle
                .set_configuration(configuration)
                .map_err(|source| PrepareError::ConfigurationFailed {
                    configuration,
                    source,
                })?;
            info!(
                "Set device configuration to {} (was {})",
                configuration, current
            );
        } else {
            debug!("Configuration {} already active", configuration);
        }

        handle
            .claim_interface(interface)
            .map_err(|source| PrepareError::ClaimFailed { interface, source })?;
        self.claimed_interface = Some(interface);
        self.state = SessionState::Prepared;

        info!("Claimed device interface [{}]", interface);
        Ok(())
    }

    /// Read and decode the 18-byte device descriptor
    pub fn read_device_descriptor(&mut self) -> Result<DeviceDescriptor, DescriptorReadError> {
        let _entered = self.span.clone().entered();

        let handle = self.readable_handle()?;
        let mut buf = [0u8; DESCRIPTOR_LEN_DEVICE as usize];

        let len = handle
            .read_descriptor(DESCRIPTOR_TYPE_DEVICE, 0, &mut buf)
            .map_err(DescriptorReadError::DescriptorReadFailed)?;
        if len < buf.len() {
            return Err(DescriptorReadError::ShortRead {
                expected: buf.len(),
                actual: len,
            });
        }

        let descriptor = DeviceDescriptor::parse(&buf)?;

        info!(
            "Device reported its revision [{}]",
            descriptor.device_version
        );
        debug!("Device descriptor: {}", descriptor.hex_dump());

        if self.state == SessionState::Prepared {
            self.state = SessionState::DescriptorRead;
        }
        Ok(descriptor)
    }

    /// Read string descriptor `index` as ASCII
    pub fn read_string_descriptor(&self, index: u8) -> Result<String, DescriptorReadError> {
        let handle = self.readable_handle()?;
        handle
            .read_string(index)
            .map_err(|source| DescriptorReadError::StringReadFailed { index, source })
    }

    fn readable_handle(&self) -> Result<&H, DescriptorReadError> {
        self.handle
            .as_ref()
            .ok_or(DescriptorReadError::InvalidState(SessionState::Closed))
    }

    /// Release the claimed interface and close the handle
    ///
    /// Safe to call in any state and any number of times. Teardown failures
    /// are logged, never returned.
    pub fn close(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        let _entered = self.span.clone().entered();

        if let Some(interface) = self.claimed_interface.take() {
            match handle.release_interface(interface) {
                Ok(()) => debug!("Released interface {}", interface),
                Err(e) => warn!("Failed to release interface {}: {}", interface, e),
            }
        }

        if self.restore_kernel_driver {
            for &interface in &self.detached_interfaces {
                match handle.attach_kernel_driver(interface) {
                    Ok(()) => info!("Reattached kernel driver to interface {}", interface),
                    Err(e) => warn!(
                        "Failed to reattach kernel driver to interface {}: {}",
                        interface, e
                    ),
                }
            }
        }

        if let Err(e) = handle.close() {
            warn!("Failed to close device [{}]: {}", self.identifier, e);
        }

        self.state = SessionState::Closed;
        debug!("Closed device [{}]", self.identifier);
    }

    pub fn identifier(&self) -> DeviceIdentifier {
        self.identifier
    }

    pub fn location(&self) -> DeviceLocation {
        self.location
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn claimed_interface(&self) -> Option<u8> {
        self.claimed_interface
    }

    /// Whether a kernel driver was bound before this session detached it
    pub fn kernel_driver_was_attached(&self) -> bool {
        !self.detached_interfaces.is_empty()
    }

    /// Interfaces this session detached a kernel driver from
    pub fn detached_interfaces(&self) -> &[u8] {
        &self.detached_interfaces
    }
}

impl<H: UsbHandle> Drop for DeviceSession<H> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<H: UsbHandle> fmt::Debug for DeviceSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("identifier", &self.identifier)
            .field("location", &self.location)
            .field("claimed_interface", &self.claimed_interface)
            .field("detached_interfaces", &self.detached_interfaces)
            .field("state", &self.state)
            .finish()
    }
}
