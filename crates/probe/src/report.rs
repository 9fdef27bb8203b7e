//! Human and JSON rendering of probe results

use descriptor::{DeviceDescriptor, DeviceIdentifier, DeviceLocation, DeviceSummary, class_name};
use serde::Serialize;
use session::{DeviceSession, UsbHandle};
use std::fmt;
use tracing::debug;

/// String descriptors referenced by the device descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStrings {
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

impl DeviceStrings {
    /// Read whichever strings the descriptor points at
    ///
    /// A string the device refuses to return is left out.
    pub fn read<H: UsbHandle>(session: &DeviceSession<H>, descriptor: &DeviceDescriptor) -> Self {
        let read = |index: Option<u8>| {
            index.and_then(|i| match session.read_string_descriptor(i) {
                Ok(s) => Some(s),
                Err(e) => {
                    debug!("{}", e);
                    None
                }
            })
        };

        Self {
            manufacturer: read(descriptor.manufacturer_string_index()),
            product: read(descriptor.product_string_index()),
            serial_number: read(descriptor.serial_number_string_index()),
        }
    }
}

/// Everything learned about a device in one probe run
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub identifier: DeviceIdentifier,
    pub location: DeviceLocation,
    pub interface: u8,
    pub configuration: u8,
    pub kernel_driver_detached: bool,
    pub descriptor: DeviceDescriptor,
    pub strings: DeviceStrings,
}

impl ProbeReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.descriptor;
        let s = &self.strings;

        writeln!(
            f,
            "Device [{}] at {} ({})",
            self.identifier, self.location, self.location.speed
        )?;
        writeln!(
            f,
            "  Interface {} claimed under configuration {}{}",
            self.interface,
            self.configuration,
            if self.kernel_driver_detached {
                ", kernel driver detached"
            } else {
                ""
            }
        )?;
        writeln!(f, "Device descriptor:")?;
        writeln!(f, "  bLength             {}", d.length)?;
        writeln!(f, "  bDescriptorType     {}", d.descriptor_type)?;
        writeln!(f, "  bcdUSB              {}", d.usb_version)?;
        writeln!(
            f,
            "  bDeviceClass        {} {}",
            d.device_class,
            class_name(d.device_class)
        )?;
        writeln!(f, "  bDeviceSubClass     {}", d.device_sub_class)?;
        writeln!(f, "  bDeviceProtocol     {}", d.device_protocol)?;
        writeln!(f, "  bMaxPacketSize0     {}", d.max_packet_size_0)?;
        writeln!(f, "  idVendor            {:#06x}", d.vendor_id)?;
        writeln!(f, "  idProduct           {:#06x}", d.product_id)?;
        writeln!(f, "  bcdDevice           {}", d.device_version)?;
        write_string_field(f, "iManufacturer", d.manufacturer_index, &s.manufacturer)?;
        write_string_field(f, "iProduct", d.product_index, &s.product)?;
        write_string_field(f, "iSerial", d.serial_number_index, &s.serial_number)?;
        writeln!(f, "  bNumConfigurations  {}", d.num_configurations)?;
        write!(f, "Device reported its revision [{}]", d.device_version)
    }
}

fn write_string_field(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    index: u8,
    value: &Option<String>,
) -> fmt::Result {
    match value {
        Some(v) => writeln!(f, "  {:<20}{} {}", name, index, v),
        None => writeln!(f, "  {:<20}{}", name, index),
    }
}

/// One line per attached device, lsusb style
pub fn render_listing(devices: &[DeviceSummary]) -> String {
    if devices.is_empty() {
        return "No USB devices found.".to_string();
    }

    devices
        .iter()
        .map(|d| format!("{} ID {} ({})", d.location, d.identifier, d.location.speed))
        .collect::<Vec<_>>()
        .join("\n")
}
