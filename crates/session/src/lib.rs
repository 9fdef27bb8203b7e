//! USB device sessions
//!
//! Opens one USB device by vendor/product ID, prepares an interface for use
//! (kernel driver detach, configuration, claim), reads its device descriptor,
//! and tears everything down again on close.
//!
//! The host USB stack sits behind the [`UsbHost`] and [`UsbHandle`] traits:
//! - [`RusbHost`] drives libusb through rusb
//! - [`mock::FakeHost`] simulates a bus in memory for tests
//!
//! All calls are synchronous and block until the host stack answers.

pub mod error;
pub mod host;
pub mod mock;
pub mod rusb_host;
pub mod session;

// Re-export public types
pub use error::{DescriptorReadError, ErrorKind, OpenError, PrepareError};
pub use host::{HostError, UsbHandle, UsbHost};
pub use rusb_host::{RusbHandle, RusbHost};
pub use session::{DeviceSession, SessionOptions, SessionState};

/// Interface claimed when the caller does not pick one
pub const DEFAULT_INTERFACE: u8 = 0;

/// Configuration selected when the caller does not pick one
pub const DEFAULT_CONFIGURATION: u8 = 1;
