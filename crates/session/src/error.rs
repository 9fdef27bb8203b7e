//! Session error types
//!
//! Each session operation has its own error enum. All of them can be reduced
//! to an [`ErrorKind`] and, where the host stack was involved, its numeric
//! error code.

use crate::host::HostError;
use crate::session::SessionState;
use descriptor::{DescriptorError, DeviceIdentifier};
use std::fmt;
use thiserror::Error;

/// Coarse classification shared by all session errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    HostStackInitFailed,
    NotFound,
    OpenFailed,
    DetachFailed,
    ConfigurationFailed,
    ClaimFailed,
    DescriptorReadFailed,
    InvalidState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::HostStackInitFailed => "host stack init failed",
            ErrorKind::NotFound => "not found",
            ErrorKind::OpenFailed => "open failed",
            ErrorKind::DetachFailed => "detach failed",
            ErrorKind::ConfigurationFailed => "configuration failed",
            ErrorKind::ClaimFailed => "claim failed",
            ErrorKind::DescriptorReadFailed => "descriptor read failed",
            ErrorKind::InvalidState => "invalid state",
        };
        f.write_str(name)
    }
}

/// Errors from locating and opening a device
#[derive(Debug, Error)]
pub enum OpenError {
    /// The host USB stack could not be initialised
    #[error("Couldn't initialise the USB host stack: {0}")]
    HostStackInitFailed(HostError),

    /// No attached device matches the identifier
    #[error("Couldn't find device [{0}]")]
    NotFound(DeviceIdentifier),

    /// A matching device exists but the host refused to open it
    #[error("Couldn't open device [{identifier}]: {source}")]
    OpenFailed {
        identifier: DeviceIdentifier,
        source: HostError,
    },
}

impl OpenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpenError::HostStackInitFailed(_) => ErrorKind::HostStackInitFailed,
            OpenError::NotFound(_) => ErrorKind::NotFound,
            OpenError::OpenFailed { .. } => ErrorKind::OpenFailed,
        }
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            OpenError::HostStackInitFailed(e) | OpenError::OpenFailed { source: e, .. } => {
                Some(e.code)
            }
            OpenError::NotFound(_) => None,
        }
    }
}

/// Errors from detaching, configuring and claiming
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("Failed to detach kernel driver from interface {interface}: {source}")]
    DetachFailed { interface: u8, source: HostError },

    #[error("Failed to set device configuration to {configuration}: {source}")]
    ConfigurationFailed { configuration: u8, source: HostError },

    #[error("Failed to claim interface {interface}: {source}")]
    ClaimFailed { interface: u8, source: HostError },

    #[error("Cannot prepare a session that is {0}")]
    InvalidState(SessionState),
}

impl PrepareError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PrepareError::DetachFailed { .. } => ErrorKind::DetachFailed,
            PrepareError::ConfigurationFailed { .. } => ErrorKind::ConfigurationFailed,
            PrepareError::ClaimFailed { .. } => ErrorKind::ClaimFailed,
            PrepareError::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            PrepareError::DetachFailed { source, .. }
            | PrepareError::ConfigurationFailed { source, .. }
            | PrepareError::ClaimFailed { source, .. } => Some(source.code),
            PrepareError::InvalidState(_) => None,
        }
    }
}

/// Errors from reading descriptors
#[derive(Debug, Error)]
pub enum DescriptorReadError {
    /// The control request itself failed
    #[error("Failed to get device descriptor: {0}")]
    DescriptorReadFailed(HostError),

    /// The device answered with fewer bytes than the descriptor needs
    #[error("Failed to get device descriptor: short read of {actual} bytes (expected {expected})")]
    ShortRead { expected: usize, actual: usize },

    /// The bytes are not a device descriptor
    #[error("Failed to decode device descriptor: {0}")]
    Malformed(#[from] DescriptorError),

    /// Failed to read a string descriptor
    #[error("Failed to read string descriptor {index}: {source}")]
    StringReadFailed { index: u8, source: HostError },

    #[error("Cannot read descriptors from a session that is {0}")]
    InvalidState(SessionState),
}

impl DescriptorReadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DescriptorReadError::InvalidState(_) => ErrorKind::InvalidState,
            _ => ErrorKind::DescriptorReadFailed,
        }
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            DescriptorReadError::DescriptorReadFailed(e)
            | DescriptorReadError::StringReadFailed { source: e, .. } => Some(e.code),
            _ => None,
        }
    }
}
