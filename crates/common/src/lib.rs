//! Common utilities for usb-probe
//!
//! This crate provides shared functionality between the session core and the
//! CLI: the shared error type, tracing setup, and builders for test fixtures.

pub mod error;
pub mod logging;
pub mod test_utils;

pub use error::{Error, Result};
pub use logging::{Verbosity, setup_logging};
