//! Common utilities for exit-recovery
//!
//! This crate provides the pieces shared by the recovery tooling: error
//! handling, logging setup, and the USB identifier and device-mode types.

pub mod error;
pub mod logging;
pub mod usb_types;

pub use error::{Error, Result};
pub use logging::setup_logging;
pub use usb_types::{APPLE_VENDOR_ID, ControlRequest, DeviceMode, DeviceSummary, UsbError, UsbId};
