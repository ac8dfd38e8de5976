//! USB host access
//!
//! The trigger talks to the bus through the [`UsbBus`] and [`ControlChannel`]
//! traits. [`HostBus`] is the libusb-backed implementation used by the binary.

pub mod bus;
pub mod device;
pub mod transfers;

pub use bus::{ControlChannel, LookupError, UsbBus};
pub use device::{HostBus, HostDevice};
