//! Bus and device handle seams

use common::{ControlRequest, DeviceSummary, UsbError, UsbId};
use thiserror::Error;

/// Fault raised while looking up a device by identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The device list could not be read
    #[error("enumerating devices: {0}")]
    Enumerate(UsbError),

    /// A matching device was found but could not be opened
    #[error("opening device: {0}")]
    Open(UsbError),
}

/// Host USB subsystem
pub trait UsbBus {
    /// Handle type returned by [`UsbBus::open`]
    type Channel: ControlChannel;

    /// Open the first attached device advertising `id`
    ///
    /// Returns `Ok(None)` when no attached device matches.
    fn open(&self, id: UsbId) -> Result<Option<Self::Channel>, LookupError>;

    /// Summaries of every attached device
    ///
    /// Descriptor strings are only read for devices in a restricted boot mode.
    fn list_devices(&self) -> Result<Vec<DeviceSummary>, UsbError>;
}

/// Open device handle able to issue control transfers on endpoint 0
///
/// The handle is released when dropped.
pub trait ControlChannel {
    /// Issue a host-to-device control transfer with no data stage
    fn write_control(&mut self, request: &ControlRequest) -> Result<(), UsbError>;

    /// Identifiers and descriptor strings of the opened device
    fn summary(&self) -> DeviceSummary;
}
