//! USB identifier types shared across crates
//!
//! Defines the identifier pairs a device reports in its restricted boot
//! modes, the control request shape used to address it, and the transport
//! fault taxonomy.

use std::fmt;
use thiserror::Error;

/// Apple USB vendor ID (shared by every mode)
pub const APPLE_VENDOR_ID: u16 = 0x05AC;

/// USB vendor/product identifier pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsbId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl UsbId {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Restricted boot mode a device can be found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceMode {
    /// Recovery mode - device shows the "connect to computer" screen
    Recovery,
    /// Device Firmware Update mode - screen stays black
    Dfu,
    /// "What The Flash" low-level restore mode
    Wtf,
}

impl DeviceMode {
    /// Modes the exit trigger searches for, in search order
    pub const EXIT_TARGETS: [DeviceMode; 2] = [DeviceMode::Recovery, DeviceMode::Dfu];

    /// Every mode recognised when scanning the bus
    pub const ALL: [DeviceMode; 3] = [DeviceMode::Recovery, DeviceMode::Dfu, DeviceMode::Wtf];

    /// Identifier pair advertised in this mode
    pub const fn usb_id(self) -> UsbId {
        match self {
            DeviceMode::Recovery => UsbId::new(APPLE_VENDOR_ID, 0x1281),
            DeviceMode::Dfu => UsbId::new(APPLE_VENDOR_ID, 0x1227),
            DeviceMode::Wtf => UsbId::new(APPLE_VENDOR_ID, 0x1222),
        }
    }

    /// Look up the mode advertised by an identifier pair
    pub fn from_usb_id(id: UsbId) -> Option<DeviceMode> {
        Self::ALL.into_iter().find(|mode| mode.usb_id() == id)
    }

    pub const fn name(self) -> &'static str {
        match self {
            DeviceMode::Recovery => "Recovery Mode",
            DeviceMode::Dfu => "DFU Mode",
            DeviceMode::Wtf => "WTF Mode",
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Control transfer setup parameters with an empty data stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    /// bmRequestType
    pub request_type: u8,
    /// bRequest
    pub request: u8,
    /// wValue
    pub value: u16,
    /// wIndex
    pub index: u16,
}

impl ControlRequest {
    /// Bit 7 of bmRequestType clear means host-to-device
    pub fn is_host_to_device(&self) -> bool {
        (self.request_type & 0x80) == 0
    }
}

impl fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request_type={:#04x}, request={:#04x}, value={:#06x}, index={:#06x}",
            self.request_type, self.request, self.value, self.index
        )
    }
}

/// Attached device as seen during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub id: UsbId,
    pub bus_number: u8,
    pub device_address: u8,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

impl DeviceSummary {
    /// Summary with no string descriptors
    pub fn bare(id: UsbId, bus_number: u8, device_address: u8) -> Self {
        Self {
            id,
            bus_number,
            device_address,
            manufacturer: None,
            product: None,
            serial_number: None,
        }
    }
}

/// USB transport fault
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsbError {
    #[error("transfer timed out")]
    Timeout,
    #[error("endpoint stalled")]
    Pipe,
    #[error("device disconnected")]
    NoDevice,
    #[error("entity not found")]
    NotFound,
    #[error("device busy")]
    Busy,
    #[error("buffer overflow")]
    Overflow,
    #[error("input/output error")]
    Io,
    #[error("invalid parameter")]
    InvalidParam,
    #[error("access denied (insufficient permissions)")]
    Access,
    #[error("{message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_identifier_pairs() {
        assert_eq!(DeviceMode::Recovery.usb_id(), UsbId::new(0x05AC, 0x1281));
        assert_eq!(DeviceMode::Dfu.usb_id(), UsbId::new(0x05AC, 0x1227));
        assert_eq!(DeviceMode::Wtf.usb_id(), UsbId::new(0x05AC, 0x1222));
    }

    #[test]
    fn test_exit_targets_search_recovery_first() {
        assert_eq!(
            DeviceMode::EXIT_TARGETS,
            [DeviceMode::Recovery, DeviceMode::Dfu]
        );
    }

    #[test]
    fn test_from_usb_id() {
        assert_eq!(
            DeviceMode::from_usb_id(UsbId::new(0x05AC, 0x1227)),
            Some(DeviceMode::Dfu)
        );
        assert_eq!(DeviceMode::from_usb_id(UsbId::new(0x05AC, 0x12a8)), None);
        assert_eq!(DeviceMode::from_usb_id(UsbId::new(0x1234, 0x1281)), None);
    }

    #[test]
    fn test_usb_id_display() {
        assert_eq!(UsbId::new(0x05AC, 0x1281).to_string(), "05ac:1281");
    }

    #[test]
    fn test_control_request_direction() {
        let vendor_out = ControlRequest {
            request_type: 0x40,
            request: 0,
            value: 0,
            index: 0,
        };
        assert!(vendor_out.is_host_to_device());

        let vendor_in = ControlRequest {
            request_type: 0xC0,
            ..vendor_out
        };
        assert!(!vendor_in.is_host_to_device());
    }

    #[test]
    fn test_usb_error_display() {
        assert_eq!(UsbError::Pipe.to_string(), "endpoint stalled");
        let other = UsbError::Other {
            message: "libusb exploded".to_string(),
        };
        assert_eq!(other.to_string(), "libusb exploded");
    }
}
