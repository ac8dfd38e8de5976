//! Control request addressing strategies
//!
//! Devices disagree on how the reboot request must be addressed, so the
//! trigger walks a fixed list of strategies and stops at the first one the
//! device accepts.

use common::ControlRequest;
use std::fmt;

/// bRequest code asking the device to reboot
pub const REBOOT_REQUEST: u8 = 0x00;

/// Way of addressing the reboot request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingStrategy {
    /// Vendor request, device recipient, host-to-device
    Vendor,
    /// Class request, interface recipient, host-to-device
    Class,
}

impl AddressingStrategy {
    /// Strategies in the order they are tried
    pub const ORDER: [AddressingStrategy; 2] =
        [AddressingStrategy::Vendor, AddressingStrategy::Class];

    /// bmRequestType byte sent with this strategy
    pub const fn request_type(self) -> u8 {
        match self {
            AddressingStrategy::Vendor => 0x40,
            AddressingStrategy::Class => 0x21,
        }
    }

    /// Reboot request addressed with this strategy
    pub const fn reboot_request(self) -> ControlRequest {
        ControlRequest {
            request_type: self.request_type(),
            request: REBOOT_REQUEST,
            value: 0,
            index: 0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AddressingStrategy::Vendor => "primary (vendor)",
            AddressingStrategy::Class => "fallback (class)",
        }
    }
}

impl fmt::Display for AddressingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:#04x}]", self.label(), self.request_type())
    }
}
