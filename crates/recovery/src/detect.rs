//! Recovery-family device detection
//!
//! Scans the bus for devices advertising any restricted boot mode. Nothing
//! is sent to the devices found.

use crate::usb::UsbBus;
use common::{DeviceMode, DeviceSummary, UsbError};
use tracing::debug;

/// Attached device in a restricted boot mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedDevice {
    pub mode: DeviceMode,
    pub summary: DeviceSummary,
}

/// List attached devices in recovery, DFU or WTF mode
pub fn detect_recovery_devices<B: UsbBus>(bus: &B) -> Result<Vec<DetectedDevice>, UsbError> {
    let detected: Vec<DetectedDevice> = bus
        .list_devices()?
        .into_iter()
        .filter_map(|summary| {
            DeviceMode::from_usb_id(summary.id).map(|mode| DetectedDevice { mode, summary })
        })
        .collect();

    debug!("Detected {} recovery-family devices", detected.len());
    Ok(detected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBus;
    use common::UsbId;

    #[test]
    fn test_detect_filters_unrelated_devices() {
        let bus = MockBus::new()
            .with_device(UsbId::new(0x1d6b, 0x0002))
            .with_device(DeviceMode::Wtf.usb_id())
            .with_device(UsbId::new(0x05AC, 0x12a8))
            .with_device(DeviceMode::Recovery.usb_id());

        let modes: Vec<DeviceMode> = detect_recovery_devices(&bus)
            .unwrap()
            .into_iter()
            .map(|device| device.mode)
            .collect();

        assert_eq!(modes, vec![DeviceMode::Wtf, DeviceMode::Recovery]);
    }

    #[test]
    fn test_detect_sends_nothing() {
        let bus = MockBus::new().with_device(DeviceMode::Dfu.usb_id());

        detect_recovery_devices(&bus).unwrap();
        assert!(bus.sent_requests().is_empty());
    }
}
