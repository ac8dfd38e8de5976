//! Test utilities for the recovery crate
//!
//! Provides a scripted in-memory bus so the trigger and detection logic can
//! be exercised without hardware.
//!
//! # Example
//!
//! ```
//! use common::DeviceMode;
//! use recovery::test_utils::MockBus;
//! use recovery::RecoveryExitTrigger;
//!
//! let bus = MockBus::new().with_device(DeviceMode::Recovery.usb_id());
//! let report = RecoveryExitTrigger::new(bus.clone()).run().unwrap();
//! assert_eq!(report.mode, DeviceMode::Recovery);
//! assert_eq!(bus.sent_requests().len(), 1);
//! ```

use crate::usb::{ControlChannel, LookupError, UsbBus};
use common::{ControlRequest, DeviceSummary, UsbError, UsbId};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Create a mock DeviceSummary with descriptor strings filled in
pub fn create_mock_summary(id: UsbId, device_address: u8) -> DeviceSummary {
    DeviceSummary {
        id,
        bus_number: 1,
        device_address,
        manufacturer: Some("Apple Inc.".to_string()),
        product: Some(format!("Mock Device {:04x}", id.product_id)),
        serial_number: Some(format!("SN{:06}", device_address)),
    }
}

#[derive(Default)]
struct MockState {
    devices: Vec<DeviceSummary>,
    open_errors: Vec<(UsbId, UsbError)>,
    list_error: Option<UsbError>,
    transfer_results: VecDeque<Result<(), UsbError>>,
    reboot_on_accept: bool,
    opened: Vec<UsbId>,
    sent: Vec<ControlRequest>,
}

/// Scripted USB bus
///
/// Clones share state, so a test can keep one clone to inspect what the
/// code under test did with the other.
#[derive(Clone, Default)]
pub struct MockBus {
    state: Rc<RefCell<MockState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device with the given identifiers
    pub fn with_device(self, id: UsbId) -> Self {
        let address = self.state.borrow().devices.len() as u8 + 1;
        self.with_summary(create_mock_summary(id, address))
    }

    /// Attach a device described by `summary`
    pub fn with_summary(self, summary: DeviceSummary) -> Self {
        self.state.borrow_mut().devices.push(summary);
        self
    }

    /// Make opening `id` fail with `error`
    pub fn with_open_error(self, id: UsbId, error: UsbError) -> Self {
        self.state.borrow_mut().open_errors.push((id, error));
        self
    }

    /// Make enumeration fail with `error`
    ///
    /// Both `list_devices` and `open` fail, since `open` enumerates first.
    pub fn with_list_error(self, error: UsbError) -> Self {
        self.state.borrow_mut().list_error = Some(error);
        self
    }

    /// Results returned by successive control transfers
    ///
    /// Once the script runs out every transfer succeeds.
    pub fn with_transfer_results(self, results: Vec<Result<(), UsbError>>) -> Self {
        self.state.borrow_mut().transfer_results = results.into();
        self
    }

    /// Detach a device once it accepts a transfer, as a rebooting device would
    pub fn with_reboot_on_accept(self) -> Self {
        self.state.borrow_mut().reboot_on_accept = true;
        self
    }

    /// Control requests sent so far, in order
    pub fn sent_requests(&self) -> Vec<ControlRequest> {
        self.state.borrow().sent.clone()
    }

    /// Identifiers passed to `open`, in order
    pub fn opened_ids(&self) -> Vec<UsbId> {
        self.state.borrow().opened.clone()
    }

    /// Number of devices currently attached
    pub fn attached_count(&self) -> usize {
        self.state.borrow().devices.len()
    }
}

impl UsbBus for MockBus {
    type Channel = MockChannel;

    fn open(&self, id: UsbId) -> Result<Option<MockChannel>, LookupError> {
        let mut state = self.state.borrow_mut();
        state.opened.push(id);

        if let Some(error) = &state.list_error {
            return Err(LookupError::Enumerate(error.clone()));
        }
        if let Some((_, error)) = state.open_errors.iter().find(|(open_id, _)| *open_id == id) {
            return Err(LookupError::Open(error.clone()));
        }

        Ok(state
            .devices
            .iter()
            .find(|device| device.id == id)
            .cloned()
            .map(|summary| MockChannel {
                summary,
                state: Rc::clone(&self.state),
            }))
    }

    fn list_devices(&self) -> Result<Vec<DeviceSummary>, UsbError> {
        let state = self.state.borrow();
        match &state.list_error {
            Some(error) => Err(error.clone()),
            None => Ok(state.devices.clone()),
        }
    }
}

/// Device handle produced by [`MockBus`]
pub struct MockChannel {
    summary: DeviceSummary,
    state: Rc<RefCell<MockState>>,
}

impl ControlChannel for MockChannel {
    fn write_control(&mut self, request: &ControlRequest) -> Result<(), UsbError> {
        let mut state = self.state.borrow_mut();
        state.sent.push(*request);

        let result = state.transfer_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() && state.reboot_on_accept {
            let id = self.summary.id;
            state.devices.retain(|device| device.id != id);
        }
        result
    }

    fn summary(&self) -> DeviceSummary {
        self.summary.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::DeviceMode;

    #[test]
    fn test_mock_bus_open_missing_device() {
        let bus = MockBus::new();
        assert!(bus.open(DeviceMode::Recovery.usb_id()).unwrap().is_none());
        assert_eq!(bus.opened_ids(), vec![DeviceMode::Recovery.usb_id()]);
    }

    #[test]
    fn test_mock_channel_reboot_detaches_device() {
        let bus = MockBus::new()
            .with_device(DeviceMode::Dfu.usb_id())
            .with_reboot_on_accept();

        let mut channel = bus.open(DeviceMode::Dfu.usb_id()).unwrap().unwrap();
        channel
            .write_control(&ControlRequest {
                request_type: 0x40,
                request: 0,
                value: 0,
                index: 0,
            })
            .unwrap();

        assert_eq!(bus.attached_count(), 0);
    }
}
