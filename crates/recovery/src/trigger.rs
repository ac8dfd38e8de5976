//! Recovery exit trigger
//!
//! Finds a device in recovery or DFU mode and asks it to reboot into normal
//! operation. The flow is linear: search each known identifier pair in
//! order, open the first match, then walk the addressing strategies until
//! one is accepted. There is no retry loop; every failure is terminal for
//! the invocation.

use crate::error::{FailedAttempt, RecoveryError};
use crate::strategy::AddressingStrategy;
use crate::usb::{ControlChannel, HostBus, LookupError, UsbBus};
use common::{DeviceMode, DeviceSummary};
use tracing::{debug, error, info, warn};

/// Outcome of a successful recovery exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    /// Mode the device was found in
    pub mode: DeviceMode,
    /// Device that accepted the request
    pub device: DeviceSummary,
    /// Strategy the device accepted
    pub strategy: AddressingStrategy,
    /// Strategies tried before the accepted one
    pub rejected: Vec<FailedAttempt>,
}

/// Single-shot recovery exit against one bus
pub struct RecoveryExitTrigger<B: UsbBus> {
    bus: B,
}

impl<B: UsbBus> RecoveryExitTrigger<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Open the first attached device in a mode we know how to exit
    ///
    /// Recovery mode is searched before DFU mode.
    pub fn locate(&self) -> Result<(DeviceMode, B::Channel), RecoveryError> {
        for mode in DeviceMode::EXIT_TARGETS {
            let id = mode.usb_id();
            debug!("Searching for {} device {}", mode, id);

            match self.bus.open(id) {
                Ok(Some(channel)) => {
                    info!("Found device in {} ({})", mode, id);
                    return Ok((mode, channel));
                }
                Ok(None) => debug!("No device attached as {}", id),
                Err(LookupError::Enumerate(source)) => {
                    return Err(RecoveryError::Transport {
                        stage: "enumerating devices",
                        source,
                    });
                }
                Err(LookupError::Open(source)) => {
                    return Err(RecoveryError::Transport {
                        stage: "opening device",
                        source,
                    });
                }
            }
        }

        Err(RecoveryError::DeviceNotFound {
            searched: DeviceMode::EXIT_TARGETS
                .iter()
                .map(|mode| mode.usb_id())
                .collect(),
        })
    }

    /// Locate a device and send it the reboot request
    ///
    /// The device handle is released before this returns.
    pub fn run(&self) -> Result<ExitReport, RecoveryError> {
        let (mode, mut channel) = self.locate()?;
        let device = channel.summary();
        log_device(&device);

        let mut rejected = Vec::new();
        for strategy in AddressingStrategy::ORDER {
            info!("Sending reboot request via {}", strategy);

            match channel.write_control(&strategy.reboot_request()) {
                Ok(()) => {
                    info!("Reboot request accepted via {}", strategy);
                    return Ok(ExitReport {
                        mode,
                        device,
                        strategy,
                        rejected,
                    });
                }
                Err(error) => {
                    warn!("Reboot request via {} failed: {}", strategy, error);
                    rejected.push(FailedAttempt { strategy, error });
                }
            }
        }

        Err(RecoveryError::TransferRejected {
            device: device.id,
            attempts: rejected,
        })
    }
}

/// Run the recovery exit against `bus` and log the outcome
pub fn exit_recovery_on<B: UsbBus>(bus: B) -> Result<ExitReport, RecoveryError> {
    let outcome = RecoveryExitTrigger::new(bus).run();
    match &outcome {
        Ok(report) => info!(
            "Device {} left {}; it should now reboot into normal mode",
            report.device.id, report.mode
        ),
        Err(e) => error!("{}", e),
    }
    outcome
}

/// Run the recovery exit against `bus`, collapsing the outcome to a boolean
pub fn exit_recovery_with<B: UsbBus>(bus: B) -> bool {
    exit_recovery_on(bus).is_ok()
}

/// Run the recovery exit against the host's USB subsystem
pub fn exit_recovery() -> Result<ExitReport, RecoveryError> {
    let bus = HostBus::new().map_err(|source| {
        let e = RecoveryError::Transport {
            stage: "initializing libusb",
            source,
        };
        error!("{}", e);
        e
    })?;
    exit_recovery_on(bus)
}

/// Try to bring an attached device out of recovery or DFU mode
///
/// Returns `true` if a device accepted the reboot request.
pub fn attempt_exit_recovery() -> bool {
    exit_recovery().is_ok()
}

/// Process exit code for an outcome: 0 on success, 1 on any failure
pub fn exit_code(outcome: &Result<ExitReport, RecoveryError>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(e) => e.exit_code(),
    }
}

fn log_device(device: &DeviceSummary) {
    info!(
        "Device {} on bus {:03} address {:03}",
        device.id, device.bus_number, device.device_address
    );
    if let Some(manufacturer) = &device.manufacturer {
        info!("  Manufacturer: {}", manufacturer);
    }
    if let Some(product) = &device.product {
        info!("  Product: {}", product);
    }
    if let Some(serial) = &device.serial_number {
        info!("  Serial: {}", serial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBus;
    use common::UsbError;

    #[test]
    fn test_locate_prefers_recovery_over_dfu() {
        let bus = MockBus::new()
            .with_device(DeviceMode::Dfu.usb_id())
            .with_device(DeviceMode::Recovery.usb_id());

        let (mode, _channel) = RecoveryExitTrigger::new(bus).locate().unwrap();
        assert_eq!(mode, DeviceMode::Recovery);
    }

    #[test]
    fn test_locate_ignores_wtf_mode() {
        let bus = MockBus::new().with_device(DeviceMode::Wtf.usb_id());

        let result = RecoveryExitTrigger::new(bus).locate();
        assert!(matches!(result, Err(RecoveryError::DeviceNotFound { .. })));
    }

    #[test]
    fn test_open_fault_is_labelled_opening_device() {
        let bus = MockBus::new()
            .with_device(DeviceMode::Recovery.usb_id())
            .with_open_error(DeviceMode::Recovery.usb_id(), UsbError::Access);

        match RecoveryExitTrigger::new(bus).run() {
            Err(RecoveryError::Transport { stage, source }) => {
                assert_eq!(stage, "opening device");
                assert_eq!(source, UsbError::Access);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_list_fault_is_labelled_enumerating_devices() {
        let bus = MockBus::new()
            .with_device(DeviceMode::Recovery.usb_id())
            .with_list_error(UsbError::NoDevice);

        match RecoveryExitTrigger::new(bus).run() {
            Err(RecoveryError::Transport { stage, source }) => {
                assert_eq!(stage, "enumerating devices");
                assert_eq!(source, UsbError::NoDevice);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_exit_code_success_and_failure() {
        let success = exit_recovery_on(MockBus::new().with_device(DeviceMode::Dfu.usb_id()));
        assert_eq!(exit_code(&success), 0);

        let failure = exit_recovery_on(MockBus::new());
        assert_eq!(exit_code(&failure), 1);
    }

    #[test]
    fn test_report_records_rejected_primary() {
        let bus = MockBus::new()
            .with_device(DeviceMode::Recovery.usb_id())
            .with_transfer_results(vec![Err(UsbError::Pipe), Ok(())]);

        let report = RecoveryExitTrigger::new(bus).run().unwrap();
        assert_eq!(report.strategy, AddressingStrategy::Class);
        assert_eq!(
            report.rejected,
            vec![FailedAttempt {
                strategy: AddressingStrategy::Vendor,
                error: UsbError::Pipe,
            }]
        );
    }
}
