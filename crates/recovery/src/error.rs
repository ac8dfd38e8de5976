//! Recovery exit error types

use crate::strategy::AddressingStrategy;
use common::{UsbError, UsbId};
use std::fmt;
use thiserror::Error;

/// One rejected strategy and the fault it raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub strategy: AddressingStrategy,
    pub error: UsbError,
}

impl fmt::Display for FailedAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

/// Why a recovery exit did not complete
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// None of the searched identifier pairs is attached
    #[error("No device found in recovery or DFU mode (searched {})", join(.searched))]
    DeviceNotFound { searched: Vec<UsbId> },

    /// A device matched but rejected every addressing strategy
    #[error("Device {device} rejected the reboot request ({})", join(.attempts))]
    TransferRejected {
        device: UsbId,
        attempts: Vec<FailedAttempt>,
    },

    /// Unexpected fault while enumerating or opening a device
    #[error("USB error while {stage}: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: UsbError,
    },
}

impl RecoveryError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        1
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::DeviceMode;

    #[test]
    fn test_device_not_found_display() {
        let err = RecoveryError::DeviceNotFound {
            searched: DeviceMode::EXIT_TARGETS
                .iter()
                .map(|mode| mode.usb_id())
                .collect(),
        };
        let msg = err.to_string();
        assert!(msg.contains("No device found"));
        assert!(msg.contains("05ac:1281, 05ac:1227"));
    }

    #[test]
    fn test_transfer_rejected_lists_attempts() {
        let err = RecoveryError::TransferRejected {
            device: DeviceMode::Recovery.usb_id(),
            attempts: vec![
                FailedAttempt {
                    strategy: AddressingStrategy::Vendor,
                    error: UsbError::Pipe,
                },
                FailedAttempt {
                    strategy: AddressingStrategy::Class,
                    error: UsbError::Timeout,
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("05ac:1281"));
        assert!(msg.contains("[0x40]: endpoint stalled"));
        assert!(msg.contains("[0x21]: transfer timed out"));
    }

    #[test]
    fn test_every_failure_exits_with_one() {
        let errors = [
            RecoveryError::DeviceNotFound { searched: vec![] },
            RecoveryError::TransferRejected {
                device: DeviceMode::Dfu.usb_id(),
                attempts: vec![],
            },
            RecoveryError::Transport {
                stage: "enumerating devices",
                source: UsbError::Access,
            },
        ];
        for err in errors {
            assert_eq!(err.exit_code(), 1);
        }
    }
}
