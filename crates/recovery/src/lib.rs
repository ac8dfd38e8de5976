//! Recovery-mode exit tooling
//!
//! Locates a device stuck in recovery or DFU mode and asks it to reboot
//! into normal operation with a single control transfer.

pub mod detect;
pub mod error;
pub mod strategy;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod trigger;
pub mod usb;

pub use detect::{DetectedDevice, detect_recovery_devices};
pub use error::{FailedAttempt, RecoveryError};
pub use strategy::AddressingStrategy;
pub use trigger::{
    ExitReport, RecoveryExitTrigger, attempt_exit_recovery, exit_code, exit_recovery,
    exit_recovery_on, exit_recovery_with,
};
pub use usb::{ControlChannel, HostBus, LookupError, UsbBus};
