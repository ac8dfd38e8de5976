//! USB transfer execution
//!
//! Synchronous control transfers through rusb, with rusb errors mapped onto
//! the shared [`UsbError`] taxonomy.

use common::{ControlRequest, UsbError};
use rusb::{DeviceHandle, UsbContext};
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for control transfers (5 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Execute a host-to-device control transfer with an empty data stage
///
/// Control transfers always go to endpoint 0, so no interface needs to be
/// claimed beforehand.
pub fn execute_control_out<T: UsbContext>(
    handle: &DeviceHandle<T>,
    request: &ControlRequest,
) -> Result<(), UsbError> {
    if !request.is_host_to_device() {
        warn!("Refusing device-to-host request on OUT path: {}", request);
        return Err(UsbError::InvalidParam);
    }

    debug!("Control transfer: {}", request);

    match handle.write_control(
        request.request_type,
        request.request,
        request.value,
        request.index,
        &[],
        DEFAULT_TIMEOUT,
    ) {
        Ok(_len) => {
            debug!("Control transfer accepted");
            Ok(())
        }
        Err(e) => {
            let error = map_rusb_error(e);
            warn!("Control transfer failed: {}", error);
            Err(error)
        }
    }
}

/// Map rusb::Error to UsbError
pub fn map_rusb_error(err: rusb::Error) -> UsbError {
    match err {
        rusb::Error::Timeout => UsbError::Timeout,
        rusb::Error::Pipe => UsbError::Pipe,
        rusb::Error::NoDevice => UsbError::NoDevice,
        rusb::Error::NotFound => UsbError::NotFound,
        rusb::Error::Busy => UsbError::Busy,
        rusb::Error::Overflow => UsbError::Overflow,
        rusb::Error::Io => UsbError::Io,
        rusb::Error::InvalidParam => UsbError::InvalidParam,
        rusb::Error::Access => UsbError::Access,
        _ => UsbError::Other {
            message: err.to_string(),
        },
    }
}
