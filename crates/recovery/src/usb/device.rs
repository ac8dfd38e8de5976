//! libusb-backed bus and device handle
//!
//! Wraps rusb's context and device handles, caching the descriptor strings
//! read when the device is opened.

use crate::usb::bus::{ControlChannel, LookupError, UsbBus};
use crate::usb::transfers::{execute_control_out, map_rusb_error};
use common::{ControlRequest, DeviceMode, DeviceSummary, UsbError, UsbId};
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, UsbContext};
use tracing::{debug, warn};

/// Host USB subsystem through libusb
pub struct HostBus {
    context: Context,
}

impl HostBus {
    /// Create a new libusb context
    pub fn new() -> Result<Self, UsbError> {
        let context = Context::new().map_err(map_rusb_error)?;
        Ok(Self { context })
    }
}

impl UsbBus for HostBus {
    type Channel = HostDevice;

    fn open(&self, id: UsbId) -> Result<Option<HostDevice>, LookupError> {
        let devices = self
            .context
            .devices()
            .map_err(|e| LookupError::Enumerate(map_rusb_error(e)))?;

        for device in devices.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    debug!(
                        "Skipping device bus={} addr={}: {}",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                    continue;
                }
            };

            if descriptor.vendor_id() != id.vendor_id || descriptor.product_id() != id.product_id {
                continue;
            }

            debug!(
                "Matched {} at bus={} addr={}",
                id,
                device.bus_number(),
                device.address()
            );
            return HostDevice::open(device, &descriptor)
                .map(Some)
                .map_err(LookupError::Open);
        }

        Ok(None)
    }

    fn list_devices(&self) -> Result<Vec<DeviceSummary>, UsbError> {
        let devices = self.context.devices().map_err(map_rusb_error)?;
        let mut summaries = Vec::with_capacity(devices.len());

        for device in devices.iter() {
            match device.device_descriptor() {
                Ok(descriptor) => {
                    let id = UsbId::new(descriptor.vendor_id(), descriptor.product_id());
                    // Strings are best-effort: an unopenable device is still listed
                    let summary = if reads_strings(id) {
                        match device.open() {
                            Ok(handle) => read_summary(&device, &descriptor, &handle),
                            Err(_) => bare_summary(&device, &descriptor),
                        }
                    } else {
                        bare_summary(&device, &descriptor)
                    };
                    summaries.push(summary);
                }
                Err(e) => warn!("Failed to read device descriptor: {}", e),
            }
        }

        debug!("Enumerated {} devices", summaries.len());
        Ok(summaries)
    }
}

/// Opened USB device
///
/// The underlying libusb handle is closed when this value is dropped.
pub struct HostDevice {
    handle: DeviceHandle<Context>,
    summary: DeviceSummary,
}

impl HostDevice {
    fn open(device: Device<Context>, descriptor: &DeviceDescriptor) -> Result<Self, UsbError> {
        let handle = device.open().map_err(|e| {
            warn!("Failed to open device: {}", e);
            map_rusb_error(e)
        })?;

        let summary = read_summary(&device, descriptor, &handle);
        debug!("Opened device {}", summary.id);

        Ok(Self { handle, summary })
    }
}

impl ControlChannel for HostDevice {
    fn write_control(&mut self, request: &ControlRequest) -> Result<(), UsbError> {
        execute_control_out(&self.handle, request)
    }

    fn summary(&self) -> DeviceSummary {
        self.summary.clone()
    }
}

impl Drop for HostDevice {
    fn drop(&mut self) {
        debug!("Releasing device {}", self.summary.id);
    }
}

/// Only restricted-mode devices are opened while listing
fn reads_strings(id: UsbId) -> bool {
    DeviceMode::from_usb_id(id).is_some()
}

fn bare_summary<T: UsbContext>(
    device: &Device<T>,
    descriptor: &DeviceDescriptor,
) -> DeviceSummary {
    DeviceSummary::bare(
        UsbId::new(descriptor.vendor_id(), descriptor.product_id()),
        device.bus_number(),
        device.address(),
    )
}

/// Read string descriptors from device
fn read_summary<T: UsbContext>(
    device: &Device<T>,
    descriptor: &DeviceDescriptor,
    handle: &DeviceHandle<T>,
) -> DeviceSummary {
    let read =
        |index: Option<u8>| index.and_then(|idx| handle.read_string_descriptor_ascii(idx).ok());

    DeviceSummary {
        manufacturer: read(descriptor.manufacturer_string_index()),
        product: read(descriptor.product_string_index()),
        serial_number: read(descriptor.serial_number_string_index()),
        ..bare_summary(device, descriptor)
    }
}
