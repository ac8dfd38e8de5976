//! exit-recovery
//!
//! Asks a device stuck in recovery or DFU mode to reboot into normal
//! operation. Exits 0 when a device accepted the request and 1 otherwise.

use anyhow::{Context, Result};
use clap::Parser;
use common::setup_logging;
use recovery::{HostBus, detect_recovery_devices, exit_code, exit_recovery};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "exit-recovery")]
#[command(
    author,
    version,
    about = "Reboot a device out of recovery or DFU mode"
)]
#[command(long_about = "
Looks for a device in recovery mode (05ac:1281), then DFU mode (05ac:1227),
and sends it a reboot control request. A vendor-addressed request is tried
first; if the device rejects it a class-addressed request is tried once.

EXAMPLES:
    # Exit recovery mode
    exit-recovery

    # Show devices in recovery, DFU or WTF mode without touching them
    exit-recovery --list

    # Run with debug logging
    exit-recovery --log-level debug

EXIT STATUS:
    0  a device accepted the reboot request
    1  no device found, or the device rejected every request
")]
struct Args {
    /// List devices in a restricted boot mode and exit
    #[arg(long)]
    list: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    setup_logging(&args.log_level).context("Failed to setup logging")?;

    info!("exit-recovery v{}", env!("CARGO_PKG_VERSION"));

    if args.list {
        return Ok(list_devices_mode());
    }

    let outcome = exit_recovery();
    Ok(ExitCode::from(exit_code(&outcome)))
}

/// List recovery-family devices and exit
fn list_devices_mode() -> ExitCode {
    let devices = match HostBus::new().and_then(|bus| detect_recovery_devices(&bus)) {
        Ok(devices) => devices,
        Err(e) => {
            error!("Failed to enumerate USB devices: {}", e);
            return ExitCode::from(1);
        }
    };

    if devices.is_empty() {
        println!("No devices in recovery, DFU or WTF mode found.");
    } else {
        println!("Found {} device(s):\n", devices.len());
        for device in devices {
            let summary = &device.summary;
            println!(
                "  {} - {} {}",
                summary.id,
                device.mode,
                summary.product.as_deref().unwrap_or("Unknown Product")
            );
            println!(
                "      Bus {:03} Device {:03}",
                summary.bus_number, summary.device_address
            );
            if let Some(serial) = &summary.serial_number {
                println!("      Serial: {}", serial);
            }
            println!();
        }
    }

    ExitCode::SUCCESS
}
