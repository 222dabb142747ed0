//! Subcommand implementations
//!
//! Each command runs against an already connected device; `main` owns
//! connecting and the final stop-and-disconnect.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use teleshake::{Device, Error, Phase, available_ports};

use crate::raw;
use crate::shutdown::Shutdown;

async fn initialize(device: &mut Device) -> Result<()> {
    if !device.initialize().await? {
        warn!("No answer to the initialization broadcast, continuing");
    }
    Ok(())
}

/// Treat a Ctrl+C as a clean exit; the device has been stopped already
fn interrupted_ok(result: teleshake::Result<()>, what: &str) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(Error::Interrupted) => {
            info!("{} interrupted by user", what);
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("{what} failed")),
    }
}

/// Ctrl+C arrived before the device was started; nothing to undo
fn cancelled_early(shutdown: &Shutdown, what: &str) -> bool {
    if shutdown.is_requested() {
        info!("{} cancelled by user before start", what);
        return true;
    }
    false
}

pub async fn run(device: &mut Device, shutdown: Shutdown) -> Result<()> {
    initialize(device).await?;

    let phases: Vec<Phase> = device.config().phases.clone();
    if phases.is_empty() {
        bail!("Configuration has no phases to run");
    }
    let total = phases
        .iter()
        .map(Phase::total_duration)
        .fold(Duration::ZERO, Duration::saturating_add);
    info!("Running {} phases ({:?})", phases.len(), total);

    if cancelled_early(&shutdown, "Shake sequence") {
        return Ok(());
    }
    let result = device.run_sequence_until(&phases, shutdown.requested()).await;
    interrupted_ok(result, "Shake sequence")
}

pub async fn shake(device: &mut Device, speed: u32, seconds: f64, shutdown: Shutdown) -> Result<()> {
    let duration = Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("Invalid duration: {seconds}"))?;

    initialize(device).await?;
    if cancelled_early(&shutdown, "Shake") {
        return Ok(());
    }
    let result = device
        .shake_for_until(speed, duration, shutdown.requested())
        .await;
    interrupted_ok(result, "Shake")
}

pub async fn stop(device: &mut Device) -> Result<()> {
    let response = device.try_stop().await?;
    println!("Stop: {}", response);
    Ok(())
}

pub async fn query(device: &mut Device) -> Result<()> {
    let info = device.get_info().await?;
    println!("Info:        {}", info);

    let last_error = device.get_last_error().await?;
    println!("Last error:  {}", last_error);

    let cycle = device.get_cycle_time().await?;
    match cycle.speed() {
        Some(speed) => println!("Cycle time:  {} ({} spm)", cycle, speed),
        None => println!("Cycle time:  {}", cycle),
    }
    Ok(())
}

pub async fn send_raw(
    device: &mut Device,
    bytes: &[u8],
    output: &Path,
    append: Option<&Path>,
    window: Duration,
) -> Result<()> {
    println!("Sending: {}", raw::format_bytes(bytes));

    let received = device.send_raw(bytes, window).await?;
    println!(
        "Received {} bytes: {}",
        received.len(),
        raw::format_bytes(&received)
    );

    raw::write_response(output, &received, false)?;
    if let Some(path) = append {
        raw::write_response(path, &received, true)?;
    }
    Ok(())
}

pub fn ports() -> Result<()> {
    let ports = available_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}", port);
    }
    Ok(())
}
