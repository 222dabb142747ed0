//! # Teleshake CLI
//!
//! ```bash
//! # Run the configured phase program on COM6
//! teleshake run --config teleshake.toml
//!
//! # Shake at 1200 spm for five seconds
//! teleshake shake --speed 1200 --duration 5 --port /dev/ttyUSB0
//!
//! # Send raw bytes and capture the answer
//! teleshake send-raw --output response.txt 33 48 0 0 0 81
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use teleshake::{Device, DeviceConfig};

mod commands;
mod logging;
mod raw;
mod shutdown;

use shutdown::Shutdown;

/// Teleshake shaker controller
#[derive(Parser, Debug)]
#[command(name = "teleshake")]
#[command(about = "Control H+P Teleshake shakers over RS232", long_about = None)]
#[command(version)]
struct Cli {
    /// Serial port (overrides the configuration file)
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for teleshake.log
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    /// Debug-level protocol logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize and run the configured phase program
    Run,

    /// Shake once at a fixed speed
    Shake {
        /// Shakes per minute (at least 1000)
        #[arg(short, long)]
        speed: u32,

        /// Hold time in seconds
        #[arg(short, long)]
        duration: f64,
    },

    /// Stop the device
    Stop,

    /// Read device info, last error and cycle time
    Query,

    /// Send raw bytes and record everything received
    SendRaw {
        /// Response file (overwritten)
        #[arg(short, long)]
        output: PathBuf,

        /// Second file the response is appended to
        #[arg(long)]
        append: Option<PathBuf>,

        /// Capture window in seconds
        #[arg(long, default_value_t = 5.0)]
        window: f64,

        /// Decimal byte values
        #[arg(required = true)]
        bytes: Vec<u8>,
    },

    /// List serial ports
    Ports,
}

fn load_config(cli: &Cli) -> Result<DeviceConfig> {
    let mut config = match &cli.config {
        Some(path) => DeviceConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => DeviceConfig::default(),
    };
    if let Some(port) = &cli.port {
        config = config.with_port(port.clone());
    }
    Ok(config)
}

async fn execute(device: &mut Device, command: &Commands, shutdown: Shutdown) -> Result<()> {
    match command {
        Commands::Run => commands::run(device, shutdown).await,
        Commands::Shake { speed, duration } => {
            commands::shake(device, *speed, *duration, shutdown).await
        }
        Commands::Stop => commands::stop(device).await,
        Commands::Query => commands::query(device).await,
        Commands::SendRaw {
            output,
            append,
            window,
            bytes,
        } => {
            let window = Duration::try_from_secs_f64(*window)
                .with_context(|| format!("Invalid capture window: {window}"))?;
            commands::send_raw(device, bytes, output, append.as_deref(), window).await
        }
        Commands::Ports => commands::ports(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(&cli.log_dir, cli.verbose)?;

    if let Commands::Ports = cli.command {
        return commands::ports();
    }

    let config = load_config(&cli)?;
    let mut device = Device::from_config(config)?;

    let shutdown = Shutdown::install().await;
    device.connect().await?;

    let outcome = execute(&mut device, &cli.command, shutdown).await;

    // stop (if needed) and release the port on every exit path
    let closed = device.close().await;
    if let Err(e) = &closed {
        error!("Failed to close device: {}", e);
    }

    outcome?;
    closed?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send_raw() {
        let cli = Cli::try_parse_from([
            "teleshake", "send-raw", "-o", "out.txt", "--append", "all.txt", "33", "48", "0",
            "0", "0", "81",
        ])
        .unwrap();

        match cli.command {
            Commands::SendRaw {
                bytes,
                append,
                window,
                ..
            } => {
                assert_eq!(bytes, vec![33, 48, 0, 0, 0, 81]);
                assert_eq!(append, Some(PathBuf::from("all.txt")));
                assert_eq!(window, 5.0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_out_of_range_byte() {
        assert!(Cli::try_parse_from(["teleshake", "send-raw", "-o", "o", "256"]).is_err());
    }

    #[test]
    fn test_port_override() {
        let cli = Cli::try_parse_from(["teleshake", "stop", "--port", "/dev/ttyUSB1"]).unwrap();
        let config = load_config(&cli).unwrap();

        assert_eq!(config.port, "/dev/ttyUSB1");
        assert_eq!(config.device_address, 1);
    }
}
