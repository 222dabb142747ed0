//! Single shake example

use std::time::Duration;
use teleshake::Device;

#[tokio::main]
async fn main() -> teleshake::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let port = std::env::var("TELESHAKE_PORT").unwrap_or_else(|_| "COM6".to_string());

    let mut device = Device::new(port);
    device.connect().await?;

    if !device.initialize().await? {
        println!("No broadcast response, continuing anyway");
    }

    // Shake at 1200 rpm for five seconds
    let ok = device.shake_for(1200, Duration::from_secs(5)).await;
    println!("Shake {}", if ok { "completed" } else { "failed" });

    device.close().await?;

    Ok(())
}
