//! Discover Hue bridges and make every light of each one blink.
//!
//! Expects the username of an already registered app in `HUE_USERNAME`.
//!
//! Run with: HUE_USERNAME=... cargo run --example discover_and_blink

use hue_bridge_rs::{Alert, DiscoveryEvent, DiscoveryOptions, StateUpdate, spawn_discovery};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let username = std::env::var("HUE_USERNAME")?;

    println!("Discovering Hue bridges on the network...");
    let mut discovery = spawn_discovery(DiscoveryOptions::default());

    while let Some(event) = discovery.next().await {
        let found = match event {
            DiscoveryEvent::Bridge(found) => found,
            DiscoveryEvent::Error(e) => {
                eprintln!("  Discovery method failed: {}", e);
                continue;
            }
        };
        println!("Found bridge at {}", found.host);

        let bridge = found.into_bridge(Some(username.as_str()))?;
        if let Err(e) = bridge.refresh().await {
            eprintln!("  Failed to load {}: {}", bridge.host(), e);
            continue;
        }

        for light in bridge.lights().await {
            match bridge
                .update_light(light.identifier(), StateUpdate::from(&Alert::Select))
                .await
            {
                Ok(_) => println!("  Blinking {}", light.name().unwrap_or(light.identifier())),
                Err(e) => eprintln!("  Failed to blink {}: {}", light.identifier(), e),
            }
        }
        bridge.flush().await?;
    }

    println!("\nDone!");
    Ok(())
}
