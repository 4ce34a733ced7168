//! CLI application for controlling lights behind a Hue bridge.
//!
//! Run with: cargo run --example hue_cli -- --help

use clap::{Parser, Subcommand};
use std::time::Duration;
use hue_bridge_rs::{
    Alert, Bridge, ColorTemperature, DiscoveryOptions, Hue, Saturation, StateUpdate,
    discover_bridges,
};

#[derive(Parser)]
#[command(name = "hue-cli")]
#[command(about = "Control Philips Hue lights from the command line", long_about = None)]
struct Cli {
    /// Host of the bridge (not required for discover command)
    #[arg(short = 'H', long, global = true)]
    host: Option<String>,

    /// API username obtained with the register command
    #[arg(short, long, global = true, env = "HUE_USERNAME")]
    username: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover Hue bridges on the network
    Discover {
        /// Discovery timeout in seconds (default: 10)
        #[arg(short, long, default_value = "10")]
        timeout: u64,
    },

    /// Register a new username (press the link button first)
    Register {
        #[arg(default_value = "hue_cli#terminal")]
        app_name: String,
    },

    /// List lights and groups
    List,

    /// Turn a light on
    On { light: String },

    /// Turn a light off
    Off { light: String },

    /// Set brightness (0-100%)
    Brightness {
        light: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },

    /// Set hue (0-360 degrees) and saturation (0-100%)
    Color {
        light: String,
        degrees: f32,
        #[arg(default_value = "100")]
        saturation: u8,
    },

    /// Set color temperature in Kelvin (2000-6500)
    Temperature {
        light: String,
        #[arg(value_parser = clap::value_parser!(u32).range(2000..=6500))]
        kelvin: u32,
    },

    /// Make a light blink once
    Blink { light: String },

    /// Turn every light of a group on or off
    Group {
        group: String,
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },

    /// Print diagnostics and request history
    Diagnostics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::Discover { timeout } = cli.command {
        println!("Discovering Hue bridges (timeout: {}s)...", timeout);
        let options = DiscoveryOptions {
            timeout: Duration::from_secs(timeout),
            ..DiscoveryOptions::default()
        };
        match discover_bridges(&options).await {
            Ok(bridges) if bridges.is_empty() => println!("No bridges found on the network."),
            Ok(bridges) => {
                println!("\nFound {} bridge(s):", bridges.len());
                for bridge in bridges {
                    println!(
                        "  Host: {:15}  ID: {}",
                        bridge.host,
                        bridge.id.as_deref().unwrap_or("-")
                    );
                }
            }
            Err(e) => eprintln!("Error during discovery: {}", e),
        }
        return Ok(());
    }

    let host = cli.host.ok_or("Bridge host is required for this command. Use --host <HOST>")?;
    let bridge = Bridge::new(&host, cli.username.as_deref())?;

    if let Commands::Register { app_name } = &cli.command {
        let username = bridge.request_username(app_name).await?;
        println!("Registered. Username: {}", username);
        return Ok(());
    }

    bridge.refresh().await?;

    match cli.command {
        Commands::Discover { .. } | Commands::Register { .. } => unreachable!(),

        Commands::List => {
            println!("Lights:");
            for light in bridge.lights().await {
                println!(
                    "  {:>3}  {:24}  {:3}  bri {:>3}  {}",
                    light.identifier(),
                    light.name().unwrap_or("?"),
                    if light.is_on() { "ON" } else { "OFF" },
                    light.brightness().map(|b| b.value()).unwrap_or(0),
                    if light.is_reachable() { "" } else { "(unreachable)" }
                );
            }
            println!("\nGroups:");
            for group in bridge.groups().await {
                println!(
                    "  {:>3}  {:24}  {:?}  lights {:?}",
                    group.identifier(),
                    group.name(),
                    group.kind(),
                    group.light_ids()
                );
            }
        }

        Commands::On { light } => bridge.set_light_on(&light, true).await?,

        Commands::Off { light } => bridge.set_light_on(&light, false).await?,

        Commands::Brightness { light, percent } => {
            bridge
                .set_light_brightness(&light, f32::from(percent) / 100.0)
                .await?
        }

        Commands::Color {
            light,
            degrees,
            saturation,
        } => {
            let mut update = StateUpdate::new();
            update.on(true);
            update.hue(&Hue::from_degrees(degrees));
            update.saturation(&Saturation::from_normalized(f32::from(saturation) / 100.0));
            bridge.update_light(&light, update).await?;
        }

        Commands::Temperature { light, kelvin } => {
            let mut update = StateUpdate::new();
            update.on(true);
            update.color_temperature(&ColorTemperature::from_kelvin(kelvin));
            bridge.update_light(&light, update).await?;
        }

        Commands::Blink { light } => {
            bridge
                .update_light(&light, StateUpdate::from(&Alert::Select))
                .await?
        }

        Commands::Group { group, state } => bridge.set_group_on(&group, state == "on").await?,

        Commands::Diagnostics => {
            let diag = bridge.diagnostics().await;
            println!("Diagnostics:\n{}", serde_json::to_string_pretty(&diag)?);
        }
    }

    // Wait for queued writes before exiting
    bridge.flush().await?;
    if let Some(error) = bridge.history().await.last_error() {
        eprintln!("Bridge reported: {}", error);
    }
    Ok(())
}
