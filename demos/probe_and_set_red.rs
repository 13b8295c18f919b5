//! Find Yeelight devices on the network and set them to red.
//!
//! With an IP address argument only that device is probed; otherwise every
//! device answering the multicast search is used.
//!
//! Run with: cargo run --example probe_and_set_red [192.168.1.239]

use std::net::IpAddr;
use std::time::Duration;
use yeelight_rs::{Light, Line, Rgb, discover_bulbs, probe};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let window = Duration::from_secs(3);

    let lights: Vec<Light> = match std::env::args().nth(1) {
        Some(ip) => {
            let ip: IpAddr = ip.parse()?;
            println!("Probing {ip}...");
            vec![Light::from_discovery(&probe(ip, window).await?)]
        }
        None => {
            println!("Discovering Yeelight devices on the network...");
            discover_bulbs(window)
                .await?
                .into_iter()
                .map(|bulb| bulb.into_light())
                .collect()
        }
    };

    if lights.is_empty() {
        println!("No lights found on the network.");
        return Ok(());
    }

    println!("Found {} light(s):", lights.len());
    for light in &lights {
        println!(
            "  - {} ({}), power: {:?}",
            light.location(),
            light.state().model().unwrap_or("unknown model"),
            light.power()
        );
    }

    let red = Rgb::rgb(255, 0, 0);

    println!("\nSetting all lights to red...");
    for mut light in lights {
        match light.set_color(Line::Primary, red).await {
            Ok(id) => {
                let reply = light.read_response().await?;
                println!(
                    "  ✓ {} accepted command {id}: {}",
                    light.location(),
                    String::from_utf8_lossy(&reply).trim_end()
                );
            }
            Err(e) => eprintln!("  ✗ Failed to set {} to red: {}", light.location(), e),
        }
    }

    println!("\nDone!");
    Ok(())
}
