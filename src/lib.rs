//! # yeelight_rs
//!
//! An async Rust library for controlling Yeelight smart lights on the local network.
//!
//! Commands travel over a TCP connection to the device's command port (55443 by
//! default) as one JSON object per CRLF-terminated line. Device state is learned
//! through an SSDP-style multicast search whose replies carry every property as a
//! `Key: Value` header.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use yeelight_rs::{Light, Line, Rgb};
//!
//! async fn control_light() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut light = Light::new("yeelight://192.168.1.239:55443".parse()?, None);
//!
//!     light.set_color(Line::Primary, Rgb::rgb(255, 0, 0)).await?;
//!     let reply = light.read_response().await?;
//!     println!("{}", String::from_utf8_lossy(&reply));
//!
//!     if light.refresh_state(Duration::from_secs(2)).await? {
//!         println!("power: {:?}", light.power());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Runtime Agnostic**: Works with tokio, async-std, or smol async runtimes
//! - **Capabilities**: Power, brightness, color temperature, RGB and HSV through [`Capability`],
//!   each targeting the primary or background element ([`Line`])
//! - **Full Method Set**: Color flows ([`FlowExpression`]), [`Scene`]s, timers, adjustments,
//!   music mode and renaming via [`Light`] or raw [`Request`]s
//! - **Discovery**: Probe one device with [`probe`] or find all of them with [`discover_bulbs`]
//! - **Change Events**: [`LightState`] records real changes into [`PendingEvents`]
//!
//! ## Runtime Selection
//!
//! This library is runtime-agnostic. Select your preferred runtime using feature flags:
//!
//! ### Using tokio (default)
//!
//! ```toml
//! [dependencies]
//! yeelight-rs = "0.1"
//! tokio = { version = "1", features = ["rt-multi-thread", "macros"] }
//! ```
//!
//! ### Using async-std
//!
//! ```toml
//! [dependencies]
//! yeelight-rs = { version = "0.1", default-features = false, features = ["runtime-async-std"] }
//! async-std = { version = "1.12", features = ["attributes"] }
//! ```
//!
//! ### Using smol
//!
//! ```toml
//! [dependencies]
//! yeelight-rs = { version = "0.1", default-features = false, features = ["runtime-smol"] }
//! smol = "2"
//! ```
//!
//! ## Feature Flags
//!
//! - `runtime-tokio` (default): Use the tokio async runtime
//! - `runtime-async-std`: Use the async-std runtime
//! - `runtime-smol`: Use the smol runtime

mod capability;
mod command;
mod connection;
mod discovery;
mod errors;
mod light;
pub mod runtime;
mod state;
mod types;

// Re-export public API
pub use capability::Capability;
pub use command::{Command, CommandCodec, Method, Request};
pub use discovery::{
    DiscoveredBulb, DiscoveryResponse, MULTICAST_ADDR, discover_bulbs, parse_headers, probe,
};
pub use errors::Error;
pub use light::Light;
pub use state::{ActiveColor, LightState, PendingEvents, Property, PropertyValue};
pub use types::{
    AdjustAction, AdjustProperty, Brightness, ColorMode, CronType, Effect, FlowAction,
    FlowExpression, FlowMode, FlowTuple, HueSaturation, Kelvin, Line, Location, PowerMode, Rgb,
    Scene, Transition, changing_state,
};
