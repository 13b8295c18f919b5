//! Value types for light control parameters.

mod adjust;
mod brightness;
mod color;
mod color_mode;
mod effect;
mod flow;
mod hue_saturation;
mod kelvin;
mod line;
mod location;
mod power;
mod scene;

pub use adjust::{AdjustAction, AdjustProperty, CronType};
pub use brightness::Brightness;
pub use color::Rgb;
pub use color_mode::ColorMode;
pub use effect::{Effect, Transition};
pub use flow::{FlowAction, FlowExpression, FlowMode, FlowTuple, changing_state};
pub use hue_saturation::HueSaturation;
pub use kelvin::Kelvin;
pub use line::Line;
pub use location::Location;
pub use power::PowerMode;
pub(crate) use power::power_str;
pub use scene::Scene;
