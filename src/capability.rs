//! Host-facing light capabilities.

use crate::command::Request;
use crate::errors::Error;
use crate::state::Property;
use crate::types::{Brightness, HueSaturation, Kelvin, Line, PowerMode, Rgb, Transition};

type Result<T> = std::result::Result<T, Error>;

/// A single capability operation with its target value.
///
/// Every capability maps onto one device method; the [`Line`] passed to
/// [`Capability::request`] picks the primary or `bg_` variant.
///
/// # Examples
///
/// ```
/// use yeelight_rs::{Brightness, Capability, Line, Method};
///
/// let request = Capability::Brightness(Brightness::create(40).unwrap())
///     .request(Line::Background)
///     .unwrap();
/// assert_eq!(request.method(), Method::BgSetBright);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Power(bool),
    Brightness(Brightness),
    ColorTemperature(Kelvin),
    Rgb(Rgb),
    Hsv(HueSaturation),
}

impl Capability {
    /// Smooth fade used when switching power.
    pub const POWER_TRANSITION_MS: u32 = 300;

    pub fn request(&self, line: Line) -> Result<Request> {
        let sudden = Transition::sudden();
        let request = match self {
            Capability::Power(on) => {
                let fade = Transition::create(Self::POWER_TRANSITION_MS)?;
                Request::set_power(line, *on, &fade, PowerMode::Normal)
            }
            Capability::Brightness(brightness) => Request::set_bright(line, brightness, &sudden),
            Capability::ColorTemperature(kelvin) => Request::set_ct_abx(line, kelvin, &sudden),
            Capability::Rgb(color) => Request::set_rgb(line, color, &sudden),
            Capability::Hsv(hs) => Request::set_hsv(line, hs, &sudden),
        };
        Ok(request)
    }

    /// The state properties this capability drives.
    pub fn properties(&self) -> &'static [Property] {
        match self {
            Capability::Power(_) => &[Property::Power],
            Capability::Brightness(_) => &[Property::Bright],
            Capability::ColorTemperature(_) => &[Property::Ct],
            Capability::Rgb(_) => &[Property::Rgb],
            Capability::Hsv(_) => &[Property::Hue, Property::Sat],
        }
    }
}
