//! Power state and the light mode selected when switching on.

use serde::{Deserialize, Serialize};

/// Which mode the light enters when it is switched on.
///
/// [`PowerMode::Normal`] keeps the last mode and is omitted from the command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerMode {
    #[default]
    Normal = 0,
    ColorTemperature = 1,
    Rgb = 2,
    Hsv = 3,
    ColorFlow = 4,
    NightLight = 5,
}

impl PowerMode {
    pub fn id(&self) -> u8 {
        *self as u8
    }
}

/// Wire representation of the power property (`"on"` / `"off"`).
pub(crate) fn power_str(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}
