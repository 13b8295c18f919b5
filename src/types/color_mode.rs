//! Active color representation reported by the device.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Which color field is currently authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Serialize, Deserialize)]
pub enum ColorMode {
    Rgb = 1,
    ColorTemperature = 2,
    Hsv = 3,
}

impl ColorMode {
    /// Returns `None` for values the device protocol does not define.
    ///
    /// # Examples
    ///
    /// ```
    /// use yeelight_rs::ColorMode;
    ///
    /// assert_eq!(ColorMode::create(2), Some(ColorMode::ColorTemperature));
    /// assert_eq!(ColorMode::create(4), None);
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        ColorMode::iter().find(|mode| mode.id() == value)
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }
}
