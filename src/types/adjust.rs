//! Relative adjustments and timer types.

use strum_macros::{AsRefStr, Display};

/// Direction of a `set_adjust` change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum AdjustAction {
    Increase,
    Decrease,
    /// Step to the next value, wrapping at the maximum
    Circle,
}

/// Property changed by `set_adjust`.
///
/// The device only accepts [`AdjustAction::Circle`] for [`AdjustProperty::Color`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum AdjustProperty {
    Bright,
    Ct,
    Color,
}

/// Timer kinds supported by `cron_add`, `cron_get` and `cron_del`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CronType {
    /// Switch the light off after the given number of minutes
    #[default]
    PowerOff = 0,
}

impl CronType {
    pub fn id(&self) -> u8 {
        *self as u8
    }
}
