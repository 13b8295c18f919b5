//! Transition effects for "set" style commands.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum_macros::{AsRefStr, Display};

use crate::errors::Error;

/// How the light moves to a new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Change immediately
    Sudden,
    /// Fade over the transition duration
    Smooth,
}

/// An effect together with its duration in milliseconds.
///
/// A duration of 0 selects [`Effect::Sudden`]; 30 or more selects
/// [`Effect::Smooth`]. Anything in between is rejected.
///
/// # Examples
///
/// ```
/// use yeelight_rs::{Effect, Transition};
///
/// assert_eq!(Transition::create(0).unwrap().effect(), Effect::Sudden);
/// assert_eq!(Transition::create(30).unwrap().effect(), Effect::Smooth);
/// assert!(Transition::create(15).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    effect: Effect,
    duration: u32,
}

impl Transition {
    /// Shortest duration the device accepts for a smooth transition.
    pub const MIN_SMOOTH_MS: u32 = 30;

    pub fn sudden() -> Self {
        Transition {
            effect: Effect::Sudden,
            duration: 0,
        }
    }

    pub fn create(duration: u32) -> Result<Self, Error> {
        match duration {
            0 => Ok(Self::sudden()),
            d if d < Self::MIN_SMOOTH_MS => Err(Error::InvalidDuration(d)),
            d => Ok(Transition {
                effect: Effect::Smooth,
                duration: d,
            }),
        }
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// The `effect, duration` pair appended to command params.
    pub(crate) fn params(&self) -> [Value; 2] {
        [json!(self.effect.as_ref()), json!(self.duration)]
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::sudden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_band() {
        for d in 1..Transition::MIN_SMOOTH_MS {
            assert_eq!(Transition::create(d), Err(Error::InvalidDuration(d)));
        }
        let smooth = Transition::create(500).unwrap();
        assert_eq!(smooth.effect(), Effect::Smooth);
        assert_eq!(smooth.duration(), 500);
    }

    #[test]
    fn test_params() {
        let [effect, duration] = Transition::create(300).unwrap().params();
        assert_eq!(effect, json!("smooth"));
        assert_eq!(duration, json!(300));
    }
}
