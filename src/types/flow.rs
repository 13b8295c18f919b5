//! Color flow expressions for `start_cf`.
//!
//! A flow is a list of transition tuples `duration,mode,value,brightness`
//! played in order, joined by commas on the wire.

use std::fmt;

use serde_json::{Value, json};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::errors::Error;

use super::{Kelvin, Rgb};

type Result<T> = std::result::Result<T, Error>;

/// What a single flow step changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum FlowMode {
    Color = 1,
    ColorTemperature = 2,
    Sleep = 7,
}

impl FlowMode {
    pub fn id(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for FlowMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        FlowMode::iter()
            .find(|mode| mode.id() == value)
            .ok_or(Error::InvalidMode(value))
    }
}

/// What the light does once the flow has run `count` times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowAction {
    /// Return to the state before the flow started
    #[default]
    Recover = 0,
    /// Stay at the last step
    Stay = 1,
    /// Switch off
    TurnOff = 2,
}

impl FlowAction {
    pub fn id(&self) -> u8 {
        *self as u8
    }
}

/// One `duration,mode,value,brightness` step.
///
/// A brightness of -1 keeps the current brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTuple {
    duration: u32,
    mode: FlowMode,
    value: i64,
    brightness: i8,
}

impl FlowTuple {
    pub fn color(duration: u32, color: &Rgb, brightness: i8) -> Self {
        FlowTuple {
            duration,
            mode: FlowMode::Color,
            value: i64::from(color.value()),
            brightness,
        }
    }

    pub fn temperature(duration: u32, kelvin: &Kelvin, brightness: i8) -> Self {
        FlowTuple {
            duration,
            mode: FlowMode::ColorTemperature,
            value: i64::from(kelvin.kelvin()),
            brightness,
        }
    }

    pub fn sleep(duration: u32) -> Self {
        FlowTuple {
            duration,
            mode: FlowMode::Sleep,
            value: 0,
            brightness: 0,
        }
    }

    /// Build a step from a raw mode and a textual value.
    ///
    /// Color steps take the value as hex (`"ff0000"`); other modes take it as
    /// a decimal integer.
    pub fn parse(duration: u32, mode: u8, value: &str, brightness: i8) -> Result<Self> {
        let mode = FlowMode::try_from(mode)?;
        let trimmed = value.trim();
        let value = match mode {
            FlowMode::Color => u32::from_str_radix(trimmed, 16).map(i64::from).ok(),
            _ => trimmed.parse::<i64>().ok(),
        }
        .ok_or_else(|| Error::InvalidFlowValue(value.to_string()))?;

        Ok(FlowTuple {
            duration,
            mode,
            value,
            brightness,
        })
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn mode(&self) -> FlowMode {
        self.mode
    }
}

impl fmt::Display for FlowTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.duration,
            self.mode.id(),
            self.value,
            self.brightness
        )
    }
}

/// Render one flow step as its wire string.
///
/// # Examples
///
/// ```
/// use yeelight_rs::changing_state;
///
/// assert_eq!(changing_state(1000, 1, "ff0000", 80).unwrap(), "1000,1,16711680,80");
/// assert_eq!(changing_state(500, 2, "4000", 50).unwrap(), "500,2,4000,50");
/// assert!(changing_state(500, 5, "4000", 50).is_err());
/// ```
pub fn changing_state(duration: u32, mode: u8, value: &str, brightness: i8) -> Result<String> {
    FlowTuple::parse(duration, mode, value, brightness).map(|tuple| tuple.to_string())
}

/// An ordered list of flow steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowExpression {
    steps: Vec<FlowTuple>,
}

impl FlowExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step, builder style.
    pub fn then(mut self, step: FlowTuple) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: FlowTuple) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn to_value(&self) -> Value {
        json!(self.to_string())
    }
}

impl fmt::Display for FlowExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromIterator<FlowTuple> for FlowExpression {
    fn from_iter<I: IntoIterator<Item = FlowTuple>>(iter: I) -> Self {
        FlowExpression {
            steps: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_mode() {
        assert_eq!(
            changing_state(1000, 5, "ff0000", 80).unwrap_err(),
            Error::InvalidMode(5)
        );
        assert!(FlowMode::try_from(7).is_ok());
    }

    #[test]
    fn test_invalid_value() {
        assert_eq!(
            changing_state(1000, 2, "warm", 80).unwrap_err(),
            Error::InvalidFlowValue("warm".into())
        );
    }

    #[test]
    fn test_expression_joins_steps() {
        let expr = FlowExpression::new()
            .then(FlowTuple::color(1000, &Rgb::rgb(255, 0, 0), 100))
            .then(FlowTuple::sleep(500))
            .then(FlowTuple::temperature(1000, &Kelvin::create(2700).unwrap(), -1));
        assert_eq!(expr.len(), 3);
        assert_eq!(expr.to_string(), "1000,1,16711680,100,500,7,0,0,1000,2,2700,-1");
    }
}
