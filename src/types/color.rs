//! Packed 24-bit RGB color.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// An RGB color packed as `0xRRGGBB`.
///
/// The device reports and accepts colors as decimal integers; the hex form is
/// only used for display and parsing.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use yeelight_rs::Rgb;
///
/// let red = Rgb::from_str("ff0000").unwrap();
/// assert_eq!(red.value(), 16711680);
/// assert_eq!(red.to_string(), "ff0000");
/// ```
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Rgb {
    pub(crate) value: u32,
}

impl Rgb {
    const MAX: u32 = 0xff_ffff;

    /// Create a color from its components.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            value: (u32::from(red) << 16) | (u32::from(green) << 8) | u32::from(blue),
        }
    }

    /// Create a color from a packed value. Returns `None` above `0xffffff`.
    pub fn create(value: u32) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self { value })
        } else {
            None
        }
    }

    /// The packed `0xRRGGBB` value sent on the wire.
    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn red(&self) -> u8 {
        (self.value >> 16) as u8
    }

    pub fn green(&self) -> u8 {
        (self.value >> 8) as u8
    }

    pub fn blue(&self) -> u8 {
        self.value as u8
    }

    /// Lowercase hex without a prefix, zero padded to six digits.
    pub fn to_hex(&self) -> String {
        format!("{:06x}", self.value)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}", self.value)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    /// Parse from a hex string, with or without a `#` or `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Error> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .unwrap_or(trimmed);
        u32::from_str_radix(digits, 16)
            .ok()
            .and_then(Self::create)
            .ok_or_else(|| Error::InvalidColorString(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        let color = Rgb::rgb(0x12, 0x34, 0x56);
        assert_eq!(color.value(), 0x123456);
        assert_eq!((color.red(), color.green(), color.blue()), (0x12, 0x34, 0x56));
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::from_str("#00ff00").unwrap().value(), 0x00ff00);
        assert_eq!(Rgb::from_str("0xff").unwrap().to_hex(), "0000ff");
        assert!(Rgb::from_str("1000000").is_err());
        assert_eq!(
            Rgb::from_str("zz").unwrap_err(),
            Error::InvalidColorString("zz".into())
        );
    }
}
