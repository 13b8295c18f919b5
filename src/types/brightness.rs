//! Brightness control for Yeelight lights.

use serde::{Deserialize, Serialize};

/// Brightness level from 0 to 100 percent.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Brightness {
    const MAX: u8 = 100;

    pub fn new() -> Self {
        Brightness { value: Self::MAX }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is above 100.
    ///
    /// # Examples
    ///
    /// ```
    /// use yeelight_rs::Brightness;
    ///
    /// assert_eq!(Brightness::create(0).unwrap().value(), 0);
    /// assert_eq!(Brightness::create(100).unwrap().value(), 100);
    /// assert!(Brightness::create(101).is_none());
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        if Self::is_valid(value) {
            Some(Brightness { value })
        } else {
            None
        }
    }

    /// Returns default (100%) if value is invalid.
    pub fn create_or(value: u8) -> Self {
        Self::create(value).unwrap_or_else(Self::new)
    }

    fn is_valid(value: u8) -> bool {
        value <= Self::MAX
    }
}
