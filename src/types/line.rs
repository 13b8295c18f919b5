//! Channel selection on dual-element fixtures.

use serde::{Deserialize, Serialize};

/// Which light element a command targets.
///
/// Ceiling lights and some lamps carry a second "background" element driven by
/// the `bg_` prefixed methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Line {
    #[default]
    Primary,
    Background,
}

impl From<u8> for Line {
    /// 0 selects the primary element; anything else the background one.
    fn from(value: u8) -> Self {
        if value == 0 {
            Line::Primary
        } else {
            Line::Background
        }
    }
}
