//! Last-known device state and change tracking.
//!
//! Property maps arrive from discovery replies and command replies as plain
//! `name -> value` strings. [`LightState::update`] routes each known name to a
//! typed setter; setters that actually change a value record it in
//! [`PendingEvents`], which the owner drains with [`LightState::take_events`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::command::Method;
use crate::types::{Brightness, ColorMode, HueSaturation, Kelvin, Rgb, power_str};

/// Property names reported by the device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, AsRefStr, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Property {
    Id,
    Model,
    FwVer,
    Support,
    Power,
    Bright,
    ColorMode,
    Ct,
    Rgb,
    Hue,
    Sat,
    Name,
}

impl Property {
    /// Whether changes to this property are reported as events.
    ///
    /// Identity fields (id, model, firmware, support, name) update silently.
    pub fn is_observable(&self) -> bool {
        matches!(
            self,
            Property::Power
                | Property::Bright
                | Property::ColorMode
                | Property::Ct
                | Property::Rgb
                | Property::Hue
                | Property::Sat
        )
    }
}

/// A typed value of an observable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValue {
    Power(bool),
    Bright(Brightness),
    ColorMode(ColorMode),
    Ct(Kelvin),
    Rgb(Rgb),
    Hue(u16),
    Sat(u8),
}

impl PropertyValue {
    /// Parse the raw wire value of `property`.
    ///
    /// Returns `None` for identity properties and for values that are
    /// malformed or out of range.
    pub fn parse(property: Property, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match property {
            Property::Power => match raw {
                "on" => Some(PropertyValue::Power(true)),
                "off" => Some(PropertyValue::Power(false)),
                _ => None,
            },
            Property::Bright => raw
                .parse::<u8>()
                .ok()
                .and_then(Brightness::create)
                .map(PropertyValue::Bright),
            Property::ColorMode => raw
                .parse::<u8>()
                .ok()
                .and_then(ColorMode::create)
                .map(PropertyValue::ColorMode),
            Property::Ct => raw
                .parse::<u16>()
                .ok()
                .and_then(Kelvin::create)
                .map(PropertyValue::Ct),
            // Reported as a decimal integer, e.g. 16711680 for ff0000.
            Property::Rgb => raw
                .parse::<u32>()
                .ok()
                .and_then(Rgb::create)
                .map(PropertyValue::Rgb),
            Property::Hue => raw
                .parse::<u16>()
                .ok()
                .filter(|hue| HueSaturation::valid_hue(*hue))
                .map(PropertyValue::Hue),
            Property::Sat => raw
                .parse::<u8>()
                .ok()
                .filter(|sat| HueSaturation::valid_saturation(*sat))
                .map(PropertyValue::Sat),
            _ => None,
        }
    }

    pub fn property(&self) -> Property {
        match self {
            PropertyValue::Power(_) => Property::Power,
            PropertyValue::Bright(_) => Property::Bright,
            PropertyValue::ColorMode(_) => Property::ColorMode,
            PropertyValue::Ct(_) => Property::Ct,
            PropertyValue::Rgb(_) => Property::Rgb,
            PropertyValue::Hue(_) => Property::Hue,
            PropertyValue::Sat(_) => Property::Sat,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Power(on) => f.write_str(power_str(*on)),
            PropertyValue::Bright(b) => write!(f, "{}", b.value()),
            PropertyValue::ColorMode(mode) => write!(f, "{}", mode.id()),
            PropertyValue::Ct(k) => write!(f, "{}", k.kelvin()),
            PropertyValue::Rgb(color) => write!(f, "{color}"),
            PropertyValue::Hue(hue) => write!(f, "{hue}"),
            PropertyValue::Sat(sat) => write!(f, "{sat}"),
        }
    }
}

/// Changes accumulated since the last drain.
///
/// Each property appears at most once and holds its latest value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEvents {
    changes: BTreeMap<Property, PropertyValue>,
}

impl PendingEvents {
    pub fn get(&self, property: Property) -> Option<&PropertyValue> {
        self.changes.get(&property)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, &PropertyValue)> {
        self.changes.iter().map(|(p, v)| (*p, v))
    }

    fn record(&mut self, value: PropertyValue) {
        self.changes.insert(value.property(), value);
    }

    /// Move everything out, leaving the buffer empty.
    fn take(&mut self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(std::mem::take(self))
        }
    }
}

impl IntoIterator for PendingEvents {
    type Item = (Property, PropertyValue);
    type IntoIter = std::collections::btree_map::IntoIter<Property, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// The color field that matches the active color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveColor {
    Rgb(Rgb),
    Temperature(Kelvin),
    Hsv(HueSaturation),
}

/// Last-known state of one device.
///
/// Color fields may be stale relative to `color_mode`; use
/// [`LightState::active_color`] for the authoritative one.
///
/// # Example
///
/// ```
/// use yeelight_rs::{LightState, Property, PropertyValue};
///
/// let mut state = LightState::default();
/// state.update([("power", "on"), ("rgb", "16711680")]);
/// assert_eq!(state.rgb_hex().as_deref(), Some("ff0000"));
///
/// let events = state.take_events().unwrap();
/// assert_eq!(events.get(Property::Power), Some(&PropertyValue::Power(true)));
/// assert!(state.take_events().is_none());
/// ```
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightState {
    id: Option<String>,
    model: Option<String>,
    fw_ver: Option<String>,
    support: Option<BTreeSet<String>>,
    power: Option<bool>,
    bright: Option<Brightness>,
    color_mode: Option<ColorMode>,
    ct: Option<Kelvin>,
    rgb: Option<Rgb>,
    hue: Option<u16>,
    sat: Option<u8>,
    name: Option<String>,
    /// Seconds since the unix epoch
    last_updated: Option<u64>,
    #[serde(skip)]
    events: PendingEvents,
}

impl LightState {
    /// Create a state that only knows the device model.
    pub fn with_model(model: Option<&str>) -> Self {
        LightState {
            model: model.map(String::from),
            ..Self::default()
        }
    }

    /// Apply a batch of `name -> value` pairs.
    ///
    /// Unknown names and malformed values are skipped. The update timestamp
    /// is refreshed even when nothing changed.
    pub fn update<I, K, V>(&mut self, properties: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in properties {
            self.apply(name.as_ref(), value.as_ref());
        }
        self.last_updated = Some(unix_now());
    }

    /// Apply a JSON object such as the `params` of a `props` notification.
    pub fn update_json(&mut self, properties: &serde_json::Map<String, Value>) {
        self.update(
            properties
                .iter()
                .filter_map(|(name, value)| json_scalar(value).map(|v| (name, v))),
        );
    }

    /// Drain pending change events.
    ///
    /// Returns `None` when nothing changed since the last call.
    pub fn take_events(&mut self) -> Option<PendingEvents> {
        self.events.take()
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn firmware_version(&self) -> Option<&str> {
        self.fw_ver.as_deref()
    }

    /// Method names from the `support` property.
    pub fn supported_methods(&self) -> Option<&BTreeSet<String>> {
        self.support.as_ref()
    }

    pub fn supports(&self, method: Method) -> bool {
        self.support
            .as_ref()
            .is_some_and(|methods| methods.contains(method.as_ref()))
    }

    pub fn power(&self) -> Option<bool> {
        self.power
    }

    pub fn brightness(&self) -> Option<Brightness> {
        self.bright
    }

    pub fn color_mode(&self) -> Option<ColorMode> {
        self.color_mode
    }

    pub fn color_temperature(&self) -> Option<Kelvin> {
        self.ct
    }

    pub fn rgb(&self) -> Option<Rgb> {
        self.rgb
    }

    /// The stored color as lowercase hex, e.g. `ff0000`.
    pub fn rgb_hex(&self) -> Option<String> {
        self.rgb.map(|color| color.to_hex())
    }

    pub fn hue(&self) -> Option<u16> {
        self.hue
    }

    pub fn saturation(&self) -> Option<u8> {
        self.sat
    }

    pub fn hue_saturation(&self) -> Option<HueSaturation> {
        HueSaturation::create(self.hue?, self.sat?)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// When the last batch of properties was applied.
    pub fn last_updated(&self) -> Option<SystemTime> {
        self.last_updated
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs))
    }

    /// The color matching the active color mode, if both are known.
    pub fn active_color(&self) -> Option<ActiveColor> {
        match self.color_mode? {
            ColorMode::Rgb => self.rgb.map(ActiveColor::Rgb),
            ColorMode::ColorTemperature => self.ct.map(ActiveColor::Temperature),
            ColorMode::Hsv => self.hue_saturation().map(ActiveColor::Hsv),
        }
    }

    fn apply(&mut self, name: &str, raw: &str) {
        let Ok(property) = Property::from_str(name) else {
            trace!("ignoring unknown property {name:?}");
            return;
        };

        match property {
            Property::Id => self.id = Some(raw.trim().to_string()),
            Property::Model => self.model = Some(raw.trim().to_string()),
            Property::FwVer => self.fw_ver = Some(raw.trim().to_string()),
            Property::Support => {
                self.support = Some(raw.split_whitespace().map(String::from).collect());
            }
            Property::Name => self.name = Some(raw.trim().to_string()),
            _ => match PropertyValue::parse(property, raw) {
                Some(value) => self.set(value),
                None => trace!("ignoring malformed {property} value {raw:?}"),
            },
        }
    }

    fn set(&mut self, value: PropertyValue) {
        let changed = match value {
            PropertyValue::Power(v) => replace(&mut self.power, v),
            PropertyValue::Bright(v) => replace(&mut self.bright, v),
            PropertyValue::ColorMode(v) => replace(&mut self.color_mode, v),
            PropertyValue::Ct(v) => replace(&mut self.ct, v),
            PropertyValue::Rgb(v) => replace(&mut self.rgb, v),
            PropertyValue::Hue(v) => replace(&mut self.hue, v),
            PropertyValue::Sat(v) => replace(&mut self.sat, v),
        };
        if changed {
            self.events.record(value);
        }
    }
}

/// Store `value` unless it is already there. Returns whether it changed.
fn replace<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    if slot.as_ref() == Some(&value) {
        return false;
    }
    *slot = Some(value);
    true
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repeated_update_records_once() {
        let mut state = LightState::default();
        state.update([("bright", "40")]);
        state.update([("bright", "40")]);

        let events = state.take_events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events.get(Property::Bright),
            Some(&PropertyValue::Bright(Brightness::create(40).unwrap()))
        );
    }

    #[test]
    fn test_loose_equality_across_representations() {
        let mut state = LightState::default();
        state.update_json(json!({"bright": 100, "ct": 4000}).as_object().unwrap());
        state.take_events();

        state.update([("bright", "100"), ("ct", " 4000 ")]);
        assert!(state.take_events().is_none());
    }

    #[test]
    fn test_events_keep_latest_value() {
        let mut state = LightState::default();
        state.update([("hue", "10")]);
        state.update([("hue", "20")]);

        let events: Vec<_> = state.take_events().unwrap().into_iter().collect();
        assert_eq!(events, vec![(Property::Hue, PropertyValue::Hue(20))]);
    }

    #[test]
    fn test_drain_clears_buffer() {
        let mut state = LightState::default();
        state.update([("power", "off")]);
        assert!(state.has_events());
        assert!(state.take_events().is_some());
        assert!(state.take_events().is_none());

        state.update([("power", "off")]);
        assert!(state.take_events().is_none());
    }

    #[test]
    fn test_rgb_stored_packed_exposed_hex() {
        let mut state = LightState::default();
        state.update([("rgb", "16711680")]);
        assert_eq!(state.rgb(), Some(Rgb::rgb(255, 0, 0)));
        assert_eq!(state.rgb_hex().as_deref(), Some("ff0000"));

        let events = state.take_events().unwrap();
        assert_eq!(events.get(Property::Rgb).unwrap().to_string(), "ff0000");
    }

    #[test]
    fn test_identity_fields_are_silent() {
        let mut state = LightState::default();
        state.update([
            ("id", "0x000000000015243f"),
            ("model", "color"),
            ("fw_ver", "18"),
            ("support", "get_prop set_default set_power toggle"),
            ("name", "desk"),
        ]);

        assert!(state.take_events().is_none());
        assert_eq!(state.id(), Some("0x000000000015243f"));
        assert_eq!(state.firmware_version(), Some("18"));
        assert_eq!(state.supported_methods().unwrap().len(), 4);
        assert!(state.supports(Method::Toggle));
        assert!(!state.supports(Method::BgToggle));
        assert_eq!(state.name(), Some("desk"));
    }

    #[test]
    fn test_unknown_and_malformed_are_ignored() {
        let mut state = LightState::default();
        state.update([
            ("Cache-Control", "max-age=3600"),
            ("bright", "bright"),
            ("ct", "99999"),
            ("power", "maybe"),
            ("sat", "101"),
        ]);

        assert!(state.take_events().is_none());
        assert!(state.brightness().is_none());
        assert!(state.last_updated().is_some());
    }

    #[test]
    fn test_timestamp_without_changes() {
        let mut state = LightState::default();
        assert!(state.last_updated().is_none());
        state.update(std::iter::empty::<(&str, &str)>());
        assert!(state.last_updated().is_some());
    }

    #[test]
    fn test_active_color_follows_mode() {
        let mut state = LightState::default();
        state.update([
            ("color_mode", "2"),
            ("ct", "2700"),
            ("rgb", "255"),
            ("hue", "100"),
            ("sat", "35"),
        ]);
        assert_eq!(
            state.active_color(),
            Some(ActiveColor::Temperature(Kelvin::create(2700).unwrap()))
        );

        state.update([("color_mode", "3")]);
        assert_eq!(
            state.active_color(),
            Some(ActiveColor::Hsv(HueSaturation::create(100, 35).unwrap()))
        );
    }

    #[test]
    fn test_events_not_serialized() {
        let mut state = LightState::with_model(Some("stripe"));
        state.update([("power", "on")]);

        let saved = serde_json::to_value(&state).unwrap();
        assert_eq!(saved["model"], json!("stripe"));
        assert_eq!(saved["power"], json!(true));
        assert!(saved.get("events").is_none());
        assert!(saved.get("rgb").is_none());

        let mut restored: LightState = serde_json::from_value(saved).unwrap();
        assert!(restored.take_events().is_none());
        assert_eq!(restored.power(), Some(true));
    }
}
