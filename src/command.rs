//! Command encoding for the TCP control channel.
//!
//! Every command is a single JSON object `{"id", "method", "params"}`
//! terminated by CRLF. Replies are not awaited here; the id returned from
//! [`CommandCodec::encode`] lets the caller correlate them later.

use serde::Serialize;
use serde_json::{Value, json};
use serde_with::{DisplayFromStr, serde_as};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::Error;
use crate::state::Property;
use crate::types::{
    AdjustAction, AdjustProperty, Brightness, CronType, FlowAction, FlowExpression,
    HueSaturation, Kelvin, Line, PowerMode, Rgb, Scene, Transition, power_str,
};

type Result<T> = std::result::Result<T, Error>;

/// Frame delimiter expected by the device.
const DELIMITER: &[u8] = b"\r\n";

/// Protocol method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Method {
    GetProp,
    SetCtAbx,
    BgSetCtAbx,
    SetRgb,
    BgSetRgb,
    SetHsv,
    BgSetHsv,
    SetBright,
    BgSetBright,
    SetPower,
    BgSetPower,
    Toggle,
    BgToggle,
    SetDefault,
    BgSetDefault,
    StartCf,
    BgStartCf,
    StopCf,
    BgStopCf,
    SetScene,
    BgSetScene,
    CronAdd,
    CronGet,
    CronDel,
    SetAdjust,
    BgSetAdjust,
    SetMusic,
    SetName,
    DevToggle,
}

impl Method {
    /// The method addressing `line`.
    ///
    /// Methods without a background variant are returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use yeelight_rs::{Line, Method};
    ///
    /// assert_eq!(Method::SetBright.for_line(Line::Background), Method::BgSetBright);
    /// assert_eq!(Method::SetName.for_line(Line::Background), Method::SetName);
    /// ```
    pub fn for_line(self, line: Line) -> Self {
        if line == Line::Primary {
            return self;
        }
        match self {
            Method::SetCtAbx => Method::BgSetCtAbx,
            Method::SetRgb => Method::BgSetRgb,
            Method::SetHsv => Method::BgSetHsv,
            Method::SetBright => Method::BgSetBright,
            Method::SetPower => Method::BgSetPower,
            Method::Toggle => Method::BgToggle,
            Method::SetDefault => Method::BgSetDefault,
            Method::StartCf => Method::BgStartCf,
            Method::StopCf => Method::BgStopCf,
            Method::SetScene => Method::BgSetScene,
            Method::SetAdjust => Method::BgSetAdjust,
            other => other,
        }
    }
}

/// A method with its parameters, before an id is assigned.
///
/// The constructors mirror the device's method table; each one that has a
/// background variant takes a [`Line`].
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    params: Vec<Value>,
}

impl Request {
    pub fn new(method: Method, params: Vec<Value>) -> Self {
        Request { method, params }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn get_prop(properties: &[Property]) -> Self {
        let params = properties.iter().map(|p| json!(p.as_ref())).collect();
        Self::new(Method::GetProp, params)
    }

    /// `[on|off, effect, duration]`, plus the mode when it is not
    /// [`PowerMode::Normal`].
    pub fn set_power(line: Line, on: bool, transition: &Transition, mode: PowerMode) -> Self {
        let mut params = vec![json!(power_str(on))];
        params.extend(transition.params());
        if mode != PowerMode::Normal {
            params.push(json!(mode.id()));
        }
        Self::new(Method::SetPower.for_line(line), params)
    }

    pub fn set_bright(line: Line, brightness: &Brightness, transition: &Transition) -> Self {
        Self::with_transition(
            Method::SetBright.for_line(line),
            vec![json!(brightness.value())],
            transition,
        )
    }

    pub fn set_ct_abx(line: Line, kelvin: &Kelvin, transition: &Transition) -> Self {
        Self::with_transition(
            Method::SetCtAbx.for_line(line),
            vec![json!(kelvin.kelvin())],
            transition,
        )
    }

    pub fn set_rgb(line: Line, color: &Rgb, transition: &Transition) -> Self {
        Self::with_transition(
            Method::SetRgb.for_line(line),
            vec![json!(color.value())],
            transition,
        )
    }

    pub fn set_hsv(line: Line, hs: &HueSaturation, transition: &Transition) -> Self {
        Self::with_transition(
            Method::SetHsv.for_line(line),
            vec![json!(hs.hue()), json!(hs.saturation())],
            transition,
        )
    }

    pub fn toggle(line: Line) -> Self {
        Self::new(Method::Toggle.for_line(line), Vec::new())
    }

    pub fn set_default(line: Line) -> Self {
        Self::new(Method::SetDefault.for_line(line), Vec::new())
    }

    /// Start a color flow. A `count` of 0 repeats forever.
    pub fn start_cf(line: Line, count: u32, action: FlowAction, expression: &FlowExpression) -> Self {
        Self::new(
            Method::StartCf.for_line(line),
            vec![json!(count), json!(action.id()), expression.to_value()],
        )
    }

    pub fn stop_cf(line: Line) -> Self {
        Self::new(Method::StopCf.for_line(line), Vec::new())
    }

    pub fn set_scene(line: Line, scene: &Scene) -> Self {
        Self::new(Method::SetScene.for_line(line), scene.params())
    }

    pub fn cron_add(kind: CronType, minutes: u32) -> Self {
        Self::new(Method::CronAdd, vec![json!(kind.id()), json!(minutes)])
    }

    pub fn cron_get(kind: CronType) -> Self {
        Self::new(Method::CronGet, vec![json!(kind.id())])
    }

    pub fn cron_del(kind: CronType) -> Self {
        Self::new(Method::CronDel, vec![json!(kind.id())])
    }

    pub fn set_adjust(line: Line, action: AdjustAction, property: AdjustProperty) -> Self {
        Self::new(
            Method::SetAdjust.for_line(line),
            vec![json!(action.as_ref()), json!(property.as_ref())],
        )
    }

    /// `[1, host, port]` to start relaying to a music server, `[0]` to stop.
    pub fn set_music(server: Option<(&str, u16)>) -> Self {
        let params = match server {
            Some((host, port)) => vec![json!(1), json!(host), json!(port)],
            None => vec![json!(0)],
        };
        Self::new(Method::SetMusic, params)
    }

    pub fn set_name(name: &str) -> Self {
        Self::new(Method::SetName, vec![json!(name)])
    }

    pub fn dev_toggle() -> Self {
        Self::new(Method::DevToggle, Vec::new())
    }

    fn with_transition(method: Method, mut params: Vec<Value>, transition: &Transition) -> Self {
        params.extend(transition.params());
        Self::new(method, params)
    }
}

/// An outbound command with its sequence id.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    id: u64,
    #[serde_as(as = "DisplayFromStr")]
    method: Method,
    params: Vec<Value>,
}

impl Command {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// The JSON object followed by CRLF.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(self).map_err(Error::JsonDump)?;
        bytes.extend_from_slice(DELIMITER);
        Ok(bytes)
    }
}

/// Assigns sequence ids to outbound commands.
///
/// Ids start at 1 and increase by one per command. The counter is process
/// local and starts over for every new [`crate::Light`].
#[derive(Debug)]
pub struct CommandCodec {
    next_id: u64,
}

impl Default for CommandCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandCodec {
    pub fn new() -> Self {
        CommandCodec { next_id: 1 }
    }

    /// The id the next command will get.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Assign the next id to a request.
    pub fn command(&mut self, request: Request) -> Command {
        let id = self.next_id;
        self.next_id += 1;
        Command {
            id,
            method: request.method,
            params: request.params,
        }
    }

    /// Build and frame a command, returning its id and wire bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use yeelight_rs::{CommandCodec, Method};
    ///
    /// let mut codec = CommandCodec::new();
    /// let (id, bytes) = codec
    ///     .encode(Method::SetBright, vec![json!(50), json!("smooth"), json!(500)])
    ///     .unwrap();
    /// assert_eq!(id, 1);
    /// assert_eq!(
    ///     bytes,
    ///     b"{\"id\":1,\"method\":\"set_bright\",\"params\":[50,\"smooth\",500]}\r\n"
    /// );
    /// ```
    pub fn encode(&mut self, method: Method, params: Vec<Value>) -> Result<(u64, Vec<u8>)> {
        let command = self.command(Request::new(method, params));
        Ok((command.id, command.to_bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn brightness(value: u8) -> Brightness {
        Brightness::create(value).unwrap()
    }

    #[test]
    fn test_exact_framing() {
        let mut codec = CommandCodec::new();
        codec.encode(Method::Toggle, Vec::new()).unwrap();
        let request = Request::set_bright(
            Line::Primary,
            &brightness(50),
            &Transition::create(500).unwrap(),
        );
        let bytes = codec.command(request).to_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\"id\":2,\"method\":\"set_bright\",\"params\":[50,\"smooth\",500]}\r\n"
        );
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut codec = CommandCodec::new();
        let ids: Vec<u64> = (0..10)
            .map(|_| codec.encode(Method::Toggle, Vec::new()).unwrap().0)
            .collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
        assert_eq!(codec.next_id(), 11);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Method::SetCtAbx.to_string(), "set_ct_abx");
        assert_eq!(Method::BgStartCf.as_ref(), "bg_start_cf");
        assert_eq!(Method::from_str("dev_toggle").unwrap(), Method::DevToggle);
        for method in Method::iter() {
            let background = method.for_line(Line::Background);
            if background != method {
                assert_eq!(background.to_string(), format!("bg_{method}"));
            }
        }
    }

    #[test]
    fn test_set_power_params() {
        let sudden = Transition::sudden();
        let request = Request::set_power(Line::Primary, true, &sudden, PowerMode::Normal);
        assert_eq!(request.method(), Method::SetPower);
        assert_eq!(request.params(), &[json!("on"), json!("sudden"), json!(0)]);

        let smooth = Transition::create(300).unwrap();
        let request = Request::set_power(Line::Background, false, &smooth, PowerMode::NightLight);
        assert_eq!(request.method(), Method::BgSetPower);
        assert_eq!(
            request.params(),
            &[json!("off"), json!("smooth"), json!(300), json!(5)]
        );
    }

    #[test]
    fn test_color_params() {
        let sudden = Transition::sudden();
        let request = Request::set_rgb(Line::Background, &Rgb::rgb(255, 0, 0), &sudden);
        assert_eq!(request.method(), Method::BgSetRgb);
        assert_eq!(request.params(), &[json!(16711680), json!("sudden"), json!(0)]);

        let hs = HueSaturation::create(120, 80).unwrap();
        let request = Request::set_hsv(Line::Primary, &hs, &sudden);
        assert_eq!(
            request.params(),
            &[json!(120), json!(80), json!("sudden"), json!(0)]
        );
    }

    #[test]
    fn test_misc_params() {
        assert_eq!(Request::set_music(None).params(), &[json!(0)]);
        assert_eq!(
            Request::set_music(Some(("192.168.1.2", 54321))).params(),
            &[json!(1), json!("192.168.1.2"), json!(54321)]
        );
        assert_eq!(
            Request::set_adjust(Line::Primary, AdjustAction::Circle, AdjustProperty::Color).params(),
            &[json!("circle"), json!("color")]
        );
        assert_eq!(
            Request::cron_add(CronType::PowerOff, 15).params(),
            &[json!(0), json!(15)]
        );
        assert_eq!(
            Request::get_prop(&[Property::Power, Property::Bright]).params(),
            &[json!("power"), json!("bright")]
        );
        assert_eq!(Request::dev_toggle().method(), Method::DevToggle);
    }
}
