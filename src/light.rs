//! Individual light control.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DisplayFromStr, serde_as};

use crate::capability::Capability;
use crate::command::{CommandCodec, Request};
use crate::connection::Connection;
use crate::discovery::{self, DiscoveryResponse};
use crate::errors::Error;
use crate::state::{LightState, PendingEvents, Property};
use crate::types::{
    AdjustAction, AdjustProperty, Brightness, CronType, FlowAction, FlowExpression,
    HueSaturation, Kelvin, Line, Location, PowerMode, Rgb, Scene, Transition,
};

type Result<T> = std::result::Result<T, Error>;

/// Represents a single Yeelight device.
///
/// A `Light` owns the command connection to one device together with its
/// last-known state. Commands are written over TCP and return the id they were
/// sent with; the reply is read separately with [`Light::read_response`].
/// State is refreshed from discovery replies and property maps.
///
/// # Example
///
/// ```
/// use yeelight_rs::Light;
///
/// let light = Light::new("yeelight://192.168.1.239:55443".parse().unwrap(), Some("color"));
/// assert_eq!(light.state().model(), Some("color"));
/// assert!(light.power().is_none());
/// assert!(!light.is_connected());
/// ```
#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
pub struct Light {
    #[serde_as(as = "DisplayFromStr")]
    location: Location,
    #[serde(flatten)]
    state: LightState,
    #[serde(skip)]
    connection: Connection,
    #[serde(skip)]
    codec: CommandCodec,
}

impl Light {
    pub fn new(location: Location, model: Option<&str>) -> Self {
        Light {
            location,
            state: LightState::with_model(model),
            connection: Connection::default(),
            codec: CommandCodec::new(),
        }
    }

    /// Build a light from a discovery reply, keeping every reported property.
    ///
    /// Falls back to the reply's source address when it carries no
    /// `Location` header.
    pub fn from_discovery(response: &DiscoveryResponse) -> Self {
        let location = response
            .location()
            .unwrap_or_else(|| Location::new(&response.ip().to_string(), Location::DEFAULT_PORT));
        let mut light = Light::new(location, None);
        light.update_state(response.properties());
        light
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn state(&self) -> &LightState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// The id the next command will be sent with.
    pub fn next_id(&self) -> u64 {
        self.codec.next_id()
    }

    /// Close the command connection. The next command reconnects.
    pub fn disconnect(&mut self) {
        self.connection.release();
    }

    /// Send a request and return the id it was sent with.
    ///
    /// The connection is opened first if needed; a failed connect does not
    /// consume an id. Nothing is read back.
    pub async fn send(&mut self, request: Request) -> Result<u64> {
        self.connection.obtain(&self.location).await?;
        let command = self.codec.command(request);
        debug!(
            "sending {} (id {}) to {}",
            command.method(),
            command.id(),
            self.location
        );
        let frame = command.to_bytes()?;
        self.connection.send(&self.location, &frame).await?;
        Ok(command.id())
    }

    /// Read the raw bytes of the next reply or notification.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        self.connection.read_reply().await
    }

    pub async fn get_prop(&mut self, properties: &[Property]) -> Result<u64> {
        self.send(Request::get_prop(properties)).await
    }

    /// Switch power with a transition of `duration` milliseconds.
    ///
    /// A duration of 0 is sudden; 1 to 29 is rejected before anything is sent.
    pub async fn set_power(
        &mut self,
        line: Line,
        on: bool,
        duration: u32,
        mode: PowerMode,
    ) -> Result<u64> {
        let transition = Transition::create(duration)?;
        self.send(Request::set_power(line, on, &transition, mode))
            .await
    }

    pub async fn set_bright(
        &mut self,
        line: Line,
        brightness: Brightness,
        duration: u32,
    ) -> Result<u64> {
        let transition = Transition::create(duration)?;
        self.send(Request::set_bright(line, &brightness, &transition))
            .await
    }

    pub async fn set_ct_abx(&mut self, line: Line, kelvin: Kelvin, duration: u32) -> Result<u64> {
        let transition = Transition::create(duration)?;
        self.send(Request::set_ct_abx(line, &kelvin, &transition))
            .await
    }

    pub async fn set_rgb(&mut self, line: Line, color: Rgb, duration: u32) -> Result<u64> {
        let transition = Transition::create(duration)?;
        self.send(Request::set_rgb(line, &color, &transition)).await
    }

    pub async fn set_hsv(&mut self, line: Line, hs: HueSaturation, duration: u32) -> Result<u64> {
        let transition = Transition::create(duration)?;
        self.send(Request::set_hsv(line, &hs, &transition)).await
    }

    pub async fn toggle(&mut self, line: Line) -> Result<u64> {
        self.send(Request::toggle(line)).await
    }

    /// Save the current state as the power-on default.
    pub async fn set_default(&mut self, line: Line) -> Result<u64> {
        self.send(Request::set_default(line)).await
    }

    /// Start a color flow. A `count` of 0 loops forever.
    pub async fn start_cf(
        &mut self,
        line: Line,
        count: u32,
        action: FlowAction,
        expression: &FlowExpression,
    ) -> Result<u64> {
        self.send(Request::start_cf(line, count, action, expression))
            .await
    }

    pub async fn stop_cf(&mut self, line: Line) -> Result<u64> {
        self.send(Request::stop_cf(line)).await
    }

    pub async fn set_scene(&mut self, line: Line, scene: &Scene) -> Result<u64> {
        self.send(Request::set_scene(line, scene)).await
    }

    /// Schedule `kind` to fire after `minutes`.
    pub async fn cron_add(&mut self, kind: CronType, minutes: u32) -> Result<u64> {
        self.send(Request::cron_add(kind, minutes)).await
    }

    pub async fn cron_get(&mut self, kind: CronType) -> Result<u64> {
        self.send(Request::cron_get(kind)).await
    }

    pub async fn cron_del(&mut self, kind: CronType) -> Result<u64> {
        self.send(Request::cron_del(kind)).await
    }

    pub async fn set_adjust(
        &mut self,
        line: Line,
        action: AdjustAction,
        property: AdjustProperty,
    ) -> Result<u64> {
        self.send(Request::set_adjust(line, action, property)).await
    }

    /// Enter music mode against `server`, or leave it with `None`.
    pub async fn set_music(&mut self, server: Option<(&str, u16)>) -> Result<u64> {
        self.send(Request::set_music(server)).await
    }

    pub async fn set_name(&mut self, name: &str) -> Result<u64> {
        self.send(Request::set_name(name)).await
    }

    /// Toggle both the primary and background elements.
    pub async fn dev_toggle(&mut self) -> Result<u64> {
        self.send(Request::dev_toggle()).await
    }

    /// Apply one capability to the given element.
    pub async fn apply(&mut self, capability: Capability, line: Line) -> Result<u64> {
        let request = capability.request(line)?;
        self.send(request).await
    }

    pub async fn turn_on(&mut self, line: Line) -> Result<u64> {
        self.set_power_state(line, true).await
    }

    pub async fn turn_off(&mut self, line: Line) -> Result<u64> {
        self.set_power_state(line, false).await
    }

    pub async fn set_power_state(&mut self, line: Line, on: bool) -> Result<u64> {
        self.apply(Capability::Power(on), line).await
    }

    pub async fn set_brightness(&mut self, line: Line, brightness: Brightness) -> Result<u64> {
        self.apply(Capability::Brightness(brightness), line).await
    }

    pub async fn set_color_temperature(&mut self, line: Line, kelvin: Kelvin) -> Result<u64> {
        self.apply(Capability::ColorTemperature(kelvin), line).await
    }

    pub async fn set_color(&mut self, line: Line, color: Rgb) -> Result<u64> {
        self.apply(Capability::Rgb(color), line).await
    }

    pub async fn set_hue_saturation(&mut self, line: Line, hs: HueSaturation) -> Result<u64> {
        self.apply(Capability::Hsv(hs), line).await
    }

    /// Cached power state.
    pub fn power(&self) -> Option<bool> {
        self.state.power()
    }

    pub fn brightness(&self) -> Option<Brightness> {
        self.state.brightness()
    }

    pub fn color_temperature(&self) -> Option<Kelvin> {
        self.state.color_temperature()
    }

    pub fn rgb(&self) -> Option<Rgb> {
        self.state.rgb()
    }

    pub fn hue_saturation(&self) -> Option<HueSaturation> {
        self.state.hue_saturation()
    }

    /// Apply a `name -> value` property batch.
    ///
    /// A `Location` entry moves the light; the open connection is released
    /// when the location actually changes.
    pub fn update_state<I, K, V>(&mut self, properties: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut location = None;
        let rest = properties.into_iter().filter(|(name, value)| {
            let name: &str = name.as_ref();
            if name == "Location" {
                let value: &str = value.as_ref();
                location = Some(value.to_string());
                false
            } else {
                true
            }
        });
        self.state.update(rest);

        if let Some(raw) = location {
            self.set_location(&raw);
        }
    }

    /// Apply a JSON property map such as the `params` of a notification.
    pub fn update_state_json(&mut self, properties: &Map<String, Value>) {
        self.state.update_json(properties);
        if let Some(Value::String(raw)) = properties.get("Location") {
            self.set_location(raw);
        }
    }

    /// Refresh the cached state from a discovery probe.
    ///
    /// Returns `Ok(false)` when the device did not answer within `window`;
    /// the cached values are left untouched in that case.
    pub async fn refresh_state(&mut self, window: Duration) -> Result<bool> {
        let Some(ip) = self.location.ip() else {
            return Err(Error::InvalidLocation(self.location.to_string()));
        };

        match discovery::probe(ip, window).await {
            Ok(response) => {
                self.update_state(response.properties());
                Ok(true)
            }
            Err(Error::DiscoveryTimeout(_)) => {
                debug!("no discovery reply from {ip}, keeping cached state");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Refresh, then return the state.
    pub async fn get_state(&mut self, window: Duration) -> Result<&LightState> {
        self.refresh_state(window).await?;
        Ok(&self.state)
    }

    /// Drain the property changes recorded since the last call.
    pub fn take_events(&mut self) -> Option<PendingEvents> {
        self.state.take_events()
    }

    fn set_location(&mut self, raw: &str) {
        match raw.parse::<Location>() {
            Ok(location) if location != self.location => {
                debug!("light moved from {} to {location}", self.location);
                self.disconnect();
                self.location = location;
            }
            Ok(_) => {}
            Err(e) => debug!("ignoring location {raw:?}: {e}"),
        }
    }
}

impl Drop for Light {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PropertyValue;

    #[test]
    fn test_location_update() {
        let mut light = Light::new(Location::new("192.168.1.2", 55443), None);
        light.update_state([("Location", "yeelight://192.168.1.3:55443"), ("power", "on")]);
        assert_eq!(light.location(), &Location::new("192.168.1.3", 55443));
        assert_eq!(light.power(), Some(true));

        light.update_state([("Location", "not a location:port")]);
        assert_eq!(light.location(), &Location::new("192.168.1.3", 55443));
    }

    #[test]
    fn test_update_state_json() {
        let mut light = Light::new(Location::new("192.168.1.2", 55443), None);
        let params = serde_json::json!({"power": "off", "bright": 10});
        light.update_state_json(params.as_object().unwrap());

        let events = light.take_events().unwrap();
        assert_eq!(events.get(Property::Power), Some(&PropertyValue::Power(false)));
        assert_eq!(light.brightness(), Brightness::create(10));
        assert!(light.take_events().is_none());
    }

    #[test]
    fn test_serde_skips_runtime_fields() {
        let mut light = Light::new(Location::new("192.168.1.2", 55443), Some("color"));
        light.update_state([("power", "on"), ("rgb", "16711680")]);

        let value = serde_json::to_value(&light).unwrap();
        assert_eq!(value["location"], "yeelight://192.168.1.2:55443");
        assert_eq!(value["model"], "color");
        assert_eq!(value["power"], true);
        assert!(value.get("events").is_none());
        assert!(value.get("connection").is_none());
        assert!(value.get("codec").is_none());

        let mut restored: Light = serde_json::from_value(value).unwrap();
        assert_eq!(restored.location(), light.location());
        assert_eq!(restored.rgb(), Some(Rgb::rgb(255, 0, 0)));
        assert_eq!(restored.next_id(), 1);
        assert!(restored.take_events().is_none());
    }

    #[test]
    fn test_from_discovery_without_location() {
        let response = DiscoveryResponse::parse(
            "192.168.1.77:1982".parse().unwrap(),
            "HTTP/1.1 200 OK\r\nid: 0x1\r\nbright: 40\r\n",
        );
        let light = Light::from_discovery(&response);
        assert_eq!(light.location(), &Location::new("192.168.1.77", 55443));
        assert_eq!(light.state().id(), Some("0x1"));
        assert_eq!(light.brightness(), Brightness::create(40));
    }

    #[cfg(feature = "runtime-tokio")]
    mod network {
        use super::*;
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use tokio::net::TcpListener;

        #[tokio::test]
        async fn test_commands_share_one_connection() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            let mut light = Light::new(Location::new("127.0.0.1", port), Some("color"));

            let first = light
                .set_bright(Line::Primary, Brightness::create(50).unwrap(), 500)
                .await
                .unwrap();
            let second = light.turn_on(Line::Background).await.unwrap();
            assert_eq!((first, second), (1, 2));
            assert!(light.is_connected());

            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            assert_eq!(
                line,
                "{\"id\":1,\"method\":\"set_bright\",\"params\":[50,\"smooth\",500]}\r\n"
            );
            line.clear();
            reader.read_line(&mut line).await.unwrap();
            assert_eq!(
                line,
                "{\"id\":2,\"method\":\"bg_set_power\",\"params\":[\"on\",\"smooth\",300]}\r\n"
            );

            reader
                .get_mut()
                .write_all(b"{\"id\":1,\"result\":[\"ok\"]}\r\n")
                .await
                .unwrap();
            let reply = light.read_response().await.unwrap();
            assert_eq!(reply, b"{\"id\":1,\"result\":[\"ok\"]}\r\n");
        }

        #[tokio::test]
        async fn test_invalid_duration_sends_nothing() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            let mut light = Light::new(Location::new("127.0.0.1", port), None);

            let err = light
                .set_bright(Line::Primary, Brightness::new(), 15)
                .await
                .unwrap_err();
            assert_eq!(err, Error::InvalidDuration(15));
            assert!(!light.is_connected());
            assert_eq!(light.next_id(), 1);
        }

        #[tokio::test]
        async fn test_moving_releases_connection() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            let mut light = Light::new(Location::new("127.0.0.1", port), None);

            light.toggle(Line::Primary).await.unwrap();
            assert!(light.is_connected());

            let same = format!("yeelight://127.0.0.1:{port}");
            light.update_state([("Location", same.as_str())]);
            assert!(light.is_connected());

            light.update_state([("Location", "yeelight://127.0.0.2:55443")]);
            assert!(!light.is_connected());
            assert_eq!(light.next_id(), 2);
        }

        #[tokio::test]
        async fn test_refresh_requires_ip() {
            let mut light = Light::new(Location::new("bulb.local", 55443), None);
            let err = light
                .refresh_state(Duration::from_millis(10))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidLocation(_)));
        }
    }
}
