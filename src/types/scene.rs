//! Scenes applied with `set_scene`.

use serde_json::{Value, json};

use super::{Brightness, FlowAction, FlowExpression, HueSaturation, Kelvin, Rgb};

/// A complete light state applied in one command, switching the light on if
/// needed.
#[derive(Debug, Clone, PartialEq)]
pub enum Scene {
    Color(Rgb, Brightness),
    Hsv(HueSaturation, Brightness),
    Temperature(Kelvin, Brightness),
    Flow {
        count: u32,
        action: FlowAction,
        expression: FlowExpression,
    },
    /// Switch on at the given brightness and off again after `minutes`.
    AutoDelayOff(Brightness, u32),
}

impl Scene {
    /// The scene class name followed by its values.
    pub(crate) fn params(&self) -> Vec<Value> {
        match self {
            Scene::Color(color, bright) => vec![json!("color"), json!(color.value()), json!(bright.value())],
            Scene::Hsv(hs, bright) => vec![
                json!("hsv"),
                json!(hs.hue()),
                json!(hs.saturation()),
                json!(bright.value()),
            ],
            Scene::Temperature(kelvin, bright) => {
                vec![json!("ct"), json!(kelvin.kelvin()), json!(bright.value())]
            }
            Scene::Flow {
                count,
                action,
                expression,
            } => vec![
                json!("cf"),
                json!(count),
                json!(action.id()),
                expression.to_value(),
            ],
            Scene::AutoDelayOff(bright, minutes) => {
                vec![json!("auto_delay_off"), json!(bright.value()), json!(minutes)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlowTuple;

    #[test]
    fn test_scene_params() {
        let bright = Brightness::create(50).unwrap();
        assert_eq!(
            Scene::Color(Rgb::rgb(0, 0, 255), bright).params(),
            vec![json!("color"), json!(255), json!(50)]
        );
        assert_eq!(
            Scene::AutoDelayOff(bright, 5).params(),
            vec![json!("auto_delay_off"), json!(50), json!(5)]
        );
    }

    #[test]
    fn test_flow_scene() {
        let scene = Scene::Flow {
            count: 0,
            action: FlowAction::Stay,
            expression: FlowExpression::new().then(FlowTuple::sleep(1000)),
        };
        assert_eq!(
            scene.params(),
            vec![json!("cf"), json!(0), json!(1), json!("1000,7,0,0")]
        );
    }
}
