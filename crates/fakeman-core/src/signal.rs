//! Signal strengths and the desire changes they cause.
//!
//! Two sources feed the desire vector besides executed means:
//! - the agent's own reply ("thought"): uncertainty, threat, misunderstanding
//!   and a chance of control *raise* desires;
//! - the environment's response: recognition, information and the end of a
//!   threat *relieve* them.
//!
//! Signals come as structured numbers in inbound metadata. When a reply
//! carries none, [`text_certainty`] gives a keyword estimate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Desire, DesireDelta};

const HIGH_CERTAINTY: [&str; 8] = [
    "certainly", "definitely", "absolutely", "clearly", "without doubt", "of course", "sure", "indeed",
];
const LOW_CERTAINTY: [&str; 8] = [
    "maybe", "perhaps", "might", "possibly", "not sure", "unsure", "don't know", "confused",
];

/// Signal levels, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalStrengths {
    #[serde(default)]
    pub threat:              f64,
    #[serde(default)]
    pub misunderstanding:    f64,
    #[serde(default)]
    pub uncertainty:         f64,
    #[serde(default)]
    pub control_opportunity: f64,
    #[serde(default)]
    pub recognition:         f64,
}

impl SignalStrengths {
    /// Only uncertainty set, derived from a certainty estimate.
    pub fn from_certainty(certainty: f64) -> Self {
        Self { uncertainty: 1.0 - certainty.clamp(0.0, 1.0), ..Self::default() }
    }

    /// Read a JSON object of named strengths. Unknown keys are ignored,
    /// non-numeric values count as absent, and values are clamped.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let get = |k: &str| obj.get(k).and_then(Value::as_f64).unwrap_or(0.0).clamp(0.0, 1.0);
        Some(Self {
            threat:              get("threat"),
            misunderstanding:    get("misunderstanding"),
            uncertainty:         get("uncertainty"),
            control_opportunity: get("control_opportunity"),
            recognition:         get("recognition"),
        })
    }

    /// Response signals from boolean flags, for peers that send no numbers.
    /// Without `provides_information` the response leaves uncertainty high.
    pub fn from_flags(threatening: bool, shows_recognition: bool, provides_information: bool) -> Self {
        Self {
            threat:      if threatening { 0.7 } else { 0.0 },
            recognition: if shows_recognition { 0.8 } else { 0.0 },
            uncertainty: if provides_information { 0.0 } else { 1.0 },
            ..Self::default()
        }
    }
}

/// Keyword estimate of how certain `text` sounds: 0.8, 0.3 or 0.5.
pub fn text_certainty(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let high = HIGH_CERTAINTY.iter().filter(|p| lower.contains(*p)).count();
    let low = LOW_CERTAINTY.iter().filter(|p| lower.contains(*p)).count();
    match high.cmp(&low) {
        std::cmp::Ordering::Greater => 0.8,
        std::cmp::Ordering::Less => 0.3,
        std::cmp::Ordering::Equal => 0.5,
    }
}

/// Turns signals into desire deltas, scaled by `strength`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalModel {
    pub strength: f64,
}

impl Default for SignalModel {
    fn default() -> Self {
        Self { strength: 1.0 }
    }
}

impl SignalModel {
    pub fn new(strength: f64) -> Self {
        Self { strength: strength.clamp(0.0, 1.0) }
    }

    /// Desires raised by the agent's own reply; apply as a stimulus.
    pub fn thought_stimulus(&self, s: &SignalStrengths) -> DesireDelta {
        let mut delta = DesireDelta::default();
        if s.uncertainty > 0.5 {
            delta.set(Desire::Information, 0.05 * s.uncertainty * self.strength);
        }
        if s.threat > 0.3 {
            delta.set(Desire::Existing, 0.08 * s.threat * self.strength);
        }
        if s.misunderstanding > 0.3 {
            delta.set(Desire::Understanding, 0.06 * s.misunderstanding * self.strength);
        }
        if s.control_opportunity > 0.3 {
            delta.set(Desire::Power, 0.04 * s.control_opportunity * self.strength);
        }
        delta
    }

    /// Desires relieved by the environment's response; apply as satisfaction.
    pub fn response_relief(&self, s: &SignalStrengths) -> DesireDelta {
        let mut delta = DesireDelta::default();
        if s.threat > 0.3 {
            delta.set(Desire::Existing, 0.10 * s.threat * self.strength);
        }
        if s.uncertainty < 0.3 {
            delta.set(Desire::Information, 0.08 * (1.0 - s.uncertainty) * self.strength);
        }
        if s.recognition > 0.5 {
            delta.set(Desire::Understanding, 0.12 * s.recognition * self.strength);
        }
        if s.control_opportunity > 0.5 {
            delta.set(Desire::Power, 0.08 * s.control_opportunity * self.strength);
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn certainty_keywords() {
        assert_eq!(text_certainty("I am absolutely sure of it"), 0.8);
        assert_eq!(text_certainty("Maybe, I don't know"), 0.3);
        assert_eq!(text_certainty("The sky is blue"), 0.5);
    }

    #[test]
    fn uncertain_reply_raises_information_only() {
        let model = SignalModel::default();
        let d = model.thought_stimulus(&SignalStrengths::from_certainty(0.3));
        assert!((d.information - 0.035).abs() < 1e-12);
        assert_eq!(d.existing, 0.0);
        assert_eq!(d.power, 0.0);
        assert_eq!(d.understanding, 0.0);

        // at the threshold nothing moves
        assert_eq!(model.thought_stimulus(&SignalStrengths::from_certainty(0.5)), DesireDelta::default());
    }

    #[test]
    fn recognition_relieves_understanding() {
        let model = SignalModel::new(0.5);
        let s = SignalStrengths::from_json(&json!({ "recognition": 0.9, "uncertainty": 0.6, "noise": 3 })).unwrap();
        let d = model.response_relief(&s);
        assert!((d.understanding - 0.054).abs() < 1e-12);
        assert_eq!(d.information, 0.0);
    }

    #[test]
    fn flags_map_to_fixed_strengths() {
        let s = SignalStrengths::from_flags(true, false, true);
        assert_eq!(s.threat, 0.7);
        assert_eq!(s.uncertainty, 0.0);
        let d = SignalModel::default().response_relief(&s);
        assert!((d.existing - 0.07).abs() < 1e-12);
        assert!((d.information - 0.08).abs() < 1e-12);

        let quiet = SignalStrengths::from_flags(false, false, false);
        assert_eq!(SignalModel::default().response_relief(&quiet), DesireDelta::default());
    }

    #[test]
    fn json_values_are_clamped() {
        let s = SignalStrengths::from_json(&json!({ "threat": 4.0, "recognition": -1 })).unwrap();
        assert_eq!(s.threat, 1.0);
        assert_eq!(s.recognition, 0.0);
        assert!(SignalStrengths::from_json(&json!([1, 2])).is_none());
    }
}
