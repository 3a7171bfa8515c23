//! Act-or-wait decision for autonomous actions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fakeman_core::Desire;

use crate::config::{AgencyConfig, GateMode};
use crate::generator::Generator;
use crate::prompt;

/// Everything a gate may consider.
#[derive(Debug, Clone, PartialEq)]
pub struct GateInput {
    pub dominant:       Desire,
    pub dominant_level: f64,
    /// L1 distance of the live desires from baseline.
    pub urgency:        f64,
    /// Σ predicted delta of the best candidate.
    pub expected_gain:  f64,
    pub description:    String,
    /// Success rate of the dominant desire's recent autonomous actions.
    pub success_rate:   f64,
    /// Actions the success rate is based on (0 means no history).
    pub samples:        usize,
    pub idle_secs:      f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    pub act:       bool,
    pub rationale: String,
}

impl GateDecision {
    pub fn act(rationale: impl Into<String>) -> Self {
        Self { act: true, rationale: rationale.into() }
    }

    pub fn wait(rationale: impl Into<String>) -> Self {
        Self { act: false, rationale: rationale.into() }
    }
}

#[async_trait]
pub trait ActionGate: Send + Sync {
    async fn decide(&self, input: &GateInput) -> GateDecision;
}

/// Act iff expected gain and trigger success rate both clear their floors.
#[derive(Debug, Clone)]
pub struct ThresholdGate {
    pub min_expected_gain:  f64,
    pub success_rate_floor: f64,
}

impl ThresholdGate {
    pub fn new(min_expected_gain: f64, success_rate_floor: f64) -> Self {
        Self { min_expected_gain, success_rate_floor }
    }

    pub fn evaluate(&self, input: &GateInput) -> GateDecision {
        if input.expected_gain <= self.min_expected_gain {
            return GateDecision::wait(format!(
                "expected gain {:.3} does not exceed {:.3}",
                input.expected_gain, self.min_expected_gain
            ));
        }
        if input.success_rate <= self.success_rate_floor {
            return GateDecision::wait(format!(
                "{} actions succeeded {:.0}% recently, floor {:.0}%",
                input.dominant,
                input.success_rate * 100.0,
                self.success_rate_floor * 100.0
            ));
        }
        GateDecision::act(format!(
            "{} at {:.2}: gain {:.3}, success rate {:.2}",
            input.dominant, input.dominant_level, input.expected_gain, input.success_rate
        ))
    }
}

#[async_trait]
impl ActionGate for ThresholdGate {
    async fn decide(&self, input: &GateInput) -> GateDecision {
        self.evaluate(input)
    }
}

/// Asks the generator. Anything but a clear ACT within the deadline waits.
pub struct LlmGate {
    generator: Arc<dyn Generator>,
    timeout:   Duration,
}

impl LlmGate {
    pub fn new(generator: Arc<dyn Generator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }
}

#[async_trait]
impl ActionGate for LlmGate {
    async fn decide(&self, input: &GateInput) -> GateDecision {
        let prompt = prompt::gate_prompt(input);
        match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await {
            Ok(Ok(text)) => match parse_verdict(&text) {
                Some(true) => GateDecision::act(format!("generator chose to act: {}", text.trim())),
                Some(false) => GateDecision::wait(format!("generator chose to wait: {}", text.trim())),
                None => GateDecision::wait("generator verdict unclear"),
            },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "gate generator failed");
                GateDecision::wait(format!("gate generator failed: {e}"))
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "gate generator timed out");
                GateDecision::wait("gate generator timed out")
            }
        }
    }
}

/// Gate selected by `config.gate_mode`.
pub fn build_gate(config: &AgencyConfig, generator: Arc<dyn Generator>) -> Box<dyn ActionGate> {
    match config.gate_mode {
        GateMode::Threshold => Box::new(ThresholdGate::new(config.min_expected_gain, config.success_rate_floor)),
        GateMode::Llm => Box::new(LlmGate::new(generator, config.generator_timeout)),
    }
}

/// First `act`/`wait` word decides.
fn parse_verdict(text: &str) -> Option<bool> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_ascii_lowercase)
        .find_map(|w| match w.as_str() {
            "act" => Some(true),
            "wait" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;

    fn input(gain: f64, rate: f64) -> GateInput {
        GateInput {
            dominant:       Desire::Information,
            dominant_level: 0.8,
            urgency:        0.4,
            expected_gain:  gain,
            description:    "ask what they mean".into(),
            success_rate:   rate,
            samples:        4,
            idle_secs:      40.0,
        }
    }

    #[test]
    fn threshold_requires_both_floors() {
        let gate = ThresholdGate::new(0.05, 0.3);
        assert!(gate.evaluate(&input(0.2, 0.5)).act);
        assert!(!gate.evaluate(&input(0.05, 0.5)).act);
        assert!(!gate.evaluate(&input(0.2, 0.3)).act);
        assert!(gate.evaluate(&input(0.01, 0.9)).rationale.contains("expected gain"));
    }

    struct Says(&'static str);

    #[async_trait]
    impl Generator for Says {
        async fn generate(&self, _: &str) -> Result<String, GeneratorError> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl Generator for Broken {
        async fn generate(&self, _: &str) -> Result<String, GeneratorError> {
            Err(GeneratorError::Failed("down".into()))
        }
    }

    #[tokio::test]
    async fn llm_gate_follows_verdict() {
        let t = Duration::from_secs(1);
        assert!(LlmGate::new(Arc::new(Says("ACT. It is worth it.")), t).decide(&input(0.0, 0.0)).await.act);
        assert!(!LlmGate::new(Arc::new(Says("I'd wait, then act")), t).decide(&input(1.0, 1.0)).await.act);
        assert!(!LlmGate::new(Arc::new(Says("maybe")), t).decide(&input(1.0, 1.0)).await.act);
        assert!(!LlmGate::new(Arc::new(Broken), t).decide(&input(1.0, 1.0)).await.act);
    }

    #[test]
    fn verdict_ignores_substrings() {
        assert_eq!(parse_verdict("Action? no: WAIT"), Some(false));
        assert_eq!(parse_verdict("exact"), None);
    }
}
