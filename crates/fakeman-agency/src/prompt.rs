//! Prompt text handed to the generator.

use fakeman_core::{CandidateMeans, DesireVector};
use fakeman_memory::SummaryInput;

use crate::gate::GateInput;

fn desires_line(d: &DesireVector) -> String {
    format!(
        "existing {:.2}, power {:.2}, understanding {:.2}, information {:.2}",
        d.existing, d.power, d.understanding, d.information
    )
}

/// Prompt for carrying out a chosen means.
pub fn action_prompt(
    scenario: &str,
    memory: &str,
    recalled: &str,
    desires: &DesireVector,
    candidate: &CandidateMeans,
    input: Option<&str>,
) -> String {
    let mut parts = vec![
        format!("Scenario:\n{scenario}"),
        format!("Desires: {}", desires_line(desires)),
    ];
    if !memory.is_empty() {
        parts.push(format!("Recent memory:\n{memory}"));
    }
    if !recalled.is_empty() {
        parts.push(format!("Similar moments before:\n{recalled}"));
    }
    if let Some(cond) = &candidate.fantasy_condition {
        parts.push(format!("Imagined: {cond}"));
    }
    parts.push(format!("Chosen means ({}): {}", candidate.kind.as_str(), candidate.description));
    match input {
        Some(text) => parts.push(format!("The user said: {text}\nReply in character.")),
        None => parts.push("Nobody is talking to you. Say what you decided to say.".to_string()),
    }
    parts.join("\n\n")
}

/// Prompt asking whether to act now.
pub fn gate_prompt(input: &GateInput) -> String {
    format!(
        "Dominant desire: {} ({:.2}), urgency {:.2}.\n\
         Best available means: {}\n\
         Expected gain {:.2}; past success rate for this desire {:.2} over {} actions; idle for {:.0}s.\n\
         Should you act now or wait? Answer with one word: ACT or WAIT.",
        input.dominant,
        input.dominant_level,
        input.urgency,
        input.description,
        input.expected_gain,
        input.success_rate,
        input.samples,
        input.idle_secs,
    )
}

/// Prompt asking for a segment summary.
pub fn summary_prompt(inputs: &[SummaryInput]) -> String {
    let mut body = Vec::new();
    for input in inputs {
        match input {
            SummaryInput::Raw(events) => {
                for e in events {
                    body.push(format!("- {} -> {}", e.thought, e.action));
                }
            }
            SummaryInput::Summary { summary, key_events } => {
                body.push(format!("- summary: {summary}"));
                for k in key_events {
                    body.push(format!("  - {k}"));
                }
            }
        }
    }
    format!(
        "Summarize these memories in a few sentences. Respond as JSON: \
         {{\"summary\": \"...\", \"key_events\": [\"...\"]}}\n{}",
        body.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fakeman_core::{Desire, DesireDelta, MeansKind};

    fn candidate() -> CandidateMeans {
        CandidateMeans {
            id:                   uuid::Uuid::nil(),
            description:          "ask what they meant".into(),
            kind:                 MeansKind::AskQuestion,
            target:               Desire::Understanding,
            predicted_delta:      DesireDelta::new(0.0, 0.0, 0.1, 0.0),
            survival_probability: 1.0,
            achievable:           true,
            is_fantasy:           false,
            fantasy_condition:    None,
            retrieved_at:         0.0,
            source_experience:    None,
        }
    }

    #[test]
    fn empty_sections_are_left_out() {
        let text = action_prompt("chatting", "", "", &DesireVector::default(), &candidate(), None);
        assert!(!text.contains("Recent memory"));
        assert!(!text.contains("Similar moments"));
        assert!(text.contains("Chosen means (ask_question): ask what they meant"));
        assert!(text.ends_with("Say what you decided to say."));
    }

    #[test]
    fn recalled_memories_and_input_are_included() {
        let text = action_prompt(
            "chatting",
            "[1] greeted -> said hi",
            "[0] + asked -> learned (understanding, gain +0.10)",
            &DesireVector::default(),
            &candidate(),
            Some("what?"),
        );
        assert!(text.contains("Similar moments before:\n[0] + asked"));
        assert!(text.contains("The user said: what?"));
    }
}
