//! Segment summarization: a pluggable capability plus the deterministic
//! rule-based fallback that is always available.

use async_trait::async_trait;
use fakeman_compress::{ThoughtBudgetAllocator, ThoughtFragment};

use crate::error::SummarizeError;
use crate::model::SummaryInput;

/// Produces the summary text of a merged segment.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, inputs: &[SummaryInput]) -> Result<String, SummarizeError>;
}

/// Deterministic summarizer: keeps the highest-weight fields of its inputs
/// within a character cap, as decided by the [`ThoughtBudgetAllocator`].
#[derive(Debug, Clone)]
pub struct RuleSummarizer {
    pub allocator: ThoughtBudgetAllocator,
    pub char_cap:  usize,
}

impl RuleSummarizer {
    pub fn new(allocator: ThoughtBudgetAllocator, char_cap: usize) -> Self {
        Self { allocator, char_cap }
    }

    /// Synchronous form, used directly as the fallback.
    pub fn summarize_now(&self, inputs: &[SummaryInput]) -> String {
        let mut fragments = Vec::new();
        let mut event_count = 0usize;
        for input in inputs {
            match input {
                SummaryInput::Raw(events) => {
                    for e in events {
                        event_count += 1;
                        let content = if e.action.is_empty() {
                            e.thought.clone()
                        } else {
                            format!("{} -> {}", e.thought, e.action)
                        };
                        // Floor keeps light events eligible for leftover space.
                        fragments.push(ThoughtFragment::new(content, e.weight.max(0.1), "event"));
                    }
                }
                SummaryInput::Summary { summary, .. } => {
                    if !summary.is_empty() {
                        fragments.push(ThoughtFragment::new(summary.clone(), 1.0, "summary"));
                    }
                }
            }
        }

        let text = self.allocator.render(&fragments, self.char_cap, "; ");
        if text.is_empty() {
            format!("{event_count} events")
        } else {
            text
        }
    }
}

impl Default for RuleSummarizer {
    fn default() -> Self {
        Self::new(ThoughtBudgetAllocator::default(), 200)
    }
}

#[async_trait]
impl Summarizer for RuleSummarizer {
    async fn summarize(&self, inputs: &[SummaryInput]) -> Result<String, SummarizeError> {
        Ok(self.summarize_now(inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AtomicEvent;

    fn event(thought: &str, action: &str, weight: f64) -> AtomicEvent {
        AtomicEvent {
            timestamp: 0.0,
            thought:   thought.to_string(),
            context:   String::new(),
            action:    action.to_string(),
            result:    None,
            weight,
            positive:  true,
        }
    }

    #[test]
    fn raw_inputs_are_condensed_by_weight() {
        let s = RuleSummarizer::default();
        let text = s.summarize_now(&[
            SummaryInput::Raw(vec![event("user greeted me", "greet back", 0.3)]),
            SummaryInput::Raw(vec![event("user asked my name", "answer", 0.7)]),
        ]);
        assert_eq!(text, "user asked my name -> answer; user greeted me -> greet back");
    }

    #[test]
    fn output_respects_char_cap() {
        let s = RuleSummarizer::new(ThoughtBudgetAllocator::default(), 40);
        let long = "a".repeat(500);
        let text = s.summarize_now(&[
            SummaryInput::Summary { summary: long.clone(), key_events: vec![] },
            SummaryInput::Summary { summary: long, key_events: vec![] },
        ]);
        assert!(text.chars().count() <= 40 + "; ".len());
    }

    #[test]
    fn deterministic() {
        let s = RuleSummarizer::default();
        let inputs = vec![SummaryInput::Raw(vec![event("x happened", "y", 0.5)])];
        assert_eq!(s.summarize_now(&inputs), s.summarize_now(&inputs));
    }
}
