use fakeman_core::Desire;
use serde::{Deserialize, Serialize};

/// A piece of thought competing for summary space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtFragment {
    pub content:        String,
    /// Importance in `[0, 1]`.
    pub weight:         f64,
    #[serde(rename = "type")]
    pub kind:           String,
    pub related_desire: Option<Desire>,
}

impl ThoughtFragment {
    pub fn new(content: impl Into<String>, weight: f64, kind: impl Into<String>) -> Self {
        Self {
            content:        content.into(),
            weight:         if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) },
            kind:           kind.into(),
            related_desire: None,
        }
    }

    pub fn with_desire(mut self, desire: Desire) -> Self {
        self.related_desire = Some(desire);
        self
    }
}

/// Result of allocation for one input fragment (same order as the input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Position of the fragment in the input slice.
    pub index:   usize,
    /// Characters granted; 0 means dropped.
    pub quota:   usize,
    /// Content truncated to `quota` characters (empty when dropped).
    pub content: String,
}
