use serde::{Deserialize, Serialize};

/// One unit of thinking: what was thought, in which context, what was done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicEvent {
    pub timestamp: f64,
    pub thought:   String,
    pub context:   String,
    pub action:    String,
    pub result:    Option<String>,
    /// Significance in `[0, 1]`; drives summary space in the rule summarizer.
    pub weight:    f64,
    /// Whether the event's realized outcome was a net gain.
    pub positive:  bool,
}

/// A contiguous run of atomic events, raw or compressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSegment {
    pub id:                u64,
    pub start_ts:          f64,
    pub end_ts:            f64,
    /// Number of atomic events folded into this segment.
    pub segment_length:    u64,
    /// Present only while uncompressed.
    pub raw_events:        Option<Vec<AtomicEvent>>,
    pub is_compressed:     bool,
    pub summary:           Option<String>,
    pub key_events:        Vec<String>,
    /// Number of merges applied on the deepest path into this segment.
    pub compression_level: u32,
    /// Atomic events with a positive outcome folded into this segment.
    pub positive_units:    u64,
}

impl EventSegment {
    /// What a summarizer sees of this segment.
    pub fn summary_input(&self) -> SummaryInput {
        match (&self.raw_events, &self.summary) {
            (Some(events), _) if !self.is_compressed => SummaryInput::Raw(events.clone()),
            (_, summary) => SummaryInput::Summary {
                summary:    summary.clone().unwrap_or_default(),
                key_events: self.key_events.clone(),
            },
        }
    }
}

/// Input handed to a [`crate::Summarizer`]: raw events of an uncompressed
/// segment or the summary of a compressed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryInput {
    Raw(Vec<AtomicEvent>),
    Summary { summary: String, key_events: Vec<String> },
}

/// Aggregate figures over the live segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStats {
    pub total_segments:            usize,
    pub total_events:              u64,
    pub total_merges:              u64,
    pub compressed_segments:       usize,
    pub raw_segments:              usize,
    pub average_segment_length:    f64,
    pub average_compression_level: f64,
    /// Seconds between the earliest start and latest end.
    pub span_secs:                 f64,
}

/// Serializable form of an [`crate::EventCompactionLog`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSnapshot {
    pub next_segment_id: u64,
    pub total_events:    u64,
    pub total_merges:    u64,
    pub segments:        Vec<EventSegment>,
}
