use std::time::Duration;

/// Configuration for the event compaction log.
#[derive(Debug, Clone)]
pub struct CompactionConfig {
    /// Maximum key events carried by one segment.
    pub key_event_cap:           usize,
    /// Characters kept from an event's thought when it becomes a key event.
    pub key_event_chars:         usize,
    /// Character cap for a merged segment's summary.
    pub summary_char_cap:        usize,
    /// Deadline for the external summarizer before the rule fallback runs.
    pub summarizer_timeout:      Duration,
    /// Extra merge passes attempted when the uniqueness check fails.
    pub max_invariant_retries:   u32,
    /// Characters of each summary shown by `narrative()`.
    pub narrative_summary_chars: usize,
    /// Key events listed per compressed segment by `narrative()`.
    pub narrative_key_events:    usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            key_event_cap:           5,
            key_event_chars:         60,
            summary_char_cap:        200,
            summarizer_timeout:      Duration::from_secs(30),
            max_invariant_retries:   3,
            narrative_summary_chars: 200,
            narrative_key_events:    3,
        }
    }
}

impl CompactionConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            key_event_cap:           env_parse("FAKEMAN_COMPACTION_KEY_EVENTS", d.key_event_cap),
            key_event_chars:         env_parse("FAKEMAN_COMPACTION_KEY_EVENT_CHARS", d.key_event_chars),
            summary_char_cap:        env_parse("FAKEMAN_COMPACTION_SUMMARY_CHARS", d.summary_char_cap),
            summarizer_timeout:      Duration::from_millis(env_parse(
                "FAKEMAN_COMPACTION_SUMMARIZER_TIMEOUT_MS",
                d.summarizer_timeout.as_millis() as u64,
            )),
            max_invariant_retries:   env_parse("FAKEMAN_COMPACTION_MAX_RETRIES", d.max_invariant_retries),
            narrative_summary_chars: d.narrative_summary_chars,
            narrative_key_events:    d.narrative_key_events,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
