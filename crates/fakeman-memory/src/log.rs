//! EventCompactionLog: a binary-counter hierarchy of event segments.
//!
//! Each appended event becomes a segment of length 1. Whenever two live
//! segments share a length they are merged into one compressed segment of
//! twice the length, exactly like carrying in a binary counter. After N
//! appends the live lengths are the set bits of N:
//!
//! ```text
//!  7 appends:  [4][2][1]
//!  8 appends:  [8]
//! ```
//!
//! Recent history stays raw and detailed; older history is progressively
//! summarized. Segment count is bounded by ⌈log₂(N+1)⌉.

use std::sync::Arc;

use fakeman_compress::ThoughtBudgetAllocator;
use tokio::time::Instant;

use crate::config::CompactionConfig;
use crate::error::CompactionError;
use crate::model::{AtomicEvent, EventSegment, LogSnapshot, LogStats, SummaryInput};
use crate::summarizer::{RuleSummarizer, Summarizer};

pub struct EventCompactionLog {
    segments:     Vec<EventSegment>,
    next_id:      u64,
    total_events: u64,
    total_merges: u64,
    config:       CompactionConfig,
    fallback:     RuleSummarizer,
    external:     Option<Arc<dyn Summarizer>>,
}

impl EventCompactionLog {
    pub fn new(config: CompactionConfig) -> Self {
        let fallback = RuleSummarizer::new(ThoughtBudgetAllocator::default(), config.summary_char_cap);
        Self {
            segments: Vec::new(),
            next_id: 1,
            total_events: 0,
            total_merges: 0,
            config,
            fallback,
            external: None,
        }
    }

    /// Prefer `summarizer` for merges; the rule fallback still covers
    /// its failures and timeouts.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.external = Some(summarizer);
        self
    }

    pub fn with_allocator(mut self, allocator: ThoughtBudgetAllocator) -> Self {
        self.fallback = RuleSummarizer::new(allocator, self.config.summary_char_cap);
        self
    }

    pub fn config(&self) -> &CompactionConfig {
        &self.config
    }

    /// Live segments in creation order (oldest first).
    pub fn segments(&self) -> &[EventSegment] {
        &self.segments
    }

    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    /// Append one event, then merge equal-length segments until all
    /// lengths are unique. Returns the number of merges performed.
    ///
    /// `summarizer_timeout` bounds the whole append: once it has passed,
    /// the remaining merges are summarized by the rule fallback.
    pub async fn append(&mut self, event: AtomicEvent) -> Result<usize, CompactionError> {
        let key = self.fallback.allocator.truncate(&event.thought, self.config.key_event_chars);
        let id = self.allocate_id();
        self.segments.push(EventSegment {
            id,
            start_ts:          event.timestamp,
            end_ts:            event.timestamp,
            segment_length:    1,
            positive_units:    u64::from(event.positive),
            raw_events:        Some(vec![event]),
            is_compressed:     false,
            summary:           None,
            key_events:        if key.is_empty() { Vec::new() } else { vec![key] },
            compression_level: 0,
        });
        self.total_events += 1;

        let deadline = Instant::now() + self.config.summarizer_timeout;
        let mut merges = self.compact(deadline).await;

        let mut retries = 0;
        loop {
            let duplicates = self.duplicate_lengths();
            if duplicates.is_empty() {
                break;
            }
            if retries >= self.config.max_invariant_retries {
                tracing::error!(?duplicates, retries, "segment length uniqueness violated");
                return Err(CompactionError::InvariantViolation { duplicates, retries });
            }
            retries += 1;
            tracing::warn!(?duplicates, retries, "segment lengths not unique, forcing merge pass");
            merges += self.compact(deadline).await;
        }

        tracing::debug!(
            segment_id = id,
            merges,
            segments = self.segments.len(),
            total_events = self.total_events,
            "event appended"
        );
        Ok(merges)
    }

    /// Verify that no two live segments share a length.
    pub fn check_invariant(&self) -> Result<(), CompactionError> {
        let duplicates = self.duplicate_lengths();
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(CompactionError::InvariantViolation { duplicates, retries: 0 })
        }
    }

    /// The last `n` segments, chronological by `end_ts`.
    pub fn recent(&self, n: usize) -> Vec<&EventSegment> {
        let ordered = self.chronological();
        let skip = ordered.len().saturating_sub(n);
        ordered.into_iter().skip(skip).collect()
    }

    /// Human-readable history, oldest first. Repeated calls on an
    /// unchanged log return identical text.
    pub fn narrative(&self) -> String {
        let mut lines = Vec::new();
        for seg in self.chronological() {
            if seg.is_compressed {
                let summary = seg.summary.as_deref().unwrap_or("");
                let summary: String = summary.chars().take(self.config.narrative_summary_chars).collect();
                lines.push(format!(
                    "[{:.0}..{:.0}] {} events (level {}): {}",
                    seg.start_ts, seg.end_ts, seg.segment_length, seg.compression_level, summary
                ));
                for k in seg.key_events.iter().take(self.config.narrative_key_events) {
                    lines.push(format!("  - {k}"));
                }
            } else if let Some(events) = &seg.raw_events {
                for e in events {
                    lines.push(format!("[{:.0}] {} -> {}", e.timestamp, e.thought, e.action));
                }
            }
        }
        lines.join("\n")
    }

    /// Share of folded-in atomic events whose outcome was positive.
    pub fn positive_fraction(&self) -> f64 {
        let total: u64 = self.segments.iter().map(|s| s.segment_length).sum();
        if total == 0 {
            return 0.0;
        }
        let positive: u64 = self.segments.iter().map(|s| s.positive_units).sum();
        positive as f64 / total as f64
    }

    pub fn stats(&self) -> LogStats {
        let n = self.segments.len();
        let compressed = self.segments.iter().filter(|s| s.is_compressed).count();
        let (avg_len, avg_level) = if n == 0 {
            (0.0, 0.0)
        } else {
            (
                self.segments.iter().map(|s| s.segment_length as f64).sum::<f64>() / n as f64,
                self.segments.iter().map(|s| s.compression_level as f64).sum::<f64>() / n as f64,
            )
        };
        let start = self.segments.iter().map(|s| s.start_ts).fold(f64::INFINITY, f64::min);
        let end = self.segments.iter().map(|s| s.end_ts).fold(f64::NEG_INFINITY, f64::max);
        LogStats {
            total_segments:            n,
            total_events:              self.total_events,
            total_merges:              self.total_merges,
            compressed_segments:       compressed,
            raw_segments:              n - compressed,
            average_segment_length:    avg_len,
            average_compression_level: avg_level,
            span_secs:                 if n == 0 { 0.0 } else { end - start },
        }
    }

    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            next_segment_id: self.next_id,
            total_events:    self.total_events,
            total_merges:    self.total_merges,
            segments:        self.segments.clone(),
        }
    }

    /// Rebuild from a snapshot. The snapshot is taken as-is; a broken one
    /// is repaired by the next `append` or reported by `check_invariant`.
    pub fn from_snapshot(snapshot: LogSnapshot, config: CompactionConfig) -> Self {
        let mut log = Self::new(config);
        let max_id = snapshot.segments.iter().map(|s| s.id).max().unwrap_or(0);
        log.next_id = snapshot.next_segment_id.max(max_id + 1);
        log.total_events = snapshot.total_events;
        log.total_merges = snapshot.total_merges;
        log.segments = snapshot.segments;
        log
    }

    // ── internals ──────────────────────────────────────────────────────────

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn chronological(&self) -> Vec<&EventSegment> {
        let mut ordered: Vec<&EventSegment> = self.segments.iter().collect();
        ordered.sort_by(|a, b| {
            a.end_ts
                .partial_cmp(&b.end_ts)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        ordered
    }

    fn duplicate_lengths(&self) -> Vec<u64> {
        let mut seen = std::collections::BTreeSet::new();
        let mut dup = std::collections::BTreeSet::new();
        for s in &self.segments {
            if !seen.insert(s.segment_length) {
                dup.insert(s.segment_length);
            }
        }
        dup.into_iter().collect()
    }

    /// Earliest-created pair of segments sharing a length.
    fn find_equal_pair(&self) -> Option<(usize, usize)> {
        for i in 0..self.segments.len() {
            for j in (i + 1)..self.segments.len() {
                if self.segments[i].segment_length == self.segments[j].segment_length {
                    return Some((i, j));
                }
            }
        }
        None
    }

    async fn compact(&mut self, deadline: Instant) -> usize {
        let mut merges = 0;
        while let Some((i, j)) = self.find_equal_pair() {
            let later = self.segments.remove(j);
            let earlier = self.segments.remove(i);
            let merged = self.merge(earlier, later, deadline).await;
            self.segments.insert(i, merged);
            merges += 1;
        }
        self.total_merges += merges as u64;
        merges
    }

    async fn merge(&mut self, a: EventSegment, b: EventSegment, deadline: Instant) -> EventSegment {
        let inputs = [a.summary_input(), b.summary_input()];
        let summary = self.summarize(&inputs, deadline).await;

        let mut key_events: Vec<String> = Vec::with_capacity(self.config.key_event_cap);
        for k in a.key_events.iter().chain(b.key_events.iter()) {
            if key_events.len() >= self.config.key_event_cap {
                break;
            }
            if !key_events.contains(k) {
                key_events.push(k.clone());
            }
        }

        EventSegment {
            id:                self.allocate_id(),
            start_ts:          a.start_ts.min(b.start_ts),
            end_ts:            a.end_ts.max(b.end_ts),
            segment_length:    a.segment_length + b.segment_length,
            raw_events:        None,
            is_compressed:     true,
            summary:           Some(summary),
            key_events,
            compression_level: a.compression_level.max(b.compression_level) + 1,
            positive_units:    a.positive_units + b.positive_units,
        }
    }

    async fn summarize(&self, inputs: &[SummaryInput], deadline: Instant) -> String {
        if let Some(external) = &self.external {
            if Instant::now() >= deadline {
                tracing::debug!("append deadline passed, using rule fallback");
                return self.fallback.summarize_now(inputs);
            }
            match tokio::time::timeout_at(deadline, external.summarize(inputs)).await {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    return self.fallback.allocator.truncate(text.trim(), self.config.summary_char_cap);
                }
                Ok(Ok(_)) => tracing::warn!("summarizer returned empty text, using rule fallback"),
                Ok(Err(e)) => tracing::warn!(error = %e, "summarizer failed, using rule fallback"),
                Err(_) => tracing::warn!(
                    timeout_ms = self.config.summarizer_timeout.as_millis() as u64,
                    "summarizer timed out, using rule fallback"
                ),
            }
        }
        self.fallback.summarize_now(inputs)
    }
}

impl std::fmt::Debug for EventCompactionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCompactionLog")
            .field("segments", &self.segments.len())
            .field("total_events", &self.total_events)
            .field("total_merges", &self.total_merges)
            .field("external_summarizer", &self.external.is_some())
            .finish()
    }
}
