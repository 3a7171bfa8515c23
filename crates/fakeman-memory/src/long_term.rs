//! LongTermMemory: one short summary per executed action.
//!
//! Where the compaction log keeps *every* thinking event at falling
//! resolution, the long-term store keeps one [`MemorySummary`] per action
//! with what was at stake and how it went. Summaries are searched by desire,
//! outcome or tag and recalled into prompts through [`LongTermMemory::narrative`].

use std::path::Path;

use fakeman_compress::{ThoughtBudgetAllocator, ThoughtFragment};
use fakeman_core::{fs, Desire};
use serde::{Deserialize, Serialize};

use crate::error::CompactionError;

/// Gains within this band count as neutral.
const NEUTRAL_BAND: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryOutcome {
    Positive,
    Negative,
    Neutral,
}

impl MemoryOutcome {
    pub fn from_gain(gain: f64) -> Self {
        if gain > NEUTRAL_BAND {
            MemoryOutcome::Positive
        } else if gain < -NEUTRAL_BAND {
            MemoryOutcome::Negative
        } else {
            MemoryOutcome::Neutral
        }
    }

    fn symbol(&self) -> char {
        match self {
            MemoryOutcome::Positive => '+',
            MemoryOutcome::Negative => '-',
            MemoryOutcome::Neutral  => 'o',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySummary {
    pub id:              u64,
    pub timestamp:       f64,
    pub cycle:           u64,
    pub situation:       String,
    pub action_taken:    String,
    pub outcome:         MemoryOutcome,
    pub dominant_desire: Desire,
    /// Realized relief summed over all desires.
    pub gain:            f64,
    /// Recall priority in `[0, 1]`.
    pub importance:      f64,
    pub tags:            Vec<String>,
    pub output_text:     String,
    /// Weighted thought fragments behind the action.
    pub thoughts:        Vec<ThoughtFragment>,
}

impl MemorySummary {
    /// The thoughts squeezed into `budget` characters, heavier ones first.
    pub fn thought_summary(&self, allocator: &ThoughtBudgetAllocator, budget: usize) -> String {
        allocator.render(&self.thoughts, budget, " ")
    }
}

/// Fields of a memory before id, outcome and importance are assigned.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub timestamp:       f64,
    pub cycle:           u64,
    pub situation:       String,
    pub action_taken:    String,
    pub dominant_desire: Desire,
    pub gain:            f64,
    pub tags:            Vec<String>,
    pub output_text:     String,
    pub thoughts:        Vec<ThoughtFragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongTermSnapshot {
    pub next_id:  u64,
    pub memories: Vec<MemorySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermStats {
    pub total:           usize,
    pub positive:        usize,
    pub negative:        usize,
    pub neutral:         usize,
    pub mean_importance: f64,
}

/// Importance of a memory: large swings either way are worth keeping,
/// big wins and big losses more so.
pub fn importance(gain: f64, outcome: MemoryOutcome) -> f64 {
    let mut value = gain.abs().min(1.0);
    match outcome {
        MemoryOutcome::Positive if gain > 0.3 => value *= 1.5,
        MemoryOutcome::Negative if gain < -0.3 => value *= 1.3,
        _ => {}
    }
    value.min(1.0)
}

/// Bounded store of action summaries. At capacity, the least important
/// stored memory makes room for the new one (the oldest among equals).
#[derive(Debug, Clone)]
pub struct LongTermMemory {
    memories:   Vec<MemorySummary>,
    next_id:    u64,
    capacity:   usize,
    text_chars: usize,
    allocator:  ThoughtBudgetAllocator,
}

impl LongTermMemory {
    pub fn new(capacity: usize, text_chars: usize) -> Self {
        Self {
            memories: Vec::new(),
            next_id: 1,
            capacity: capacity.max(1),
            text_chars,
            allocator: ThoughtBudgetAllocator::default(),
        }
    }

    pub fn with_allocator(mut self, allocator: ThoughtBudgetAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    pub fn memories(&self) -> &[MemorySummary] {
        &self.memories
    }

    pub fn add(&mut self, new: NewMemory) -> &MemorySummary {
        let outcome = MemoryOutcome::from_gain(new.gain);
        let memory = MemorySummary {
            id:              self.next_id,
            timestamp:       new.timestamp,
            cycle:           new.cycle,
            situation:       self.allocator.truncate(&new.situation, self.text_chars),
            action_taken:    self.allocator.truncate(&new.action_taken, self.text_chars),
            outcome,
            dominant_desire: new.dominant_desire,
            gain:            new.gain,
            importance:      importance(new.gain, outcome),
            tags:            new.tags,
            output_text:     new.output_text,
            thoughts:        new.thoughts,
        };
        self.next_id += 1;
        tracing::debug!(id = memory.id, outcome = ?outcome, importance = memory.importance, "memory added");

        if self.memories.len() >= self.capacity {
            self.evict();
        }
        self.memories.push(memory);
        let last = self.memories.len() - 1;
        &self.memories[last]
    }

    /// Newest first.
    pub fn recent(&self, count: usize) -> Vec<&MemorySummary> {
        self.newest_first(|_| true, count)
    }

    /// Most important first, among those at or above `min_importance`.
    pub fn important(&self, count: usize, min_importance: f64) -> Vec<&MemorySummary> {
        let mut found: Vec<&MemorySummary> =
            self.memories.iter().filter(|m| m.importance >= min_importance).collect();
        found.sort_by(|a, b| b.importance.total_cmp(&a.importance).then(b.id.cmp(&a.id)));
        found.truncate(count);
        found
    }

    pub fn search_by_desire(&self, desire: Desire, count: usize) -> Vec<&MemorySummary> {
        self.newest_first(|m| m.dominant_desire == desire, count)
    }

    pub fn search_by_outcome(&self, outcome: MemoryOutcome, count: usize) -> Vec<&MemorySummary> {
        self.newest_first(|m| m.outcome == outcome, count)
    }

    /// Memories carrying any of `tags`.
    pub fn search_by_tags(&self, tags: &[&str], count: usize) -> Vec<&MemorySummary> {
        self.newest_first(|m| m.tags.iter().any(|t| tags.contains(&t.as_str())), count)
    }

    /// The last `count` memories as text, oldest first.
    pub fn narrative(&self, count: usize) -> String {
        narrate(self.recent(count))
    }

    /// Like [`Self::narrative`], restricted to memories of `desire`.
    pub fn recall(&self, desire: Desire, count: usize) -> String {
        narrate(self.search_by_desire(desire, count))
    }

    pub fn stats(&self) -> LongTermStats {
        let count = |o: MemoryOutcome| self.memories.iter().filter(|m| m.outcome == o).count();
        let total = self.memories.len();
        LongTermStats {
            total,
            positive: count(MemoryOutcome::Positive),
            negative: count(MemoryOutcome::Negative),
            neutral: count(MemoryOutcome::Neutral),
            mean_importance: if total == 0 {
                0.0
            } else {
                self.memories.iter().map(|m| m.importance).sum::<f64>() / total as f64
            },
        }
    }

    pub fn snapshot(&self) -> LongTermSnapshot {
        LongTermSnapshot { next_id: self.next_id, memories: self.memories.clone() }
    }

    pub fn from_snapshot(snapshot: LongTermSnapshot, capacity: usize, text_chars: usize) -> Self {
        let mut store = Self::new(capacity, text_chars);
        let max_id = snapshot.memories.iter().map(|m| m.id).max().unwrap_or(0);
        store.next_id = snapshot.next_id.max(max_id + 1);
        store.memories = snapshot.memories;
        while store.memories.len() > store.capacity {
            store.evict();
        }
        store
    }

    pub fn save(&self, path: &Path) -> Result<(), CompactionError> {
        fs::write_json_atomic(path, &self.snapshot())?;
        Ok(())
    }

    /// Load from `path`; a missing file yields an empty store.
    pub fn load(path: &Path, capacity: usize, text_chars: usize) -> Result<Self, CompactionError> {
        let snapshot: Option<LongTermSnapshot> = fs::read_json(path)?;
        Ok(match snapshot {
            Some(s) => {
                tracing::info!(memories = s.memories.len(), "long-term memory restored");
                Self::from_snapshot(s, capacity, text_chars)
            }
            None => Self::new(capacity, text_chars),
        })
    }

    fn newest_first<F>(&self, keep: F, count: usize) -> Vec<&MemorySummary>
    where
        F: Fn(&MemorySummary) -> bool,
    {
        let mut found: Vec<&MemorySummary> = self.memories.iter().filter(|m| keep(m)).collect();
        found.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        found.truncate(count);
        found
    }

    fn evict(&mut self) {
        let victim = self
            .memories
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.importance.total_cmp(&b.importance).then(a.id.cmp(&b.id)))
            .map(|(i, _)| i);
        if let Some(i) = victim {
            let gone = self.memories.remove(i);
            tracing::debug!(id = gone.id, importance = gone.importance, "memory evicted");
        }
    }
}

/// One line per memory, oldest first.
fn narrate(mut memories: Vec<&MemorySummary>) -> String {
    memories.reverse();
    memories
        .iter()
        .map(|m| {
            format!(
                "[{:.0}] {} {} -> {} ({}, gain {:+.2})",
                m.timestamp,
                m.outcome.symbol(),
                m.situation,
                m.action_taken,
                m.dominant_desire,
                m.gain
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
