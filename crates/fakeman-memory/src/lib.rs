//! `fakeman-memory` — bounded, time-hierarchical memory of thinking events.
//!
//! An unbounded stream of [`AtomicEvent`]s is folded into an
//! [`EventCompactionLog`] whose live segments always have pairwise distinct
//! lengths (powers of two). Merges are summarized by a pluggable
//! [`Summarizer`]; the deterministic [`RuleSummarizer`] backs it up on
//! failure or timeout.
//!
//! [`LongTermMemory`] sits beside the log: one searchable summary per
//! executed action.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use fakeman_memory::{AtomicEvent, CompactionConfig, EventCompactionLog};
//!
//! let mut log = EventCompactionLog::new(CompactionConfig::default());
//! log.append(event).await?;
//! println!("{}", log.narrative());
//! ```

pub mod config;
pub mod error;
pub mod log;
pub mod long_term;
pub mod model;
pub mod store;
pub mod summarizer;

pub use config::CompactionConfig;
pub use error::{CompactionError, SummarizeError};
pub use log::EventCompactionLog;
pub use long_term::{LongTermMemory, LongTermStats, MemoryOutcome, MemorySummary, NewMemory};
pub use model::{AtomicEvent, EventSegment, LogSnapshot, LogStats, SummaryInput};
pub use store::{load_log, save_log};
pub use summarizer::{RuleSummarizer, Summarizer};
