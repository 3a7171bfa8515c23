//! `fakeman-compress` — fits weighted thought fragments into a character budget.
//!
//! Heavier fragments get proportionally more room; fragments whose share
//! would be too short to read are dropped rather than mangled. Used by the
//! rule-based segment summarizer and by outbound thought summaries.

pub mod allocator;
pub mod config;
pub mod model;

pub use allocator::ThoughtBudgetAllocator;
pub use config::AllocatorConfig;
pub use model::{Allocation, ThoughtFragment};
