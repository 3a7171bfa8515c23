//! JSON persistence for the compaction log.

use std::path::Path;

use fakeman_core::fs;

use crate::config::CompactionConfig;
use crate::error::CompactionError;
use crate::log::EventCompactionLog;
use crate::model::LogSnapshot;

/// Atomically write the log's snapshot to `path`.
pub fn save_log(path: &Path, log: &EventCompactionLog) -> Result<(), CompactionError> {
    fs::write_json_atomic(path, &log.snapshot())?;
    Ok(())
}

/// Load a log from `path`; a missing file yields an empty log.
pub fn load_log(path: &Path, config: CompactionConfig) -> Result<EventCompactionLog, CompactionError> {
    let snapshot: Option<LogSnapshot> = fs::read_json(path)?;
    Ok(match snapshot {
        Some(s) => {
            tracing::info!(segments = s.segments.len(), total_events = s.total_events, "event log restored");
            EventCompactionLog::from_snapshot(s, config)
        }
        None => EventCompactionLog::new(config),
    })
}
