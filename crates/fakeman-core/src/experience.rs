//! Short-horizon experience store.
//!
//! Every executed means leaves one [`Experience`]. The log is bounded
//! (oldest evicted first), searchable by keyword overlap with the current
//! context, and persisted with a redundant backup copy.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::fs;
use crate::model::{Desire, DesireDelta, MeansKind, MeansProposal};

/// One executed means and what it did to the desires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id:         u64,
    pub timestamp:  f64,
    pub context:    String,
    pub purpose:    String,
    pub means:      String,
    pub kind:       MeansKind,
    /// Dominant desire when the action was decided.
    pub trigger:    Desire,
    pub delta:      DesireDelta,
    pub success:    bool,
    pub autonomous: bool,
}

impl Experience {
    /// Re-propose this experience's means for the current tick.
    pub fn to_proposal(&self) -> MeansProposal {
        MeansProposal {
            id:                uuid::Uuid::new_v4(),
            description:       self.means.clone(),
            kind:              self.kind,
            target:            self.delta.strongest(),
            historical_delta:  Some(self.delta),
            achievable:        self.success,
            is_fantasy:        false,
            fantasy_condition: None,
            retrieved_at:      self.timestamp,
            source_experience: Some(self.id),
        }
    }
}

/// Fields of an experience before it is assigned an id.
#[derive(Debug, Clone)]
pub struct NewExperience {
    pub timestamp:  f64,
    pub context:    String,
    pub purpose:    String,
    pub means:      String,
    pub kind:       MeansKind,
    pub trigger:    Desire,
    pub delta:      DesireDelta,
    pub success:    bool,
    pub autonomous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExperienceFile {
    next_id: u64,
    entries: Vec<Experience>,
}

/// Bounded, persisted experience log.
#[derive(Debug, Clone)]
pub struct ExperienceLog {
    entries:        VecDeque<Experience>,
    capacity:       usize,
    next_id:        u64,
    backup_present: bool,
}

impl ExperienceLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries:        VecDeque::new(),
            capacity:       capacity.max(1),
            next_id:        1,
            backup_present: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a redundant copy exists on disk.
    pub fn has_backup(&self) -> bool {
        self.backup_present
    }

    /// Oldest-first view.
    pub fn entries(&self) -> impl Iterator<Item = &Experience> {
        self.entries.iter()
    }

    /// Append an experience, evicting the oldest when full.
    pub fn record(&mut self, new: NewExperience) -> &Experience {
        let exp = Experience {
            id:         self.next_id,
            timestamp:  new.timestamp,
            context:    new.context,
            purpose:    new.purpose,
            means:      new.means,
            kind:       new.kind,
            trigger:    new.trigger,
            delta:      new.delta,
            success:    new.success,
            autonomous: new.autonomous,
        };
        self.next_id += 1;
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(exp);
        &self.entries[self.entries.len() - 1]
    }

    /// Up to `k` experiences most similar to `query` (keyword Jaccard over
    /// context and means), newer first on equal score. An empty query
    /// returns the `k` most recent.
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<&Experience> {
        let q = tokens(query);
        let mut scored: Vec<(f64, &Experience)> = self
            .entries
            .iter()
            .map(|e| {
                if q.is_empty() {
                    return (1.0, e);
                }
                let mut t = tokens(&e.context);
                t.extend(tokens(&e.means));
                let inter = q.intersection(&t).count() as f64;
                let union = q.union(&t).count() as f64;
                (if union > 0.0 { inter / union } else { 0.0 }, e)
            })
            .filter(|(s, _)| *s > 0.0)
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.1.timestamp.partial_cmp(&a.1.timestamp).unwrap_or(std::cmp::Ordering::Equal))
        });
        scored.into_iter().take(k).map(|(_, e)| e).collect()
    }

    /// Persist to `path` and mirror to the backup path.
    pub fn save(&mut self, path: &Path) -> Result<(), CoreError> {
        let file = ExperienceFile {
            next_id: self.next_id,
            entries: self.entries.iter().cloned().collect(),
        };
        fs::write_json_atomic(path, &file)?;
        fs::write_json_atomic(&backup_path(path), &file)?;
        self.backup_present = true;
        Ok(())
    }

    /// Load from `path`, falling back to the backup when the primary is
    /// missing or unreadable. Neither present yields an empty log.
    pub fn load(path: &Path, capacity: usize) -> Result<Self, CoreError> {
        let backup = backup_path(path);
        let file: Option<ExperienceFile> = match fs::read_json(path) {
            Ok(Some(f)) => Some(f),
            Ok(None) => fs::read_json(&backup)?,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "experience log unreadable, trying backup");
                fs::read_json(&backup)?
            }
        };
        let mut log = Self::new(capacity);
        if let Some(f) = file {
            log.next_id = f.next_id;
            for e in f.entries {
                log.next_id = log.next_id.max(e.id + 1);
                while log.entries.len() >= log.capacity {
                    log.entries.pop_front();
                }
                log.entries.push_back(e);
            }
        }
        log.backup_present = backup.exists();
        Ok(log)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(|w| w.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(context: &str, means: &str, ts: f64) -> NewExperience {
        NewExperience {
            timestamp:  ts,
            context:    context.to_string(),
            purpose:    "reduce information".to_string(),
            means:      means.to_string(),
            kind:       MeansKind::AskQuestion,
            trigger:    Desire::Information,
            delta:      DesireDelta::new(0.0, 0.0, 0.0, 0.2),
            success:    true,
            autonomous: false,
        }
    }

    #[test]
    fn record_evicts_oldest() {
        let mut log = ExperienceLog::new(2);
        log.record(sample("a", "x", 1.0));
        log.record(sample("b", "y", 2.0));
        log.record(sample("c", "z", 3.0));
        let ids: Vec<u64> = log.entries().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn retrieve_prefers_overlap_then_recency() {
        let mut log = ExperienceLog::new(10);
        log.record(sample("user asks about weather", "ask where they live", 1.0));
        log.record(sample("user talks about music", "share a song", 2.0));
        log.record(sample("weather again today", "ask about rain", 3.0));
        let hits = log.retrieve("what is the weather", 5);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|e| e.context.contains("weather")));
        assert!(log.retrieve("quantum", 5).is_empty());
        assert_eq!(log.retrieve("", 1)[0].id, 3);
    }

    #[test]
    fn save_writes_backup_and_load_restores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiences.json");
        let mut log = ExperienceLog::new(10);
        log.record(sample("ctx", "means", 1.0));
        assert!(!log.has_backup());
        log.save(&path).unwrap();
        assert!(log.has_backup());

        std::fs::write(&path, b"not json").unwrap();
        let mut back = ExperienceLog::load(&path, 10).unwrap();
        assert_eq!(back.len(), 1);
        assert!(back.has_backup());
        assert_eq!(back.record(sample("n", "m", 2.0)).id, 2);
    }
}
