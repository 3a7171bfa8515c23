//! On-disk layout of one agent instance.
//!
//! ```text
//! <data_dir>/
//!   agent.json            desires, cycle, timers, trigger history
//!   scenario.json         ScenarioState
//!   event_log.json        EventCompactionLog snapshot
//!   experiences.json      ExperienceLog (+ experiences.json.bak)
//!   long_term.json        LongTermMemory
//! ```

use std::path::{Path, PathBuf};

use fakeman_core::{fs, DesireVector, ExperienceLog};
use fakeman_memory::{CompactionConfig, EventCompactionLog, LongTermMemory};
use fakeman_scenario::ScenarioState;
use serde::{Deserialize, Serialize};

use crate::error::AgencyError;
use crate::history::TriggerHistory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub desires:          DesireVector,
    pub cycle:            u64,
    pub last_action_time: Option<f64>,
    pub cooldown_from:    f64,
    pub context:          String,
    pub history:          TriggerHistory,
}

#[derive(Debug, Clone)]
pub struct AgentStore {
    dir: PathBuf,
}

impl AgentStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AgencyError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| fakeman_core::CoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn load_agent(&self) -> Result<Option<AgentState>, AgencyError> {
        let mut state: Option<AgentState> = fs::read_json(&self.path("agent.json"))?;
        if let Some(s) = state.as_mut() {
            s.desires = s.desires.clamped();
        }
        Ok(state)
    }

    pub fn save_agent(&self, state: &AgentState) -> Result<(), AgencyError> {
        fs::write_json_atomic(&self.path("agent.json"), state)?;
        Ok(())
    }

    pub fn load_scenario(&self) -> Result<Option<ScenarioState>, AgencyError> {
        Ok(fakeman_scenario::load_scenario(&self.path("scenario.json"))?)
    }

    pub fn save_scenario(&self, state: &ScenarioState) -> Result<(), AgencyError> {
        fakeman_scenario::save_scenario(&self.path("scenario.json"), state)?;
        Ok(())
    }

    pub fn load_log(&self, config: CompactionConfig) -> Result<EventCompactionLog, AgencyError> {
        Ok(fakeman_memory::load_log(&self.path("event_log.json"), config)?)
    }

    pub fn save_log(&self, log: &EventCompactionLog) -> Result<(), AgencyError> {
        fakeman_memory::save_log(&self.path("event_log.json"), log)?;
        Ok(())
    }

    pub fn load_experiences(&self, capacity: usize) -> Result<ExperienceLog, AgencyError> {
        Ok(ExperienceLog::load(&self.path("experiences.json"), capacity)?)
    }

    pub fn save_experiences(&self, log: &mut ExperienceLog) -> Result<(), AgencyError> {
        log.save(&self.path("experiences.json"))?;
        Ok(())
    }

    pub fn load_long_term(&self, capacity: usize, text_chars: usize) -> Result<LongTermMemory, AgencyError> {
        Ok(LongTermMemory::load(&self.path("long_term.json"), capacity, text_chars)?)
    }

    pub fn save_long_term(&self, memory: &LongTermMemory) -> Result<(), AgencyError> {
        memory.save(&self.path("long_term.json"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_state_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = AgentStore::open(dir.path().join("agent")).unwrap();
        assert!(store.load_agent().unwrap().is_none());

        let mut history = TriggerHistory::new(5);
        history.record(fakeman_core::Desire::Power, true);
        let state = AgentState {
            desires:          DesireVector::new(0.1, 0.2, 0.3, 0.4),
            cycle:            9,
            last_action_time: Some(12.0),
            cooldown_from:    12.0,
            context:          "talking".into(),
            history,
        };
        store.save_agent(&state).unwrap();
        assert_eq!(store.load_agent().unwrap(), Some(state));
    }
}
