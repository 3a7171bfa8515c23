use std::collections::BTreeMap;

use fakeman_core::{CandidateMeans, DesireVector};
use serde::{Deserialize, Serialize};

/// A piece of externally supplied knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalInfoItem {
    pub content:    String,
    /// How sure the agent is of it, in `[0, 1]`.
    pub certainty:  f64,
    /// How much it matters, in `[0, 1]`.
    pub importance: f64,
}

/// How the agent believes one interlocutor sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interlocutor {
    /// Signed: negative importance marks an antagonist.
    pub importance:      f64,
    pub desired_image:   String,
    pub perceived_image: String,
    /// Gap between desired and perceived image, in `[0, 1]`.
    pub deviation:       f64,
}

/// The agent's model of the situation it is in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioState {
    pub situation:           String,
    pub role:                String,
    pub role_expectations:   String,
    pub external_info:       Vec<ExternalInfoItem>,
    pub interlocutors:       BTreeMap<String, Interlocutor>,
    /// Seconds timestamp of the last input from outside.
    pub last_external_input: f64,
    pub simulation_count:    u64,
    /// Desire levels implied by the scenario; never merged into the live vector.
    pub predicted:           DesireVector,
}

impl Default for ScenarioState {
    fn default() -> Self {
        let mut interlocutors = BTreeMap::new();
        interlocutors.insert(
            "user".to_string(),
            Interlocutor {
                importance:      0.5,
                desired_image:   "helpful and trustworthy".to_string(),
                perceived_image: "unknown".to_string(),
                deviation:       0.5,
            },
        );
        Self {
            situation:           String::new(),
            role:                "conversational agent".to_string(),
            role_expectations:   "be helpful and keep the conversation going".to_string(),
            external_info:       Vec::new(),
            interlocutors,
            last_external_input: 0.0,
            simulation_count:    0,
            predicted:           DesireVector::zero(),
        }
    }
}

/// Inputs for the memory-stability term of the `existing` formula.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryStability {
    /// Entries in the short-horizon experience store.
    pub short_horizon_count: usize,
    pub backup_present:      bool,
    /// Live segments in the long-horizon event log.
    pub long_horizon_segments: usize,
    /// Positive-outcome share of long-horizon events, in `[0, 1]`.
    pub positive_fraction:   f64,
}

/// Outcome of candidate selection. Holding `best` by value makes an
/// empty selection unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub best:        CandidateMeans,
    /// Remaining survivors, best first.
    pub runners_up:  Vec<CandidateMeans>,
    /// Candidates dropped for a negative total delta.
    pub discarded:   usize,
    /// True when every candidate was negative and the best one was put back.
    pub reinserted:  bool,
}

impl Selection {
    /// All survivors, best first.
    pub fn ranked(&self) -> impl Iterator<Item = &CandidateMeans> {
        std::iter::once(&self.best).chain(self.runners_up.iter())
    }

    pub fn survivor_count(&self) -> usize {
        1 + self.runners_up.len()
    }
}
