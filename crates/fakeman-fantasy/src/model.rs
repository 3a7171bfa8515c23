use fakeman_core::{Desire, DesireDelta, Experience, MeansKind, MeansProposal};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An experience with weights computed for one query. Never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedExperience<'a> {
    pub experience:       &'a Experience,
    pub magnitude_weight: f64,
    pub time_weight:      f64,
    pub total_weight:     f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FantasyKind {
    /// "Doing that again would feel good again."
    Recurrence,
    /// "Had I done otherwise, I would not have lost this."
    Counterfactual,
    /// "If I had capability X, I could reach my purpose."
    Capability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Mild,
    Moderate,
    Strong,
}

/// A read-only hypothetical. Becomes actionable only via [`Fantasy::to_proposal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fantasy {
    pub id:              Uuid,
    pub kind:            FantasyKind,
    pub intensity:       Intensity,
    pub weight:          f64,
    pub experience_id:   Option<u64>,
    pub means_kind:      MeansKind,
    pub condition:       String,
    pub action:          String,
    pub expectation:     String,
    pub affected_desire: Desire,
    pub original_change: DesireDelta,
    /// Delta the fantasy promises if acted on.
    pub hoped_change:    DesireDelta,
    pub timestamp:       f64,
}

impl Fantasy {
    /// Promote to a candidate means proposal flagged as a fantasy.
    pub fn to_proposal(&self) -> MeansProposal {
        MeansProposal {
            id:                Uuid::new_v4(),
            description:       self.action.clone(),
            kind:              self.means_kind,
            target:            self.affected_desire,
            historical_delta:  Some(self.hoped_change),
            achievable:        self.kind != FantasyKind::Capability,
            is_fantasy:        true,
            fantasy_condition: Some(self.condition.clone()),
            retrieved_at:      self.timestamp,
            source_experience: self.experience_id,
        }
    }
}
