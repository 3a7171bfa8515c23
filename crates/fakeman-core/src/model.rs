use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four tracked desires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Desire {
    Existing,
    Power,
    Understanding,
    Information,
}

impl Desire {
    /// Field order of [`DesireVector`].
    pub const ALL: [Desire; 4] = [
        Desire::Existing,
        Desire::Power,
        Desire::Understanding,
        Desire::Information,
    ];

    /// Tie-break order used by `DesireState::dominant`.
    pub const PRIORITY: [Desire; 4] = [
        Desire::Existing,
        Desire::Understanding,
        Desire::Information,
        Desire::Power,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Desire::Existing      => "existing",
            Desire::Power         => "power",
            Desire::Understanding => "understanding",
            Desire::Information   => "information",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "existing"      => Some(Desire::Existing),
            "power"         => Some(Desire::Power),
            "understanding" => Some(Desire::Understanding),
            "information"   => Some(Desire::Information),
            _ => None,
        }
    }
}

impl std::fmt::Display for Desire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current level of each desire. Components always lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesireVector {
    pub existing:      f64,
    pub power:         f64,
    pub understanding: f64,
    pub information:   f64,
}

impl DesireVector {
    /// Build a vector, clamping every component into `[0, 1]`.
    pub fn new(existing: f64, power: f64, understanding: f64, information: f64) -> Self {
        Self {
            existing:      clamp_unit(existing),
            power:         clamp_unit(power),
            understanding: clamp_unit(understanding),
            information:   clamp_unit(information),
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    pub fn get(&self, desire: Desire) -> f64 {
        match desire {
            Desire::Existing      => self.existing,
            Desire::Power         => self.power,
            Desire::Understanding => self.understanding,
            Desire::Information   => self.information,
        }
    }

    /// Set one component (clamped).
    pub fn set(&mut self, desire: Desire, value: f64) {
        let v = clamp_unit(value);
        match desire {
            Desire::Existing      => self.existing = v,
            Desire::Power         => self.power = v,
            Desire::Understanding => self.understanding = v,
            Desire::Information   => self.information = v,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Desire, f64)> + '_ {
        Desire::ALL.iter().map(move |d| (*d, self.get(*d)))
    }

    /// L1 distance to `other`.
    pub fn l1_distance(&self, other: &DesireVector) -> f64 {
        Desire::ALL
            .iter()
            .map(|d| (self.get(*d) - other.get(*d)).abs())
            .sum()
    }

    /// Re-clamp all components. Deserialized vectors may carry out-of-range values.
    pub fn clamped(self) -> Self {
        Self::new(self.existing, self.power, self.understanding, self.information)
    }
}

impl Default for DesireVector {
    fn default() -> Self {
        Self::new(0.4, 0.2, 0.25, 0.15)
    }
}

/// A signed change per desire, each component in `[-1, 1]`.
///
/// Positive components mean *satisfaction*: the desire is relieved.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DesireDelta {
    pub existing:      f64,
    pub power:         f64,
    pub understanding: f64,
    pub information:   f64,
}

impl DesireDelta {
    pub fn new(existing: f64, power: f64, understanding: f64, information: f64) -> Self {
        Self {
            existing:      clamp_signed(existing),
            power:         clamp_signed(power),
            understanding: clamp_signed(understanding),
            information:   clamp_signed(information),
        }
    }

    pub fn get(&self, desire: Desire) -> f64 {
        match desire {
            Desire::Existing      => self.existing,
            Desire::Power         => self.power,
            Desire::Understanding => self.understanding,
            Desire::Information   => self.information,
        }
    }

    pub fn set(&mut self, desire: Desire, value: f64) {
        let v = clamp_signed(value);
        match desire {
            Desire::Existing      => self.existing = v,
            Desire::Power         => self.power = v,
            Desire::Understanding => self.understanding = v,
            Desire::Information   => self.information = v,
        }
    }

    /// Relief realized going from `before` to `after`: how much each
    /// desire went down.
    pub fn between(before: &DesireVector, after: &DesireVector) -> Self {
        Self::new(
            before.existing - after.existing,
            before.power - after.power,
            before.understanding - after.understanding,
            before.information - after.information,
        )
    }

    /// Signed sum of all components.
    pub fn total(&self) -> f64 {
        self.existing + self.power + self.understanding + self.information
    }

    /// Sum of absolute components.
    pub fn magnitude(&self) -> f64 {
        self.existing.abs() + self.power.abs() + self.understanding.abs() + self.information.abs()
    }

    /// Component with the largest absolute change (priority order on ties).
    pub fn strongest(&self) -> Desire {
        let mut best = Desire::PRIORITY[0];
        for d in Desire::PRIORITY {
            if self.get(d).abs() > self.get(best).abs() {
                best = d;
            }
        }
        best
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.existing * factor,
            self.power * factor,
            self.understanding * factor,
            self.information * factor,
        )
    }
}

/// Category of a candidate means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeansKind {
    AskQuestion,
    MakeStatement,
    Proactive,
    Wait,
    Other,
}

impl MeansKind {
    /// Desire a means of this kind serves when nothing more specific is known.
    pub fn default_target(&self) -> Desire {
        match self {
            MeansKind::AskQuestion   => Desire::Information,
            MeansKind::MakeStatement => Desire::Understanding,
            MeansKind::Proactive     => Desire::Power,
            MeansKind::Wait          => Desire::Existing,
            MeansKind::Other         => Desire::Existing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeansKind::AskQuestion   => "ask_question",
            MeansKind::MakeStatement => "make_statement",
            MeansKind::Proactive     => "proactive",
            MeansKind::Wait          => "wait",
            MeansKind::Other         => "other",
        }
    }
}

/// An un-simulated action proposal, as retrieved from history, taken from
/// the default repertoire, or promoted from a fantasy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeansProposal {
    pub id:                Uuid,
    pub description:       String,
    pub kind:              MeansKind,
    pub target:            Desire,
    /// Realized delta of the experience this proposal was retrieved from.
    pub historical_delta:  Option<DesireDelta>,
    pub achievable:        bool,
    pub is_fantasy:        bool,
    pub fantasy_condition: Option<String>,
    /// Timestamp (seconds) of the source the proposal was retrieved from.
    pub retrieved_at:      f64,
    pub source_experience: Option<u64>,
}

impl MeansProposal {
    /// A fresh achievable proposal with no history behind it.
    pub fn fresh(description: impl Into<String>, kind: MeansKind, retrieved_at: f64) -> Self {
        Self {
            id:                Uuid::new_v4(),
            description:       description.into(),
            kind,
            target:            kind.default_target(),
            historical_delta:  None,
            achievable:        true,
            is_fantasy:        false,
            fantasy_condition: None,
            retrieved_at,
            source_experience: None,
        }
    }
}

/// A simulated candidate action. Created per tick, consumed immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMeans {
    pub id:                   Uuid,
    pub description:          String,
    pub kind:                 MeansKind,
    pub target:               Desire,
    pub predicted_delta:      DesireDelta,
    pub survival_probability: f64,
    pub achievable:           bool,
    pub is_fantasy:           bool,
    pub fantasy_condition:    Option<String>,
    pub retrieved_at:         f64,
    pub source_experience:    Option<u64>,
}

impl CandidateMeans {
    /// Expected gain: signed sum of the predicted delta.
    pub fn total_delta(&self) -> f64 {
        self.predicted_delta.total()
    }
}

pub(crate) fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

pub(crate) fn clamp_signed(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
}
