//! DesireState: the live desire vector and its only mutation path.

use serde::{Deserialize, Serialize};

use crate::model::{Desire, DesireDelta, DesireVector};

/// Something that happened and moves the desire vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "delta", rename_all = "snake_case")]
pub enum Outcome {
    /// Realized delta of an executed means. Positive components relieve
    /// the desire (the level goes down).
    Satisfaction(DesireDelta),
    /// External feedback. Positive components raise the desire.
    Stimulus(DesireDelta),
}

/// Owns the live [`DesireVector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesireState {
    current: DesireVector,
}

impl DesireState {
    pub fn new(initial: DesireVector) -> Self {
        Self { current: initial.clamped() }
    }

    pub fn current(&self) -> DesireVector {
        self.current
    }

    /// Apply an outcome and clamp every component into `[0, 1]`.
    ///
    /// Out-of-range results are clamped silently.
    pub fn update(&mut self, outcome: &Outcome) -> DesireVector {
        let (delta, sign) = match outcome {
            Outcome::Satisfaction(d) => (d, -1.0),
            Outcome::Stimulus(d)     => (d, 1.0),
        };
        for desire in Desire::ALL {
            let next = self.current.get(desire) + sign * delta.get(desire);
            self.current.set(desire, next);
        }
        tracing::debug!(
            existing = self.current.existing,
            power = self.current.power,
            understanding = self.current.understanding,
            information = self.current.information,
            "desire vector updated"
        );
        self.current
    }

    /// Highest desire; ties resolved existing > understanding > information > power.
    pub fn dominant(&self) -> (Desire, f64) {
        let mut best = Desire::PRIORITY[0];
        for d in Desire::PRIORITY {
            if self.current.get(d) > self.current.get(best) {
                best = d;
            }
        }
        (best, self.current.get(best))
    }

    /// Lowest desire (the least pressing one); same tie order as `dominant`.
    pub fn weakest(&self) -> (Desire, f64) {
        let mut best = Desire::PRIORITY[0];
        for d in Desire::PRIORITY {
            if self.current.get(d) < self.current.get(best) {
                best = d;
            }
        }
        (best, self.current.get(best))
    }

    /// Urgency: L1 distance between the live vector and `baseline`.
    pub fn pressure(&self, baseline: &DesireVector) -> f64 {
        self.current.l1_distance(baseline)
    }
}

impl Default for DesireState {
    fn default() -> Self {
        Self::new(DesireVector::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfaction_lowers_and_stimulus_raises() {
        let mut s = DesireState::new(DesireVector::new(0.5, 0.5, 0.5, 0.5));
        s.update(&Outcome::Satisfaction(DesireDelta::new(0.2, 0.0, 0.0, 0.0)));
        assert!((s.current().existing - 0.3).abs() < 1e-12);
        s.update(&Outcome::Stimulus(DesireDelta::new(0.0, 0.1, 0.0, 0.0)));
        assert!((s.current().power - 0.6).abs() < 1e-12);
    }

    #[test]
    fn update_clamps_to_unit_range() {
        let mut s = DesireState::new(DesireVector::new(0.9, 0.1, 0.5, 0.5));
        let v = s.update(&Outcome::Stimulus(DesireDelta::new(0.8, -0.9, 0.0, 0.0)));
        assert_eq!(v.existing, 1.0);
        assert_eq!(v.power, 0.0);
    }

    #[test]
    fn dominant_breaks_ties_by_priority() {
        let s = DesireState::new(DesireVector::new(0.3, 0.5, 0.5, 0.5));
        assert_eq!(s.dominant().0, Desire::Understanding);

        let s = DesireState::new(DesireVector::new(0.5, 0.5, 0.5, 0.5));
        assert_eq!(s.dominant().0, Desire::Existing);

        let s = DesireState::new(DesireVector::new(0.1, 0.6, 0.2, 0.6));
        assert_eq!(s.dominant().0, Desire::Information);
    }

    #[test]
    fn pressure_is_l1_distance() {
        let s = DesireState::new(DesireVector::new(0.5, 0.2, 0.25, 0.15));
        let baseline = DesireVector::default();
        assert!((s.pressure(&baseline) - 0.1).abs() < 1e-12);
        assert_eq!(DesireState::new(baseline).pressure(&baseline), 0.0);
    }
}
