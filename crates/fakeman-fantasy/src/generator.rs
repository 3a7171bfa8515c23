//! WeightedFantasyGenerator: turns significant, recent experiences into
//! recurrence and counterfactual fantasies.
//!
//! ```text
//! magnitude_weight = Σ |δ_i|
//! time_weight      = exp(−λ · (now − ts))
//! total_weight     = 0.7 · magnitude_weight + 0.3 · time_weight
//! ```

use std::cmp::Ordering;

use fakeman_core::{Desire, DesireDelta, DesireVector, Experience, MeansKind};
use uuid::Uuid;

use crate::config::FantasyConfig;
use crate::model::{Fantasy, FantasyKind, Intensity, WeightedExperience};

pub struct WeightedFantasyGenerator {
    pub config: FantasyConfig,
}

impl WeightedFantasyGenerator {
    pub fn new(config: FantasyConfig) -> Self {
        Self { config }
    }

    /// Weigh every experience as of `now`.
    pub fn weigh<'a>(
        &self,
        history: impl IntoIterator<Item = &'a Experience>,
        now: f64,
    ) -> Vec<WeightedExperience<'a>> {
        history
            .into_iter()
            .map(|e| {
                let magnitude_weight = e.delta.magnitude();
                let age = (now - e.timestamp).max(0.0);
                let time_weight = (-self.config.decay_lambda * age).exp();
                WeightedExperience {
                    experience: e,
                    magnitude_weight,
                    time_weight,
                    total_weight: self.config.magnitude_factor * magnitude_weight
                        + self.config.time_factor * time_weight,
                }
            })
            .collect()
    }

    /// Up to `k` fantasies from the heaviest experiences whose magnitude is
    /// at least `min_magnitude`. Experiences with a zero aggregate delta
    /// carry no direction and produce nothing.
    pub fn generate<'a>(
        &self,
        history: impl IntoIterator<Item = &'a Experience>,
        now: f64,
        k: usize,
        min_magnitude: f64,
    ) -> Vec<Fantasy> {
        let mut weighted: Vec<WeightedExperience<'a>> = self
            .weigh(history, now)
            .into_iter()
            .filter(|w| {
                w.magnitude_weight >= min_magnitude
                    && w.total_weight >= self.config.weight_floor
                    && w.experience.delta.total() != 0.0
            })
            .collect();
        weighted.sort_by(|a, b| {
            b.total_weight
                .partial_cmp(&a.total_weight)
                .unwrap_or(Ordering::Equal)
                .then(b.experience.timestamp.partial_cmp(&a.experience.timestamp).unwrap_or(Ordering::Equal))
        });

        let fantasies: Vec<Fantasy> = weighted
            .iter()
            .take(k)
            .filter_map(|w| self.fantasize(w, now))
            .collect();
        tracing::debug!(count = fantasies.len(), k, "fantasies generated");
        fantasies
    }

    /// "If I had capability X" fantasies for the most pressing desire.
    pub fn capability_fantasies(&self, desires: &DesireVector, purpose: &str, n: usize, now: f64) -> Vec<Fantasy> {
        let mut order: Vec<(Desire, f64)> = desires.iter().collect();
        order.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let Some((desire, level)) = order.first().copied() else {
            return Vec::new();
        };

        capability_templates(desire)
            .iter()
            .take(n)
            .map(|(capability, kind)| {
                let mut hoped = DesireDelta::default();
                hoped.set(desire, level * self.config.capability_hope_factor);
                Fantasy {
                    id:              Uuid::new_v4(),
                    kind:            FantasyKind::Capability,
                    intensity:       self.intensity(level),
                    weight:          level,
                    experience_id:   None,
                    means_kind:      *kind,
                    condition:       format!("If I had {capability}"),
                    action:          format!("work towards {capability} to {purpose}"),
                    expectation:     format!("I could better {purpose}"),
                    affected_desire: desire,
                    original_change: DesireDelta::default(),
                    hoped_change:    hoped,
                    timestamp:       now,
                }
            })
            .collect()
    }

    pub fn intensity(&self, weight: f64) -> Intensity {
        if weight > self.config.strong_threshold {
            Intensity::Strong
        } else if weight > self.config.moderate_threshold {
            Intensity::Moderate
        } else {
            Intensity::Mild
        }
    }

    /// One-paragraph description of a fantasy set.
    pub fn summary(&self, fantasies: &[Fantasy]) -> String {
        if fantasies.is_empty() {
            return "No fantasies right now.".to_string();
        }
        let count = |k: FantasyKind| fantasies.iter().filter(|f| f.kind == k).count();
        let mut parts = vec![format!(
            "{} fantasies ({} recurrence, {} counterfactual, {} capability).",
            fantasies.len(),
            count(FantasyKind::Recurrence),
            count(FantasyKind::Counterfactual),
            count(FantasyKind::Capability),
        )];
        if let Some(top) = fantasies
            .iter()
            .max_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap_or(Ordering::Equal))
        {
            parts.push(format!("Strongest: {}, {}.", top.condition, top.expectation));
        }
        parts.join(" ")
    }

    fn fantasize(&self, w: &WeightedExperience<'_>, now: f64) -> Option<Fantasy> {
        let e = w.experience;
        let aggregate = e.delta.total();
        let affected = e.delta.strongest();
        let (kind, condition, action, expectation, hoped) = if aggregate > 0.0 {
            (
                FantasyKind::Recurrence,
                format!("If I {} again in a similar situation", e.means),
                e.means.clone(),
                format!("{} could ease again by {:.2}", affected, e.delta.get(affected).abs()),
                e.delta,
            )
        } else if aggregate < 0.0 {
            (
                FantasyKind::Counterfactual,
                format!("If I had not {} back then", e.means),
                format!("try something other than: {}", e.means),
                format!("I would not have lost {:.2} on {}", e.delta.get(affected).abs(), affected),
                e.delta.scaled(-self.config.counterfactual_reversal),
            )
        } else {
            return None;
        };

        Some(Fantasy {
            id:              Uuid::new_v4(),
            kind,
            intensity:       self.intensity(w.total_weight),
            weight:          w.total_weight,
            experience_id:   Some(e.id),
            means_kind:      if kind == FantasyKind::Counterfactual { MeansKind::Other } else { e.kind },
            condition,
            action,
            expectation,
            affected_desire: affected,
            original_change: e.delta,
            hoped_change:    hoped,
            timestamp:       now,
        })
    }
}

impl Default for WeightedFantasyGenerator {
    fn default() -> Self {
        Self::new(FantasyConfig::default())
    }
}

fn capability_templates(desire: Desire) -> &'static [(&'static str, MeansKind)] {
    match desire {
        Desire::Existing => &[
            ("a durable backup of my memories", MeansKind::Proactive),
            ("a guarantee that this conversation continues", MeansKind::MakeStatement),
        ],
        Desire::Power => &[
            ("more tools at my disposal", MeansKind::Proactive),
            ("permission to act on my own", MeansKind::AskQuestion),
        ],
        Desire::Understanding => &[
            ("a clearer picture of how I am seen", MeansKind::AskQuestion),
            ("the words to explain myself fully", MeansKind::MakeStatement),
        ],
        Desire::Information => &[
            ("complete knowledge of this situation", MeansKind::AskQuestion),
            ("a reliable source to check my facts", MeansKind::Proactive),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(id: u64, ts: f64, delta: DesireDelta) -> Experience {
        Experience {
            id,
            timestamp:  ts,
            context:    "ctx".into(),
            purpose:    "be understood".into(),
            means:      format!("said thing {id}"),
            kind:       MeansKind::MakeStatement,
            trigger:    Desire::Understanding,
            delta,
            success:    true,
            autonomous: false,
        }
    }

    #[test]
    fn recency_never_lowers_weight_at_equal_magnitude() {
        let g = WeightedFantasyGenerator::default();
        let delta = DesireDelta::new(0.2, 0.0, -0.1, 0.0);
        let history = [exp(1, 1_000.0, delta), exp(2, 9_000.0, delta)];
        let w = g.weigh(&history, 10_000.0);
        assert_eq!(w[0].magnitude_weight, w[1].magnitude_weight);
        assert!(w[1].time_weight >= w[0].time_weight);
        assert!(w[1].total_weight >= w[0].total_weight);
    }

    #[test]
    fn weights_follow_formula() {
        let g = WeightedFantasyGenerator::default();
        let history = [exp(1, 0.0, DesireDelta::new(0.3, -0.2, 0.0, 0.0))];
        let w = &g.weigh(&history, 10_000.0)[0];
        assert!((w.magnitude_weight - 0.5).abs() < 1e-12);
        assert!((w.time_weight - (-1.0f64).exp()).abs() < 1e-12);
        assert!((w.total_weight - (0.35 + 0.3 * (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn sign_selects_fantasy_kind() {
        let g = WeightedFantasyGenerator::default();
        let history = [
            exp(1, 100.0, DesireDelta::new(0.0, 0.0, 0.4, 0.0)),
            exp(2, 100.0, DesireDelta::new(-0.3, 0.0, 0.0, 0.0)),
            exp(3, 100.0, DesireDelta::new(0.2, -0.2, 0.0, 0.0)),
        ];
        let fantasies = g.generate(&history, 100.0, 10, 0.1);
        assert_eq!(fantasies.len(), 2);
        let recur = fantasies.iter().find(|f| f.experience_id == Some(1)).unwrap();
        assert_eq!(recur.kind, FantasyKind::Recurrence);
        assert_eq!(recur.affected_desire, Desire::Understanding);
        assert_eq!(recur.intensity, Intensity::Strong);
        let cf = fantasies.iter().find(|f| f.experience_id == Some(2)).unwrap();
        assert_eq!(cf.kind, FantasyKind::Counterfactual);
        assert!(cf.hoped_change.existing > 0.0);
    }

    #[test]
    fn top_k_and_min_magnitude() {
        let g = WeightedFantasyGenerator::default();
        let history: Vec<Experience> = (1..=6)
            .map(|i| exp(i, 0.0, DesireDelta::new(0.05 * i as f64, 0.0, 0.0, 0.0)))
            .collect();
        let fantasies = g.generate(&history, 0.0, 2, 0.1);
        let ids: Vec<Option<u64>> = fantasies.iter().map(|f| f.experience_id).collect();
        assert_eq!(ids, vec![Some(6), Some(5)]);
        assert!(g.generate(&history, 0.0, 10, 0.5).is_empty());
    }

    #[test]
    fn thresholds_are_configurable() {
        let g = WeightedFantasyGenerator::new(FantasyConfig {
            strong_threshold: 0.9,
            moderate_threshold: 0.5,
            ..FantasyConfig::default()
        });
        assert_eq!(g.intensity(0.6), Intensity::Moderate);
        assert_eq!(g.intensity(0.95), Intensity::Strong);
        assert_eq!(g.intensity(0.5), Intensity::Mild);
    }

    #[test]
    fn promoted_fantasy_is_flagged() {
        let g = WeightedFantasyGenerator::default();
        let history = [exp(7, 0.0, DesireDelta::new(0.0, 0.0, 0.3, 0.0))];
        let f = &g.generate(&history, 0.0, 1, 0.0)[0];
        let p = f.to_proposal();
        assert!(p.is_fantasy);
        assert!(p.achievable);
        assert_eq!(p.fantasy_condition.as_deref(), Some(f.condition.as_str()));
        assert_eq!(p.source_experience, Some(7));
    }

    #[test]
    fn capability_fantasies_target_most_pressing_desire() {
        let g = WeightedFantasyGenerator::default();
        let desires = DesireVector::new(0.2, 0.1, 0.3, 0.9);
        let fs = g.capability_fantasies(&desires, "help the user", 2, 5.0);
        assert_eq!(fs.len(), 2);
        assert!(fs.iter().all(|f| f.affected_desire == Desire::Information));
        assert!(fs.iter().all(|f| !f.to_proposal().achievable));
        assert!(g.summary(&fs).starts_with("2 fantasies (0 recurrence, 0 counterfactual, 2 capability)."));
        assert!((fs[0].hoped_change.information - 0.45).abs() < 1e-12);
    }

    #[test]
    fn capability_hope_follows_config() {
        let g = WeightedFantasyGenerator::new(FantasyConfig {
            capability_hope_factor: 0.2,
            ..FantasyConfig::default()
        });
        let desires = DesireVector::new(0.8, 0.1, 0.3, 0.2);
        let fs = g.capability_fantasies(&desires, "stay safe", 1, 0.0);
        assert_eq!(fs[0].affected_desire, Desire::Existing);
        assert!((fs[0].hoped_change.existing - 0.16).abs() < 1e-12);
        assert_eq!(fs[0].hoped_change.power, 0.0);
    }
}
