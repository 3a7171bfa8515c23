//! ScenarioSimulator: "what would this means do to my desires?"
//!
//! The scenario implies a desire vector through four independent formulas,
//! one per desire. A candidate's predicted delta combines the history it was
//! retrieved from with the gap between the live and scenario-implied level
//! of the desire it targets. Selection drops net-negative candidates but
//! never returns nothing.

use std::cmp::Ordering;

use fakeman_core::{CandidateMeans, Desire, DesireDelta, DesireVector, MeansProposal};

use crate::config::SimulatorConfig;
use crate::model::{
    ExternalInfoItem, Interlocutor, MemoryStability, ScenarioState, Selection,
};

// ── Formulas ─────────────────────────────────────────────────────────────

/// Weighted memory stability, clamped to `[0, 1]`.
pub fn memory_stability(config: &SimulatorConfig, m: &MemoryStability) -> f64 {
    let short_ratio = if config.short_horizon_capacity > 0.0 {
        (m.short_horizon_count as f64 / config.short_horizon_capacity).min(1.0)
    } else {
        0.0
    };
    let long_ratio = if config.long_horizon_baseline > 0.0 {
        (m.long_horizon_segments as f64 / config.long_horizon_baseline).min(1.0)
    } else {
        0.0
    };
    let stability = short_ratio * config.short_horizon_weight
        + if m.backup_present { config.backup_bonus } else { 0.0 }
        + long_ratio * config.long_horizon_weight
        + m.positive_fraction.clamp(0.0, 1.0) * config.positive_weight;
    stability.clamp(0.0, 1.0)
}

/// `existing = 1 − memory_stability`.
pub fn existing_level(config: &SimulatorConfig, m: &MemoryStability) -> f64 {
    1.0 - memory_stability(config, m)
}

/// `power = (known − achievable) / known`, 0 when nothing is known.
pub fn power_level(known: usize, achievable: usize) -> f64 {
    if known == 0 {
        return 0.0;
    }
    (known.saturating_sub(achievable)) as f64 / known as f64
}

/// `information = 1 − Σ(certainty·importance) / Σ importance`, 0 when the
/// total importance is 0.
pub fn information_level(items: &[ExternalInfoItem]) -> f64 {
    let total: f64 = items.iter().map(|i| i.importance).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let covered: f64 = items.iter().map(|i| i.certainty * i.importance).sum();
    (1.0 - covered / total).clamp(0.0, 1.0)
}

/// `understanding = Σ(importance·deviation) / Σ|importance|`, 0 when the
/// denominator is 0. Antagonists (negative importance) pull it down.
pub fn understanding_level<'a>(interlocutors: impl IntoIterator<Item = &'a Interlocutor>) -> f64 {
    let (weighted, denom) = interlocutors
        .into_iter()
        .fold((0.0, 0.0), |(w, d), i| (w + i.importance * i.deviation, d + i.importance.abs()));
    if denom == 0.0 {
        return 0.0;
    }
    (weighted / denom).clamp(0.0, 1.0)
}

// ── Simulator ────────────────────────────────────────────────────────────

pub struct ScenarioSimulator {
    pub config: SimulatorConfig,
    state:      ScenarioState,
}

impl ScenarioSimulator {
    pub fn new(config: SimulatorConfig, state: ScenarioState) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &ScenarioState {
        &self.state
    }

    /// Desire vector implied by the scenario for a candidate pool of
    /// `known` means of which `achievable` can actually be carried out.
    pub fn predict_desires(&self, known: usize, achievable: usize, m: &MemoryStability) -> DesireVector {
        DesireVector::new(
            existing_level(&self.config, m),
            power_level(known, achievable),
            understanding_level(self.state.interlocutors.values()),
            information_level(&self.state.external_info),
        )
    }

    /// Fill in predicted delta and survival probability for one proposal.
    pub fn simulate(
        &mut self,
        proposal: &MeansProposal,
        desires: &DesireVector,
        predicted: &DesireVector,
    ) -> CandidateMeans {
        let boost = if proposal.is_fantasy { self.config.fantasy_boost } else { 1.0 };
        let history = proposal.historical_delta.unwrap_or_default();

        let mut delta = DesireDelta::default();
        for d in Desire::ALL {
            let mut v = history.get(d) * boost;
            if d == proposal.target {
                v += desires.get(d) - predicted.get(d);
            }
            delta.set(d, v);
        }

        let total = delta.total();
        let mut survival = self.config.survival_base(proposal.kind);
        if total > 0.0 {
            survival += self.config.survival_gain_bonus;
        } else if total < self.config.survival_loss_threshold {
            survival -= self.config.survival_loss_penalty;
        }

        self.state.simulation_count += 1;

        CandidateMeans {
            id:                   proposal.id,
            description:          proposal.description.clone(),
            kind:                 proposal.kind,
            target:               proposal.target,
            predicted_delta:      delta,
            survival_probability: survival.clamp(0.0, 1.0),
            achievable:           proposal.achievable,
            is_fantasy:           proposal.is_fantasy,
            fantasy_condition:    proposal.fantasy_condition.clone(),
            retrieved_at:         proposal.retrieved_at,
            source_experience:    proposal.source_experience,
        }
    }

    /// Simulate a whole pool against the scenario-implied vector of that pool.
    pub fn simulate_all(
        &mut self,
        proposals: &[MeansProposal],
        desires: &DesireVector,
        m: &MemoryStability,
    ) -> Vec<CandidateMeans> {
        let achievable = proposals.iter().filter(|p| p.achievable).count();
        let predicted = self.predict_desires(proposals.len(), achievable, m);
        proposals
            .iter()
            .map(|p| self.simulate(p, desires, &predicted))
            .collect()
    }

    /// Drop net-negative candidates and rank the rest. When every candidate
    /// is negative the least-bad one is put back. `None` only for an empty pool.
    pub fn select(&self, candidates: Vec<CandidateMeans>) -> Option<Selection> {
        let total = candidates.len();
        let (mut kept, mut dropped): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|c| c.total_delta() >= 0.0);
        let discarded = dropped.len();

        let reinserted = kept.is_empty();
        if reinserted {
            dropped.sort_by(rank);
            let best = dropped.into_iter().next()?;
            tracing::debug!(total, total_delta = best.total_delta(), "all candidates negative, reinserting best");
            kept.push(best);
        }

        kept.sort_by(rank);
        let mut iter = kept.into_iter();
        let best = iter.next()?;
        Some(Selection {
            best,
            runners_up: iter.collect(),
            discarded,
            reinserted,
        })
    }

    /// Recompute the scenario-implied vector from the surviving candidates.
    pub fn refresh_prediction(&mut self, selection: &Selection, m: &MemoryStability) -> DesireVector {
        let known = selection.survivor_count();
        let achievable = selection.ranked().filter(|c| c.achievable).count();
        self.state.predicted = self.predict_desires(known, achievable, m);
        self.state.predicted
    }

    /// Simulate, select and refresh in one step.
    pub fn evaluate(
        &mut self,
        proposals: &[MeansProposal],
        desires: &DesireVector,
        m: &MemoryStability,
    ) -> Option<Selection> {
        let candidates = self.simulate_all(proposals, desires, m);
        let selection = self.select(candidates)?;
        self.refresh_prediction(&selection, m);
        tracing::debug!(
            candidates = proposals.len(),
            survivors = selection.survivor_count(),
            discarded = selection.discarded,
            best_gain = selection.best.total_delta(),
            "candidates evaluated"
        );
        Some(selection)
    }

    // ── Scenario updates ─────────────────────────────────────────────────

    /// Record the current context. External input refreshes the
    /// last-input clock and corroborates info items sharing a keyword.
    pub fn update_from_context(&mut self, context: &str, external: bool, now: f64) {
        self.state.situation = context.to_string();
        if !external {
            return;
        }
        self.state.last_external_input = now;
        let words = keywords(context);
        let step = self.config.corroboration_step;
        for item in &mut self.state.external_info {
            if keywords(&item.content).iter().any(|w| words.contains(w)) {
                item.certainty = (item.certainty + step).min(1.0);
            }
        }
    }

    pub fn add_external_info(&mut self, content: impl Into<String>, certainty: f64, importance: f64) {
        self.state.external_info.push(ExternalInfoItem {
            content:    content.into(),
            certainty:  certainty.clamp(0.0, 1.0),
            importance: importance.clamp(0.0, 1.0),
        });
    }

    /// Update (or create) an interlocutor's perceived image and re-derive
    /// the deviation: unknown image 0.8, matching the desired image 0.1,
    /// otherwise 0.5.
    pub fn update_interlocutor(&mut self, name: &str, perceived_image: &str, importance: Option<f64>) {
        let desired_default = self.config.default_desired_image.clone();
        let entry = self
            .state
            .interlocutors
            .entry(name.to_string())
            .or_insert_with(|| Interlocutor {
                importance:      0.5,
                desired_image:   desired_default,
                perceived_image: String::new(),
                deviation:       0.5,
            });
        if let Some(i) = importance {
            entry.importance = i.clamp(-1.0, 1.0);
        }
        entry.perceived_image = perceived_image.trim().to_string();
        entry.deviation = image_deviation(&entry.desired_image, &entry.perceived_image);
    }

    /// Seconds since the last external input.
    pub fn idle_secs(&self, now: f64) -> f64 {
        (now - self.state.last_external_input).max(0.0)
    }

    /// Short textual rendering for prompts.
    pub fn summary(&self) -> String {
        let s = &self.state;
        let mut parts = Vec::new();
        if !s.situation.is_empty() {
            parts.push(format!("Situation: {}", s.situation));
        }
        parts.push(format!("Role: {} ({})", s.role, s.role_expectations));
        for (name, i) in &s.interlocutors {
            parts.push(format!(
                "Interlocutor {name}: importance {:.2}, seen as \"{}\", deviation {:.2}",
                i.importance, i.perceived_image, i.deviation
            ));
        }
        if !s.external_info.is_empty() {
            parts.push(format!("Known facts: {}", s.external_info.len()));
        }
        let p = &s.predicted;
        parts.push(format!(
            "Scenario-implied desires: existing {:.2}, power {:.2}, understanding {:.2}, information {:.2}",
            p.existing, p.power, p.understanding, p.information
        ));
        parts.join("\n")
    }
}

/// Best first: total delta, then survival probability, then recency.
fn rank(a: &CandidateMeans, b: &CandidateMeans) -> Ordering {
    b.total_delta()
        .partial_cmp(&a.total_delta())
        .unwrap_or(Ordering::Equal)
        .then(
            b.survival_probability
                .partial_cmp(&a.survival_probability)
                .unwrap_or(Ordering::Equal),
        )
        .then(b.retrieved_at.partial_cmp(&a.retrieved_at).unwrap_or(Ordering::Equal))
}

fn image_deviation(desired: &str, perceived: &str) -> f64 {
    let perceived = perceived.to_lowercase();
    let desired = desired.to_lowercase();
    if perceived.is_empty() || perceived == "unknown" {
        0.8
    } else if desired.contains(&perceived) || perceived.contains(&desired) {
        0.1
    } else {
        0.5
    }
}

fn keywords(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4)
        .map(|w| w.to_lowercase())
        .collect()
}
