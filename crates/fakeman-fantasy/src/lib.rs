//! `fakeman-fantasy` — hypotheticals drawn from the agent's own history.
//!
//! Significant experiences (large desire deltas) and recent ones weigh the
//! most. Good experiences become *recurrence* fantasies ("do that again"),
//! bad ones become *counterfactuals* ("had I done otherwise"). A third kind,
//! *capability* fantasies, imagines abilities the agent lacks for its most
//! pressing desire.
//!
//! Fantasies never mutate anything; [`Fantasy::to_proposal`] turns one into
//! a candidate means for the scenario simulator.

pub mod config;
pub mod generator;
pub mod model;

pub use config::FantasyConfig;
pub use generator::WeightedFantasyGenerator;
pub use model::{Fantasy, FantasyKind, Intensity, WeightedExperience};
