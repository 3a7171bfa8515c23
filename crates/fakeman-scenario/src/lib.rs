//! `fakeman-scenario` — the agent's model of its situation and the
//! simulator that scores candidate means against it.
//!
//! The scenario implies a desire vector through four formulas:
//!
//! | Desire        | Scenario-implied level                          |
//! |---------------|-------------------------------------------------|
//! | existing      | `1 − memory_stability`                          |
//! | power         | `(known − achievable) / known`                  |
//! | information   | `1 − Σ(certainty·importance) / Σ importance`    |
//! | understanding | `Σ(importance·deviation) / Σ abs(importance)`   |
//!
//! That vector is kept next to, never merged into, the live desire vector.

pub mod config;
pub mod error;
pub mod model;
pub mod simulator;
pub mod store;

pub use config::SimulatorConfig;
pub use error::ScenarioError;
pub use model::{ExternalInfoItem, Interlocutor, MemoryStability, ScenarioState, Selection};
pub use simulator::ScenarioSimulator;
pub use store::{load_scenario, save_scenario};
