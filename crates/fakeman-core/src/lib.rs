//! `fakeman-core` — shared vocabulary of the FakeMan decision engine.
//!
//! - [`DesireVector`] / [`DesireDelta`]: the four desires (existing, power,
//!   understanding, information) and signed changes to them
//! - [`DesireState`]: owner of the live vector; `update`, `dominant`, `pressure`
//! - [`MeansProposal`] / [`CandidateMeans`]: actions before and after simulation
//! - [`SignalModel`]: desire changes driven by reply and response signals
//! - [`ExperienceLog`]: bounded short-horizon history of executed means
//! - [`fs`]: atomic-replace JSON persistence used by every store

pub mod clock;
pub mod config;
pub mod error;
pub mod experience;
pub mod fs;
pub mod model;
pub mod signal;
pub mod state;

pub use clock::now_secs;
pub use config::DesireConfig;
pub use error::CoreError;
pub use experience::{Experience, ExperienceLog, NewExperience};
pub use model::{CandidateMeans, Desire, DesireDelta, DesireVector, MeansKind, MeansProposal};
pub use signal::{text_certainty, SignalModel, SignalStrengths};
pub use state::{DesireState, Outcome};
