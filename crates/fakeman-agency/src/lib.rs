//! `fakeman-agency` — the decision loop of a FakeMan agent.
//!
//! Every tick the [`AgencyEngine`] reads the [`Mailbox`], gathers candidate
//! means (retrieved experiences, a fixed repertoire and, when idle,
//! fantasies), lets the scenario simulator rank them and asks an
//! [`ActionGate`] whether the best one is worth acting on. Actions are
//! phrased by an external [`Generator`]; its output goes back through the
//! mailbox.
//!
//! ## Architecture
//!
//! ```text
//!        input.json            output.json / state.json
//!            │                          ▲
//!            ▼                          │
//!       ┌─────────┐  tick()  ┌──────────┴───┐
//!       │ Mailbox │ ───────▶ │ AgencyEngine │ ──────▶ AgentStore (data dir)
//!       └─────────┘          └──────┬───────┘
//!                                   │
//!     ┌──────────────┬──────────────┼───────────────┬──────────────┐
//!     ▼              ▼              ▼               ▼              ▼
//!  DesireState   ExperienceLog  ScenarioSimulator  ActionGate    Generator
//!                     │              ▲                            │
//!                     ▼              │                            ▼
//!             FantasyGenerator ──────┘                  EventCompactionLog
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod generator;
pub mod history;
pub mod mailbox;
pub mod prompt;
pub mod store;

pub use config::{AgencyConfig, GateMode};
pub use engine::{AgencyEngine, LoopPhase, TickOutcome, TickReport};
pub use error::{AgencyError, GeneratorError};
pub use gate::{build_gate, ActionGate, GateDecision, GateInput, LlmGate, ThresholdGate};
pub use generator::{CommandGenerator, EchoGenerator, Generator, GeneratorSummarizer};
pub use history::{ActionRecord, TriggerHistory};
pub use mailbox::{
    ActionType, ChannelMailbox, ChannelPeer, FileMailbox, InboundMessage, Mailbox, OutboundMessage,
    RunStatus, StatusSnapshot, INBOUND_FILE, OUTBOUND_FILE, STATUS_FILE,
};
pub use store::{AgentState, AgentStore};
