//! Agency configuration.
//!
//! All values can be overridden through environment variables:
//!
//! | Env var                              | Default     | Description                                  |
//! |--------------------------------------|-------------|----------------------------------------------|
//! | `FAKEMAN_AGENCY_TICK_MS`             | `1000`      | Loop cadence                                 |
//! | `FAKEMAN_AGENCY_COOLDOWN_SECS`       | `30`        | Minimum gap between actions                  |
//! | `FAKEMAN_AGENCY_MIN_GAIN`            | `0.05`      | Expected gain an action must exceed          |
//! | `FAKEMAN_AGENCY_SUCCESS_FLOOR`       | `0.3`       | Trigger success rate an action must exceed   |
//! | `FAKEMAN_AGENCY_SUCCESS_WINDOW`      | `10`        | Autonomous actions the success rate spans    |
//! | `FAKEMAN_AGENCY_GENERATOR_TIMEOUT_MS`| `30000`     | Deadline for one generator call              |
//! | `FAKEMAN_AGENCY_GATE`                | `threshold` | `threshold` or `llm`                         |
//! | `FAKEMAN_AGENCY_FANTASY_IDLE_SECS`   | `30`        | Idle time before fantasies join the pool     |
//! | `FAKEMAN_AGENCY_FANTASY_COUNT`       | `2`         | Fantasies drawn per evaluation               |
//! | `FAKEMAN_AGENCY_FANTASY_MIN_MAGNITUDE`| `0.1`      | Minimum delta magnitude for a fantasy        |
//! | `FAKEMAN_AGENCY_CAPABILITY_FANTASIES`| `1`         | Capability fantasies drawn per evaluation    |
//! | `FAKEMAN_AGENCY_RETRIEVAL_K`         | `5`         | Past experiences retrieved per evaluation    |
//! | `FAKEMAN_AGENCY_SUMMARY_BUDGET`      | `160`       | Characters of outbound thought summary       |
//! | `FAKEMAN_AGENCY_NARRATIVE_SEGMENTS`  | `3`         | Recent log segments shown to the generator   |
//! | `FAKEMAN_AGENCY_LONG_TERM_CAPACITY`  | `500`       | Action summaries kept in long-term memory    |
//! | `FAKEMAN_AGENCY_LONG_TERM_RECALL`    | `3`         | Long-term memories shown to the generator    |
//! | `FAKEMAN_AGENCY_PURPOSE`             | see below   | Standing purpose used in fantasies           |

use std::time::Duration;

use fakeman_compress::AllocatorConfig;
use fakeman_core::DesireConfig;
use fakeman_fantasy::FantasyConfig;
use fakeman_memory::CompactionConfig;
use fakeman_scenario::SimulatorConfig;

/// Which [`crate::ActionGate`] decides autonomous actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    Threshold,
    Llm,
}

impl std::str::FromStr for GateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "threshold" => Ok(GateMode::Threshold),
            "llm"       => Ok(GateMode::Llm),
            other       => Err(format!("unknown gate mode: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgencyConfig {
    // -- Loop --
    pub tick_interval:     Duration,
    /// Seconds that must pass after an action (or inbound input) before
    /// the agent considers acting on its own.
    pub cooldown_secs:     f64,
    pub generator_timeout: Duration,

    // -- Gate --
    pub gate_mode:          GateMode,
    /// Expected gain (Σ predicted delta) an autonomous action must exceed.
    pub min_expected_gain:  f64,
    /// Success rate of the trigger desire an autonomous action must exceed.
    pub success_rate_floor: f64,
    /// Number of recent autonomous actions the success rate is computed over.
    pub success_window:     usize,

    // -- Candidates --
    pub retrieval_k:           usize,
    pub fantasy_idle_secs:     f64,
    pub fantasy_count:         usize,
    pub fantasy_min_magnitude: f64,
    pub capability_fantasies:  usize,
    pub purpose:               String,

    // -- Output --
    pub thought_summary_budget: usize,
    pub narrative_segments:     usize,

    // -- Long-term memory --
    pub long_term_capacity:   usize,
    /// Characters kept of a memory's situation and action.
    pub long_term_text_chars: usize,
    /// Memories of the trigger desire recalled into the action prompt.
    pub long_term_recall:     usize,

    // -- Engines --
    pub desire:     DesireConfig,
    pub simulator:  SimulatorConfig,
    pub fantasy:    FantasyConfig,
    pub compaction: CompactionConfig,
    pub allocator:  AllocatorConfig,
}

impl Default for AgencyConfig {
    fn default() -> Self {
        Self {
            tick_interval:     Duration::from_millis(1000),
            cooldown_secs:     30.0,
            generator_timeout: Duration::from_secs(30),

            gate_mode:          GateMode::Threshold,
            min_expected_gain:  0.05,
            success_rate_floor: 0.3,
            success_window:     10,

            retrieval_k:           5,
            fantasy_idle_secs:     30.0,
            fantasy_count:         2,
            fantasy_min_magnitude: 0.1,
            capability_fantasies:  1,
            purpose:               "keep a meaningful conversation going".to_string(),

            thought_summary_budget: 160,
            narrative_segments:     3,

            long_term_capacity:   500,
            long_term_text_chars: 100,
            long_term_recall:     3,

            desire:     DesireConfig::default(),
            simulator:  SimulatorConfig::default(),
            fantasy:    FantasyConfig::default(),
            compaction: CompactionConfig::default(),
            allocator:  AllocatorConfig::default(),
        }
    }
}

impl AgencyConfig {
    pub fn from_env() -> Self {
        fn env_u64(key: &str, default: u64) -> u64 {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        }
        fn env_usize(key: &str, default: usize) -> usize {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        }
        fn env_f64(key: &str, default: f64) -> f64 {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        }

        let d = Self::default();
        let gate_mode = match std::env::var("FAKEMAN_AGENCY_GATE") {
            Ok(v) => v.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "falling back to threshold gate");
                GateMode::Threshold
            }),
            Err(_) => d.gate_mode,
        };

        Self {
            tick_interval:     Duration::from_millis(env_u64("FAKEMAN_AGENCY_TICK_MS", 1000)),
            cooldown_secs:     env_f64("FAKEMAN_AGENCY_COOLDOWN_SECS",           d.cooldown_secs),
            generator_timeout: Duration::from_millis(env_u64("FAKEMAN_AGENCY_GENERATOR_TIMEOUT_MS", 30_000)),

            gate_mode,
            min_expected_gain:  env_f64("FAKEMAN_AGENCY_MIN_GAIN",               d.min_expected_gain),
            success_rate_floor: env_f64("FAKEMAN_AGENCY_SUCCESS_FLOOR",          d.success_rate_floor),
            success_window:     env_usize("FAKEMAN_AGENCY_SUCCESS_WINDOW",       d.success_window),

            retrieval_k:           env_usize("FAKEMAN_AGENCY_RETRIEVAL_K",         d.retrieval_k),
            fantasy_idle_secs:     env_f64("FAKEMAN_AGENCY_FANTASY_IDLE_SECS",     d.fantasy_idle_secs),
            fantasy_count:         env_usize("FAKEMAN_AGENCY_FANTASY_COUNT",       d.fantasy_count),
            fantasy_min_magnitude: env_f64("FAKEMAN_AGENCY_FANTASY_MIN_MAGNITUDE", d.fantasy_min_magnitude),
            capability_fantasies:  env_usize("FAKEMAN_AGENCY_CAPABILITY_FANTASIES", d.capability_fantasies),
            purpose:               std::env::var("FAKEMAN_AGENCY_PURPOSE").unwrap_or(d.purpose),

            thought_summary_budget: env_usize("FAKEMAN_AGENCY_SUMMARY_BUDGET",     d.thought_summary_budget),
            narrative_segments:     env_usize("FAKEMAN_AGENCY_NARRATIVE_SEGMENTS", d.narrative_segments),

            long_term_capacity:   env_usize("FAKEMAN_AGENCY_LONG_TERM_CAPACITY", d.long_term_capacity),
            long_term_text_chars: d.long_term_text_chars,
            long_term_recall:     env_usize("FAKEMAN_AGENCY_LONG_TERM_RECALL",   d.long_term_recall),

            desire:     DesireConfig::from_env(),
            simulator:  SimulatorConfig::from_env(),
            fantasy:    FantasyConfig::from_env(),
            compaction: CompactionConfig::from_env(),
            allocator:  AllocatorConfig::from_env(),
        }
    }
}
