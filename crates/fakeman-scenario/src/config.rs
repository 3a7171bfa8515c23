use fakeman_core::MeansKind;

/// Configuration for the scenario simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    // -- Memory stability (existing desire) --
    /// Experience count at which the short-horizon store counts as full.
    pub short_horizon_capacity: f64,
    pub short_horizon_weight:   f64,
    /// Added when a redundant backup of memory exists.
    pub backup_bonus:           f64,
    /// Segment count at which the long-horizon log counts as full.
    pub long_horizon_baseline:  f64,
    pub long_horizon_weight:    f64,
    pub positive_weight:        f64,

    // -- Candidate prediction --
    /// Multiplier applied to a fantasy's historical delta.
    pub fantasy_boost: f64,

    // -- Survival probability --
    pub survival_ask_question:   f64,
    pub survival_make_statement: f64,
    pub survival_proactive:      f64,
    pub survival_wait:           f64,
    pub survival_other:          f64,
    /// Added when the predicted total is positive.
    pub survival_gain_bonus:     f64,
    /// Subtracted when the predicted total is below `survival_loss_threshold`.
    pub survival_loss_penalty:   f64,
    pub survival_loss_threshold: f64,

    // -- Scenario updates --
    /// Certainty added to info items corroborated by new external input.
    pub corroboration_step:    f64,
    /// Image assumed wanted for a newly seen interlocutor.
    pub default_desired_image: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            short_horizon_capacity: 100.0,
            short_horizon_weight:   0.4,
            backup_bonus:           0.3,
            long_horizon_baseline:  8.0,
            long_horizon_weight:    0.3,
            positive_weight:        0.2,

            fantasy_boost: 1.5,

            survival_ask_question:   0.9,
            survival_make_statement: 0.85,
            survival_proactive:      0.7,
            survival_wait:           0.95,
            survival_other:          0.8,
            survival_gain_bonus:     0.05,
            survival_loss_penalty:   0.1,
            survival_loss_threshold: -0.1,

            corroboration_step:    0.1,
            default_desired_image: "helpful and trustworthy".to_string(),
        }
    }
}

impl SimulatorConfig {
    pub fn from_env() -> Self {
        fn env_f64(key: &str, default: f64) -> f64 {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        }
        let d = Self::default();
        Self {
            short_horizon_capacity:  env_f64("FAKEMAN_SIM_SHORT_CAPACITY",      d.short_horizon_capacity),
            short_horizon_weight:    env_f64("FAKEMAN_SIM_SHORT_WEIGHT",        d.short_horizon_weight),
            backup_bonus:            env_f64("FAKEMAN_SIM_BACKUP_BONUS",        d.backup_bonus),
            long_horizon_baseline:   env_f64("FAKEMAN_SIM_LONG_BASELINE",       d.long_horizon_baseline),
            long_horizon_weight:     env_f64("FAKEMAN_SIM_LONG_WEIGHT",         d.long_horizon_weight),
            positive_weight:         env_f64("FAKEMAN_SIM_POSITIVE_WEIGHT",     d.positive_weight),
            fantasy_boost:           env_f64("FAKEMAN_SIM_FANTASY_BOOST",       d.fantasy_boost),
            survival_ask_question:   d.survival_ask_question,
            survival_make_statement: d.survival_make_statement,
            survival_proactive:      d.survival_proactive,
            survival_wait:           d.survival_wait,
            survival_other:          d.survival_other,
            survival_gain_bonus:     d.survival_gain_bonus,
            survival_loss_penalty:   d.survival_loss_penalty,
            survival_loss_threshold: d.survival_loss_threshold,
            corroboration_step:      env_f64("FAKEMAN_SIM_CORROBORATION_STEP",  d.corroboration_step),
            default_desired_image:   std::env::var("FAKEMAN_SIM_DESIRED_IMAGE")
                .unwrap_or(d.default_desired_image),
        }
    }

    /// Base survival probability for a means kind.
    pub fn survival_base(&self, kind: MeansKind) -> f64 {
        match kind {
            MeansKind::AskQuestion   => self.survival_ask_question,
            MeansKind::MakeStatement => self.survival_make_statement,
            MeansKind::Proactive     => self.survival_proactive,
            MeansKind::Wait          => self.survival_wait,
            MeansKind::Other         => self.survival_other,
        }
    }
}
