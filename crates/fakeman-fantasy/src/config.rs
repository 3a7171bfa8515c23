/// Configuration for the weighted fantasy generator.
#[derive(Debug, Clone)]
pub struct FantasyConfig {
    /// Recency decay per second: `time_weight = exp(−λ·age)`.
    pub decay_lambda:            f64,
    pub magnitude_factor:        f64,
    pub time_factor:             f64,
    /// Experiences whose total weight falls below this are ignored.
    pub weight_floor:            f64,
    /// Total weight above which a fantasy is strong.
    pub strong_threshold:        f64,
    /// Total weight above which a fantasy is moderate.
    pub moderate_threshold:      f64,
    /// Share of a loss a counterfactual hopes to win back.
    pub counterfactual_reversal: f64,
    /// Share of the most pressing desire a capability fantasy hopes to relieve.
    pub capability_hope_factor:  f64,
}

impl Default for FantasyConfig {
    fn default() -> Self {
        Self {
            decay_lambda:            1e-4,
            magnitude_factor:        0.7,
            time_factor:             0.3,
            weight_floor:            0.01,
            strong_threshold:        0.4,
            moderate_threshold:      0.2,
            counterfactual_reversal: 0.5,
            capability_hope_factor:  0.5,
        }
    }
}

impl FantasyConfig {
    pub fn from_env() -> Self {
        fn env_f64(key: &str, default: f64) -> f64 {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        }
        let d = Self::default();
        Self {
            decay_lambda:            env_f64("FAKEMAN_FANTASY_DECAY_LAMBDA",       d.decay_lambda),
            magnitude_factor:        env_f64("FAKEMAN_FANTASY_MAGNITUDE_FACTOR",   d.magnitude_factor),
            time_factor:             env_f64("FAKEMAN_FANTASY_TIME_FACTOR",        d.time_factor),
            weight_floor:            env_f64("FAKEMAN_FANTASY_WEIGHT_FLOOR",       d.weight_floor),
            strong_threshold:        env_f64("FAKEMAN_FANTASY_STRONG_THRESHOLD",   d.strong_threshold),
            moderate_threshold:      env_f64("FAKEMAN_FANTASY_MODERATE_THRESHOLD", d.moderate_threshold),
            counterfactual_reversal: env_f64("FAKEMAN_FANTASY_REVERSAL",           d.counterfactual_reversal),
            capability_hope_factor:  env_f64("FAKEMAN_FANTASY_CAPABILITY_HOPE",    d.capability_hope_factor)
                .clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_hope_is_read_from_env_and_clamped() {
        std::env::set_var("FAKEMAN_FANTASY_CAPABILITY_HOPE", "1.8");
        let cfg = FantasyConfig::from_env();
        std::env::remove_var("FAKEMAN_FANTASY_CAPABILITY_HOPE");
        assert_eq!(cfg.capability_hope_factor, 1.0);
        assert_eq!(FantasyConfig::default().capability_hope_factor, 0.5);
    }
}
