use crate::model::DesireVector;

/// Startup and baseline desire levels.
#[derive(Debug, Clone)]
pub struct DesireConfig {
    /// Vector used when no persisted state exists.
    pub initial:  DesireVector,
    /// Reference vector for urgency (`DesireState::pressure`).
    pub baseline: DesireVector,
    /// Capacity of the short-horizon experience log.
    pub experience_capacity: usize,
    /// Scale of signal-driven desire changes, in `[0, 1]`.
    pub signal_strength: f64,
}

impl Default for DesireConfig {
    fn default() -> Self {
        Self {
            initial:             DesireVector::default(),
            baseline:            DesireVector::default(),
            experience_capacity: 100,
            signal_strength:     1.0,
        }
    }
}

impl DesireConfig {
    /// Read `FAKEMAN_DESIRE_{INITIAL,BASELINE}_{EXISTING,POWER,UNDERSTANDING,INFORMATION}`
    /// plus `FAKEMAN_DESIRE_EXPERIENCE_CAPACITY` and `FAKEMAN_DESIRE_SIGNAL_STRENGTH`,
    /// falling back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            initial:             env_vector("FAKEMAN_DESIRE_INITIAL", d.initial),
            baseline:            env_vector("FAKEMAN_DESIRE_BASELINE", d.baseline),
            experience_capacity: std::env::var("FAKEMAN_DESIRE_EXPERIENCE_CAPACITY")
                .ok().and_then(|s| s.parse().ok()).unwrap_or(d.experience_capacity),
            signal_strength:     std::env::var("FAKEMAN_DESIRE_SIGNAL_STRENGTH")
                .ok().and_then(|s| s.parse::<f64>().ok()).map(|v| v.clamp(0.0, 1.0))
                .unwrap_or(d.signal_strength),
        }
    }
}

fn env_vector(prefix: &str, default: DesireVector) -> DesireVector {
    fn component(prefix: &str, name: &str, default: f64) -> f64 {
        std::env::var(format!("{prefix}_{name}"))
            .ok().and_then(|s| s.parse().ok()).unwrap_or(default)
    }
    DesireVector::new(
        component(prefix, "EXISTING", default.existing),
        component(prefix, "POWER", default.power),
        component(prefix, "UNDERSTANDING", default.understanding),
        component(prefix, "INFORMATION", default.information),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_is_clamped() {
        std::env::set_var("FAKEMAN_DESIRE_BASELINE_POWER", "3.5");
        let cfg = DesireConfig::from_env();
        std::env::remove_var("FAKEMAN_DESIRE_BASELINE_POWER");
        assert_eq!(cfg.baseline.power, 1.0);
        assert_eq!(cfg.baseline.existing, 0.4);
    }
}
