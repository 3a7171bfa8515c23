/// Tuning for [`crate::ThoughtBudgetAllocator`].
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    /// Fragments lighter than this are dropped before allocation.
    pub min_weight_threshold: f64,
    /// Quotas below this many characters are not worth keeping.
    pub min_readable_length:  usize,
    /// Marker appended to truncated content (counted inside the quota).
    pub ellipsis:             String,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            min_weight_threshold: 0.1,
            min_readable_length:  10,
            ellipsis:             "...".to_string(),
        }
    }
}

impl AllocatorConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            min_weight_threshold: std::env::var("FAKEMAN_ALLOC_MIN_WEIGHT")
                .ok().and_then(|s| s.parse().ok()).unwrap_or(d.min_weight_threshold),
            min_readable_length:  std::env::var("FAKEMAN_ALLOC_MIN_READABLE")
                .ok().and_then(|s| s.parse().ok()).unwrap_or(d.min_readable_length),
            ellipsis:             d.ellipsis,
        }
    }
}
