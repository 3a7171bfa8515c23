//! Weight-proportional character budget allocation.

use crate::config::AllocatorConfig;
use crate::model::{Allocation, ThoughtFragment};

/// Splits a character budget across thought fragments by weight.
#[derive(Debug, Clone, Default)]
pub struct ThoughtBudgetAllocator {
    pub config: AllocatorConfig,
}

impl ThoughtBudgetAllocator {
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    /// Allocate `budget` characters across `fragments`.
    ///
    /// Returns one [`Allocation`] per input fragment, in input order.
    /// The sum of all quotas never exceeds `budget`, and a fragment of
    /// weight 0 always receives 0.
    pub fn allocate(&self, fragments: &[ThoughtFragment], budget: usize) -> Vec<Allocation> {
        let mut out: Vec<Allocation> = (0..fragments.len())
            .map(|index| Allocation { index, quota: 0, content: String::new() })
            .collect();

        let mut order: Vec<usize> = fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| f.weight > 0.0 && f.weight >= self.config.min_weight_threshold)
            .map(|(i, _)| i)
            .collect();
        if order.is_empty() || budget == 0 {
            return out;
        }
        // Stable: equal weights keep input order.
        order.sort_by(|a, b| {
            fragments[*b].weight
                .partial_cmp(&fragments[*a].weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let total_weight: f64 = order.iter().map(|i| fragments[*i].weight).sum();
        let mut remaining = budget;
        let mut dropped = 0usize;

        for i in order {
            let share = fragments[i].weight / total_weight * budget as f64;
            let quota = (share.round() as usize).min(remaining);
            if quota < self.config.min_readable_length {
                dropped += 1;
                continue;
            }
            remaining -= quota;
            out[i].quota = quota;
            out[i].content = self.truncate(&fragments[i].content, quota);
        }

        tracing::trace!(budget, used = budget - remaining, dropped, "thought budget allocated");
        out
    }

    /// Allocate and join the surviving contents, heaviest first, with `sep`.
    ///
    /// The separator is not counted against the budget.
    pub fn render(&self, fragments: &[ThoughtFragment], budget: usize, sep: &str) -> String {
        let mut kept: Vec<(f64, usize, String)> = self
            .allocate(fragments, budget)
            .into_iter()
            .filter(|a| a.quota > 0 && !a.content.is_empty())
            .map(|a| (fragments[a.index].weight, a.index, a.content))
            .collect();
        kept.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        kept.into_iter().map(|(_, _, c)| c).collect::<Vec<_>>().join(sep)
    }

    /// Cut `content` to at most `quota` characters, marking the cut with
    /// the configured ellipsis when it fits.
    pub fn truncate(&self, content: &str, quota: usize) -> String {
        let len = content.chars().count();
        if len <= quota {
            return content.to_string();
        }
        let marker_len = self.config.ellipsis.chars().count();
        if quota > marker_len {
            let mut s: String = content.chars().take(quota - marker_len).collect();
            s.push_str(&self.config.ellipsis);
            s
        } else {
            content.chars().take(quota).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn frag(content: &str, weight: f64) -> ThoughtFragment {
        ThoughtFragment::new(content, weight, "thought")
    }

    #[test]
    fn quotas_are_weight_proportional() {
        let alloc = ThoughtBudgetAllocator::default();
        let fragments = vec![
            frag(&"a".repeat(200), 0.6),
            frag(&"b".repeat(200), 0.3),
            frag(&"c".repeat(200), 0.1),
        ];
        let out = alloc.allocate(&fragments, 100);
        assert_eq!(out[0].quota, 60);
        assert_eq!(out[1].quota, 30);
        assert_eq!(out[2].quota, 10);
        assert_eq!(out[0].content.chars().count(), 60);
        assert!(out[0].content.ends_with("..."));
    }

    #[test]
    fn zero_weight_gets_nothing() {
        let alloc = ThoughtBudgetAllocator::new(AllocatorConfig {
            min_weight_threshold: 0.0,
            ..AllocatorConfig::default()
        });
        let out = alloc.allocate(&[frag("important thought", 1.0), frag("noise", 0.0)], 50);
        assert_eq!(out[1].quota, 0);
        assert!(out[1].content.is_empty());
        assert_eq!(out[0].content, "important thought");
    }

    #[test]
    fn unreadable_shares_are_dropped() {
        let alloc = ThoughtBudgetAllocator::default();
        let out = alloc.allocate(&[frag("long enough content", 0.9), frag("tiny share", 0.15)], 40);
        assert_eq!(out[0].quota, 34);
        assert_eq!(out[1].quota, 0);
    }

    #[test]
    fn below_threshold_is_filtered() {
        let alloc = ThoughtBudgetAllocator::default();
        let out = alloc.allocate(&[frag("kept content here", 0.5), frag("filtered out", 0.05)], 100);
        assert_eq!(out[0].quota, 100);
        assert_eq!(out[1].quota, 0);
    }

    #[test]
    fn short_content_is_not_padded() {
        let alloc = ThoughtBudgetAllocator::default();
        let out = alloc.allocate(&[frag("hi there", 1.0)], 50);
        assert_eq!(out[0].content, "hi there");
    }

    #[test]
    fn render_orders_by_weight() {
        let alloc = ThoughtBudgetAllocator::default();
        let text = alloc.render(&[frag("second idea", 0.3), frag("first idea", 0.7)], 60, " | ");
        assert_eq!(text, "first idea | second idea");
    }

    #[test]
    fn quota_sum_never_exceeds_budget() {
        let alloc = ThoughtBudgetAllocator::default();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let n = rng.gen_range(0..12);
            let fragments: Vec<ThoughtFragment> = (0..n)
                .map(|_| frag(&"x".repeat(rng.gen_range(0..120)), rng.gen_range(0.0..1.0)))
                .collect();
            let budget = rng.gen_range(0..300);
            let out = alloc.allocate(&fragments, budget);
            let sum: usize = out.iter().map(|a| a.quota).sum();
            assert!(sum <= budget, "sum {sum} > budget {budget}");
            for a in &out {
                assert!(a.content.chars().count() <= a.quota);
            }
        }
    }
}
