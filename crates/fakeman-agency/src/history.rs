use std::collections::VecDeque;

use fakeman_core::Desire;
use serde::{Deserialize, Serialize};

/// Outcome of one autonomous action, keyed by the desire that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub trigger: Desire,
    pub success: bool,
}

/// Sliding window over the last K autonomous actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerHistory {
    window:  usize,
    records: VecDeque<ActionRecord>,
}

impl TriggerHistory {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1), records: VecDeque::new() }
    }

    pub fn record(&mut self, trigger: Desire, success: bool) {
        while self.records.len() >= self.window {
            self.records.pop_front();
        }
        self.records.push_back(ActionRecord { trigger, success });
    }

    /// `(success rate, samples)` for `trigger` within the window. No
    /// samples reads as a rate of 1.0 so a fresh agent can start acting.
    pub fn success_rate(&self, trigger: Desire) -> (f64, usize) {
        let (hits, n) = self
            .records
            .iter()
            .filter(|r| r.trigger == trigger)
            .fold((0usize, 0usize), |(h, n), r| (h + usize::from(r.success), n + 1));
        if n == 0 {
            (1.0, 0)
        } else {
            (hits as f64 / n as f64, n)
        }
    }

    /// Resize the window, dropping the oldest records if it shrank.
    pub fn resize(&mut self, window: usize) {
        self.window = window.max(1);
        while self.records.len() > self.window {
            self.records.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_per_trigger_within_window() {
        let mut h = TriggerHistory::new(4);
        assert_eq!(h.success_rate(Desire::Power), (1.0, 0));
        h.record(Desire::Power, false);
        h.record(Desire::Power, true);
        h.record(Desire::Information, false);
        h.record(Desire::Power, true);
        assert_eq!(h.success_rate(Desire::Power), (2.0 / 3.0, 3));
        h.record(Desire::Information, true);
        // oldest Power failure fell out of the window
        assert_eq!(h.success_rate(Desire::Power), (1.0, 2));
        assert_eq!(h.success_rate(Desire::Information), (0.5, 2));
    }
}
