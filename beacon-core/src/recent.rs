//! Log of hosts that recently pinged the server, oldest first. Duplicates are kept.

use std::collections::VecDeque;

/// Roughly how many machines the log is sized for.
pub const DEFAULT_RECENT_CAPACITY: usize = 20;

/// How [`RecentSubjects::trim`] enforces the capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrimPolicy {
    /// Drop at most one oldest entry per trim while over capacity.
    /// A burst of pings inside one tick leaves the log above capacity for several ticks.
    #[default]
    OnePerTick,
    /// Drop oldest entries until the log is at capacity.
    Strict,
}

#[derive(Debug, Clone)]
pub struct RecentSubjects {
    entries: VecDeque<String>,
    capacity: usize,
    policy: TrimPolicy,
}

impl RecentSubjects {
    pub fn new(capacity: usize, policy: TrimPolicy) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            policy,
        }
    }

    pub fn push(&mut self, host: impl Into<String>) {
        self.entries.push_back(host.into());
    }

    /// Enforce the capacity per policy. Returns how many entries were dropped.
    pub fn trim(&mut self) -> usize {
        match self.policy {
            TrimPolicy::OnePerTick => {
                if self.entries.len() > self.capacity {
                    self.entries.pop_front();
                    1
                } else {
                    0
                }
            }
            TrimPolicy::Strict => {
                let excess = self.entries.len().saturating_sub(self.capacity);
                self.entries.drain(..excess);
                excess
            }
        }
    }

    pub fn set_policy(&mut self, policy: TrimPolicy) {
        self.policy = policy;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl Default for RecentSubjects {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_CAPACITY, TrimPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_per_tick_drops_single_oldest() {
        let mut log = RecentSubjects::default();
        for i in 0..25 {
            log.push(format!("10.0.0.{i}"));
        }
        assert_eq!(log.trim(), 1);
        assert_eq!(log.len(), 24);
        assert_eq!(log.iter().next(), Some("10.0.0.1"));
        for _ in 0..3 {
            log.trim();
        }
        assert_eq!(log.len(), 21);
        // 21 > 20, so one more trim still removes an entry; the next does not.
        assert_eq!(log.trim(), 1);
        assert_eq!(log.trim(), 0);
        assert_eq!(log.len(), 20);
    }

    #[test]
    fn trim_each_insert_settles_at_capacity() {
        let mut log = RecentSubjects::default();
        for i in 0..25 {
            log.push(format!("h{i}"));
            log.trim();
        }
        assert_eq!(log.len(), 20);
        assert_eq!(log.iter().next(), Some("h5"));
    }

    #[test]
    fn strict_trims_to_capacity() {
        let mut log = RecentSubjects::new(3, TrimPolicy::Strict);
        for h in ["a", "b", "c", "d", "e"] {
            log.push(h);
        }
        assert_eq!(log.trim(), 2);
        assert_eq!(log.iter().collect::<Vec<_>>(), vec!["c", "d", "e"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut log = RecentSubjects::default();
        log.push("a");
        log.push("a");
        assert_eq!(log.len(), 2);
    }
}
