//! Operation counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe, fixed set of named counters.
///
/// Names are registered up front; incrementing an unknown name is a no-op.
pub struct StatsCounter {
    counters: BTreeMap<&'static str, AtomicU64>,
}

impl StatsCounter {
    pub fn new(names: &[&'static str]) -> Self {
        let counters = names.iter().map(|&name| (name, AtomicU64::new(0))).collect();
        Self { counters }
    }

    pub fn increment(&self, name: &str) {
        self.add(name, 1);
    }

    pub fn add(&self, name: &str, value: u64) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Current values, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        self.counters
            .iter()
            .map(|(&k, v)| (k, v.load(Ordering::Relaxed)))
            .collect()
    }
}
