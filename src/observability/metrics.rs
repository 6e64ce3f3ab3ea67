//! Monotonic counters keyed by name plus a canonical, sorted `k=v` label
//! suffix. Per-run and therefore never shared between runs.

use std::collections::HashMap;
use std::sync::Mutex;

pub struct MetricsRegistry {
    counters: Mutex<HashMap<String, i64>>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self { counters: Mutex::new(HashMap::new()) }
    }

    fn key(name: &str, labels: &[(&str, &str)]) -> String {
        if labels.is_empty() {
            return name.to_string();
        }
        let mut sorted: Vec<&(&str, &str)> = labels.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);
        let parts: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{name}|{}", parts.join(","))
    }

    pub fn inc(&self, name: &str, labels: &[(&str, &str)]) {
        self.inc_by(name, 1, labels);
    }

    pub fn inc_by(&self, name: &str, value: i64, labels: &[(&str, &str)]) {
        let key = Self::key(name, labels);
        let mut counters = self.counters.lock().unwrap();
        *counters.entry(key).or_insert(0) += value;
    }

    pub fn snapshot(&self) -> HashMap<String, i64> {
        self.counters.lock().unwrap().clone()
    }
}
