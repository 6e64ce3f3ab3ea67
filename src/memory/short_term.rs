//! Run-local scratchpad. Plain mutable state owned by the executor: no
//! sharing, no locking, no global — created per run, dropped when the run
//! ends.

use std::collections::HashMap;

use serde_json::{json, Value};
use sha1::{Digest, Sha1};

#[derive(Debug, Clone, Default)]
pub struct ShortTermMemory {
    pub state: HashMap<String, Value>,
    pub step_outputs: HashMap<String, Value>,
    pub observations: Vec<Value>,
    pub retries: HashMap<String, i64>,
    pub refinements: Vec<Value>,
    pub criteria_progress: HashMap<String, bool>,
    seen_step_signatures: HashMap<String, i64>,
}

impl ShortTermMemory {
    pub fn new(initial_state: HashMap<String, Value>) -> Self {
        Self { state: initial_state, ..Default::default() }
    }

    pub fn record_observation(&mut self, step_id: &str, observation: Value) {
        let mut entry = observation.clone();
        if let Value::Object(ref mut map) = entry {
            map.insert("step_id".to_string(), json!(step_id));
        }
        self.observations.push(entry);
        self.step_outputs.insert(step_id.to_string(), observation.clone());
        self.state.insert("last_observation".to_string(), observation);
        self.state.insert("last_step_id".to_string(), json!(step_id));
    }

    pub fn mark_retry(&mut self, step_id: &str) -> i64 {
        let counter = self.retries.entry(step_id.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn retry_count(&self, step_id: &str) -> i64 {
        *self.retries.get(step_id).unwrap_or(&0)
    }

    pub fn record_refinement(&mut self, payload: Value) {
        self.state.insert("last_refinement".to_string(), payload.clone());
        self.refinements.push(payload);
    }

    /// `sha1(canonical_json({tool_name, tool_args}))`, keys sorted
    /// recursively. Bumps the signature's occurrence count as a side effect.
    pub fn step_signature(&mut self, tool_name: &str, tool_args: &HashMap<String, Value>) -> String {
        let canonical = canonical_json(&json!({ "tool_name": tool_name, "tool_args": tool_args }));
        let mut hasher = Sha1::new();
        hasher.update(canonical.as_bytes());
        let sig = hex_encode(&hasher.finalize());
        *self.seen_step_signatures.entry(sig.clone()).or_insert(0) += 1;
        sig
    }

    pub fn signature_count(&self, signature: &str) -> i64 {
        *self.seen_step_signatures.get(signature).unwrap_or(&0)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Recursively sorts object keys so the JSON text is a stable hash input.
pub fn canonical_json(value: &Value) -> String {
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut sorted = serde_json::Map::new();
                for (k, v) in entries {
                    sorted.insert(k.clone(), sort(v));
                }
                Value::Object(sorted)
            }
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    sort(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_stable_under_key_order() {
        let mut a = HashMap::new();
        a.insert("b".to_string(), json!(1));
        a.insert("a".to_string(), json!(2));
        let mut stm = ShortTermMemory::default();
        let sig1 = stm.step_signature("calc", &a);

        let mut b = HashMap::new();
        b.insert("a".to_string(), json!(2));
        b.insert("b".to_string(), json!(1));
        let sig2 = stm.step_signature("calc", &b);

        assert_eq!(sig1, sig2);
        assert_eq!(stm.signature_count(&sig1), 2);
    }

    #[test]
    fn retry_count_is_monotonic() {
        let mut stm = ShortTermMemory::default();
        assert_eq!(stm.retry_count("s1"), 0);
        assert_eq!(stm.mark_retry("s1"), 1);
        assert_eq!(stm.mark_retry("s1"), 2);
        assert_eq!(stm.retry_count("s1"), 2);
    }

    #[test]
    fn record_observation_updates_state_and_outputs() {
        let mut stm = ShortTermMemory::default();
        stm.record_observation("s1", json!({"tool_name": "calc", "result": {"result": 4}}));
        assert_eq!(stm.state.get("last_step_id").unwrap(), "s1");
        assert!(stm.step_outputs.contains_key("s1"));
        assert_eq!(stm.observations.len(), 1);
    }
}
