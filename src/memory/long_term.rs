//! A small embedded, in-process store for cross-run memory: a seeded demo
//! table the `db_query` tool can read, append-only memory entries for
//! perception/planner recall, tool-outcome history, run summaries, and eval
//! results. Deliberately not a full SQL engine or an external database
//! dependency — the policy gate only ever allows a narrow
//! `SELECT ... FROM demo_numbers` / `PRAGMA` shape by default, mirroring the
//! source system's own seeded demo table. Guarded by a `Mutex` and
//! snapshotted to a JSON file under the runtime directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::observability::utc_now_iso;
use crate::types::RunTrace;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct Store {
    demo_numbers: Vec<DemoNumber>,
    memory_entries: Vec<MemoryEntry>,
    tool_outcomes: Vec<ToolOutcome>,
    runs: HashMap<String, RunSummary>,
    eval_results: Vec<EvalResultRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DemoNumber {
    id: i64,
    label: String,
    value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryEntry {
    id: i64,
    namespace: String,
    key: String,
    value_text: String,
    metadata: Value,
    created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolOutcome {
    trace_id: String,
    step_id: String,
    tool_name: String,
    status: String,
    latency_ms: i64,
    outcome: Value,
    created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RunSummary {
    run_id: String,
    trace_id: String,
    status: String,
    request: Value,
    final_output: Value,
    stop_reason: String,
    started_at: String,
    finished_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EvalResultRow {
    scenario_id: String,
    passed: bool,
    reason: String,
    score: f64,
    trace_path: Option<String>,
    created_at: String,
}

fn seed_demo_numbers() -> Vec<DemoNumber> {
    vec![
        DemoNumber { id: 1, label: "alpha".to_string(), value: 10 },
        DemoNumber { id: 2, label: "beta".to_string(), value: 20 },
        DemoNumber { id: 3, label: "gamma".to_string(), value: 30 },
    ]
}

pub struct LongTermMemory {
    path: PathBuf,
    store: Mutex<Store>,
    next_memory_id: Mutex<i64>,
}

impl LongTermMemory {
    pub fn open(path: &Path) -> Self {
        let store = std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str::<Store>(&text).ok())
            .unwrap_or_else(|| Store { demo_numbers: seed_demo_numbers(), ..Default::default() });
        let next_id = store.memory_entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        Self { path: path.to_path_buf(), store: Mutex::new(store), next_memory_id: Mutex::new(next_id) }
    }

    fn persist(&self, store: &Store) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(text) = serde_json::to_string_pretty(store) {
            let _ = std::fs::write(&self.path, text);
        }
    }

    /// Executes a narrow read-only subset of SQL against `demo_numbers`:
    /// `SELECT <cols> FROM demo_numbers [ORDER BY id] [LIMIT n]` or
    /// `PRAGMA ...` (returns no rows). Anything else is a tool error, which
    /// the caller maps to `FailureType::ToolError`.
    pub fn query(&self, sql: &str, _params: &[Value]) -> Result<Vec<Value>, String> {
        let normalized = normalize_sql(sql);
        if normalized.starts_with("pragma") {
            return Ok(Vec::new());
        }
        if !normalized.starts_with("select") {
            return Err(format!("unsupported query: {sql}"));
        }
        if !normalized.contains("from demo_numbers") {
            return Err(format!("unknown table referenced in query: {sql}"));
        }
        let store = self.store.lock().unwrap();
        let mut rows: Vec<Value> = store
            .demo_numbers
            .iter()
            .map(|n| json!({"id": n.id, "label": n.label, "value": n.value}))
            .collect();
        if let Some(limit) = extract_limit(&normalized) {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    pub fn add_memory_entry(&self, namespace: &str, key: &str, value_text: &str, metadata: Value) {
        let mut store = self.store.lock().unwrap();
        let mut next_id = self.next_memory_id.lock().unwrap();
        let entry = MemoryEntry {
            id: *next_id,
            namespace: namespace.to_string(),
            key: key.to_string(),
            value_text: value_text.to_string(),
            metadata,
            created_at: utc_now_iso(),
        };
        *next_id += 1;
        store.memory_entries.push(entry);
        self.persist(&store);
    }

    pub fn get_memory_entries(&self, namespace: Option<&str>, limit: usize) -> Vec<(String, String)> {
        let store = self.store.lock().unwrap();
        store
            .memory_entries
            .iter()
            .rev()
            .filter(|e| namespace.map(|ns| ns == e.namespace).unwrap_or(true))
            .take(limit)
            .map(|e| (e.key.clone(), e.value_text.clone()))
            .collect()
    }

    pub fn save_tool_outcome(
        &self,
        trace_id: &str,
        step_id: &str,
        tool_name: &str,
        status: &str,
        latency_ms: i64,
        outcome: Value,
    ) {
        let mut store = self.store.lock().unwrap();
        store.tool_outcomes.push(ToolOutcome {
            trace_id: trace_id.to_string(),
            step_id: step_id.to_string(),
            tool_name: tool_name.to_string(),
            status: status.to_string(),
            latency_ms,
            outcome,
            created_at: utc_now_iso(),
        });
        self.persist(&store);
    }

    pub fn save_trace(&self, trace: &RunTrace) {
        let mut store = self.store.lock().unwrap();
        store.runs.insert(
            trace.run_id.clone(),
            RunSummary {
                run_id: trace.run_id.clone(),
                trace_id: trace.trace_id.clone(),
                status: format!("{:?}", trace.status),
                request: trace.request.clone(),
                final_output: json!(trace.final_output),
                stop_reason: trace.stop_reason.message.clone(),
                started_at: trace.started_at.clone(),
                finished_at: trace.finished_at.clone(),
            },
        );
        self.persist(&store);
    }

    pub fn save_eval_result(&self, scenario_id: &str, passed: bool, reason: &str, score: f64, trace_path: Option<String>) {
        let mut store = self.store.lock().unwrap();
        store.eval_results.push(EvalResultRow {
            scenario_id: scenario_id.to_string(),
            passed,
            reason: reason.to_string(),
            score,
            trace_path,
            created_at: utc_now_iso(),
        });
        self.persist(&store);
    }
}

fn normalize_sql(sql: &str) -> String {
    let no_comments: String = sql
        .lines()
        .map(|line| match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join(" ");
    no_comments.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn extract_limit(normalized_sql: &str) -> Option<usize> {
    let idx = normalized_sql.find("limit")?;
    normalized_sql[idx + 5..].trim().split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn query_returns_seeded_rows_respecting_limit() {
        let dir = tempdir().unwrap();
        let ltm = LongTermMemory::open(&dir.path().join("store.json"));
        let rows = ltm.query("SELECT id, label, value FROM demo_numbers ORDER BY id LIMIT 2", &[]).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn query_rejects_non_select_non_pragma() {
        let dir = tempdir().unwrap();
        let ltm = LongTermMemory::open(&dir.path().join("store.json"));
        assert!(ltm.query("DELETE FROM demo_numbers WHERE id = 1", &[]).is_err());
    }

    #[test]
    fn memory_entries_round_trip_through_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        {
            let ltm = LongTermMemory::open(&path);
            ltm.add_memory_entry("facts", "seed:a", "hello world", json!({}));
        }
        let reopened = LongTermMemory::open(&path);
        let entries = reopened.get_memory_entries(Some("facts"), 10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "seed:a");
    }
}
