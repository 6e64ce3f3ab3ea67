//! Serializes a finished `RunTrace` to a stable JSON file named
//! `{UTCTimestamp}_{prefix}_{trace_id}.json` under the traces directory.

use std::path::{Path, PathBuf};

use crate::errors::OrchestratorError;
use crate::observability::trace_export_path;
use crate::types::RunTrace;

pub fn export_trace(traces_dir: &Path, trace: &RunTrace, prefix: &str) -> Result<PathBuf, OrchestratorError> {
    std::fs::create_dir_all(traces_dir)?;
    let path = trace_export_path(traces_dir, &trace.trace_id, prefix);
    let text = serde_json::to_string_pretty(trace)?;
    std::fs::write(&path, text)?;
    Ok(path)
}

pub fn load_trace(path: &Path) -> Result<RunTrace, OrchestratorError> {
    let text = std::fs::read_to_string(path)?;
    let trace = serde_json::from_str(&text)?;
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn export_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let trace = RunTrace::new("abc123".to_string(), "run1".to_string(), json!({"goal": "test"}));
        let path = export_trace(dir.path(), &trace, "run").unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().ends_with("_run_abc123.json"));
        let reloaded = load_trace(&path).unwrap();
        assert_eq!(reloaded.trace_id, trace.trace_id);
    }
}
