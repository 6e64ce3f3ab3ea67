use std::path::{Path, PathBuf};

use uuid::Uuid;

pub fn utc_now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// 128-bit random, hex-encoded (32 chars).
pub fn new_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Same shape as the trace id; a run is one execution of a trace.
pub fn new_run_id() -> String {
    new_trace_id()
}

/// 64-bit random hex (16 chars), unique per tool-call attempt.
pub fn new_step_attempt_id() -> String {
    let full = Uuid::new_v4().simple().to_string();
    full[..16].to_string()
}

/// `{UTCTimestamp}_{prefix}_{trace_id}.json`
pub fn trace_export_path(traces_dir: &Path, trace_id: &str, prefix: &str) -> PathBuf {
    let ts = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    traces_dir.join(format!("{ts}_{prefix}_{trace_id}.json"))
}
