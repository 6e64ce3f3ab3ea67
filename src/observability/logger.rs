//! JSON-line structured logger. Every line is one log event; writes are
//! serialized behind a mutex so concurrent runs never interleave output.
//! This sits alongside `tracing` rather than replacing it: every emitted
//! line is also forwarded as a `tracing` event so the ambient
//! subscriber/OTLP pipeline sees it.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use super::ids::utc_now_iso;

#[derive(Clone)]
pub struct StructuredLogger {
    component: String,
    context: BTreeMap<String, Value>,
    log_file: Option<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>, log_file: Option<PathBuf>) -> Self {
        Self { component: component.into(), context: BTreeMap::new(), log_file, lock: Arc::new(Mutex::new(())) }
    }

    /// Clone this logger into a child bound with additional context fields,
    /// e.g. `trace_id`/`run_id`, optionally renaming the component.
    pub fn child(&self, component: Option<&str>, context: &[(&str, Value)]) -> Self {
        let mut merged = self.context.clone();
        for (k, v) in context {
            merged.insert((*k).to_string(), v.clone());
        }
        Self {
            component: component.unwrap_or(&self.component).to_string(),
            context: merged,
            log_file: self.log_file.clone(),
            lock: self.lock.clone(),
        }
    }

    fn emit(&self, level: &str, event: &str, message: &str, data: Value) {
        let mut payload = json!({
            "ts": utc_now_iso(),
            "level": level,
            "component": self.component,
            "event": event,
            "message": message,
            "data": data,
        });
        if let Value::Object(ref mut map) = payload {
            for (k, v) in &self.context {
                map.insert(k.clone(), v.clone());
            }
        }
        let line = payload.to_string();

        match level {
            "DEBUG" => tracing::debug!(component = %self.component, event, message),
            "WARNING" => tracing::warn!(component = %self.component, event, message),
            "ERROR" => tracing::error!(component = %self.component, event, message),
            _ => tracing::info!(component = %self.component, event, message),
        }

        let _guard = self.lock.lock().unwrap();
        println!("{line}");
        if let Some(path) = &self.log_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(f, "{line}");
            }
        }
    }

    pub fn debug(&self, event: &str, message: &str, data: Value) {
        self.emit("DEBUG", event, message, data);
    }
    pub fn info(&self, event: &str, message: &str, data: Value) {
        self.emit("INFO", event, message, data);
    }
    pub fn warning(&self, event: &str, message: &str, data: Value) {
        self.emit("WARNING", event, message, data);
    }
    pub fn error(&self, event: &str, message: &str, data: Value) {
        self.emit("ERROR", event, message, data);
    }
}
