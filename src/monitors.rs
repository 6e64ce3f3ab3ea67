//! Pure classifier: maps a `ToolCallRecord`'s outcome to zero or more
//! `FailureSignal`s. Touches nothing else — no registry, no memory.

use serde_json::Value;

use crate::errors::FailureType;
use crate::types::{FailureSignal, Severity, ToolCallRecord, ToolCallStatus};

fn signal(failure_type: FailureType, retryable: bool, severity: Severity, message: impl Into<String>, action: impl Into<String>) -> FailureSignal {
    FailureSignal {
        failure_type,
        retryable,
        severity,
        message: message.into(),
        recommended_action: action.into(),
        diagnostics: Default::default(),
    }
}

pub fn classify(record: &ToolCallRecord) -> Vec<FailureSignal> {
    let malformed = record
        .result
        .as_ref()
        .and_then(|r| r.get("malformed"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    match record.status {
        ToolCallStatus::Success if malformed => {
            vec![signal(FailureType::SchemaError, true, Severity::Medium, "tool returned a malformed result", "retry_with_relaxed_schema")]
        }
        ToolCallStatus::Success => Vec::new(),
        ToolCallStatus::Timeout => {
            vec![signal(FailureType::Timeout, true, Severity::Medium, "tool call timed out", "increase_timeout_and_retry")]
        }
        ToolCallStatus::SchemaError => {
            vec![signal(FailureType::SchemaError, true, Severity::Medium, "tool call returned a schema error", "retry_with_relaxed_schema")]
        }
        ToolCallStatus::PolicyBlocked => {
            vec![signal(FailureType::PolicyViolation, false, Severity::High, "tool call blocked by policy", "abort")]
        }
        ToolCallStatus::Error => {
            vec![signal(FailureType::ToolError, true, Severity::Medium, record.error.clone().unwrap_or_else(|| "tool call failed".to_string()), "retry")]
        }
    }
}

pub fn detect_non_progress(signature_count: i64, threshold: i64, tool_name: &str, step_id: &str) -> Option<FailureSignal> {
    if signature_count > threshold {
        Some(signal(
            FailureType::NonProgress,
            false,
            Severity::High,
            format!("step '{step_id}' repeated the same {tool_name} call {signature_count} times without progress"),
            "abort",
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCallRecord;
    use serde_json::json;
    use std::collections::HashMap;

    fn record(status: ToolCallStatus, result: Option<Value>) -> ToolCallRecord {
        ToolCallRecord {
            step_id: "s1".to_string(),
            step_attempt_id: "a1".to_string(),
            tool_name: "http_get".to_string(),
            tool_args: HashMap::new(),
            validated_args: HashMap::new(),
            status,
            latency_ms: 1,
            result,
            error: None,
            raw_response: Value::Null,
            ts: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn success_without_malformed_flag_is_clean() {
        let rec = record(ToolCallStatus::Success, Some(json!({"malformed": false})));
        assert!(classify(&rec).is_empty());
    }

    #[test]
    fn success_with_malformed_flag_emits_schema_error() {
        let rec = record(ToolCallStatus::Success, Some(json!({"malformed": true})));
        let signals = classify(&rec);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].failure_type, FailureType::SchemaError);
        assert!(signals[0].retryable);
    }

    #[test]
    fn policy_blocked_is_not_retryable() {
        let rec = record(ToolCallStatus::PolicyBlocked, None);
        let signals = classify(&rec);
        assert!(!signals[0].retryable);
        assert_eq!(signals[0].severity, Severity::High);
    }

    #[test]
    fn non_progress_fires_above_threshold() {
        assert!(detect_non_progress(2, 1, "calc", "s1").is_some());
        assert!(detect_non_progress(1, 1, "calc", "s1").is_none());
    }
}
